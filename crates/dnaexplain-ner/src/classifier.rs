//! Rule-based report analysis.
//!
//! A single pass over the input text produces everything downstream tiers
//! need: candidate genes, the classification cue, zygosity, panel listings,
//! identifier-shaped tokens, and disallowed intents. The classifier is a pure
//! function of its input: no I/O, no randomness, no state between calls.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use dnaexplain_common::{Confidence, EntityType, ExtractedEntity};

use crate::classification::{detect_classification, detect_zygosity, Classification, Zygosity};
use crate::gene_symbols::{canonical_gene, is_known_symbol, is_stopword, KNOWN_GENE_SYMBOLS};
use crate::intent::detect_intents;
use crate::patterns;

static POINT_CHANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[A-Z]\d+[A-Z]|RS\d+|E[234])$").unwrap());
static LETTER_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]\d+$").unwrap());
/// Record numbers and accessions: letters followed by a long digit run.
static ACCESSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{1,4}\d{4,}$").unwrap());

/// Everything the rule library found in one report excerpt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Analysis {
    /// Canonical gene names in order of first appearance. Empty unless the
    /// text also carries a genetics-context cue.
    pub genes: Vec<String>,
    pub classification: Option<Classification>,
    pub zygosity: Option<Zygosity>,
    pub apoe_e4: bool,
    /// Genes listed after a "tested gene(s):" heading.
    pub panel_genes: Vec<String>,
    pub rsids: Vec<String>,
    pub hgvs: Vec<String>,
    pub conditions: Vec<String>,
    pub intents: Vec<&'static str>,
    pub has_genetics_context: bool,
}

impl Analysis {
    pub fn has_panel(&self) -> bool {
        !self.panel_genes.is_empty()
    }

    /// All findings as response entities.
    pub fn entities(&self) -> Vec<ExtractedEntity> {
        let mut entities: Vec<ExtractedEntity> = self
            .genes
            .iter()
            .map(|g| {
                let confidence = if is_known_symbol(g) { Confidence::High } else { Confidence::Medium };
                ExtractedEntity::new(EntityType::Gene, g.clone(), confidence)
            })
            .collect();

        entities.extend(self.identifier_entities());

        if let Some(c) = self.classification {
            entities.push(ExtractedEntity::new(
                EntityType::VariantClassification,
                c.label(),
                Confidence::High,
            ));
        }
        if let Some(z) = self.zygosity {
            entities.push(ExtractedEntity::new(EntityType::Zygosity, z.as_str(), Confidence::High));
        }
        for condition in &self.conditions {
            entities.push(ExtractedEntity::new(EntityType::Condition, condition.clone(), Confidence::Medium));
        }
        entities
    }

    /// Literal identifier tokens only (rsIDs and HGVS expressions).
    pub fn identifier_entities(&self) -> Vec<ExtractedEntity> {
        let rsids = self
            .rsids
            .iter()
            .map(|r| ExtractedEntity::new(EntityType::Rsid, r.clone(), Confidence::High));
        let hgvs = self
            .hgvs
            .iter()
            .map(|h| ExtractedEntity::new(EntityType::Hgvs, h.clone(), Confidence::High));
        rsids.chain(hgvs).collect()
    }
}

/// Compiled classifier. Cheap to share; holds only immutable regexes.
pub struct TextClassifier {
    known_symbol_regex: Regex,
}

impl Default for TextClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl TextClassifier {
    pub fn new() -> Self {
        Self::with_symbols(std::iter::empty::<&str>())
    }

    /// Classifier that also recognises `extra` symbols, typically the gene
    /// keys of a loaded knowledge base.
    pub fn with_symbols<S: AsRef<str>>(extra: impl IntoIterator<Item = S>) -> Self {
        let mut symbols: Vec<String> = KNOWN_GENE_SYMBOLS.iter().map(|g| g.to_string()).collect();
        symbols.extend(extra.into_iter().map(|s| s.as_ref().to_string()));
        // Longest first so multi-word keys win over their prefixes.
        symbols.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        symbols.dedup();
        let known_pattern = symbols.iter().map(|g| regex::escape(g)).collect::<Vec<_>>().join("|");
        let known_symbol_regex = Regex::new(&format!(r"(?i)\b({})\b", known_pattern)).unwrap();
        Self { known_symbol_regex }
    }

    pub fn analyze(&self, text: &str) -> Analysis {
        let has_genetics_context = patterns::GENETICS_CONTEXT.is_match(text);

        let genes = if has_genetics_context { self.gene_candidates(text) } else { Vec::new() };

        let panel_genes = patterns::PANEL_LIST
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|list| self.gene_candidates(list.as_str()))
            .unwrap_or_default();

        let analysis = Analysis {
            genes,
            classification: detect_classification(text),
            zygosity: detect_zygosity(text),
            apoe_e4: patterns::APOE_E4.is_match(text),
            panel_genes,
            rsids: unique(patterns::RSID.find_iter(text).map(|m| m.as_str().to_ascii_lowercase())),
            hgvs: hgvs_tokens(text),
            conditions: unique(patterns::CONDITION.find_iter(text).map(|m| m.as_str().to_string())),
            intents: detect_intents(text),
            has_genetics_context,
        };

        debug!(
            chars = text.chars().count(),
            genes = analysis.genes.len(),
            classification = ?analysis.classification,
            panel = analysis.panel_genes.len(),
            intents = ?analysis.intents,
            "Report analyzed"
        );

        analysis
    }

    /// Gene-shaped tokens, synonyms, and lower-case mentions of well-known
    /// symbols, canonicalised and de-duplicated in order of appearance.
    fn gene_candidates(&self, text: &str) -> Vec<String> {
        let mut found: Vec<(usize, String)> = Vec::new();
        let mut synonym_spans = Vec::new();

        for m in patterns::GENE_SYNONYM.find_iter(text) {
            synonym_spans.push(m.range());
            found.push((m.start(), canonical_gene(m.as_str())));
        }
        for m in patterns::GENE_TOKEN.find_iter(text) {
            let inside_synonym =
                synonym_spans.iter().any(|span| span.start <= m.start() && m.end() <= span.end);
            if !inside_synonym && is_plausible_symbol(m.as_str()) {
                found.push((m.start(), canonical_gene(m.as_str())));
            }
        }
        for m in self.known_symbol_regex.find_iter(text) {
            found.push((m.start(), canonical_gene(m.as_str())));
        }

        found.sort_by_key(|(pos, _)| *pos);
        unique(found.into_iter().map(|(_, gene)| gene))
    }
}

/// Shape alone is not enough: report headings, names, identifiers, and point
/// changes (`C677T`) share the upper-case alphanumeric shape. An all-letter
/// token counts only when it is a recognised symbol; unrecognised symbols must
/// carry a digit (`ZNF462`).
fn is_plausible_symbol(token: &str) -> bool {
    if is_stopword(token) || POINT_CHANGE.is_match(token) || ACCESSION.is_match(token) {
        return false;
    }
    if LETTER_DIGITS.is_match(token) || !token.bytes().any(|b| b.is_ascii_digit()) {
        return is_known_symbol(token);
    }
    true
}

fn hgvs_tokens(text: &str) -> Vec<String> {
    let full: Vec<(usize, usize, String)> = patterns::HGVS
        .find_iter(text)
        .map(|m| (m.start(), m.end(), m.as_str().to_string()))
        .collect();
    let short = patterns::HGVS_SHORT.find_iter(text).filter(|m| {
        !full.iter().any(|(start, end, _)| m.start() >= *start && m.end() <= *end)
    });
    unique(
        full.iter()
            .map(|(_, _, s)| s.clone())
            .chain(short.map(|m| m.as_str().to_string())),
    )
}

fn unique(items: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items.filter(|item| seen.insert(item.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn analyze(text: &str) -> Analysis {
        TextClassifier::new().analyze(text)
    }

    #[test]
    fn test_gene_with_classification() {
        let a = analyze("BRCA1, likely pathogenic, heterozygous");
        assert_eq!(a.genes, vec!["BRCA1".to_string()]);
        assert_eq!(a.classification, Some(Classification::LikelyPathogenic));
        assert_eq!(a.zygosity, Some(Zygosity::Heterozygous));
        assert!(a.has_genetics_context);
    }

    #[test]
    fn test_gene_requires_genetics_context() {
        let a = analyze("THE ATM NEAR MY HOUSE WAS OUT OF CASH");
        assert!(a.genes.is_empty());
        assert!(!a.has_genetics_context);
    }

    #[test]
    fn test_stoplist_and_point_changes_are_not_genes() {
        let a = analyze("MTHFR C677T variant, HOMOZYGOUS. DNA TEST RESULT: POSITIVE");
        assert_eq!(a.genes, vec!["MTHFR".to_string()]);
    }

    #[test]
    fn test_synonym_resolves_to_kb_key() {
        let a = analyze("Factor V Leiden mutation, heterozygous");
        assert_eq!(a.genes, vec!["Factor V Leiden".to_string()]);
    }

    #[test]
    fn test_uppercase_header_and_names_are_not_genes() {
        let a = analyze(
            "GENETIC TEST REPORT\nPATIENT NAME: JANE DOE\nMRN: MRN20451\nRESULT: Variant of uncertain significance",
        );
        assert!(a.genes.is_empty(), "unexpected genes: {:?}", a.genes);
        assert_eq!(a.classification, Some(Classification::Vus));
        assert!(a.entities().iter().all(|e| e.entity_type != EntityType::Gene));
    }

    #[test]
    fn test_uppercase_synonym_is_one_gene() {
        let a = analyze("FACTOR V LEIDEN MUTATION DETECTED, HETEROZYGOUS");
        assert_eq!(a.genes, vec!["Factor V Leiden".to_string()]);
    }

    #[test]
    fn test_extra_symbols_are_recognised() {
        let classifier = TextClassifier::with_symbols(["ABCC", "CACNA"]);
        let a = classifier.analyze("ABCC variant, likely benign");
        assert_eq!(a.genes, vec!["ABCC".to_string()]);
        assert!(TextClassifier::new().analyze("ABCC variant, likely benign").genes.is_empty());
    }

    #[test]
    fn test_unrecognised_symbol_needs_a_digit() {
        let a = analyze("ZNF462 variant, uncertain significance");
        assert_eq!(a.genes, vec!["ZNF462".to_string()]);
        assert_eq!(a.entities()[0].confidence, Confidence::Medium);
    }

    #[test]
    fn test_lowercase_known_symbol() {
        let a = analyze("my brca2 gene came back with a variant");
        assert_eq!(a.genes, vec!["BRCA2".to_string()]);
    }

    #[test]
    fn test_rsid_only_report() {
        let a = analyze("rs80357906 uncertain significance variant in an unspecified gene");
        assert!(a.genes.is_empty());
        assert_eq!(a.rsids, vec!["rs80357906".to_string()]);
        assert_eq!(a.classification, Some(Classification::Vus));
        assert!(a.has_genetics_context);
    }

    #[test]
    fn test_panel_listing() {
        let a = analyze("Tested genes: BRCA1, BRCA2, PALB2 and CHEK2\nNo variants detected.");
        assert_eq!(a.panel_genes, vec!["BRCA1", "BRCA2", "PALB2", "CHEK2"]);
        assert!(a.has_panel());
        assert_eq!(a.classification, None);
    }

    #[test]
    fn test_hgvs_full_and_short_do_not_duplicate() {
        let a = analyze("BRCA1 NM_007294.3:c.5266dupC pathogenic; also c.68_69delAG");
        assert_eq!(a.hgvs, vec!["NM_007294.3:c.5266dupC".to_string(), "c.68_69delAG".to_string()]);
    }

    #[test]
    fn test_entities_include_gene_and_classification() {
        let a = analyze("BRCA2 pathogenic variant rs80359550 associated with breast cancer");
        let entities = a.entities();
        let kinds: Vec<EntityType> = entities.iter().map(|e| e.entity_type).collect();
        assert_eq!(
            kinds,
            vec![EntityType::Gene, EntityType::Rsid, EntityType::VariantClassification, EntityType::Condition]
        );
        assert_eq!(entities[0].value, "BRCA2");
        assert_eq!(entities[0].confidence, Confidence::High);
    }

    #[test]
    fn test_analysis_is_deterministic() {
        let text = "APOE e3/e4 genotype; MTHFR A1298C heterozygous. What supplements should I take?";
        assert_eq!(analyze(text), analyze(text));
        assert!(analyze(text).apoe_e4);
    }
}
