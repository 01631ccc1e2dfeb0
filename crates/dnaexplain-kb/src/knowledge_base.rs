//! Curated knowledge base: gene templates, classification templates,
//! glossary, and disclaimer text.
//!
//! Read-only after load. Sources are JSON documents merged in order; later
//! sources extend or override earlier ones by key. A missing or malformed
//! source is logged and skipped, so the worst case is an empty knowledge base,
//! never a failed process.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

const EMBEDDED_SOURCES: &[(&str, &str)] = &[
    ("embedded:common-genes.json", include_str!("../kb/common-genes.json")),
    ("embedded:glossary.json", include_str!("../kb/glossary.json")),
];

/// Used when no source supplies a disclaimer.
pub const DEFAULT_DISCLAIMER: &str = "This information is for educational purposes only and is not intended as medical advice, diagnosis, or treatment. Genetic information should be interpreted by qualified healthcare professionals in the context of your complete health history. Always consult with a licensed healthcare provider or certified genetic counselor before making any medical decisions based on genetic test results.";

pub const DEFAULT_SHORT_DISCLAIMER: &str =
    "Educational only. Not medical advice. Consult a healthcare provider or genetic counselor for personalized guidance.";

#[derive(Debug, Error)]
pub enum KbError {
    #[error("failed to read {path}: {source}")]
    Io { path: String, source: std::io::Error },

    #[error("failed to parse {path}: {source}")]
    Parse { path: String, source: serde_json::Error },
}

// ---------------------------------------------------------------------------
// Template types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateStep {
    pub title: String,
    pub description: String,
    pub urgency: String,
    #[serde(default)]
    pub who_to_talk_to: Option<String>,
}

/// Gene-specific narrative for one classification key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneResponse {
    pub summary: String,
    #[serde(default)]
    pub what_this_does_not_mean: Vec<String>,
    #[serde(default)]
    pub next_steps: Vec<TemplateStep>,
    #[serde(default)]
    pub questions_to_ask: Vec<String>,
    #[serde(default)]
    pub caution: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneEntry {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub associated_conditions: Vec<String>,
    #[serde(default)]
    pub inheritance: Option<String>,
    #[serde(default)]
    pub penetrance: Option<String>,
    #[serde(default)]
    pub important_context: Option<String>,
    /// Gene-level caution applied when the response template has none.
    #[serde(default)]
    pub caution: Option<String>,
    #[serde(default)]
    pub responses: BTreeMap<String, GeneResponse>,
}

impl GeneEntry {
    fn merge(&mut self, later: GeneEntry) {
        if !later.full_name.is_empty() {
            self.full_name = later.full_name;
        }
        if !later.description.is_empty() {
            self.description = later.description;
        }
        if !later.associated_conditions.is_empty() {
            self.associated_conditions = later.associated_conditions;
        }
        if later.inheritance.is_some() {
            self.inheritance = later.inheritance;
        }
        if later.penetrance.is_some() {
            self.penetrance = later.penetrance;
        }
        if later.important_context.is_some() {
            self.important_context = later.important_context;
        }
        if later.caution.is_some() {
            self.caution = later.caution;
        }
        self.responses.extend(later.responses);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardResponse {
    pub summary: String,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub recommendation: Option<String>,
    #[serde(default)]
    pub questions_to_ask: Vec<String>,
}

/// Gene-independent template for a classification key (e.g. `VUS`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationEntry {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub glossary_term: Option<String>,
    pub standard_response: StandardResponse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlossaryTerm {
    pub term: String,
    #[serde(default)]
    pub full_name: String,
    pub meaning: String,
    pub why_it_matters: String,
    #[serde(default)]
    pub common_misreadings: Vec<String>,
    #[serde(default)]
    pub what_to_do: String,
}

/// On-disk shape of one source document. Every section is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct KbSource {
    genes: BTreeMap<String, GeneEntry>,
    common_classifications: BTreeMap<String, ClassificationEntry>,
    glossary: Vec<GlossaryTerm>,
    disclaimer: Option<String>,
    short_disclaimer: Option<String>,
}

// ---------------------------------------------------------------------------
// KnowledgeBase
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    genes: BTreeMap<String, GeneEntry>,
    classifications: BTreeMap<String, ClassificationEntry>,
    glossary: Vec<GlossaryTerm>,
    disclaimer: Option<String>,
    short_disclaimer: Option<String>,
}

impl KnowledgeBase {
    /// Empty knowledge base; every lookup misses.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Built-in templates compiled into the binary.
    pub fn embedded() -> Self {
        Self::from_sources(EMBEDDED_SOURCES.iter().copied())
    }

    /// Built-in templates followed by every `*.json` file in `dirs`, in
    /// directory order then file-name order.
    pub fn load(dirs: &[PathBuf]) -> Self {
        let mut kb = Self::embedded();
        for dir in dirs {
            match read_dir_sources(dir) {
                Ok(sources) => {
                    for (path, body) in sources {
                        kb.merge_source(&path, &body);
                    }
                }
                Err(e) => warn!(error = %e, "Knowledge base directory skipped"),
            }
        }
        info!(
            genes = kb.genes.len(),
            classifications = kb.classifications.len(),
            glossary_terms = kb.glossary.len(),
            "Knowledge base loaded"
        );
        kb
    }

    /// Merge `(name, json)` sources in order.
    pub fn from_sources<'a>(sources: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut kb = Self::empty();
        for (name, body) in sources {
            kb.merge_source(name, body);
        }
        kb
    }

    fn merge_source(&mut self, name: &str, body: &str) {
        let source: KbSource = match serde_json::from_str(body) {
            Ok(source) => source,
            Err(e) => {
                let err = KbError::Parse { path: name.to_string(), source: e };
                warn!(error = %err, "Knowledge base source skipped");
                return;
            }
        };

        debug!(source = name, genes = source.genes.len(), "Merging knowledge base source");

        for (symbol, entry) in source.genes {
            match self.genes.get_mut(&symbol) {
                Some(existing) => existing.merge(entry),
                None => {
                    self.genes.insert(symbol, entry);
                }
            }
        }
        self.classifications.extend(source.common_classifications);
        for term in source.glossary {
            match self.glossary.iter_mut().find(|t| t.term.eq_ignore_ascii_case(&term.term)) {
                Some(existing) => *existing = term,
                None => self.glossary.push(term),
            }
        }
        if source.disclaimer.is_some() {
            self.disclaimer = source.disclaimer;
        }
        if source.short_disclaimer.is_some() {
            self.short_disclaimer = source.short_disclaimer;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty() && self.classifications.is_empty() && self.glossary.is_empty()
    }

    /// Exact key first, then a case-insensitive scan.
    pub fn gene(&self, symbol: &str) -> Option<&GeneEntry> {
        self.genes.get(symbol).or_else(|| {
            self.genes
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(symbol))
                .map(|(_, entry)| entry)
        })
    }

    pub fn gene_response(&self, symbol: &str, classification: &str) -> Option<&GeneResponse> {
        self.gene(symbol)?.responses.get(classification)
    }

    pub fn classification(&self, key: &str) -> Option<&ClassificationEntry> {
        self.classifications.get(key).or_else(|| {
            self.classifications
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, entry)| entry)
        })
    }

    /// Gene symbols with templates, sorted.
    pub fn supported_genes(&self) -> Vec<String> {
        self.genes.keys().cloned().collect()
    }

    pub fn glossary(&self) -> &[GlossaryTerm] {
        &self.glossary
    }

    /// Lookup by term or full name, case-insensitive.
    pub fn glossary_term(&self, term: &str) -> Option<&GlossaryTerm> {
        self.glossary.iter().find(|t| {
            t.term.eq_ignore_ascii_case(term) || t.full_name.eq_ignore_ascii_case(term)
        })
    }

    /// Terms whose name, full name, or meaning contains any keyword.
    pub fn matching_terms(&self, keywords: &[&str]) -> Vec<&GlossaryTerm> {
        let keywords: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();
        self.glossary
            .iter()
            .filter(|t| {
                let term = t.term.to_lowercase();
                let full_name = t.full_name.to_lowercase();
                let meaning = t.meaning.to_lowercase();
                keywords.iter().any(|k| term.contains(k) || full_name.contains(k) || meaning.contains(k))
            })
            .collect()
    }

    /// Prompt-ready glossary snippets for the requested terms. Unknown terms
    /// are skipped; the result is empty when none are known.
    pub fn glossary_context(&self, terms: &[&str]) -> String {
        terms
            .iter()
            .filter_map(|term| self.glossary_term(term))
            .map(|t| {
                let mut block = if t.full_name.is_empty() {
                    format!("**{}**: {}", t.term, t.meaning)
                } else {
                    format!("**{}** ({}): {}", t.term, t.full_name, t.meaning)
                };
                block.push_str(&format!("\nWhy it matters: {}", t.why_it_matters));
                if !t.what_to_do.is_empty() {
                    block.push_str(&format!("\nWhat to do: {}", t.what_to_do));
                }
                block
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn disclaimer(&self) -> &str {
        self.disclaimer.as_deref().unwrap_or(DEFAULT_DISCLAIMER)
    }

    pub fn short_disclaimer(&self) -> &str {
        self.short_disclaimer.as_deref().unwrap_or(DEFAULT_SHORT_DISCLAIMER)
    }
}

fn read_dir_sources(dir: &Path) -> Result<Vec<(String, String)>, KbError> {
    let io_err = |source| KbError::Io { path: dir.display().to_string(), source };
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(io_err)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    let mut sources = Vec::with_capacity(paths.len());
    for path in paths {
        match fs::read_to_string(&path) {
            Ok(body) => sources.push((path.display().to_string(), body)),
            Err(source) => {
                let err = KbError::Io { path: path.display().to_string(), source };
                warn!(error = %err, "Knowledge base source skipped");
            }
        }
    }
    Ok(sources)
}

// ---------------------------------------------------------------------------
// Process-wide instance
// ---------------------------------------------------------------------------

static SHARED: OnceLock<Arc<KnowledgeBase>> = OnceLock::new();

/// Load the process-wide knowledge base on first call; later calls return the
/// same instance and ignore `dirs`. Reloading requires a restart.
pub fn init_shared(dirs: &[PathBuf]) -> Arc<KnowledgeBase> {
    SHARED.get_or_init(|| Arc::new(KnowledgeBase::load(dirs))).clone()
}

/// Process-wide knowledge base, loading the built-in templates if nothing
/// initialised it yet.
pub fn shared() -> Arc<KnowledgeBase> {
    init_shared(&[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_embedded_kb_loads() {
        let kb = KnowledgeBase::embedded();
        assert!(!kb.is_empty());
        assert_eq!(
            kb.supported_genes(),
            vec!["APOE", "BRCA1", "BRCA2", "CFTR", "Factor V Leiden", "HFE", "MTHFR"]
        );
        assert!(kb.gene_response("BRCA1", "pathogenic").is_some());
        assert!(kb.gene_response("APOE", "e4_carrier").is_some());
        assert!(kb.classification("VUS").is_some());
        assert!(kb.classification("vus").is_some());
    }

    #[test]
    fn test_malformed_source_degrades_to_empty() {
        let kb = KnowledgeBase::from_sources([("broken.json", "{ not json")]);
        assert!(kb.is_empty());
        assert!(kb.gene("BRCA1").is_none());
        assert_eq!(kb.disclaimer(), DEFAULT_DISCLAIMER);
    }

    #[test]
    fn test_missing_directory_is_skipped() {
        let kb = KnowledgeBase::load(&[PathBuf::from("/nonexistent/dnaexplain-kb")]);
        assert!(kb.gene("BRCA2").is_some());
    }

    #[test]
    fn test_later_source_overrides_and_extends() {
        let base = r#"{"genes": {"TP53": {"full_name": "Tumor protein p53", "description": "d",
            "responses": {"general": {"summary": "base"}}}}}"#;
        let overlay = r#"{"genes": {"TP53": {"penetrance": "variable",
            "responses": {"general": {"summary": "override"}, "pathogenic": {"summary": "p"}}}},
            "disclaimer": "custom"}"#;
        let kb = KnowledgeBase::from_sources([("a", base), ("b", overlay)]);
        let gene = kb.gene("tp53").unwrap();
        assert_eq!(gene.full_name, "Tumor protein p53");
        assert_eq!(gene.penetrance.as_deref(), Some("variable"));
        assert_eq!(gene.responses["general"].summary, "override");
        assert!(gene.responses.contains_key("pathogenic"));
        assert_eq!(kb.disclaimer(), "custom");
    }

    #[test]
    fn test_glossary_lookup_by_full_name() {
        let kb = KnowledgeBase::embedded();
        assert_eq!(kb.glossary_term("variant of uncertain significance").unwrap().term, "VUS");
        assert_eq!(kb.glossary_term("rsid").unwrap().term, "rsID");
        assert!(kb.glossary_term("nonexistent").is_none());
    }

    #[test]
    fn test_matching_terms() {
        let kb = KnowledgeBase::embedded();
        let terms: Vec<&str> = kb.matching_terms(&["zygous"]).iter().map(|t| t.term.as_str()).collect();
        assert_eq!(terms, vec!["Heterozygous", "Homozygous"]);
    }

    #[test]
    fn test_glossary_context_format() {
        let kb = KnowledgeBase::embedded();
        let ctx = kb.glossary_context(&["VUS", "unknown-term"]);
        assert!(ctx.starts_with("**VUS** (Variant of Uncertain Significance): "));
        assert!(ctx.contains("\nWhy it matters: "));
        assert!(ctx.contains("\nWhat to do: "));
        assert_eq!(kb.glossary_context(&["unknown-term"]), "");
    }

    #[test]
    fn test_shared_instance_is_reused() {
        let a = shared();
        let b = shared();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
