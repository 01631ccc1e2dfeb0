//! Prebuilt tier: pick a template for a classifier result and compose a full
//! `TranslationResult` from it. No network, no randomness.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use dnaexplain_common::{
    Confidence, EntityType, ExtractedEntity, GlossaryEntry, NextStep, Source, TranslationResult,
    Urgency,
};
use dnaexplain_ner::{is_known_symbol, Analysis, Zygosity};

use crate::knowledge_base::{GeneEntry, GeneResponse, KnowledgeBase};

/// Sentinel gene for classification-only matches.
pub const UNKNOWN_GENE: &str = "unknown";
/// Sentinel gene for a tested-gene listing without a finding.
pub const PANEL_GENE: &str = "panel";
pub const GENE_PANEL_KEY: &str = "gene_panel";
/// Template used when a gene is named without a classification.
pub const GENERAL_KEY: &str = "general";

const CLINVAR_URL: &str = "https://www.ncbi.nlm.nih.gov/clinvar/";
const NSGC_URL: &str = "https://www.nsgc.org/findageneticcounselor";
const GENEREVIEWS_URL: &str = "https://www.ncbi.nlm.nih.gov/books/NBK1116/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrebuiltMatch {
    pub gene: String,
    pub classification: String,
    pub confidence: Confidence,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub detected_genes: Vec<String>,
}

impl PrebuiltMatch {
    pub fn is_panel(&self) -> bool {
        self.gene == PANEL_GENE
    }

    pub fn is_classification_only(&self) -> bool {
        self.gene == UNKNOWN_GENE
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SynthesisError {
    #[error("no template for gene {gene} with classification {classification}")]
    TemplateMissing { gene: String, classification: String },
}

/// Resolve an analysis to a template key the knowledge base can answer.
///
/// Checked in order: tested-gene panel without a classification, known gene
/// (with APOE e4 and zygosity overrides), then classification-only. Returns
/// `None` when nothing matches, which hands the request to the next tier.
pub fn find_prebuilt_match(kb: &KnowledgeBase, analysis: &Analysis) -> Option<PrebuiltMatch> {
    if analysis.classification.is_none() && analysis.has_panel() {
        let recognised = recognised_genes(kb, &analysis.panel_genes);
        if !recognised.is_empty() {
            return Some(PrebuiltMatch {
                gene: PANEL_GENE.to_string(),
                classification: GENE_PANEL_KEY.to_string(),
                confidence: Confidence::Medium,
                detected_genes: recognised,
            });
        }
    }

    for gene in &analysis.genes {
        let Some(entry) = kb.gene(gene) else { continue };
        if let Some(found) = match_gene(gene, entry, analysis) {
            return Some(found);
        }
    }

    let classification = analysis.classification?;
    if !analysis.has_genetics_context {
        return None;
    }
    let key = classification.generic_key();
    kb.classification(key)?;
    Some(PrebuiltMatch {
        gene: UNKNOWN_GENE.to_string(),
        classification: key.to_string(),
        confidence: Confidence::High,
        detected_genes: recognised_genes(kb, &analysis.genes),
    })
}

/// Genes with a template or on the built-in symbol list; shape-only
/// candidates never surface as entities.
fn recognised_genes(kb: &KnowledgeBase, genes: &[String]) -> Vec<String> {
    genes.iter().filter(|g| kb.gene(g).is_some() || is_known_symbol(g)).cloned().collect()
}

fn match_gene(gene: &str, entry: &GeneEntry, analysis: &Analysis) -> Option<PrebuiltMatch> {
    let (mut key, mut confidence) = match analysis.classification {
        Some(c) => (c.template_key(), Confidence::High),
        None => (GENERAL_KEY, Confidence::Medium),
    };

    if gene.eq_ignore_ascii_case("APOE") && analysis.apoe_e4 {
        key = "e4_carrier";
        confidence = Confidence::High;
    }

    // Zygosity-specific templates (Factor V Leiden, MTHFR, HFE) are more
    // specific than a classification key when present.
    if let Some(z @ (Zygosity::Homozygous | Zygosity::Heterozygous)) = analysis.zygosity {
        if entry.responses.contains_key(z.as_str()) && key != "e4_carrier" {
            key = z.as_str();
            confidence = Confidence::High;
        }
    }

    let key = if entry.responses.contains_key(key) {
        key
    } else if entry.responses.contains_key(GENERAL_KEY) {
        confidence = Confidence::Medium;
        GENERAL_KEY
    } else {
        return None;
    };

    Some(PrebuiltMatch {
        gene: gene.to_string(),
        classification: key.to_string(),
        confidence,
        detected_genes: Vec::new(),
    })
}

/// Compose the full answer for a match.
///
/// Fails only when the match names a template the knowledge base does not
/// hold, which cannot happen for a match produced against the same instance.
pub fn synthesize(kb: &KnowledgeBase, m: &PrebuiltMatch) -> Result<TranslationResult, SynthesisError> {
    debug!(gene = %m.gene, classification = %m.classification, "Synthesizing prebuilt response");

    if m.is_panel() {
        return Ok(panel_result(kb, m));
    }
    if m.is_classification_only() {
        return classification_only_result(kb, m);
    }

    let missing = || SynthesisError::TemplateMissing {
        gene: m.gene.clone(),
        classification: m.classification.clone(),
    };
    let entry = kb.gene(&m.gene).ok_or_else(missing)?;
    let response = entry.responses.get(&m.classification).ok_or_else(missing)?;

    Ok(gene_result(kb, m, entry, response))
}

fn gene_result(
    kb: &KnowledgeBase,
    m: &PrebuiltMatch,
    entry: &GeneEntry,
    response: &GeneResponse,
) -> TranslationResult {
    let mut extracted_entities = vec![
        ExtractedEntity::new(EntityType::Gene, m.gene.clone(), Confidence::High)
            .with_notes(entry.full_name.clone()),
    ];
    if m.classification != GENERAL_KEY {
        extracted_entities.push(ExtractedEntity::new(
            EntityType::VariantClassification,
            m.classification.clone(),
            m.confidence,
        ));
    }

    let mut summary_plain_english = response.summary.clone();
    if let Some(context) = &entry.important_context {
        summary_plain_english.push_str(&format!("\n\n**Important Context**: {}", context));
    }

    let why_it_matters = if entry.associated_conditions.is_empty() {
        "This gene is relevant to your health".to_string()
    } else {
        format!("Associated with: {}", entry.associated_conditions.join(", "))
    };
    let mut glossary = vec![GlossaryEntry::new(m.gene.clone(), entry.description.clone(), why_it_matters)];
    if let Some(inheritance) = &entry.inheritance {
        glossary.push(GlossaryEntry::new(
            "Inheritance Pattern",
            inheritance.clone(),
            "This affects how the variant may be passed to family members",
        ));
    }
    if let Some(penetrance) = &entry.penetrance {
        glossary.push(GlossaryEntry::new(
            "Penetrance",
            penetrance.clone(),
            "This indicates how often people who carry the variant develop symptoms",
        ));
    }

    let mut what_this_does_not_mean = response.what_this_does_not_mean.clone();
    if let Some(caution) = response.caution.as_ref().or(entry.caution.as_ref()) {
        what_this_does_not_mean.push(format!("CAUTION: {}", caution));
    }

    let next_steps = response
        .next_steps
        .iter()
        .map(|step| NextStep {
            title: step.title.clone(),
            rationale: step.description.clone(),
            who_to_talk_to: step.who_to_talk_to.clone().unwrap_or_else(|| {
                if step.title.contains("Genetic") {
                    "Certified Genetic Counselor".to_string()
                } else {
                    "Healthcare Provider".to_string()
                }
            }),
            urgency: Urgency::from_label(&step.urgency),
        })
        .collect();

    TranslationResult {
        disclaimer: kb.disclaimer().to_string(),
        extracted_entities,
        summary_plain_english,
        glossary,
        what_this_does_not_mean,
        next_steps,
        questions_to_ask: response.questions_to_ask.clone(),
        sources: vec![
            Source::linked("ClinVar Database", CLINVAR_URL, "Look up variant classifications and evidence"),
            Source::linked("Find a Genetic Counselor", NSGC_URL, "Get professional guidance on your results"),
            Source::linked("GeneReviews", GENEREVIEWS_URL, "Detailed information about genetic conditions"),
        ],
        refusals: Vec::new(),
    }
}

fn classification_only_result(
    kb: &KnowledgeBase,
    m: &PrebuiltMatch,
) -> Result<TranslationResult, SynthesisError> {
    let entry = kb.classification(&m.classification).ok_or_else(|| SynthesisError::TemplateMissing {
        gene: m.gene.clone(),
        classification: m.classification.clone(),
    })?;
    let standard = &entry.standard_response;

    let label = entry.label.clone().unwrap_or_else(|| m.classification.clone());
    let mut extracted_entities =
        vec![ExtractedEntity::new(EntityType::VariantClassification, label, Confidence::High)];
    for gene in &m.detected_genes {
        extracted_entities.push(
            ExtractedEntity::new(EntityType::Gene, gene.clone(), Confidence::Medium)
                .with_notes("No gene-specific template is available for this gene"),
        );
    }

    let glossary = entry
        .glossary_term
        .as_deref()
        .and_then(|term| kb.glossary_term(term))
        .map(|t| {
            let mut g = GlossaryEntry::new(t.term.clone(), t.meaning.clone(), t.why_it_matters.clone());
            if !t.common_misreadings.is_empty() {
                g.common_misreadings = Some(t.common_misreadings.clone());
            }
            vec![g]
        })
        .unwrap_or_default();

    Ok(TranslationResult {
        disclaimer: kb.disclaimer().to_string(),
        extracted_entities,
        summary_plain_english: standard.summary.clone(),
        glossary,
        what_this_does_not_mean: standard.key_points.clone(),
        next_steps: vec![NextStep {
            title: "Consult a Genetic Counselor".to_string(),
            rationale: standard.recommendation.clone().unwrap_or_else(|| {
                "A genetic counselor can explain what this means for you".to_string()
            }),
            who_to_talk_to: "Certified Genetic Counselor".to_string(),
            urgency: Urgency::Routine,
        }],
        questions_to_ask: standard.questions_to_ask.clone(),
        sources: vec![
            Source::linked("ClinVar Database", CLINVAR_URL, "Check for updated variant classifications"),
            Source::linked("Find a Genetic Counselor", NSGC_URL, "Professional guidance on genetic results"),
        ],
        refusals: Vec::new(),
    })
}

fn panel_result(kb: &KnowledgeBase, m: &PrebuiltMatch) -> TranslationResult {
    let gene_list = m.detected_genes.join(", ");
    let extracted_entities = m
        .detected_genes
        .iter()
        .map(|g| {
            ExtractedEntity::new(EntityType::Gene, g.clone(), Confidence::Medium)
                .with_notes("Listed as tested; no finding reported for this gene")
        })
        .collect();

    TranslationResult {
        disclaimer: kb.disclaimer().to_string(),
        extracted_entities,
        summary_plain_english: format!(
            "Your report lists the genes that were tested ({}). A list of tested genes is not a finding: \
             it only describes what the laboratory looked at. No variant classification was found in the text. \
             Look for a section that names a specific variant together with a classification such as \
             pathogenic, likely pathogenic, or uncertain significance before drawing any conclusion.",
            gene_list
        ),
        glossary: vec![GlossaryEntry::new(
            "Gene panel",
            "A test that looks at a set of genes at the same time",
            "Being on the panel only means a gene was examined, not that a variant was found in it",
        )],
        what_this_does_not_mean: vec![
            "A tested-gene list is not a finding".to_string(),
            "It does not mean you have a variant in any listed gene".to_string(),
            "It does not mean you have or will develop any listed condition".to_string(),
        ],
        next_steps: vec![NextStep {
            title: "Find the Results Section".to_string(),
            rationale: "The report should state whether any variant was found and how it is classified"
                .to_string(),
            who_to_talk_to: "Ordering clinician or Certified Genetic Counselor".to_string(),
            urgency: Urgency::Informational,
        }],
        questions_to_ask: vec![
            "Were any variants found in the genes that were tested?".to_string(),
            "If a variant was found, how is it classified?".to_string(),
        ],
        sources: vec![Source::linked(
            "Find a Genetic Counselor",
            NSGC_URL,
            "Professional help reading a full report",
        )],
        refusals: Vec::new(),
    }
}
