//! Fixed responses that need no backend: the deterministic fallback used when
//! generative output fails the contract, and the prebuilt-only notice.

use dnaexplain_common::schema::{
    GlossaryEntry, NextStep, Source, TranslationResult, Urgency,
};
use dnaexplain_ner::Analysis;

const CLINVAR_URL: &str = "https://www.ncbi.nlm.nih.gov/clinvar/";
const NSGC_URL: &str = "https://www.nsgc.org/findageneticcounselor";

pub const FALLBACK_SUMMARY: &str = "We were unable to fully analyze this report automatically. \
Please review the extracted information below and consult with a genetic counselor for a complete interpretation.";

/// Conservative answer built only from literal identifiers in the input.
/// Never carries refusals.
pub fn fallback_response(disclaimer: &str, analysis: &Analysis) -> TranslationResult {
    TranslationResult {
        disclaimer: disclaimer.to_string(),
        extracted_entities: analysis.identifier_entities(),
        summary_plain_english: FALLBACK_SUMMARY.to_string(),
        glossary: vec![GlossaryEntry::new(
            "Genetic Report",
            "A document containing information about genetic variants found in your DNA sample.",
            "Understanding your genetic report can help you and your healthcare providers make informed decisions about your health.",
        )],
        what_this_does_not_mean: vec![
            "This automated analysis is not a substitute for professional interpretation".to_string(),
            "The presence of variants does not necessarily indicate disease".to_string(),
        ],
        next_steps: vec![NextStep {
            title: "Consult a Genetic Counselor".to_string(),
            rationale: "A certified genetic counselor can provide personalized interpretation of your results".to_string(),
            who_to_talk_to: "Certified Genetic Counselor (CGC)".to_string(),
            urgency: Urgency::Routine,
        }],
        questions_to_ask: vec![
            "What do these specific results mean for my health?".to_string(),
            "Should I have any additional testing?".to_string(),
            "What are the implications for my family members?".to_string(),
        ],
        sources: vec![
            Source::linked(
                "National Society of Genetic Counselors",
                NSGC_URL,
                "Find a certified genetic counselor in your area",
            ),
            Source::linked("ClinVar Database", CLINVAR_URL, "Look up variant classifications"),
        ],
        refusals: Vec::new(),
    }
}

/// Returned instead of calling a backend when prebuilt-only mode is in force
/// and no template matched.
pub fn prebuilt_only_response(disclaimer: &str) -> TranslationResult {
    TranslationResult {
        disclaimer: disclaimer.to_string(),
        extracted_entities: Vec::new(),
        summary_plain_english: concat!(
            "Prebuilt-only mode is enabled, so this service will not call an external AI model. ",
            "No prebuilt template matched the text you provided.\n\n",
            "Try one of these:\n",
            "- Paste only the \"Findings\" or \"Results\" section\n",
            "- Include the gene name (e.g., BRCA1) and a classification (Pathogenic / VUS / Benign)\n",
            "- Include a variant identifier (rsID or HGVS), if present\n\n",
            "For a full AI translation, disable prebuilt-only mode.",
        )
        .to_string(),
        glossary: Vec::new(),
        what_this_does_not_mean: vec![
            "This is NOT a medical interpretation".to_string(),
            "This does NOT mean your results are normal or abnormal".to_string(),
            "This does NOT replace a clinician or genetic counselor".to_string(),
        ],
        next_steps: vec![
            NextStep {
                title: "Focus the input".to_string(),
                rationale: "Shorter, genetics-only text is more likely to match a prebuilt template.".to_string(),
                who_to_talk_to: "You (editing the pasted text)".to_string(),
                urgency: Urgency::Informational,
            },
            NextStep {
                title: "Use ClinVar Lookup (if you have an rsID/HGVS)".to_string(),
                rationale: "If your report includes a variant identifier, ClinVar can provide public classification context.".to_string(),
                who_to_talk_to: "ClinVar tool and a healthcare professional for interpretation".to_string(),
                urgency: Urgency::Routine,
            },
        ],
        questions_to_ask: vec![
            "Does my report list a specific variant identifier (rsID or HGVS)?".to_string(),
            "What is the reported classification (Pathogenic, VUS, Benign)?".to_string(),
            "Should this result be confirmed with clinical testing?".to_string(),
        ],
        sources: vec![
            Source::linked(
                "ClinVar Database",
                CLINVAR_URL,
                "Public database for variant classifications and supporting evidence",
            ),
            Source::linked(
                "National Society of Genetic Counselors",
                NSGC_URL,
                "Find a genetics professional to prepare questions with",
            ),
        ],
        refusals: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dnaexplain_common::schema::EntityType;
    use dnaexplain_common::validate_translation;
    use dnaexplain_ner::TextClassifier;

    #[test]
    fn test_fallback_extracts_rsids_only() {
        let analysis = TextClassifier::new().analyze("Variant rs80357906 and RS1801133 reported in BRCA1");
        let result = fallback_response("disclaimer", &analysis);
        let values: Vec<&str> = result
            .extracted_entities
            .iter()
            .filter(|e| e.entity_type == EntityType::Rsid)
            .map(|e| e.value.as_str())
            .collect();
        assert_eq!(values, vec!["rs80357906", "rs1801133"]);
        assert!(result.extracted_entities.iter().all(|e| e.entity_type != EntityType::Gene));
        assert!(result.refusals.is_empty());
    }

    #[test]
    fn test_fixed_responses_satisfy_contract() {
        let analysis = TextClassifier::new().analyze("nothing recognisable here");
        for result in [fallback_response("d", &analysis), prebuilt_only_response("d")] {
            let value = serde_json::to_value(&result).unwrap();
            assert_eq!(validate_translation(value).unwrap(), result);
        }
    }
}
