//! Structural validation of a decoded record against the `TranslationResult` contract.
//!
//! Validation is total: it never panics and never raises past the caller. A
//! violation is returned as a value so the orchestrator can route it to the
//! deterministic fallback.

use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::schema::TranslationResult;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractViolation {
    #[error("record is not an object")]
    NotAnObject,
    #[error("shape mismatch: {0}")]
    Shape(String),
    #[error("sources[{index}].url is not a valid URL: {url}")]
    InvalidUrl { index: usize, url: String },
}

/// Check a decoded record and, when it conforms, return the typed result.
///
/// Required fields, array element shapes, and the enumerated value sets for
/// entity `type`, `confidence`, and next-step `urgency` are enforced through the
/// typed schema. Source URLs, when present, must be absolute URLs.
pub fn validate_translation(value: Value) -> Result<TranslationResult, ContractViolation> {
    if !value.is_object() {
        return Err(ContractViolation::NotAnObject);
    }

    let result: TranslationResult = serde_json::from_value(value)
        .map_err(|e| ContractViolation::Shape(e.to_string()))?;

    for (index, source) in result.sources.iter().enumerate() {
        if let Some(url) = &source.url {
            if Url::parse(url).is_err() {
                return Err(ContractViolation::InvalidUrl { index, url: url.clone() });
            }
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_record() -> Value {
        json!({
            "disclaimer": "Educational only.",
            "extracted_entities": [
                { "type": "gene", "value": "BRCA2", "confidence": "high" }
            ],
            "summary_plain_english": "A variant was reported.",
            "glossary": [
                { "term": "VUS", "meaning": "Uncertain", "why_it_matters": "Often reclassified" }
            ],
            "what_this_does_not_mean": ["It is not a diagnosis"],
            "next_steps": [
                {
                    "title": "Talk to a counselor",
                    "rationale": "Personal interpretation",
                    "who_to_talk_to": "Genetic counselor",
                    "urgency": "routine"
                }
            ],
            "questions_to_ask": [],
            "sources": [
                { "label": "ClinVar", "url": "https://www.ncbi.nlm.nih.gov/clinvar/", "why_relevant": "Lookup" }
            ],
            "refusals": []
        })
    }

    #[test]
    fn test_valid_record_passes() {
        let result = validate_translation(valid_record()).unwrap();
        assert_eq!(result.extracted_entities[0].value, "BRCA2");
    }

    #[test]
    fn test_missing_required_field_is_violation() {
        let mut record = valid_record();
        record.as_object_mut().unwrap().remove("refusals");
        let err = validate_translation(record).unwrap_err();
        assert!(matches!(err, ContractViolation::Shape(ref m) if m.contains("refusals")));
    }

    #[test]
    fn test_wrong_enum_value_is_violation() {
        let mut record = valid_record();
        record["next_steps"][0]["urgency"] = json!("urgent");
        assert!(matches!(validate_translation(record), Err(ContractViolation::Shape(_))));

        let mut record = valid_record();
        record["extracted_entities"][0]["type"] = json!("protein");
        assert!(validate_translation(record).is_err());
    }

    #[test]
    fn test_relative_source_url_is_violation() {
        let mut record = valid_record();
        record["sources"][0]["url"] = json!("/kb/templates/questions");
        assert_eq!(
            validate_translation(record),
            Err(ContractViolation::InvalidUrl { index: 0, url: "/kb/templates/questions".into() })
        );
    }

    #[test]
    fn test_non_object_is_violation() {
        assert_eq!(validate_translation(json!([1, 2, 3])), Err(ContractViolation::NotAnObject));
    }
}
