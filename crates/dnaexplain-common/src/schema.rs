//! Request and response shapes shared by both translation tiers and the HTTP surface.
//! `TranslationResult` is the single output contract: every field is required,
//! arrays may be empty.

use serde::{Deserialize, Serialize};

pub const MIN_REPORT_CHARS: usize = 10;
pub const MAX_REPORT_CHARS: usize = 50_000;
pub const MAX_CLINVAR_QUERY_CHARS: usize = 500;

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Gene,
    Rsid,
    Hgvs,
    VariantClassification,
    Zygosity,
    Condition,
    Unknown,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Gene                  => "gene",
            EntityType::Rsid                  => "rsid",
            EntityType::Hgvs                  => "hgvs",
            EntityType::VariantClassification => "variant_classification",
            EntityType::Zygosity              => "zygosity",
            EntityType::Condition             => "condition",
            EntityType::Unknown               => "unknown",
        }
    }
}

/// Ordered so that `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Low    => "low",
            Confidence::Medium => "medium",
            Confidence::High   => "high",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedEntity {
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub value: String,
    pub confidence: Confidence,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ExtractedEntity {
    pub fn new(entity_type: EntityType, value: impl Into<String>, confidence: Confidence) -> Self {
        Self { entity_type, value: value.into(), confidence, notes: None }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Explanation parts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlossaryEntry {
    pub term: String,
    pub meaning: String,
    pub why_it_matters: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common_misreadings: Option<Vec<String>>,
}

impl GlossaryEntry {
    pub fn new(
        term: impl Into<String>,
        meaning: impl Into<String>,
        why_it_matters: impl Into<String>,
    ) -> Self {
        Self {
            term: term.into(),
            meaning: meaning.into(),
            why_it_matters: why_it_matters.into(),
            common_misreadings: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    /// Normal follow-up timeline
    Routine,
    /// Within a few weeks
    Soon,
    /// Should prioritize
    Important,
    /// No urgency, just FYI
    Informational,
}

impl Urgency {
    /// Lenient parse used for hand-authored templates; unknown values read as routine.
    pub fn from_label(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "soon"          => Urgency::Soon,
            "important"     => Urgency::Important,
            "informational" => Urgency::Informational,
            _               => Urgency::Routine,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextStep {
    pub title: String,
    pub rationale: String,
    pub who_to_talk_to: String,
    pub urgency: Urgency,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub why_relevant: String,
}

impl Source {
    pub fn linked(label: &str, url: &str, why_relevant: &str) -> Self {
        Self {
            label: label.to_string(),
            url: Some(url.to_string()),
            why_relevant: why_relevant.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Refusal {
    pub user_intent: String,
    pub refusal_text: String,
    pub safe_alternative: String,
}

// ---------------------------------------------------------------------------
// Output contract
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationResult {
    pub disclaimer: String,
    pub extracted_entities: Vec<ExtractedEntity>,
    pub summary_plain_english: String,
    pub glossary: Vec<GlossaryEntry>,
    pub what_this_does_not_mean: Vec<String>,
    pub next_steps: Vec<NextStep>,
    pub questions_to_ask: Vec<String>,
    pub sources: Vec<Source>,
    pub refusals: Vec<Refusal>,
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslateMode {
    #[default]
    Auto,
    PrebuiltOnly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateRequest {
    pub text: String,
    #[serde(default)]
    pub mode: Option<TranslateMode>,
}

impl TranslateRequest {
    /// Returns every failed rule so the caller can fix the request in one round trip.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        let chars = self.text.chars().count();
        if chars < MIN_REPORT_CHARS {
            errors.push(format!(
                "Report text must be at least {MIN_REPORT_CHARS} characters (too short to analyze)"
            ));
        }
        if chars > MAX_REPORT_CHARS {
            errors.push("Report text must not exceed 50,000 characters".to_string());
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClinvarRequest {
    pub query: String,
}

impl ClinvarRequest {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let chars = self.query.trim().chars().count();
        if chars == 0 {
            return Err(vec!["Query is required".to_string()]);
        }
        if chars > MAX_CLINVAR_QUERY_CHARS {
            return Err(vec!["Query must not exceed 500 characters".to_string()]);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiteratureRequest {
    pub genes: Vec<String>,
    #[serde(default)]
    pub topics: Option<Vec<String>>,
    #[serde(default)]
    pub max_results: Option<u32>,
}

impl LiteratureRequest {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if self.genes.is_empty() || self.genes.len() > 3 {
            errors.push("Provide between 1 and 3 genes".to_string());
        }
        if self.genes.iter().any(|g| !(2..=20).contains(&g.trim().chars().count())) {
            errors.push("Each gene must be 2-20 characters".to_string());
        }
        if let Some(topics) = &self.topics {
            if topics.len() > 3 {
                errors.push("Provide at most 3 topics".to_string());
            }
            if topics.iter().any(|t| !(2..=80).contains(&t.trim().chars().count())) {
                errors.push("Each topic must be 2-80 characters".to_string());
            }
        }
        if let Some(n) = self.max_results {
            if !(1..=10).contains(&n) {
                errors.push("max_results must be between 1 and 10".to_string());
            }
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into(), details: None }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_entity_serializes_type_field() {
        let e = ExtractedEntity::new(EntityType::VariantClassification, "VUS", Confidence::High);
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["type"], "variant_classification");
        assert_eq!(json["confidence"], "high");
        assert!(json.get("notes").is_none());
    }

    #[test]
    fn test_confidence_ordering() {
        assert!(Confidence::Low < Confidence::Medium);
        assert!(Confidence::Medium < Confidence::High);
    }

    #[test]
    fn test_translate_request_bounds() {
        let short = TranslateRequest { text: "BRCA1".into(), mode: None };
        assert!(short.validate().is_err());

        let ok = TranslateRequest { text: "BRCA1 pathogenic variant".into(), mode: None };
        assert!(ok.validate().is_ok());

        let long = TranslateRequest { text: "A".repeat(MAX_REPORT_CHARS + 1), mode: None };
        let errs = long.validate().unwrap_err();
        assert_eq!(errs, vec!["Report text must not exceed 50,000 characters".to_string()]);
    }

    #[test]
    fn test_translate_mode_parses_snake_case() {
        let req: TranslateRequest =
            serde_json::from_str(r#"{"text":"BRCA1 pathogenic","mode":"prebuilt_only"}"#).unwrap();
        assert_eq!(req.mode, Some(TranslateMode::PrebuiltOnly));
    }

    #[test]
    fn test_literature_request_limits() {
        let req = LiteratureRequest {
            genes: vec!["BRCA1".into(), "BRCA2".into(), "TP53".into(), "ATM".into()],
            topics: None,
            max_results: Some(20),
        };
        let errs = req.validate().unwrap_err();
        assert_eq!(errs.len(), 2);
    }

    #[test]
    fn test_urgency_from_label_is_lenient() {
        assert_eq!(Urgency::from_label("Important"), Urgency::Important);
        assert_eq!(Urgency::from_label("whenever"), Urgency::Routine);
    }
}
