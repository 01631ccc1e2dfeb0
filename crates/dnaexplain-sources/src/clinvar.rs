//! ClinVar variant lookup.
//!
//! A free-form query (rsID, HGVS, variation id, or gene symbol) is turned into
//! an E-utilities search term; the first hit is summarised and normalised into
//! a fixed significance / review-status vocabulary with a plain-language guide.
//! Lookups never fail outward: transport errors become `found: false`.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument, warn};

use dnaexplain_common::cache::CacheStore;

use crate::error::SourceError;
use crate::ncbi::{summary_records, NcbiClient};

pub const CACHE_TTL: Duration = Duration::from_secs(5 * 60);
const CLINVAR_BASE_URL: &str = "https://www.ncbi.nlm.nih.gov/clinvar";

// ── Query type ───────────────────────────────────────────────────────────────

static RSID_QUERY: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)^rs\d+$"));
static VARIATION_ID_QUERY: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)^(VCV)?\d+$"));
static HGVS_QUERY: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)^(NM_|NC_|NP_|NG_)"));
static GENE_QUERY: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)^[A-Z][A-Z0-9]{1,10}$"));
static VCV_PREFIX: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)^VCV0*"));

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    Rsid,
    VariationId,
    Hgvs,
    Gene,
    Unknown,
}

pub fn detect_query_type(query: &str) -> QueryType {
    let q = query.trim();
    if RSID_QUERY.is_match(q) {
        QueryType::Rsid
    } else if VARIATION_ID_QUERY.is_match(q) {
        QueryType::VariationId
    } else if HGVS_QUERY.is_match(q) {
        QueryType::Hgvs
    } else if GENE_QUERY.is_match(q) {
        QueryType::Gene
    } else {
        QueryType::Unknown
    }
}

/// E-utilities search term for a query of the given type.
pub fn search_term(query: &str, kind: QueryType) -> String {
    let q = query.trim();
    match kind {
        QueryType::Rsid => format!("{q}[Variant ID]"),
        QueryType::VariationId => {
            let id = VCV_PREFIX.replace(q, "");
            let id = if id.is_empty() { "0" } else { id.as_ref() };
            format!("{id}[Variation ID]")
        }
        QueryType::Hgvs => format!("\"{}\"[Variant name]", q.replace('"', "")),
        QueryType::Gene => format!("{q}[Gene Name]"),
        QueryType::Unknown => q.to_string(),
    }
}

// ── Normalised vocabulary ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClinicalSignificance {
    #[serde(rename = "Pathogenic")]
    Pathogenic,
    #[serde(rename = "Likely pathogenic")]
    LikelyPathogenic,
    #[serde(rename = "Uncertain significance")]
    UncertainSignificance,
    #[serde(rename = "Likely benign")]
    LikelyBenign,
    #[serde(rename = "Benign")]
    Benign,
    #[serde(rename = "Conflicting interpretations")]
    Conflicting,
    #[serde(rename = "Not provided")]
    NotProvided,
    #[serde(rename = "Other")]
    Other,
}

impl ClinicalSignificance {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pathogenic            => "Pathogenic",
            Self::LikelyPathogenic      => "Likely pathogenic",
            Self::UncertainSignificance => "Uncertain significance",
            Self::LikelyBenign          => "Likely benign",
            Self::Benign                => "Benign",
            Self::Conflicting           => "Conflicting interpretations",
            Self::NotProvided           => "Not provided",
            Self::Other                 => "Other",
        }
    }

    pub fn normalize(raw: Option<&str>) -> Self {
        let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else { return Self::NotProvided };
        let lower = raw.to_lowercase();
        let likely = lower.contains("likely");

        if lower.contains("conflicting") {
            Self::Conflicting
        } else if lower.contains("pathogenic") && !likely {
            Self::Pathogenic
        } else if lower.contains("likely pathogenic") {
            Self::LikelyPathogenic
        } else if lower.contains("uncertain") || lower.contains("vus") {
            Self::UncertainSignificance
        } else if lower.contains("likely benign") {
            Self::LikelyBenign
        } else if lower.contains("benign") && !likely {
            Self::Benign
        } else {
            Self::Other
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewStatus {
    #[serde(rename = "practice guideline")]
    PracticeGuideline,
    #[serde(rename = "reviewed by expert panel")]
    ExpertPanel,
    #[serde(rename = "criteria provided, multiple submitters, no conflicts")]
    MultipleSubmitters,
    #[serde(rename = "criteria provided, conflicting interpretations")]
    ConflictingInterpretations,
    #[serde(rename = "criteria provided, single submitter")]
    SingleSubmitter,
    #[serde(rename = "no assertion for the individual variant")]
    NoAssertionForVariant,
    #[serde(rename = "no assertion criteria provided")]
    NoAssertionCriteria,
    #[serde(rename = "no assertion provided")]
    NoAssertion,
}

impl ReviewStatus {
    pub fn normalize(raw: Option<&str>) -> Self {
        let Some(raw) = raw else { return Self::NoAssertion };
        let lower = raw.to_lowercase();
        if lower.contains("practice guideline") {
            Self::PracticeGuideline
        } else if lower.contains("expert panel") {
            Self::ExpertPanel
        } else if lower.contains("multiple submitters") && lower.contains("no conflicts") {
            Self::MultipleSubmitters
        } else if lower.contains("conflicting") {
            Self::ConflictingInterpretations
        } else if lower.contains("single submitter") {
            Self::SingleSubmitter
        } else if lower.contains("individual variant") {
            Self::NoAssertionForVariant
        } else if lower.contains("no assertion criteria") {
            Self::NoAssertionCriteria
        } else {
            Self::NoAssertion
        }
    }
}

// ── Response ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinvarVariant {
    pub variation_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gene_symbol: Option<String>,
    pub clinical_significance: ClinicalSignificance,
    pub review_status: ReviewStatus,
    pub conditions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_evaluated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submissions_count: Option<usize>,
    pub source_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinvarResponse {
    pub query: String,
    pub found: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<ClinvarVariant>,
    pub interpretation_guide: String,
    pub disclaimer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Newer esummary records carry `germline_classification`; older ones
/// `clinical_significance`.
fn classification_block(record: &Value) -> &Value {
    if record["germline_classification"].is_object() {
        &record["germline_classification"]
    } else {
        &record["clinical_significance"]
    }
}

pub fn summary_to_variant(uid: &str, record: &Value) -> ClinvarVariant {
    let significance = classification_block(record);
    let conditions = record["trait_set"]
        .as_array()
        .map(|traits| {
            traits.iter()
                .filter_map(|t| t["trait_name"].as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default();

    ClinvarVariant {
        variation_id: uid.to_string(),
        name: record["title"]
            .as_str()
            .filter(|t| !t.is_empty())
            .unwrap_or("Unknown variant")
            .to_string(),
        gene_symbol: record["genes"][0]["symbol"].as_str().map(String::from),
        clinical_significance: ClinicalSignificance::normalize(significance["description"].as_str()),
        review_status: ReviewStatus::normalize(significance["review_status"].as_str()),
        conditions,
        last_evaluated: significance["last_evaluated"]
            .as_str()
            .filter(|s| !s.is_empty())
            .map(String::from),
        submissions_count: record["supporting_submissions"]["scv"].as_array().map(Vec::len),
        source_url: format!("{CLINVAR_BASE_URL}/variation/{uid}/"),
    }
}

pub const NOT_FOUND_GUIDE: &str = "No variant found matching your query. This could mean:
• The variant hasn't been submitted to ClinVar
• The query format wasn't recognized
• The variant exists under a different identifier

Try searching with a different identifier format (rsID, HGVS notation, or ClinVar variation ID).";

pub fn interpretation_guide(variant: Option<&ClinvarVariant>) -> String {
    let Some(variant) = variant else { return NOT_FOUND_GUIDE.to_string() };
    let guide = match variant.clinical_significance {
        ClinicalSignificance::Pathogenic => "This variant is classified as PATHOGENIC, meaning there is strong evidence it is associated with disease. However:
• This does NOT mean you will definitely develop the condition
• Risk depends on penetrance (not all carriers develop symptoms)
• Family history and other factors affect individual risk
• Discuss with a genetic counselor for personalized interpretation",
        ClinicalSignificance::LikelyPathogenic => "This variant is classified as LIKELY PATHOGENIC (>90% certainty of disease association). This is treated clinically similar to pathogenic variants, but:
• Classification may change as more evidence emerges
• Individual risk varies based on many factors
• Consult a genetic counselor for guidance",
        ClinicalSignificance::UncertainSignificance => "This variant is classified as VUS (Variant of Uncertain Significance). This means:
• NOT enough evidence to determine if it's harmful or harmless
• VUS is NOT a diagnosis
• Most VUS are eventually reclassified as benign
• Do NOT make medical decisions based on a VUS alone
• Consider periodic re-evaluation as classifications update",
        ClinicalSignificance::LikelyBenign => "This variant is classified as LIKELY BENIGN (>90% certainty it's harmless). Generally, no clinical action is needed.",
        ClinicalSignificance::Benign => "This variant is classified as BENIGN. It is not associated with disease and is normal human variation.",
        ClinicalSignificance::Conflicting => "Different laboratories have submitted conflicting interpretations for this variant. This means:
• The evidence is not yet conclusive
• Treat with caution and do not make decisions based solely on this
• A genetic counselor can help interpret in your specific context",
        other => {
            return format!(
                "This variant has a classification of \"{}\". Discuss with a healthcare provider for interpretation.",
                other.label()
            )
        }
    };
    guide.to_string()
}

// ── Client ───────────────────────────────────────────────────────────────────

pub struct ClinvarClient {
    ncbi: Arc<NcbiClient>,
    cache: Arc<dyn CacheStore<ClinvarResponse>>,
    disclaimer: String,
}

impl ClinvarClient {
    pub fn new(
        ncbi: Arc<NcbiClient>,
        cache: Arc<dyn CacheStore<ClinvarResponse>>,
        disclaimer: impl Into<String>,
    ) -> Self {
        Self { ncbi, cache, disclaimer: disclaimer.into() }
    }

    pub fn cache_key(query: &str) -> String {
        format!("clinvar:{}", query.trim().to_lowercase())
    }

    #[instrument(skip(self))]
    pub async fn lookup(&self, query: &str) -> ClinvarResponse {
        let query = query.trim();
        let key = Self::cache_key(query);
        if let Some(hit) = self.cache.get(&key) {
            return hit;
        }

        match self.fetch(query).await {
            Ok(response) => {
                info!(found = response.found, "ClinVar lookup complete");
                self.cache.set(&key, response.clone(), CACHE_TTL);
                response
            }
            Err(e) => {
                warn!(error = %e, "ClinVar lookup failed");
                self.not_found(query, Some(e.to_string()))
            }
        }
    }

    async fn fetch(&self, query: &str) -> Result<ClinvarResponse, SourceError> {
        let term = search_term(query, detect_query_type(query));
        let ids = self.ncbi.esearch("clinvar", &term, 5, None).await?;
        let Some(first) = ids.into_iter().next() else {
            return Ok(self.not_found(query, None));
        };

        let result = self.ncbi.esummary("clinvar", &[first]).await?;
        let records = summary_records(&result);
        let Some((uid, record)) = records.first() else {
            return Ok(self.not_found(
                query,
                Some("Found variant ID but could not retrieve details".to_string()),
            ));
        };

        let variant = summary_to_variant(uid, record);
        Ok(ClinvarResponse {
            query: query.to_string(),
            found: true,
            interpretation_guide: interpretation_guide(Some(&variant)),
            variant: Some(variant),
            disclaimer: self.disclaimer.clone(),
            error: None,
        })
    }

    fn not_found(&self, query: &str, error: Option<String>) -> ClinvarResponse {
        ClinvarResponse {
            query: query.to_string(),
            found: false,
            variant: None,
            interpretation_guide: interpretation_guide(None),
            disclaimer: self.disclaimer.clone(),
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_detect_query_type() {
        assert_eq!(detect_query_type("rs80357906"), QueryType::Rsid);
        assert_eq!(detect_query_type(" RS1801133 "), QueryType::Rsid);
        assert_eq!(detect_query_type("VCV000017661"), QueryType::VariationId);
        assert_eq!(detect_query_type("17661"), QueryType::VariationId);
        assert_eq!(detect_query_type("NM_007294.4:c.68_69del"), QueryType::Hgvs);
        assert_eq!(detect_query_type("BRCA1"), QueryType::Gene);
        assert_eq!(detect_query_type("BRCA1 c.68_69del"), QueryType::Unknown);
    }

    #[test]
    fn test_search_terms() {
        assert_eq!(search_term("rs80357906", QueryType::Rsid), "rs80357906[Variant ID]");
        assert_eq!(search_term("VCV000017661", QueryType::VariationId), "17661[Variation ID]");
        assert_eq!(
            search_term("NM_007294.4:c.68_69del", QueryType::Hgvs),
            "\"NM_007294.4:c.68_69del\"[Variant name]"
        );
        assert_eq!(search_term("CFTR", QueryType::Gene), "CFTR[Gene Name]");
    }

    #[test]
    fn test_normalize_significance() {
        use ClinicalSignificance::*;
        assert_eq!(ClinicalSignificance::normalize(Some("Pathogenic")), Pathogenic);
        assert_eq!(ClinicalSignificance::normalize(Some("Likely pathogenic")), LikelyPathogenic);
        assert_eq!(ClinicalSignificance::normalize(Some("Pathogenic/Likely pathogenic")), LikelyPathogenic);
        assert_eq!(ClinicalSignificance::normalize(Some("Uncertain significance")), UncertainSignificance);
        assert_eq!(ClinicalSignificance::normalize(Some("Likely benign")), LikelyBenign);
        assert_eq!(ClinicalSignificance::normalize(Some("Benign")), Benign);
        assert_eq!(
            ClinicalSignificance::normalize(Some("Conflicting classifications of pathogenicity")),
            Conflicting
        );
        assert_eq!(ClinicalSignificance::normalize(None), NotProvided);
        assert_eq!(ClinicalSignificance::normalize(Some("drug response")), Other);
    }

    #[test]
    fn test_normalize_review_status() {
        assert_eq!(
            ReviewStatus::normalize(Some("criteria provided, multiple submitters, no conflicts")),
            ReviewStatus::MultipleSubmitters
        );
        assert_eq!(ReviewStatus::normalize(Some("reviewed by expert panel")), ReviewStatus::ExpertPanel);
        assert_eq!(ReviewStatus::normalize(None), ReviewStatus::NoAssertion);
        let json = serde_json::to_value(ReviewStatus::SingleSubmitter).unwrap();
        assert_eq!(json, "criteria provided, single submitter");
    }

    #[test]
    fn test_summary_to_variant() {
        let record = json!({
            "title": "NM_007294.4(BRCA1):c.68_69del (p.Glu23fs)",
            "genes": [{ "symbol": "BRCA1" }],
            "germline_classification": {
                "description": "Pathogenic",
                "review_status": "reviewed by expert panel",
                "last_evaluated": "2016/09/08 00:00"
            },
            "trait_set": [{ "trait_name": "Hereditary breast ovarian cancer syndrome" }],
            "supporting_submissions": { "scv": ["SCV1", "SCV2"] }
        });
        let v = summary_to_variant("17661", &record);
        assert_eq!(v.gene_symbol.as_deref(), Some("BRCA1"));
        assert_eq!(v.clinical_significance, ClinicalSignificance::Pathogenic);
        assert_eq!(v.review_status, ReviewStatus::ExpertPanel);
        assert_eq!(v.submissions_count, Some(2));
        assert_eq!(v.source_url, "https://www.ncbi.nlm.nih.gov/clinvar/variation/17661/");
        assert!(interpretation_guide(Some(&v)).starts_with("This variant is classified as PATHOGENIC"));
    }

    #[test]
    fn test_missing_fields_default() {
        let v = summary_to_variant("1", &json!({}));
        assert_eq!(v.name, "Unknown variant");
        assert_eq!(v.clinical_significance, ClinicalSignificance::NotProvided);
        assert!(v.conditions.is_empty());
        assert!(interpretation_guide(Some(&v)).contains("\"Not provided\""));
    }

    #[test]
    fn test_cache_key_is_normalised() {
        assert_eq!(ClinvarClient::cache_key("  RS80357906 "), "clinvar:rs80357906");
    }
}
