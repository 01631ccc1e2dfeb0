//! PubMed literature suggestions for selected genes and topics.
//!
//! Only the caller's gene/topic keywords are sent to NCBI, never report text.
//! Queries start conservative (reviews and guidelines, recent, genetics
//! context) and are relaxed step by step until something is found.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument};

use dnaexplain_common::cache::CacheStore;
use dnaexplain_common::schema::LiteratureRequest;

use crate::error::SourceError;
use crate::ncbi::{summary_records, NcbiClient};

pub const CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);
pub const DEFAULT_MAX_RESULTS: u32 = 5;

const GENETICS_CONTEXT: &str = "(genetic[tiab] OR hereditary[tiab] OR variant[tiab] OR mutation[tiab])";
const PUBLICATION_TYPE: &str = "(review[pt] OR guideline[pt] OR meta-analysis[pt])";
const REVIEW_ONLY: &str = "(review[pt] OR meta-analysis[pt])";
const DATE_FILTER: &str = "(\"2016\"[pdat] : \"3000\"[pdat])";
const WIDER_DATE_FILTER: &str = "(\"2010\"[pdat] : \"3000\"[pdat])";

static YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiteratureArticle {
    pub title: String,
    pub pmid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<String>,
    pub url: String,
    pub why_relevant: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiteratureResponse {
    pub query: String,
    pub articles: Vec<LiteratureArticle>,
    pub disclaimer: String,
}

/// Trimmed, non-empty search keywords.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTerms {
    pub genes: Vec<String>,
    pub topics: Vec<String>,
    pub max_results: u32,
}

impl From<&LiteratureRequest> for SearchTerms {
    fn from(req: &LiteratureRequest) -> Self {
        let clean = |items: &[String]| -> Vec<String> {
            items.iter().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect()
        };
        Self {
            genes: clean(&req.genes),
            topics: req.topics.as_deref().map(clean).unwrap_or_default(),
            max_results: req.max_results.unwrap_or(DEFAULT_MAX_RESULTS),
        }
    }
}

impl SearchTerms {
    /// Order-independent key: genes upper-cased, topics lower-cased, both sorted.
    pub fn cache_key(&self) -> String {
        let mut genes: Vec<String> = self.genes.iter().map(|g| g.to_uppercase()).collect();
        let mut topics: Vec<String> = self.topics.iter().map(|t| t.to_lowercase()).collect();
        genes.sort();
        topics.sort();
        format!("genes={}|topics={}|max={}", genes.join(","), topics.join(","), self.max_results)
    }

    fn gene_part(&self) -> String {
        let genes = self.genes.iter().map(|g| format!("{g}[tiab]")).collect::<Vec<_>>().join(" OR ");
        format!("({genes})")
    }

    fn topic_part(&self) -> Option<String> {
        if self.topics.is_empty() {
            return None;
        }
        let topics = self
            .topics
            .iter()
            .map(|t| format!("\"{}\"[tiab]", t.replace('"', "")))
            .collect::<Vec<_>>()
            .join(" OR ");
        Some(format!("({topics})"))
    }

    /// Strictest query first; each later entry drops or widens one filter.
    /// Duplicates are removed, keeping order.
    pub fn query_ladder(&self) -> Vec<String> {
        let genes = self.gene_part();
        let topics = self.topic_part();

        let mut strict = vec![genes.as_str()];
        if let Some(t) = &topics {
            strict.push(t.as_str());
        }
        strict.extend([GENETICS_CONTEXT, PUBLICATION_TYPE, DATE_FILTER]);

        let last = match &topics {
            Some(t) => vec![genes.as_str(), t.as_str(), WIDER_DATE_FILTER],
            None => vec![genes.as_str(), WIDER_DATE_FILTER],
        };

        let candidates = [
            strict,
            vec![genes.as_str(), GENETICS_CONTEXT, PUBLICATION_TYPE, DATE_FILTER],
            vec![genes.as_str(), PUBLICATION_TYPE, DATE_FILTER],
            vec![genes.as_str(), REVIEW_ONLY, WIDER_DATE_FILTER],
            last,
        ];

        let mut ladder: Vec<String> = Vec::with_capacity(candidates.len());
        for parts in candidates {
            let query = parts.join(" AND ");
            if !ladder.contains(&query) {
                ladder.push(query);
            }
        }
        ladder
    }
}

/// Explanation derived from the article title and the selected keywords only.
pub fn why_relevant(title: &str, genes: &[String], topics: &[String]) -> String {
    let title_lower = title.to_lowercase();
    let matched_genes: Vec<&str> = genes
        .iter()
        .filter(|g| {
            Regex::new(&format!(r"(?i)\b{}\b", regex::escape(g)))
                .map(|re| re.is_match(title))
                .unwrap_or(false)
        })
        .map(String::as_str)
        .collect();
    let matched_topics: Vec<&str> = topics
        .iter()
        .filter(|t| title_lower.contains(&t.to_lowercase()))
        .map(String::as_str)
        .collect();

    let mut parts = Vec::new();
    if !matched_genes.is_empty() {
        let plural = if matched_genes.len() > 1 { "s" } else { "" };
        parts.push(format!("Matches gene{plural}: {}", matched_genes.join(", ")));
    }
    if !matched_topics.is_empty() {
        let plural = if matched_topics.len() > 1 { "s" } else { "" };
        parts.push(format!("Matches topic{plural}: {}", matched_topics.join(", ")));
    }

    if parts.is_empty() {
        "Suggested review/guideline-style background reading related to your selected gene/topic keywords (PubMed).".to_string()
    } else {
        format!("{}. Suggested review/guideline-style background reading (PubMed).", parts.join(" · "))
    }
}

pub fn record_to_article(uid: &str, record: &Value, terms: &SearchTerms) -> Option<LiteratureArticle> {
    let title = record["title"].as_str().filter(|t| !t.is_empty())?.to_string();
    let pmid = record["uid"].as_str().unwrap_or(uid).to_string();
    let journal = record["fulljournalname"]
        .as_str()
        .or_else(|| record["source"].as_str())
        .filter(|j| !j.is_empty())
        .map(String::from);
    let year = record["pubdate"]
        .as_str()
        .and_then(|d| YEAR.find(d))
        .map(|m| m.as_str().to_string());
    let authors = record["authors"]
        .as_array()
        .map(|list| {
            list.iter()
                .filter_map(|a| a["name"].as_str())
                .collect::<Vec<_>>()
                .join(", ")
        })
        .filter(|s| !s.is_empty());

    let genes: Vec<String> = terms.genes.iter().map(|g| g.to_uppercase()).collect();
    let why_relevant = why_relevant(&title, &genes, &terms.topics);

    Some(LiteratureArticle {
        url: format!("https://pubmed.ncbi.nlm.nih.gov/{pmid}/"),
        title,
        pmid,
        journal,
        year,
        authors,
        why_relevant,
    })
}

fn disclaimer(broadened: bool) -> String {
    let mut text = String::from(
        "Suggested reading only. These links are provided for education and are not medical advice. \
         This search uses only the selected gene/topic keywords (not your full report text).",
    );
    if broadened {
        text.push_str(" Search was broadened to find results.");
    }
    text
}

pub struct LiteratureClient {
    ncbi: Arc<NcbiClient>,
    cache: Arc<dyn CacheStore<LiteratureResponse>>,
}

impl LiteratureClient {
    pub fn new(ncbi: Arc<NcbiClient>, cache: Arc<dyn CacheStore<LiteratureResponse>>) -> Self {
        Self { ncbi, cache }
    }

    #[instrument(skip(self, req), fields(genes = req.genes.len()))]
    pub async fn search(&self, req: &LiteratureRequest) -> Result<LiteratureResponse, SourceError> {
        let terms = SearchTerms::from(req);
        let key = terms.cache_key();
        if let Some(hit) = self.cache.get(&key) {
            debug!("Literature cache hit");
            return Ok(hit);
        }

        let ladder = terms.query_ladder();
        let mut used = 0;
        let mut pmids = Vec::new();
        for (i, query) in ladder.iter().enumerate() {
            used = i;
            pmids = self.ncbi.esearch("pubmed", query, terms.max_results, Some("relevance")).await?;
            if !pmids.is_empty() {
                break;
            }
        }

        let articles = if pmids.is_empty() {
            Vec::new()
        } else {
            let result = self.ncbi.esummary("pubmed", &pmids).await?;
            summary_records(&result)
                .into_iter()
                .filter_map(|(uid, record)| record_to_article(&uid, record, &terms))
                .collect()
        };

        info!(articles = articles.len(), step = used, "Literature search complete");
        let response = LiteratureResponse {
            query: ladder[used].clone(),
            articles,
            disclaimer: disclaimer(used > 0),
        };
        self.cache.set(&key, response.clone(), CACHE_TTL);
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn terms(genes: &[&str], topics: &[&str]) -> SearchTerms {
        SearchTerms {
            genes: genes.iter().map(|s| s.to_string()).collect(),
            topics: topics.iter().map(|s| s.to_string()).collect(),
            max_results: 5,
        }
    }

    #[test]
    fn test_strict_query_shape() {
        let ladder = terms(&["BRCA1", "BRCA2"], &["breast cancer"]).query_ladder();
        assert_eq!(
            ladder[0],
            "(BRCA1[tiab] OR BRCA2[tiab]) AND (\"breast cancer\"[tiab]) AND \
             (genetic[tiab] OR hereditary[tiab] OR variant[tiab] OR mutation[tiab]) AND \
             (review[pt] OR guideline[pt] OR meta-analysis[pt]) AND (\"2016\"[pdat] : \"3000\"[pdat])"
        );
        assert_eq!(ladder.len(), 5);
    }

    #[test]
    fn test_ladder_dedupes_without_topics() {
        let ladder = terms(&["APOE"], &[]).query_ladder();
        assert_eq!(ladder.len(), 4);
        assert_eq!(ladder.last().unwrap(), "(APOE[tiab]) AND (\"2010\"[pdat] : \"3000\"[pdat])");
    }

    #[test]
    fn test_cache_key_is_order_independent() {
        let a = terms(&["brca2", "BRCA1"], &["Screening", "risk"]);
        let b = terms(&["BRCA1", "BRCA2"], &["risk", "screening"]);
        assert_eq!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn test_request_is_trimmed() {
        let req = LiteratureRequest {
            genes: vec![" MTHFR ".into()],
            topics: Some(vec!["  folate ".into()]),
            max_results: None,
        };
        assert_eq!(SearchTerms::from(&req), terms(&["MTHFR"], &["folate"]));
    }

    #[test]
    fn test_why_relevant() {
        let genes = vec!["BRCA1".to_string(), "TP53".to_string()];
        let topics = vec!["screening".to_string()];
        assert_eq!(
            why_relevant("BRCA1 carriers and screening outcomes", &genes, &topics),
            "Matches gene: BRCA1 · Matches topic: screening. Suggested review/guideline-style background reading (PubMed)."
        );
        assert!(why_relevant("Unrelated title", &genes, &topics).starts_with("Suggested review"));
        // Whole-word gene match only
        assert!(why_relevant("BRCA10 study", &genes, &[]).starts_with("Suggested review"));
    }

    #[test]
    fn test_record_to_article() {
        let record = json!({
            "uid": "12345",
            "title": "Management of BRCA1 carriers",
            "fulljournalname": "Genetics in Medicine",
            "pubdate": "2021 Mar",
            "authors": [{ "name": "Smith J" }, { "name": "Doe A" }]
        });
        let article = record_to_article("12345", &record, &terms(&["brca1"], &[])).unwrap();
        assert_eq!(article.year.as_deref(), Some("2021"));
        assert_eq!(article.authors.as_deref(), Some("Smith J, Doe A"));
        assert_eq!(article.url, "https://pubmed.ncbi.nlm.nih.gov/12345/");
        assert!(article.why_relevant.starts_with("Matches gene: BRCA1"));

        assert!(record_to_article("1", &json!({ "title": "" }), &terms(&["X1"], &[])).is_none());
    }

    #[test]
    fn test_broadened_disclaimer() {
        assert!(!disclaimer(false).contains("broadened"));
        assert!(disclaimer(true).ends_with("Search was broadened to find results."));
    }
}
