//! NCBI E-utilities client shared by the ClinVar and PubMed lookups.
//!
//! Endpoints used:
//!   esearch:  https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi
//!   esummary: https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esummary.fcgi
//!
//! NCBI allows 3 requests/second without an API key and 10 with one. Every
//! call waits for a slot in the shared rate limiter before going out.

use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, instrument};

use dnaexplain_common::rate_limit::{RateLimitConfig, RateLimitStore};
use dnaexplain_common::sandbox::SandboxClient;

use crate::error::SourceError;

const ESEARCH_URL:  &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi";
const ESUMMARY_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esummary.fcgi";
const TOOL_NAME: &str = "dnaexplain";
const THROTTLE_KEY: &str = "ncbi";
const SLOT_POLL: Duration = Duration::from_millis(100);

pub struct NcbiClient {
    client: SandboxClient,
    api_key: Option<SecretString>,
    limiter: Arc<dyn RateLimitStore>,
    throttle: RateLimitConfig,
}

impl NcbiClient {
    pub fn new(
        client: SandboxClient,
        api_key: Option<SecretString>,
        limiter: Arc<dyn RateLimitStore>,
    ) -> Self {
        let per_second = if api_key.is_some() { 10 } else { 3 };
        Self { client, api_key, limiter, throttle: RateLimitConfig::per_second(per_second) }
    }

    /// Requests per second this client allows itself.
    pub fn requests_per_second(&self) -> u32 {
        self.throttle.max
    }

    async fn wait_for_slot(&self) {
        while !self.limiter.check(THROTTLE_KEY, self.throttle).allowed {
            tokio::time::sleep(SLOT_POLL).await;
        }
    }

    fn base_params(&self, db: &str) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("db", db.to_string()),
            ("retmode", "json".to_string()),
            ("tool", TOOL_NAME.to_string()),
        ];
        if let Some(key) = &self.api_key {
            params.push(("api_key", key.expose_secret().to_string()));
        }
        params
    }

    async fn get_json(
        &self,
        url: &str,
        params: &[(&'static str, String)],
        context: &'static str,
    ) -> Result<Value, SourceError> {
        self.wait_for_slot().await;
        let resp = self.client
            .get(url)?
            .header("Accept", "application/json")
            .query(params)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::Status { context, status: status.as_u16() });
        }
        Ok(resp.json().await?)
    }

    /// Search a database and return matching ids.
    #[instrument(skip(self, term), fields(term_len = term.len()))]
    pub async fn esearch(
        &self,
        db: &str,
        term: &str,
        retmax: u32,
        sort: Option<&str>,
    ) -> Result<Vec<String>, SourceError> {
        let mut params = self.base_params(db);
        params.push(("term", term.to_string()));
        params.push(("retmax", retmax.to_string()));
        if let Some(sort) = sort {
            params.push(("sort", sort.to_string()));
        }

        let context = if db == "clinvar" { "ClinVar search" } else { "PubMed search" };
        let json = self.get_json(ESEARCH_URL, &params, context).await?;
        let ids = id_list(&json);
        debug!(db, hits = ids.len(), "esearch returned ids");
        Ok(ids)
    }

    /// Raw `esummary` result object for the given ids.
    #[instrument(skip(self))]
    pub async fn esummary(&self, db: &str, ids: &[String]) -> Result<Value, SourceError> {
        let mut params = self.base_params(db);
        params.push(("id", ids.join(",")));

        let context = if db == "clinvar" { "ClinVar summary" } else { "PubMed summary" };
        let json = self.get_json(ESUMMARY_URL, &params, context).await?;
        Ok(json["result"].clone())
    }
}

fn id_list(json: &Value) -> Vec<String> {
    json["esearchresult"]["idlist"]
        .as_array()
        .map(|ids| ids.iter().filter_map(|v| v.as_str().map(String::from)).collect())
        .unwrap_or_default()
}

/// `(uid, record)` pairs of an `esummary` result, in `uids` order.
pub fn summary_records(result: &Value) -> Vec<(String, &Value)> {
    result["uids"]
        .as_array()
        .map(|uids| {
            uids.iter()
                .filter_map(|u| u.as_str())
                .filter_map(|uid| {
                    let record = &result[uid];
                    record.is_object().then(|| (uid.to_string(), record))
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dnaexplain_common::rate_limit::InMemoryRateLimiter;
    use serde_json::json;

    fn client(api_key: Option<&str>) -> NcbiClient {
        NcbiClient::new(
            SandboxClient::new().unwrap(),
            api_key.map(|k| SecretString::from(k.to_string())),
            Arc::new(InMemoryRateLimiter::new()),
        )
    }

    #[test]
    fn test_throttle_depends_on_api_key() {
        assert_eq!(client(None).requests_per_second(), 3);
        assert_eq!(client(Some("abc")).requests_per_second(), 10);
    }

    #[test]
    fn test_api_key_goes_into_params() {
        let params = client(Some("abc")).base_params("clinvar");
        assert!(params.contains(&("api_key", "abc".to_string())));
        assert!(params.contains(&("db", "clinvar".to_string())));
        assert!(!client(None).base_params("pubmed").iter().any(|(k, _)| *k == "api_key"));
    }

    #[test]
    fn test_id_list() {
        let json = json!({ "esearchresult": { "count": "2", "idlist": ["12", "34"] } });
        assert_eq!(id_list(&json), vec!["12", "34"]);
        assert!(id_list(&json!({})).is_empty());
    }

    #[test]
    fn test_summary_records_skip_missing() {
        let result = json!({ "uids": ["1", "2"], "1": { "title": "a" } });
        let records = summary_records(&result);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].0, "1");
        assert_eq!(records[0].1["title"], "a");
    }

    #[tokio::test]
    async fn test_wait_for_slot_returns_when_free() {
        let c = client(None);
        for _ in 0..3 {
            c.wait_for_slot().await;
        }
        assert!(!c.limiter.check(THROTTLE_KEY, c.throttle).allowed);
    }
}
