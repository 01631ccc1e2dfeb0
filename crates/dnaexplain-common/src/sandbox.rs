use reqwest::{Client, ClientBuilder};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;
use crate::error::CommonError;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Outbound HTTP client that only reaches approved hosts.
/// Every external call (NCBI lookups, model providers) goes through one of these.
#[derive(Debug, Clone)]
pub struct SandboxClient {
    client: Client,
    allowlist: HashSet<String>,
}

impl SandboxClient {
    /// Client with the default allowlist and a 30 s request timeout.
    pub fn new() -> Result<Self, CommonError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, CommonError> {
        let domains = [
            "eutils.ncbi.nlm.nih.gov",           // E-utilities (ClinVar, PubMed)
            "www.ncbi.nlm.nih.gov",              // ClinVar record pages
            "pubmed.ncbi.nlm.nih.gov",           // PubMed article pages
            "api.openai.com",                    // OpenAI
            "api.deepseek.com",                  // DeepSeek (OpenAI-compatible)
            "api.anthropic.com",                 // Anthropic
            "generativelanguage.googleapis.com", // Gemini
            "localhost",                         // Ollama local
            "127.0.0.1",
        ];
        let allowlist = domains.iter().map(|d| d.to_string()).collect();

        let client = ClientBuilder::new().timeout(timeout).build()?;

        Ok(Self { client, allowlist })
    }

    /// Appends an exact hostname to the allowlist.
    pub fn allow_domain(&mut self, domain: &str) {
        self.allowlist.insert(domain.to_string());
    }

    /// Allows the host of a configured base URL (e.g. a self-hosted
    /// OpenAI-compatible endpoint). Unparseable URLs are ignored.
    pub fn allow_url_host(&mut self, base_url: &str) {
        if let Some(host) = Url::parse(base_url).ok().and_then(|u| u.host_str().map(str::to_string)) {
            self.allowlist.insert(host);
        }
    }

    pub fn is_allowed(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else { return false };
        let Some(host) = parsed.host_str() else { return false };
        self.allowlist
            .iter()
            .any(|allowed| host == allowed || host.ends_with(&format!(".{}", allowed)))
    }

    fn guard(&self, url: &str) -> Result<(), CommonError> {
        if self.is_allowed(url) {
            Ok(())
        } else {
            tracing::warn!(url, "Outbound request blocked: host not in allowlist");
            Err(CommonError::Sandbox(format!("domain not in allowlist for URL {}", url)))
        }
    }

    pub fn get(&self, url: &str) -> Result<reqwest::RequestBuilder, CommonError> {
        self.guard(url)?;
        Ok(self.client.get(url))
    }

    pub fn post(&self, url: &str) -> Result<reqwest::RequestBuilder, CommonError> {
        self.guard(url)?;
        Ok(self.client.post(url))
    }
}
