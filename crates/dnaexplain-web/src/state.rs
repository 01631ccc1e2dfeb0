//! Shared application state for the web server.

use std::sync::Arc;

use dnaexplain_common::cache::{CacheStore, TtlCache};
use dnaexplain_common::error::CommonError;
use dnaexplain_common::rate_limit::{InMemoryRateLimiter, RateLimitStore};
use dnaexplain_common::sandbox::SandboxClient;
use dnaexplain_llm::Translator;
use dnaexplain_sources::{clinvar, literature};
use dnaexplain_sources::{ClinvarClient, ClinvarResponse, LiteratureClient, LiteratureResponse, NcbiClient};

use crate::config::{Config, RateLimits};

/// Shared state injected into every Axum handler.
pub struct AppState {
    pub translator: Translator,
    pub limiter: Arc<dyn RateLimitStore>,
    pub limits: RateLimits,
    pub clinvar: ClinvarClient,
    pub literature: LiteratureClient,
    /// Configured provider name, reported by the health endpoint.
    pub provider: String,
    clinvar_cache: Arc<TtlCache<ClinvarResponse>>,
    literature_cache: Arc<TtlCache<LiteratureResponse>>,
}

impl AppState {
    /// Wire the lookup clients around an already built translator.
    pub fn new(config: &Config, translator: Translator) -> Result<Self, CommonError> {
        let limiter: Arc<dyn RateLimitStore> = Arc::new(InMemoryRateLimiter::new());
        let ncbi = Arc::new(NcbiClient::new(
            SandboxClient::new()?,
            config.ncbi.api_key.clone(),
            limiter.clone(),
        ));

        let clinvar_cache = Arc::new(TtlCache::<ClinvarResponse>::new(clinvar::CACHE_TTL));
        let literature_cache = Arc::new(TtlCache::<LiteratureResponse>::new(literature::CACHE_TTL));
        let disclaimer = translator.knowledge_base().short_disclaimer().to_string();

        Ok(Self {
            clinvar: ClinvarClient::new(ncbi.clone(), clinvar_cache.clone(), disclaimer),
            literature: LiteratureClient::new(ncbi, literature_cache.clone()),
            translator,
            limiter,
            limits: config.rate_limits.clone(),
            provider: config.llm.provider.clone(),
            clinvar_cache,
            literature_cache,
        })
    }

    /// Evict expired lookup results, returning how many were dropped.
    pub fn cleanup_caches(&self) -> usize {
        self.clinvar_cache.cleanup() + self.literature_cache.cleanup()
    }
}

pub type SharedState = Arc<AppState>;
