//! Configuration loading for DNA Explainer.
//! Reads dnaexplain.toml from the current directory or the path in DNAEXPLAIN_CONFIG,
//! then applies environment overrides. The file is optional.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use thiserror::Error;
use tracing::warn;

use dnaexplain_common::rate_limit::RateLimitConfig;
use dnaexplain_llm::{BackendConfig, BackendKind, LlmError, TranslatorConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },

    #[error("invalid config file {path}: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },

    #[error(transparent)]
    Provider(#[from] LlmError),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub knowledge_base: KnowledgeBaseConfig,
    #[serde(default)]
    pub ncbi: NcbiConfig,
    #[serde(default)]
    pub rate_limits: RateLimits,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_cleanup_secs")]
    pub cache_cleanup_secs: u64,
}

fn default_bind()         -> String { "127.0.0.1:3000".to_string() }
fn default_cleanup_secs() -> u64 { 600 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: default_bind(), cache_cleanup_secs: default_cleanup_secs() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "secret")]
    pub api_key: Option<SecretString>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Never call the reasoning backend.
    #[serde(default)]
    pub prebuilt_only: bool,
    #[serde(default)]
    pub prefer_generative: bool,
}

fn default_provider()     -> String { "openai".to_string() }
fn default_timeout_secs() -> u64 { 60 }

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            api_key: None,
            base_url: None,
            timeout_secs: default_timeout_secs(),
            prebuilt_only: false,
            prefer_generative: false,
        }
    }
}

/// Extra directories searched for knowledge-base JSON, in priority order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KnowledgeBaseConfig {
    #[serde(default)]
    pub dirs: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NcbiConfig {
    #[serde(default, deserialize_with = "secret")]
    pub api_key: Option<SecretString>,
}

/// Requests per minute per client, by endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimits {
    #[serde(default = "default_translate_rpm")]
    pub translate_per_min: u32,
    #[serde(default = "default_literature_rpm")]
    pub literature_per_min: u32,
    #[serde(default = "default_clinvar_rpm")]
    pub clinvar_per_min: u32,
    #[serde(default = "default_extract_rpm")]
    pub extract_per_min: u32,
}

fn default_translate_rpm()  -> u32 { 10 }
fn default_literature_rpm() -> u32 { 30 }
fn default_clinvar_rpm()    -> u32 { 30 }
fn default_extract_rpm()    -> u32 { 10 }

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            translate_per_min: default_translate_rpm(),
            literature_per_min: default_literature_rpm(),
            clinvar_per_min: default_clinvar_rpm(),
            extract_per_min: default_extract_rpm(),
        }
    }
}

impl RateLimits {
    pub fn translate(&self)  -> RateLimitConfig { RateLimitConfig::per_minute(self.translate_per_min) }
    pub fn literature(&self) -> RateLimitConfig { RateLimitConfig::per_minute(self.literature_per_min) }
    pub fn clinvar(&self)    -> RateLimitConfig { RateLimitConfig::per_minute(self.clinvar_per_min) }
    pub fn extract(&self)    -> RateLimitConfig { RateLimitConfig::per_minute(self.extract_per_min) }
}

fn secret<'de, D: Deserializer<'de>>(d: D) -> Result<Option<SecretString>, D::Error> {
    let raw = Option::<String>::deserialize(d)?;
    Ok(raw.filter(|s| !s.trim().is_empty()).map(SecretString::from))
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

fn parse_number<T: FromStr>(name: &str, value: &str) -> Option<T> {
    let parsed = value.trim().parse().ok();
    if parsed.is_none() {
        warn!(var = name, "Ignoring non-numeric environment override");
    }
    parsed
}

impl Config {
    /// Load configuration from dnaexplain.toml, then the environment.
    /// Checks DNAEXPLAIN_CONFIG env var first, then current directory.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("DNAEXPLAIN_CONFIG")
            .unwrap_or_else(|_| "dnaexplain.toml".to_string());

        let mut config = if Path::new(&path).exists() {
            Self::from_file(Path::new(&path))?
        } else {
            tracing::info!(path = %path, "No config file found; using defaults");
            Self::default()
        };
        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::from_toml(&content)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Apply environment overrides through `var`, which returns a variable's value if set.
    pub fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        let var = |name: &str| var(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = var("LLM_PROVIDER")  { self.llm.provider = v.trim().to_string(); }
        if let Some(v) = var("LLM_MODEL")     { self.llm.model = Some(v.trim().to_string()); }
        if let Some(v) = var("LLM_BASE_URL")  { self.llm.base_url = Some(v.trim().to_string()); }
        if let Some(v) = var("LLM_API_KEY")   { self.llm.api_key = Some(SecretString::from(v)); }
        if let Some(v) = var("LLM_TIMEOUT_SECS") {
            if let Some(secs) = parse_number("LLM_TIMEOUT_SECS", &v) {
                self.llm.timeout_secs = secs;
            }
        }
        if let Some(v) = var("PREBUILT_ONLY_MODE") { self.llm.prebuilt_only = parse_flag(&v); }
        if let Some(v) = var("PREFER_GENERATIVE")  { self.llm.prefer_generative = parse_flag(&v); }

        if let Some(v) = var("NCBI_API_KEY") { self.ncbi.api_key = Some(SecretString::from(v)); }

        let limits = [
            ("RATE_LIMIT_TRANSLATE_PER_MIN",  &mut self.rate_limits.translate_per_min),
            ("RATE_LIMIT_LITERATURE_PER_MIN", &mut self.rate_limits.literature_per_min),
            ("RATE_LIMIT_CLINVAR_PER_MIN",    &mut self.rate_limits.clinvar_per_min),
            ("RATE_LIMIT_EXTRACT_PER_MIN",    &mut self.rate_limits.extract_per_min),
        ];
        for (name, slot) in limits {
            if let Some(n) = var(name).and_then(|v| parse_number(name, &v)) {
                *slot = n;
            }
        }

        // Directories merge in order, so the explicit one goes last to win
        if let Some(v) = var("DNAEXPLAIN_KB_DIR") {
            self.knowledge_base.dirs.push(PathBuf::from(v.trim()));
        }
        if let Some(v) = var("DNAEXPLAIN_BIND") { self.server.bind = v.trim().to_string(); }
    }

    pub fn backend_config(&self) -> Result<BackendConfig, ConfigError> {
        let kind: BackendKind = self.llm.provider.parse()?;
        Ok(BackendConfig {
            kind,
            model: self.llm.model.clone(),
            api_key: self.llm.api_key.clone(),
            base_url: self.llm.base_url.clone(),
            timeout: self.llm_timeout(),
        })
    }

    pub fn translator_config(&self) -> TranslatorConfig {
        TranslatorConfig {
            prefer_generative: self.llm.prefer_generative,
            prebuilt_only: self.llm.prebuilt_only,
            timeout: self.llm_timeout(),
        }
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm.timeout_secs.max(1))
    }

    pub fn cache_cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.server.cache_cleanup_secs.max(1))
    }
}
