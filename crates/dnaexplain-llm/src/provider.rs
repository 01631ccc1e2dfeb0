//! Backend selection by configuration.
//!
//! The orchestrator only ever sees `Arc<dyn LlmBackend>`; everything
//! provider-specific (default model, base URL, whether a credential is
//! required) is decided here.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use dnaexplain_common::sandbox::SandboxClient;

use crate::backend::{
    AnthropicBackend, GeminiBackend, LlmBackend, LlmError, OllamaBackend, OpenAiBackend,
    OpenAiCompatibleBackend,
};

pub const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com";
pub const OLLAMA_BASE_URL: &str = "http://localhost:11434";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    #[serde(rename = "openai")]
    OpenAi,
    Anthropic,
    DeepSeek,
    Gemini,
    Ollama,
    #[serde(rename = "openai_compatible")]
    OpenAiCompatible,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::OpenAi           => "openai",
            BackendKind::Anthropic        => "anthropic",
            BackendKind::DeepSeek         => "deepseek",
            BackendKind::Gemini           => "gemini",
            BackendKind::Ollama           => "ollama",
            BackendKind::OpenAiCompatible => "openai_compatible",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            BackendKind::OpenAi           => "gpt-4o",
            BackendKind::Anthropic        => "claude-3-5-sonnet-20241022",
            BackendKind::DeepSeek         => "deepseek-chat",
            BackendKind::Gemini           => "gemini-1.5-pro",
            BackendKind::Ollama           => "llama3:8b",
            BackendKind::OpenAiCompatible => "gpt-4o-mini",
        }
    }

    /// Local and self-hosted endpoints may run without a credential.
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, BackendKind::Ollama | BackendKind::OpenAiCompatible)
    }
}

impl FromStr for BackendKind {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai"                                     => Ok(BackendKind::OpenAi),
            "anthropic" | "claude"                       => Ok(BackendKind::Anthropic),
            "deepseek"                                   => Ok(BackendKind::DeepSeek),
            "gemini" | "google"                          => Ok(BackendKind::Gemini),
            "ollama"                                     => Ok(BackendKind::Ollama),
            "openai_compatible" | "openai-compatible"    => Ok(BackendKind::OpenAiCompatible),
            other => Err(LlmError::NotConfigured(format!("unknown provider '{other}'"))),
        }
    }
}

/// Everything needed to construct one backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub kind: BackendKind,
    pub model: Option<String>,
    pub api_key: Option<SecretString>,
    pub base_url: Option<String>,
    pub timeout: Duration,
}

impl BackendConfig {
    pub fn new(kind: BackendKind) -> Self {
        Self { kind, model: None, api_key: None, base_url: None, timeout: Duration::from_secs(60) }
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().filter(|m| !m.is_empty()).unwrap_or(self.kind.default_model())
    }

    fn key(&self) -> Option<SecretString> {
        self.api_key
            .as_ref()
            .map(|k| k.expose_secret().trim().to_string())
            .filter(|k| !k.is_empty())
            .map(SecretString::from)
    }
}

/// Build the configured backend.
///
/// Returns `Ok(None)` when a remote provider has no credential: the caller is
/// expected to run in prebuilt-only mode rather than fail.
pub fn build_backend(cfg: &BackendConfig) -> Result<Option<Arc<dyn LlmBackend>>, LlmError> {
    let key = cfg.key();
    if cfg.kind.requires_api_key() && key.is_none() {
        tracing::warn!(
            provider = cfg.kind.as_str(),
            "Provider configured but no API key found (set LLM_API_KEY); generative tier disabled"
        );
        return Ok(None);
    }

    let mut client = SandboxClient::with_timeout(cfg.timeout)?;
    if let Some(base) = &cfg.base_url {
        client.allow_url_host(base);
    }
    let model = cfg.model().to_string();

    let backend: Arc<dyn LlmBackend> = match (cfg.kind, key) {
        (BackendKind::OpenAi, Some(key)) => match &cfg.base_url {
            // A custom base URL for "openai" means an OpenAI-compatible proxy
            Some(base) => Arc::new(
                OpenAiCompatibleBackend::new(client, base.clone(), model, Some(key)).with_name("openai"),
            ),
            None => Arc::new(OpenAiBackend::new(client, key, model)),
        },
        (BackendKind::Anthropic, Some(key)) => Arc::new(AnthropicBackend::new(client, key, model)),
        (BackendKind::Gemini, Some(key)) => Arc::new(GeminiBackend::new(client, key, model)),
        (BackendKind::DeepSeek, Some(key)) => {
            let base = cfg.base_url.clone().unwrap_or_else(|| DEEPSEEK_BASE_URL.to_string());
            Arc::new(OpenAiCompatibleBackend::new(client, base, model, Some(key)).with_name("deepseek"))
        }
        (BackendKind::Ollama, _) => {
            let base = cfg.base_url.clone().unwrap_or_else(|| OLLAMA_BASE_URL.to_string());
            Arc::new(OllamaBackend::new(client, base, model))
        }
        (BackendKind::OpenAiCompatible, key) => {
            let base = cfg.base_url.clone().ok_or_else(|| {
                LlmError::NotConfigured("openai_compatible requires LLM_BASE_URL".to_string())
            })?;
            Arc::new(OpenAiCompatibleBackend::new(client, base, model, key))
        }
        (kind, None) => {
            return Err(LlmError::NotConfigured(format!("{} requires an API key", kind.as_str())));
        }
    };

    tracing::info!(
        provider = backend.name(),
        model = backend.model_id(),
        is_local = backend.is_local(),
        "Reasoning backend configured"
    );
    Ok(Some(backend))
}
