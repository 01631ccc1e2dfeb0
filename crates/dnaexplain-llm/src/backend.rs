//! Reasoning backend trait and concrete implementations.
//!
//! Backends:
//!   OllamaBackend           - local Ollama (OpenAI-compatible endpoint)
//!   OpenAiBackend           - OpenAI API (gpt-4o, gpt-4o-mini, …)
//!   OpenAiCompatibleBackend - any OpenAI-compatible endpoint (DeepSeek,
//!                             vLLM, LMStudio, OpenRouter, …)
//!   AnthropicBackend        - Anthropic Messages API (claude-*)
//!   GeminiBackend           - Google Gemini API (gemini-1.5-pro, flash, …)
//!
//! Every backend answers the same two-argument `generate(system, user)` call;
//! transport details (endpoint, credential, envelope) stay inside the impl.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use dnaexplain_common::error::CommonError;
use dnaexplain_common::sandbox::SandboxClient;

/// Preamble placed before the report text in the user turn.
pub const USER_PREAMBLE: &str =
    "Please analyze this genetic report and provide educational information:\n\n";

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Outbound call blocked: {0}")]
    Sandbox(#[from] CommonError),
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
    #[error("Backend not configured: {0}")]
    NotConfigured(String),
    #[error("Rate limit exceeded")]
    RateLimitExceeded,
    #[error("API error [{status}]: {message}")]
    ApiError { status: u16, message: String },
}

// ── Request / Response ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,   // "system" | "user" | "assistant"
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRequest {
    pub messages: Vec<Message>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    /// Ask the provider for a single JSON object where it supports that.
    #[serde(default)]
    pub json_mode: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub content: String,
    pub model: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

// ── Trait ─────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait LlmBackend: Send + Sync {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError>;
    fn model_id(&self) -> &str;
    /// Short provider name used in logs and health output.
    fn name(&self) -> &'static str;
    fn is_local(&self) -> bool;
    fn max_output_tokens(&self) -> usize;

    /// One structured-output turn: system prompt plus the verbatim report.
    async fn generate(&self, system_prompt: &str, user_text: &str) -> Result<String, LlmError> {
        let req = LlmRequest {
            messages: vec![
                Message::system(system_prompt),
                Message::user(format!("{USER_PREAMBLE}{user_text}")),
            ],
            model: None,
            max_tokens: Some(4000.min(self.max_output_tokens() as u32)),
            temperature: Some(0.3),
            json_mode: true,
        };
        let resp = self.complete(req).await?;
        if resp.content.trim().is_empty() {
            return Err(LlmError::Unavailable("empty response from backend".to_string()));
        }
        Ok(resp.content)
    }
}

// ── Helper: parse OpenAI-style response ──────────────────────────────────────

fn parse_openai_response(json: &serde_json::Value, fallback_model: &str) -> LlmResponse {
    LlmResponse {
        content: json["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or("")
            .to_string(),
        model: json["model"]
            .as_str()
            .unwrap_or(fallback_model)
            .to_string(),
        prompt_tokens:     json["usage"]["prompt_tokens"].as_u64().unwrap_or(0) as u32,
        completion_tokens: json["usage"]["completion_tokens"].as_u64().unwrap_or(0) as u32,
    }
}

async fn check_response_status(resp: reqwest::Response) -> Result<serde_json::Value, LlmError> {
    let status = resp.status().as_u16();
    let text = resp.text().await?;
    if status == 429 {
        return Err(LlmError::RateLimitExceeded);
    }
    if status >= 400 {
        let body: serde_json::Value = serde_json::from_str(&text).unwrap_or_default();
        let msg = body["error"]["message"]
            .as_str()
            .or_else(|| body["message"].as_str())
            .unwrap_or("unknown API error")
            .to_string();
        return Err(LlmError::ApiError { status, message: msg });
    }
    Ok(serde_json::from_str(&text)?)
}

/// `{base}/v1/chat/completions`, without doubling a trailing `/v1`.
fn chat_completions_url(base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if base.ends_with("/v1") {
        format!("{}/chat/completions", base)
    } else {
        format!("{}/v1/chat/completions", base)
    }
}

fn openai_body(req: &LlmRequest, default_model: &str) -> serde_json::Value {
    let mut body = serde_json::json!({
        "model":       req.model.as_deref().unwrap_or(default_model),
        "messages":    req.messages,
        "max_tokens":  req.max_tokens.unwrap_or(4000),
        "temperature": req.temperature.unwrap_or(0.3),
    });
    if req.json_mode {
        body["response_format"] = serde_json::json!({ "type": "json_object" });
    }
    body
}

// ── 1. Ollama (local) ─────────────────────────────────────────────────────────

pub struct OllamaBackend {
    pub base_url: String,
    pub model: String,
    client: SandboxClient,
}

impl OllamaBackend {
    pub fn new(client: SandboxClient, base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), model: model.into(), client }
    }
}

#[async_trait]
impl LlmBackend for OllamaBackend {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError> {
        let url = chat_completions_url(&self.base_url);
        let body = openai_body(&req, &self.model);
        let resp = self.client.post(&url)?.json(&body).send().await?;
        let json = check_response_status(resp).await?;
        Ok(parse_openai_response(&json, &self.model))
    }

    fn model_id(&self) -> &str { &self.model }
    fn name(&self) -> &'static str { "ollama" }
    fn is_local(&self) -> bool { true }
    fn max_output_tokens(&self) -> usize { 8192 }
}

// ── 2. OpenAI ─────────────────────────────────────────────────────────────────

pub struct OpenAiBackend {
    pub model: String,
    api_key: SecretString,
    client: SandboxClient,
}

impl OpenAiBackend {
    pub fn new(client: SandboxClient, api_key: SecretString, model: impl Into<String>) -> Self {
        Self { model: model.into(), api_key, client }
    }
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError> {
        let body = openai_body(&req, &self.model);
        let resp = self.client
            .post("https://api.openai.com/v1/chat/completions")?
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;
        let json = check_response_status(resp).await?;
        Ok(parse_openai_response(&json, &self.model))
    }

    fn model_id(&self) -> &str { &self.model }
    fn name(&self) -> &'static str { "openai" }
    fn is_local(&self) -> bool { false }
    fn max_output_tokens(&self) -> usize { 16_384 }
}

// ── 3. OpenAI-Compatible (DeepSeek, vLLM, LMStudio, OpenRouter, …) ──────────

pub struct OpenAiCompatibleBackend {
    pub base_url: String,
    pub model: String,
    name: &'static str,
    api_key: Option<SecretString>,
    client: SandboxClient,
}

impl OpenAiCompatibleBackend {
    pub fn new(
        client: SandboxClient,
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<SecretString>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            name: "openai_compatible",
            api_key,
            client,
        }
    }

    /// Provider label reported in logs, e.g. `deepseek`.
    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(k) => req.bearer_auth(k.expose_secret()),
            None    => req,
        }
    }
}

#[async_trait]
impl LlmBackend for OpenAiCompatibleBackend {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError> {
        let url = chat_completions_url(&self.base_url);
        let body = openai_body(&req, &self.model);
        let resp = self.auth(self.client.post(&url)?).json(&body).send().await?;
        let json = check_response_status(resp).await?;
        Ok(parse_openai_response(&json, &self.model))
    }

    fn model_id(&self) -> &str { &self.model }
    fn name(&self) -> &'static str { self.name }
    fn is_local(&self) -> bool { false }
    fn max_output_tokens(&self) -> usize { 8_192 }
}

// ── 4. Anthropic (claude-*) ───────────────────────────────────────────────────

pub struct AnthropicBackend {
    pub model: String,
    api_key: SecretString,
    client: SandboxClient,
}

impl AnthropicBackend {
    pub fn new(client: SandboxClient, api_key: SecretString, model: impl Into<String>) -> Self {
        Self { api_key, model: model.into(), client }
    }
}

#[async_trait]
impl LlmBackend for AnthropicBackend {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError> {
        // Messages API takes the system prompt as a top-level field
        let system = req.messages.iter()
            .find(|m| m.role == "system")
            .map(|m| m.content.as_str())
            .unwrap_or("");

        let messages: Vec<serde_json::Value> = req.messages.iter()
            .filter(|m| m.role != "system")
            .map(|m| serde_json::json!({"role": m.role, "content": m.content}))
            .collect();

        let model = req.model.as_deref().unwrap_or(&self.model);
        let max_tokens = req.max_tokens.unwrap_or(4000);

        let mut body = serde_json::json!({
            "model":       model,
            "messages":    messages,
            "max_tokens":  max_tokens,
            "temperature": req.temperature.unwrap_or(0.3),
        });
        if !system.is_empty() {
            body["system"] = serde_json::Value::String(system.to_string());
        }

        let resp = self.client
            .post("https://api.anthropic.com/v1/messages")?
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let json = check_response_status(resp).await?;

        let content = json["content"]
            .as_array()
            .and_then(|blocks| blocks.iter().find(|b| b["type"] == "text"))
            .and_then(|b| b["text"].as_str())
            .unwrap_or("")
            .to_string();

        Ok(LlmResponse {
            content,
            model: json["model"].as_str().unwrap_or(model).to_string(),
            prompt_tokens:     json["usage"]["input_tokens"].as_u64().unwrap_or(0) as u32,
            completion_tokens: json["usage"]["output_tokens"].as_u64().unwrap_or(0) as u32,
        })
    }

    fn model_id(&self) -> &str { &self.model }
    fn name(&self) -> &'static str { "anthropic" }
    fn is_local(&self) -> bool { false }
    fn max_output_tokens(&self) -> usize { 8_192 }
}

// ── 5. Google Gemini ──────────────────────────────────────────────────────────

pub struct GeminiBackend {
    pub model: String,
    api_key: SecretString,
    client: SandboxClient,
}

impl GeminiBackend {
    pub fn new(client: SandboxClient, api_key: SecretString, model: impl Into<String>) -> Self {
        Self { api_key, model: model.into(), client }
    }
}

#[async_trait]
impl LlmBackend for GeminiBackend {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError> {
        let model = req.model.as_deref().unwrap_or(&self.model);
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            model
        );

        // System message → systemInstruction
        let system_text = req.messages.iter()
            .find(|m| m.role == "system")
            .map(|m| m.content.clone());

        let contents: Vec<serde_json::Value> = req.messages.iter()
            .filter(|m| m.role != "system")
            .map(|m| {
                let role = if m.role == "assistant" { "model" } else { "user" };
                serde_json::json!({
                    "role": role,
                    "parts": [{ "text": m.content }]
                })
            })
            .collect();

        let mut body = serde_json::json!({
            "contents": contents,
            "generationConfig": {
                "maxOutputTokens": req.max_tokens.unwrap_or(4000),
                "temperature":     req.temperature.unwrap_or(0.3),
            }
        });
        if req.json_mode {
            body["generationConfig"]["responseMimeType"] = "application/json".into();
        }
        if let Some(sys) = system_text {
            body["systemInstruction"] = serde_json::json!({
                "parts": [{ "text": sys }]
            });
        }

        let resp = self.client
            .post(&url)?
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;
        let json = check_response_status(resp).await?;

        let content = json["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .unwrap_or("")
            .to_string();

        let prompt_tokens = json["usageMetadata"]["promptTokenCount"]
            .as_u64().unwrap_or(0) as u32;
        let completion_tokens = json["usageMetadata"]["candidatesTokenCount"]
            .as_u64().unwrap_or(0) as u32;

        Ok(LlmResponse {
            content,
            model: model.to_string(),
            prompt_tokens,
            completion_tokens,
        })
    }

    fn model_id(&self) -> &str { &self.model }
    fn name(&self) -> &'static str { "gemini" }
    fn is_local(&self) -> bool { false }
    fn max_output_tokens(&self) -> usize { 8_192 }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
