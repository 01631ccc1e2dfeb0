//! Audit records for generative-tier calls.
//!
//! One record per backend call, emitted through `tracing`. The record carries
//! a SHA-256 of the raw output so a response can be correlated later without
//! storing it; the report text itself is never part of the record.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallOutcome {
    Ok,
    InvalidOutput,
    ParseError,
    TransportError,
    Timeout,
}

impl CallOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallOutcome::Ok             => "ok",
            CallOutcome::InvalidOutput  => "invalid_output",
            CallOutcome::ParseError     => "parse_error",
            CallOutcome::TransportError => "transport_error",
            CallOutcome::Timeout        => "timeout",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmAuditEntry {
    pub id: Uuid,
    pub request_id: Option<String>,
    pub model: String,
    pub backend: String,
    pub outcome: CallOutcome,
    /// Empty when the call produced no output.
    pub output_hash: String,
    pub latency_ms: u64,
    pub called_at: chrono::DateTime<Utc>,
}

impl LlmAuditEntry {
    pub fn new(
        request_id: Option<String>,
        model: String,
        backend: String,
        outcome: CallOutcome,
        output: Option<&str>,
        latency_ms: u64,
    ) -> Self {
        let output_hash = output.map(sha256_hex).unwrap_or_default();

        Self {
            id: Uuid::new_v4(),
            request_id,
            model,
            backend,
            outcome,
            output_hash,
            latency_ms,
            called_at: Utc::now(),
        }
    }

    pub fn emit(&self) {
        tracing::info!(
            audit_id = %self.id,
            request_id = self.request_id.as_deref().unwrap_or("-"),
            backend = %self.backend,
            model = %self.model,
            outcome = self.outcome.as_str(),
            output_sha256 = %self.output_hash,
            latency_ms = self.latency_ms,
            "Generative call audited"
        );
    }
}

fn sha256_hex(output: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(output.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_hash_is_sha256() {
        let entry = LlmAuditEntry::new(None, "gpt-4o".into(), "openai".into(), CallOutcome::Ok, Some("abc"), 12);
        assert_eq!(
            entry.output_hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_no_output_leaves_hash_empty() {
        let entry = LlmAuditEntry::new(
            Some("req-1".into()),
            "m".into(),
            "b".into(),
            CallOutcome::Timeout,
            None,
            30_000,
        );
        assert!(entry.output_hash.is_empty());
        assert_eq!(entry.outcome.as_str(), "timeout");
    }
}
