//! Tiered translation: prebuilt templates first, the generative backend
//! second, and a deterministic fallback whenever generative output fails the
//! response contract.

use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};

use dnaexplain_common::schema::{Confidence, TranslateMode, TranslationResult};
use dnaexplain_common::validate_translation;
use dnaexplain_kb::{find_prebuilt_match, synthesize, KnowledgeBase, PrebuiltMatch};
use dnaexplain_ner::{Analysis, TextClassifier};

use crate::audit::{CallOutcome, LlmAuditEntry};
use crate::backend::{LlmBackend, LlmError};
use crate::fallback::{fallback_response, prebuilt_only_response};
use crate::parse;
use crate::prompt::build_system_prompt;
use crate::refusals::apply_refusals;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Which path produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Prebuilt,
    PrebuiltOnly,
    Generative,
    Fallback,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Prebuilt     => "prebuilt",
            Tier::PrebuiltOnly => "prebuilt_only",
            Tier::Generative   => "generative",
            Tier::Fallback     => "fallback",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TranslateOutcome {
    pub result: TranslationResult,
    pub tier: Tier,
    /// Set when the prebuilt tier answered.
    pub matched: Option<PrebuiltMatch>,
}

/// Faults surfaced to the caller. Invalid generative output is not one of
/// them: it is answered with the deterministic fallback.
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("reasoning backend failed: {0}")]
    Backend(#[source] LlmError),
    #[error("reasoning backend timed out after {0:?}")]
    Timeout(Duration),
    #[error("failed to parse analysis response: {0}")]
    Parse(#[source] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct TranslatorConfig {
    /// Skip the prebuilt tier whenever a backend is available.
    pub prefer_generative: bool,
    /// Never call the backend, regardless of per-request mode.
    pub prebuilt_only: bool,
    pub timeout: Duration,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self { prefer_generative: false, prebuilt_only: false, timeout: DEFAULT_TIMEOUT }
    }
}

pub struct Translator {
    classifier: TextClassifier,
    kb: Arc<KnowledgeBase>,
    backend: Option<Arc<dyn LlmBackend>>,
    config: TranslatorConfig,
    system_prompt: String,
}

impl Translator {
    pub fn new(
        kb: Arc<KnowledgeBase>,
        backend: Option<Arc<dyn LlmBackend>>,
        config: TranslatorConfig,
    ) -> Self {
        let system_prompt = build_system_prompt(&kb);
        let classifier = TextClassifier::with_symbols(kb.supported_genes());
        Self { classifier, kb, backend, config, system_prompt }
    }

    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.kb
    }

    pub fn backend(&self) -> Option<&dyn LlmBackend> {
        self.backend.as_deref()
    }

    /// True when no request can reach the generative tier.
    pub fn is_prebuilt_only(&self) -> bool {
        self.config.prebuilt_only || self.backend.is_none()
    }

    pub async fn translate(
        &self,
        text: &str,
        mode: TranslateMode,
    ) -> Result<TranslateOutcome, TranslateError> {
        self.translate_for(None, text, mode).await
    }

    /// Same as [`translate`](Self::translate), tagging the audit record with
    /// the caller's request id.
    pub async fn translate_for(
        &self,
        request_id: Option<&str>,
        text: &str,
        mode: TranslateMode,
    ) -> Result<TranslateOutcome, TranslateError> {
        let analysis = self.classifier.analyze(text);
        if !analysis.intents.is_empty() {
            info!(intents = ?analysis.intents, "Disallowed intents detected");
        }

        let prebuilt_only = mode == TranslateMode::PrebuiltOnly || self.is_prebuilt_only();
        let skip_prebuilt = self.config.prefer_generative && !prebuilt_only;

        if !skip_prebuilt {
            if let Some(outcome) = self.try_prebuilt(&analysis) {
                return Ok(outcome);
            }
        }

        let backend = match (&self.backend, prebuilt_only) {
            (Some(backend), false) => backend,
            _ => {
                debug!("No template matched in prebuilt-only mode");
                let mut result = prebuilt_only_response(self.kb.disclaimer());
                apply_refusals(&mut result, &analysis.intents);
                return Ok(TranslateOutcome { result, tier: Tier::PrebuiltOnly, matched: None });
            }
        };

        self.generate(backend.as_ref(), request_id, text, &analysis).await
    }

    fn try_prebuilt(&self, analysis: &Analysis) -> Option<TranslateOutcome> {
        let matched = find_prebuilt_match(&self.kb, analysis)?;
        if matched.confidence < Confidence::Medium {
            return None;
        }
        match synthesize(&self.kb, &matched) {
            Ok(mut result) => {
                info!(
                    gene = %matched.gene,
                    classification = %matched.classification,
                    confidence = matched.confidence.as_str(),
                    "Answered from prebuilt template"
                );
                apply_refusals(&mut result, &analysis.intents);
                Some(TranslateOutcome { result, tier: Tier::Prebuilt, matched: Some(matched) })
            }
            Err(e) => {
                warn!(error = %e, "Prebuilt synthesis failed; continuing to next tier");
                None
            }
        }
    }

    async fn generate(
        &self,
        backend: &dyn LlmBackend,
        request_id: Option<&str>,
        text: &str,
        analysis: &Analysis,
    ) -> Result<TranslateOutcome, TranslateError> {
        let started = Instant::now();
        let call = tokio::time::timeout(
            self.config.timeout,
            backend.generate(&self.system_prompt, text),
        )
        .await;
        let latency_ms = started.elapsed().as_millis() as u64;

        let audit = |outcome: CallOutcome, output: Option<&str>| {
            LlmAuditEntry::new(
                request_id.map(str::to_string),
                backend.model_id().to_string(),
                backend.name().to_string(),
                outcome,
                output,
                latency_ms,
            )
            .emit();
        };

        let raw = match call {
            Err(_elapsed) => {
                audit(CallOutcome::Timeout, None);
                return Err(TranslateError::Timeout(self.config.timeout));
            }
            Ok(Err(LlmError::Http(e))) if e.is_timeout() => {
                audit(CallOutcome::Timeout, None);
                return Err(TranslateError::Timeout(self.config.timeout));
            }
            Ok(Err(e)) => {
                audit(CallOutcome::TransportError, None);
                warn!(backend = backend.name(), error = %e, "Reasoning backend call failed");
                return Err(TranslateError::Backend(e));
            }
            Ok(Ok(raw)) => raw,
        };

        let value = match parse::decode(&raw) {
            Ok(value) => value,
            Err(e) => {
                audit(CallOutcome::ParseError, Some(&raw));
                warn!(error = %e, "Generative output is not JSON");
                return Err(TranslateError::Parse(e));
            }
        };

        match validate_translation(value) {
            Ok(mut result) => {
                audit(CallOutcome::Ok, Some(&raw));
                apply_refusals(&mut result, &analysis.intents);
                info!(
                    entities = result.extracted_entities.len(),
                    refusals = result.refusals.len(),
                    latency_ms,
                    "Answered from generative tier"
                );
                Ok(TranslateOutcome { result, tier: Tier::Generative, matched: None })
            }
            Err(violation) => {
                audit(CallOutcome::InvalidOutput, Some(&raw));
                warn!(error = %violation, "Generative output failed contract; using fallback");
                let result = fallback_response(self.kb.disclaimer(), analysis);
                Ok(TranslateOutcome { result, tier: Tier::Fallback, matched: None })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translator(config: TranslatorConfig) -> Translator {
        Translator::new(Arc::new(KnowledgeBase::embedded()), None, config)
    }

    #[tokio::test]
    async fn test_known_gene_uses_prebuilt_tier() {
        let t = translator(TranslatorConfig::default());
        let outcome = t
            .translate("BRCA1, likely pathogenic, heterozygous", TranslateMode::Auto)
            .await
            .unwrap();
        assert_eq!(outcome.tier, Tier::Prebuilt);
        let matched = outcome.matched.unwrap();
        assert_eq!(matched.gene, "BRCA1");
        assert_eq!(matched.classification, "pathogenic");
    }

    #[tokio::test]
    async fn test_no_backend_degrades_to_prebuilt_only() {
        let t = translator(TranslatorConfig::default());
        assert!(t.is_prebuilt_only());
        let outcome = t
            .translate("My report lists something I do not understand at all", TranslateMode::Auto)
            .await
            .unwrap();
        assert_eq!(outcome.tier, Tier::PrebuiltOnly);
        assert!(outcome.result.summary_plain_english.contains("Prebuilt-only mode"));
    }

    #[tokio::test]
    async fn test_prefer_generative_without_backend_still_uses_templates() {
        let t = translator(TranslatorConfig { prefer_generative: true, ..Default::default() });
        let outcome = t
            .translate("CFTR carrier, heterozygous variant detected", TranslateMode::Auto)
            .await
            .unwrap();
        assert_eq!(outcome.tier, Tier::Prebuilt);
    }

    #[test]
    fn test_tier_labels() {
        assert_eq!(Tier::PrebuiltOnly.as_str(), "prebuilt_only");
        assert_eq!(Tier::Fallback.as_str(), "fallback");
    }
}
