//! Shared testing utilities: a scripted reasoning backend and report fixtures.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use dnaexplain_llm::backend::{LlmBackend, LlmError, LlmRequest, LlmResponse};

// ── Scripted backend ─────────────────────────────────────────────────────────

/// One scripted reply. Replies are consumed in order; the last one repeats
/// once the script is exhausted.
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    ApiError { status: u16, message: String },
    Unavailable(String),
    /// Sleep before answering; use with a short orchestrator timeout.
    Delayed(Duration, String),
}

/// Backend that answers from a fixed script and records what it was sent.
pub struct ScriptedBackend {
    script: Mutex<VecDeque<Reply>>,
    last: Mutex<Option<Reply>>,
    calls: AtomicUsize,
    last_request: Mutex<Option<LlmRequest>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            last: Mutex::new(None),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn with(self, reply: Reply) -> Self {
        self.script.lock().unwrap().push_back(reply);
        self
    }

    pub fn replying(text: impl Into<String>) -> Self {
        Self::new().with(Reply::Text(text.into()))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<LlmRequest> {
        self.last_request.lock().unwrap().clone()
    }

    fn next_reply(&self) -> Reply {
        let mut script = self.script.lock().unwrap();
        let mut last = self.last.lock().unwrap();
        if let Some(reply) = script.pop_front() {
            *last = Some(reply.clone());
            return reply;
        }
        last.clone()
            .unwrap_or_else(|| Reply::Unavailable("script is empty".to_string()))
    }
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmBackend for ScriptedBackend {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(req);

        let content = match self.next_reply() {
            Reply::Text(text) => text,
            Reply::ApiError { status, message } => return Err(LlmError::ApiError { status, message }),
            Reply::Unavailable(msg) => return Err(LlmError::Unavailable(msg)),
            Reply::Delayed(delay, text) => {
                tokio::time::sleep(delay).await;
                text
            }
        };

        Ok(LlmResponse {
            content,
            model: "scripted".to_string(),
            prompt_tokens: 0,
            completion_tokens: 0,
        })
    }

    fn model_id(&self) -> &str { "scripted" }
    fn name(&self) -> &'static str { "scripted" }
    fn is_local(&self) -> bool { true }
    fn max_output_tokens(&self) -> usize { 4_096 }
}

// ── Fixtures ─────────────────────────────────────────────────────────────────

pub mod reports {
    pub const BRCA1_LIKELY_PATHOGENIC: &str = "BRCA1, likely pathogenic, heterozygous";
    pub const UNKNOWN_GENE_VUS: &str =
        "rs80357906 uncertain significance variant in an unspecified gene";
    pub const TESTED_PANEL: &str =
        "Genetic screening. Tested genes: BRCA1, BRCA2, TP53. No reportable findings in the sections below.";
    pub const MEDICATION_QUESTION: &str =
        "what medication should I take for this mutation";
    /// Genetics vocabulary that matches no template.
    pub const UNMATCHED: &str =
        "The lab sequenced several regions and noted a variant near rs123456 that needs follow up.";
}

/// A generative reply that satisfies the response contract.
pub fn valid_translation_json() -> Value {
    json!({
        "disclaimer": "Educational only.",
        "extracted_entities": [
            { "type": "rsid", "value": "rs123456", "confidence": "high" }
        ],
        "summary_plain_english": "Your report mentions one variant identifier.",
        "glossary": [
            { "term": "rsID", "meaning": "Reference SNP identifier", "why_it_matters": "Lets you look the variant up" }
        ],
        "what_this_does_not_mean": ["It is not a diagnosis"],
        "next_steps": [
            {
                "title": "Talk to a genetic counselor",
                "rationale": "Personal interpretation",
                "who_to_talk_to": "Genetic counselor",
                "urgency": "routine"
            }
        ],
        "questions_to_ask": ["What does this variant mean for me?"],
        "sources": [
            { "label": "ClinVar", "url": "https://www.ncbi.nlm.nih.gov/clinvar/", "why_relevant": "Variant lookup" }
        ],
        "refusals": []
    })
}

/// Same record with one enum value broken.
pub fn invalid_urgency_json() -> Value {
    let mut value = valid_translation_json();
    value["next_steps"][0]["urgency"] = json!("immediately");
    value
}
