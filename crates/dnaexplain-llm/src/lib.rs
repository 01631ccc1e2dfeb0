//! dnaexplain-llm: generative tier and translation orchestration.
//! Provider-agnostic backends, prompt assembly, output recovery, and the
//! tiered `Translator` that ties the prebuilt and generative paths together.

pub mod backend;
pub mod provider;
pub mod prompt;
pub mod parse;
pub mod fallback;
pub mod refusals;
pub mod audit;
pub mod orchestrator;

pub use backend::{LlmBackend, LlmError, LlmRequest, LlmResponse, Message};
pub use orchestrator::{Tier, TranslateError, TranslateOutcome, Translator, TranslatorConfig};
pub use provider::{build_backend, BackendConfig, BackendKind};
