//! dnaexplain-common: Shared types, errors, and admission control used across all DNA Explainer crates.

pub mod error;
pub mod schema;
pub mod validation;
pub mod rate_limit;
pub mod cache;
pub mod sandbox;

// Re-export commonly used types
pub use schema::{
    Confidence, EntityType, ErrorResponse, ExtractedEntity, GlossaryEntry, NextStep, Refusal,
    Source, TranslationResult, Urgency,
};
pub use validation::{validate_translation, ContractViolation};
