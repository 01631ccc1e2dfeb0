//! dnaexplain-web: HTTP API for DNA Explainer.
//! Provides:
//!   - Report translation (prebuilt templates, generative tier, fallback)
//!   - ClinVar variant lookup
//!   - PubMed suggested reading
//!   - PDF / text upload extraction
//!   - Health and tier availability

pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;
