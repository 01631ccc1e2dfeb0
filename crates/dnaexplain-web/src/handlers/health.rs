//! GET /api/health: liveness plus which answer tiers are available.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::SharedState;

#[derive(Debug, Serialize)]
pub struct TierStatus {
    pub prebuilt: bool,
    pub generative: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub tiers: TierStatus,
    pub provider: String,
    /// Model of the active backend; absent in prebuilt-only mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub supported_genes: Vec<String>,
}

pub async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let translator = &state.translator;
    let kb = translator.knowledge_base();
    let generative = !translator.is_prebuilt_only();

    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        tiers: TierStatus { prebuilt: !kb.is_empty(), generative },
        provider: state.provider.clone(),
        model: translator.backend().filter(|_| generative).map(|b| b.model_id().to_string()),
        supported_genes: kb.supported_genes(),
    })
}
