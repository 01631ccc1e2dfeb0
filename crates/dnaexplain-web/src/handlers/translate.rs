//! POST /api/translate: plain-language translation of a genetic report.
//!
//! Report text never reaches the logs; only its length, the answering tier,
//! and result counts do.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{info, warn};
use uuid::Uuid;

use dnaexplain_common::schema::TranslateRequest;

use crate::error::ApiError;
use crate::handlers::admit;
use crate::state::SharedState;

pub const TIER_HEADER: &str = "x-translation-tier";

pub async fn translate(
    State(state): State<SharedState>,
    headers: HeaderMap,
    payload: Result<Json<TranslateRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let request_id: String = Uuid::new_v4().simple().to_string().chars().take(8).collect();

    admit(
        &state,
        "translate",
        &headers,
        state.limits.translate(),
        "Too many translation requests. Please wait and try again.",
    )?;

    let Json(request) = payload?;
    request.validate().map_err(ApiError::Validation)?;

    info!(request_id = %request_id, text_len = request.text.chars().count(), "Processing translation request");

    let outcome = state
        .translator
        .translate_for(Some(&request_id), &request.text, request.mode.unwrap_or_default())
        .await
        .inspect_err(|e| warn!(request_id = %request_id, error = %e, "Translation failed"))?;

    info!(
        request_id = %request_id,
        tier = outcome.tier.as_str(),
        entities = outcome.result.extracted_entities.len(),
        refusals = outcome.result.refusals.len(),
        "Translation complete"
    );

    let tier = outcome.tier.as_str();
    let mut response = Json(outcome.result).into_response();
    let headers = response.headers_mut();
    headers.insert(HeaderName::from_static(TIER_HEADER), HeaderValue::from_static(tier));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    Ok(response)
}
