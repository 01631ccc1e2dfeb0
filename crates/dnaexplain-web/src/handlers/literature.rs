//! POST /api/literature: suggested PubMed reading for selected genes.
//!
//! Only the chosen gene and topic keywords are sent to PubMed, never report text.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::info;

use dnaexplain_common::schema::LiteratureRequest;

use crate::error::{rate_limit_headers, ApiError};
use crate::handlers::admit;
use crate::state::SharedState;

pub async fn literature_search(
    State(state): State<SharedState>,
    headers: HeaderMap,
    payload: Result<Json<LiteratureRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let decision = admit(
        &state,
        "literature",
        &headers,
        state.limits.literature(),
        "Too many literature searches. Please wait and try again.",
    )?;

    let Json(request) = payload?;
    request.validate().map_err(ApiError::Validation)?;

    let result = state.literature.search(&request).await.map_err(|e| ApiError::Internal {
        context: "Failed to fetch literature",
        detail: e.to_string(),
    })?;
    info!(genes = request.genes.len(), articles = result.articles.len(), "Literature search complete");

    let mut response = Json(result).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=3600, s-maxage=86400, stale-while-revalidate=604800"),
    );
    headers.extend(rate_limit_headers(&decision));
    Ok(response)
}
