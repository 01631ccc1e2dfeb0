//! GET /api/clinvar?query=: ClinVar variant lookup.

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use dnaexplain_common::schema::ClinvarRequest;

use crate::error::ApiError;
use crate::handlers::admit;
use crate::state::SharedState;

#[derive(Debug, Deserialize)]
pub struct ClinvarQuery {
    pub query: Option<String>,
}

pub async fn clinvar_lookup(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(params): Query<ClinvarQuery>,
) -> Result<Response, ApiError> {
    admit(
        &state,
        "clinvar",
        &headers,
        state.limits.clinvar(),
        "Too many variant lookups. Please wait and try again.",
    )?;

    let Some(query) = params.query.filter(|q| !q.is_empty()) else {
        return Err(ApiError::BadRequest { error: "Query parameter is required", details: None });
    };
    let request = ClinvarRequest { query };
    request.validate().map_err(ApiError::Validation)?;

    // Lookup failures come back as `found: false` with an error string
    let result = state.clinvar.lookup(&request.query).await;

    let mut response = Json(result).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("public, max-age=300"));
    Ok(response)
}
