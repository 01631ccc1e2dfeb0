//! POST /api/extract-text: text from an uploaded PDF or plain-text report.

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::info;

use dnaexplain_sources::extract::{extract_text, MAX_FILE_SIZE};

use crate::error::ApiError;
use crate::handlers::admit;
use crate::state::SharedState;

const FILE_FIELD: &str = "file";

fn upload_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::BadRequest {
            error: "File too large",
            details: Some(format!("Maximum file size is {}MB", MAX_FILE_SIZE / 1024 / 1024)),
        }
    } else {
        ApiError::BadRequest { error: "Failed to read upload", details: None }
    }
}

pub async fn extract_document(
    State(state): State<SharedState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    admit(
        &state,
        "extract-text",
        &headers,
        state.limits.extract(),
        "Too many file extractions. Please wait and try again.",
    )?;

    let mut multipart = multipart.map_err(|_| ApiError::BadRequest {
        error: "Expected multipart/form-data",
        details: None,
    })?;

    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let mime = field.content_type().unwrap_or("application/octet-stream").to_string();
        let filename = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.map_err(upload_error)?;

        let document = extract_text(bytes.to_vec(), &mime, filename).await?;
        info!(mime = %mime, chars = document.meta.chars, pages = ?document.meta.pages, "Upload converted to text");

        let mut response = Json(document).into_response();
        let headers = response.headers_mut();
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
        headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
        return Ok(response);
    }

    Err(ApiError::BadRequest { error: "No file provided", details: None })
}
