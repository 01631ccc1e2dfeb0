//! API errors with HTTP status mapping.
//!
//! Every failure leaves the service as an `ErrorResponse` body. Messages are
//! fixed strings chosen here: backend error bodies and internal faults are
//! logged, never echoed to the client.

use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::rejection::JsonRejection;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::{error, warn};

use dnaexplain_common::rate_limit::RateLimitDecision;
use dnaexplain_common::ErrorResponse;
use dnaexplain_llm::TranslateError;
use dnaexplain_sources::SourceError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid JSON in request body")]
    InvalidJson,

    #[error("validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("{error}")]
    BadRequest { error: &'static str, details: Option<String> },

    #[error("rate limit exceeded")]
    RateLimited { decision: RateLimitDecision, details: &'static str },

    #[error(transparent)]
    Translate(#[from] TranslateError),

    #[error(transparent)]
    Extract(#[from] SourceError),

    #[error("{context}: {detail}")]
    Internal { context: &'static str, detail: String },
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            // Well-formed JSON of the wrong shape, e.g. a missing `text` field
            JsonRejection::JsonDataError(e) => ApiError::Validation(vec![e.body_text()]),
            _ => ApiError::InvalidJson,
        }
    }
}

/// `X-RateLimit-*` headers for a decision; `X-RateLimit-Reset` is a unix timestamp.
pub fn rate_limit_headers(decision: &RateLimitDecision) -> HeaderMap {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or(0);
    let reset = (now + decision.reset_ms).div_ceil(1000);

    let mut headers = HeaderMap::new();
    headers.insert(HeaderName::from_static("x-ratelimit-limit"), HeaderValue::from(decision.limit));
    headers.insert(HeaderName::from_static("x-ratelimit-remaining"), HeaderValue::from(decision.remaining));
    headers.insert(HeaderName::from_static("x-ratelimit-reset"), HeaderValue::from(reset));
    headers
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidJson | ApiError::Validation(_) | ApiError::BadRequest { .. } => {
                StatusCode::BAD_REQUEST
            }
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Translate(TranslateError::Backend(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Translate(TranslateError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Translate(TranslateError::Parse(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Extract(SourceError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Extract(
                SourceError::UnsupportedType(_)
                | SourceError::TooLarge { .. }
                | SourceError::Pdf(_)
                | SourceError::Empty,
            ) => StatusCode::BAD_REQUEST,
            ApiError::Extract(_) | ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorResponse {
        match self {
            ApiError::InvalidJson => ErrorResponse::new("Invalid JSON in request body"),
            ApiError::Validation(messages) => {
                ErrorResponse::new("Validation failed").with_details(messages.join(", "))
            }
            ApiError::BadRequest { error, details } => {
                let body = ErrorResponse::new(*error);
                match details {
                    Some(d) => body.with_details(d.clone()),
                    None => body,
                }
            }
            ApiError::RateLimited { details, .. } => {
                ErrorResponse::new("Rate limit exceeded").with_details(*details)
            }
            ApiError::Translate(TranslateError::Backend(_)) => {
                ErrorResponse::new("Analysis service unavailable")
                    .with_details("The language model provider could not be reached. Please try again.")
            }
            ApiError::Translate(TranslateError::Timeout(_)) => {
                ErrorResponse::new("Analysis timed out")
                    .with_details("The report took too long to analyze. Please try again.")
            }
            ApiError::Translate(TranslateError::Parse(_)) => {
                ErrorResponse::new("Failed to analyze report").with_details(
                    "An error occurred while processing your request. Please try again.",
                )
            }
            ApiError::Extract(SourceError::UnsupportedType(_)) => {
                ErrorResponse::new("Unsupported file type").with_details("Allowed types: PDF, TXT")
            }
            ApiError::Extract(SourceError::TooLarge { max, .. }) => {
                ErrorResponse::new("File too large")
                    .with_details(format!("Maximum file size is {}MB", max / 1024 / 1024))
            }
            ApiError::Extract(SourceError::Pdf(_)) => ErrorResponse::new("Failed to parse PDF").with_details(
                "The PDF file could not be read. It may be corrupted, password-protected, or contain only scanned images.",
            ),
            ApiError::Extract(SourceError::Empty) => ErrorResponse::new("No text found")
                .with_details("The file appears to be empty or contains only images."),
            ApiError::Extract(SourceError::Timeout(_)) => ErrorResponse::new("Processing timed out")
                .with_details("PDF processing timed out. The file may be too large or complex."),
            ApiError::Extract(_) => ErrorResponse::new("Failed to process file")
                .with_details("An unexpected error occurred."),
            ApiError::Internal { context, .. } => ErrorResponse::new(*context)
                .with_details("An unexpected error occurred."),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "Request failed");
        } else if status == StatusCode::TOO_MANY_REQUESTS {
            warn!("Rate limit exceeded");
        }

        let mut response = (status, Json(self.body())).into_response();
        let headers = response.headers_mut();
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));

        if let ApiError::RateLimited { decision, .. } = &self {
            headers.insert(header::RETRY_AFTER, HeaderValue::from(decision.retry_after_secs()));
            headers.extend(rate_limit_headers(decision));
        }
        response
    }
}
