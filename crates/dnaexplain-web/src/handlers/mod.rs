//! HTTP handlers for all API routes.

pub mod translate;
pub mod clinvar;
pub mod literature;
pub mod extract;
pub mod health;

use axum::http::HeaderMap;

use dnaexplain_common::rate_limit::{RateLimitConfig, RateLimitDecision};

use crate::error::ApiError;
use crate::state::AppState;

/// Client identity for rate limiting: first `X-Forwarded-For` hop, then
/// `X-Real-IP`, then `unknown`.
pub fn client_ip(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };
    forwarded.or_else(real_ip).unwrap_or("unknown").to_string()
}

/// Count one request against `feature:<client>`; errors once the window is full.
pub(crate) fn admit(
    state: &AppState,
    feature: &str,
    headers: &HeaderMap,
    cfg: RateLimitConfig,
    details: &'static str,
) -> Result<RateLimitDecision, ApiError> {
    let key = format!("{feature}:{}", client_ip(headers));
    let decision = state.limiter.check(&key, cfg);
    if decision.allowed {
        Ok(decision)
    } else {
        Err(ApiError::RateLimited { decision, details })
    }
}
