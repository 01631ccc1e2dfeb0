//! Axum router: maps all URL paths to handlers.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::{
    cors::CorsLayer,
    trace::TraceLayer,
    compression::CompressionLayer,
};
use dnaexplain_sources::extract::MAX_FILE_SIZE;

use crate::state::SharedState;
use crate::handlers::{
    translate::translate,
    clinvar::clinvar_lookup,
    literature::literature_search,
    extract::extract_document,
    health::health,
};

/// Room for multipart framing around a maximum-size upload.
const UPLOAD_BODY_LIMIT: usize = MAX_FILE_SIZE + 64 * 1024;

/// Build and return the full Axum router.
pub fn build_router(shared: SharedState) -> Router {
    Router::new()
        .route("/api/translate",    post(translate))
        .route("/api/clinvar",      get(clinvar_lookup))
        .route("/api/literature",   post(literature_search))
        .route("/api/extract-text", post(extract_document).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)))
        .route("/api/health",       get(health))

        // Middleware
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}
