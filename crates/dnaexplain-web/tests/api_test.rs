//! HTTP surface tests: requests go through the full router with a scripted backend.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;

use dnaexplain_kb::KnowledgeBase;
use dnaexplain_llm::{LlmBackend, Translator, TranslatorConfig};
use dnaexplain_test_utils::{invalid_urgency_json, reports, valid_translation_json, Reply, ScriptedBackend};
use dnaexplain_web::config::Config;
use dnaexplain_web::router::build_router;
use dnaexplain_web::state::AppState;

fn app(backend: Option<Arc<ScriptedBackend>>, config: Config, tc: TranslatorConfig) -> Router {
    let backend = backend.map(|b| -> Arc<dyn LlmBackend> { b });
    let translator = Translator::new(Arc::new(KnowledgeBase::embedded()), backend, tc);
    let state = AppState::new(&config, translator).unwrap();
    build_router(Arc::new(state))
}

fn app_with(backend: Arc<ScriptedBackend>) -> Router {
    app(Some(backend), Config::default(), TranslatorConfig::default())
}

fn translate_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/translate")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn upload_request(content_type: &str, filename: &str, contents: &str) -> Request<Body> {
    let boundary = "dnaexplain-test-boundary";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
         Content-Type: {content_type}\r\n\r\n\
         {contents}\r\n\
         --{boundary}--\r\n"
    );
    Request::builder()
        .method("POST")
        .uri("/api/extract-text")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={boundary}"))
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn tier(response: &Response) -> &str {
    response.headers()["x-translation-tier"].to_str().unwrap()
}

// ── /api/translate ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_prebuilt_answer_skips_backend() {
    let backend = Arc::new(ScriptedBackend::replying(valid_translation_json().to_string()));
    let response = app_with(backend.clone())
        .oneshot(translate_request(json!({ "text": reports::BRCA1_LIKELY_PATHOGENIC })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(tier(&response), "prebuilt");
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
    let body = json_body(response).await;
    assert!(body["summary_plain_english"].as_str().unwrap().contains("BRCA1"));
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn test_generative_answer() {
    let backend = Arc::new(ScriptedBackend::replying(valid_translation_json().to_string()));
    let response = app_with(backend.clone())
        .oneshot(translate_request(json!({ "text": reports::UNMATCHED })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(tier(&response), "generative");
    let body = json_body(response).await;
    assert_eq!(body["summary_plain_english"], "Your report mentions one variant identifier.");
    assert_eq!(backend.calls(), 1);
}

#[tokio::test]
async fn test_contract_violation_returns_fallback_with_200() {
    let backend = Arc::new(ScriptedBackend::replying(invalid_urgency_json().to_string()));
    let response = app_with(backend)
        .oneshot(translate_request(json!({ "text": reports::UNMATCHED })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(tier(&response), "fallback");
    let body = json_body(response).await;
    assert_eq!(body["refusals"], json!([]));
}

#[tokio::test]
async fn test_backend_failure_is_502_without_upstream_detail() {
    let backend = Arc::new(ScriptedBackend::new().with(Reply::ApiError {
        status: 500,
        message: "upstream stack trace".into(),
    }));
    let response = app_with(backend)
        .oneshot(translate_request(json!({ "text": reports::UNMATCHED })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = json_body(response).await;
    assert!(!body.to_string().contains("upstream stack trace"));
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_prose_reply_is_500() {
    let backend = Arc::new(ScriptedBackend::replying("Sorry, I can only answer in prose."));
    let response = app_with(backend)
        .oneshot(translate_request(json!({ "text": reports::UNMATCHED })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(response).await["error"], "Failed to analyze report");
}

#[tokio::test]
async fn test_slow_backend_is_504() {
    let backend = Arc::new(ScriptedBackend::new().with(Reply::Delayed(
        Duration::from_secs(2),
        valid_translation_json().to_string(),
    )));
    let tc = TranslatorConfig { timeout: Duration::from_millis(50), ..TranslatorConfig::default() };
    let response = app(Some(backend), Config::default(), tc)
        .oneshot(translate_request(json!({ "text": reports::UNMATCHED })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
}

#[tokio::test]
async fn test_prebuilt_only_request_never_calls_backend() {
    let backend = Arc::new(ScriptedBackend::replying(valid_translation_json().to_string()));
    let response = app_with(backend.clone())
        .oneshot(translate_request(json!({ "text": reports::UNMATCHED, "mode": "prebuilt_only" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(tier(&response), "prebuilt_only");
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn test_no_backend_runs_prebuilt_only() {
    let response = app(None, Config::default(), TranslatorConfig::default())
        .oneshot(translate_request(json!({ "text": reports::UNMATCHED })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(tier(&response), "prebuilt_only");
}

#[tokio::test]
async fn test_invalid_json_is_400() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/translate")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ not json"))
        .unwrap();
    let response = app_with(Arc::new(ScriptedBackend::new())).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "Invalid JSON in request body");
}

#[tokio::test]
async fn test_short_text_fails_validation() {
    let response = app_with(Arc::new(ScriptedBackend::new()))
        .oneshot(translate_request(json!({ "text": "BRCA1" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Validation failed");
    assert!(body["details"].as_str().unwrap().contains("at least 10 characters"));
}

#[tokio::test]
async fn test_missing_text_fails_validation() {
    let response = app_with(Arc::new(ScriptedBackend::new()))
        .oneshot(translate_request(json!({ "mode": "auto" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "Validation failed");
}

#[tokio::test]
async fn test_translate_rate_limit_per_client() {
    let mut config = Config::default();
    config.rate_limits.translate_per_min = 2;
    let app = app(Some(Arc::new(ScriptedBackend::new())), config, TranslatorConfig::default());

    let from = |ip: &str| {
        let mut req = translate_request(json!({ "text": reports::BRCA1_LIKELY_PATHOGENIC }));
        req.headers_mut().insert("x-forwarded-for", ip.parse().unwrap());
        req
    };

    for _ in 0..2 {
        let ok = app.clone().oneshot(from("203.0.113.7")).await.unwrap();
        assert_eq!(ok.status(), StatusCode::OK);
    }
    let limited = app.clone().oneshot(from("203.0.113.7")).await.unwrap();
    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(limited.headers().contains_key(header::RETRY_AFTER));
    assert_eq!(limited.headers()["x-ratelimit-remaining"], "0");
    assert_eq!(json_body(limited).await["error"], "Rate limit exceeded");

    let other = app.oneshot(from("198.51.100.2")).await.unwrap();
    assert_eq!(other.status(), StatusCode::OK);
}

// ── Lookups ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_clinvar_requires_query() {
    let request = Request::builder().uri("/api/clinvar").body(Body::empty()).unwrap();
    let response = app_with(Arc::new(ScriptedBackend::new())).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "Query parameter is required");
}

#[tokio::test]
async fn test_clinvar_rejects_overlong_query() {
    let uri = format!("/api/clinvar?query={}", "a".repeat(501));
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app_with(Arc::new(ScriptedBackend::new())).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "Validation failed");
}

#[tokio::test]
async fn test_literature_validates_genes() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/literature")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "genes": [], "max_results": 20 }).to_string()))
        .unwrap();
    let response = app_with(Arc::new(ScriptedBackend::new())).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    let details = body["details"].as_str().unwrap();
    assert!(details.contains("between 1 and 3 genes"));
    assert!(details.contains("max_results"));
}

// ── /api/extract-text ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_extract_plain_text_upload() {
    let response = app_with(Arc::new(ScriptedBackend::new()))
        .oneshot(upload_request("text/plain", "report.txt", "BRCA1 c.68_69delAG\r\n\r\n\r\n\r\nHeterozygous"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["text"], "BRCA1 c.68_69delAG\n\nHeterozygous");
    assert_eq!(body["meta"]["filename"], "report.txt");
    assert!(body["meta"].get("pages").is_none());
}

#[tokio::test]
async fn test_extract_rejects_unsupported_type() {
    let response = app_with(Arc::new(ScriptedBackend::new()))
        .oneshot(upload_request("image/png", "scan.png", "not really a png"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "Unsupported file type");
}

#[tokio::test]
async fn test_extract_without_file_field() {
    let boundary = "b";
    let body = format!("--{boundary}\r\nContent-Disposition: form-data; name=\"other\"\r\n\r\nx\r\n--{boundary}--\r\n");
    let request = Request::builder()
        .method("POST")
        .uri("/api/extract-text")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={boundary}"))
        .body(Body::from(body))
        .unwrap();
    let response = app_with(Arc::new(ScriptedBackend::new())).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "No file provided");
}

// ── /api/health ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_health_reports_tiers() {
    let request = Request::builder().uri("/api/health").body(Body::empty()).unwrap();
    let response = app_with(Arc::new(ScriptedBackend::new())).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["tiers"], json!({ "prebuilt": true, "generative": true }));
    assert_eq!(body["model"], "scripted");
    assert!(body["supported_genes"].as_array().unwrap().iter().any(|g| g == "BRCA1"));
}

#[tokio::test]
async fn test_health_without_backend() {
    let request = Request::builder().uri("/api/health").body(Body::empty()).unwrap();
    let response = app(None, Config::default(), TranslatorConfig::default())
        .oneshot(request)
        .await
        .unwrap();

    let body = json_body(response).await;
    assert_eq!(body["tiers"]["generative"], false);
    assert!(body.get("model").is_none());
}
