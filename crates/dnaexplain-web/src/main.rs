//! DNA Explainer API server
//!
//! Run with: cargo run -p dnaexplain-web

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use dnaexplain_kb::knowledge_base::init_shared;
use dnaexplain_llm::{build_backend, Translator};
use dnaexplain_web::config::Config;
use dnaexplain_web::router::build_router;
use dnaexplain_web::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is normal
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("dnaexplain=debug,info")),
        )
        .init();

    info!("Starting DNA Explainer v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load()?;

    let kb = init_shared(&config.knowledge_base.dirs);

    let backend = if config.llm.prebuilt_only {
        None
    } else {
        build_backend(&config.backend_config()?)?
    };
    match &backend {
        Some(b) => info!(backend = b.name(), model = b.model_id(), local = b.is_local(), "Generative tier enabled"),
        None => warn!("Running in prebuilt-only mode: reports without a matching template get generic guidance"),
    }

    let translator = Translator::new(kb, backend, config.translator_config());
    let state = Arc::new(AppState::new(&config, translator)?);
    spawn_cache_sweeper(Arc::clone(&state), config.cache_cleanup_interval());
    let app = build_router(state);

    let listener = TcpListener::bind(&config.server.bind).await?;
    info!("Server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Periodic sweep of expired lookup results and idle rate-limit keys; caches
/// also evict lazily on read.
fn spawn_cache_sweeper(state: Arc<AppState>, every: Duration) {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(every);
        tick.tick().await;
        loop {
            tick.tick().await;
            let evicted = state.cleanup_caches();
            if evicted > 0 {
                info!(evicted, "Expired lookup results evicted");
            }
            let idle = state.limiter.sweep();
            if idle > 0 {
                info!(idle, "Idle rate-limit keys dropped");
            }
        }
    });
}
