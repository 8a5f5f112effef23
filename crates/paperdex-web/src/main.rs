use std::sync::Arc;
use std::time::Duration;

use paperdex_common::{AppConfig, EmbedderKind, HttpClient, SourceKind};
use paperdex_engine::RetrievalEngine;
use paperdex_scraper::sources::arxiv::ArxivClient;
use paperdex_scraper::sources::listing::ListingClient;
use paperdex_scraper::{PageSelector, PaperSource};
use paperdex_store::{Embedder, HashEmbedder, LanceStore, OpenAiEmbedder};
use paperdex_web::router::build_router;
use paperdex_web::state::AppState;
use paperdex_web::refresh;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = AppConfig::from_env()?;
    let http = HttpClient::with_timeout(cfg.http_timeout)?;

    let embedder: Arc<dyn Embedder> = match &cfg.embedder {
        EmbedderKind::Local => Arc::new(HashEmbedder::new()),
        EmbedderKind::OpenAi { api_key, model } => Arc::new(OpenAiEmbedder::new(
            http.clone(),
            api_key.clone(),
            model.clone(),
        )),
    };

    let store = LanceStore::open(&cfg.data_dir, embedder).await?;
    info!(data_dir = %cfg.data_dir, "Document store opened");

    let source: Arc<dyn PaperSource> = match cfg.source {
        SourceKind::Arxiv => Arc::new(ArxivClient::new(http.clone())),
        SourceKind::ListingTrending => {
            Arc::new(ListingClient::new(http.clone(), PageSelector::Trending))
        }
        SourceKind::ListingLatest => {
            Arc::new(ListingClient::new(http.clone(), PageSelector::Latest))
        }
    };

    let engine = RetrievalEngine::new(Arc::new(store), source);

    if let Some(hours) = cfg.refresh_hours {
        if !cfg.refresh_topics.is_empty() {
            refresh::spawn_refresh(
                engine.clone(),
                cfg.refresh_topics.clone(),
                Duration::from_secs(hours * 3600),
            );
        }
    }

    let app = build_router(AppState { engine });
    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    info!("paperdex listening on http://{}", cfg.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.ok();
    info!("Shutdown signal received");
}
