mod company;
mod config;
mod db;
mod documents;
mod errors;
mod jobs;
mod llm_client;
mod models;
mod parsing;
mod routes;
mod state;
#[cfg(test)]
mod test_support;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::company::aggregator::CompanyAggregator;
use crate::company::discovery::{SimulatedSearch, UrlDiscovery};
use crate::config::Config;
use crate::db::create_pool;
use crate::documents::store::DocumentStore;
use crate::llm_client::LlmClient;
use crate::parsing::extractor::FallbackExtractor;
use crate::parsing::heuristic::HeuristicExtractor;
use crate::parsing::llm_extractor::LlmExtractor;
use crate::parsing::posting::PostingFetcher;
use crate::routes::build_router;
use crate::state::AppState;

const POSTING_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Job Tracker API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize the description parser: LLM first, heuristic behind it
    let parser_llm = LlmClient::new(config.parser_llm.clone())?;
    if config.parser_llm.api_key.is_none() {
        info!("GROQ_API_KEY not set; descriptions will be parsed heuristically");
    } else {
        info!("Description parser initialized (model: {})", parser_llm.model());
    }
    let extractor = Arc::new(FallbackExtractor::new(
        Arc::new(LlmExtractor::new(parser_llm)),
        Arc::new(HeuristicExtractor),
    ));

    // Initialize company research
    let company_llm = LlmClient::new(config.company_llm.clone())?;
    info!("Company aggregator initialized (model: {})", company_llm.model());
    let company = Arc::new(CompanyAggregator::new(company_llm));
    let discovery = Arc::new(UrlDiscovery::new(Arc::new(SimulatedSearch)));

    // Initialize document storage
    let documents = DocumentStore::new(&config.upload_dir);
    documents.ensure_dirs().await?;
    info!("Document storage ready at {}", config.upload_dir.display());

    let posting = PostingFetcher::new(POSTING_FETCH_TIMEOUT)?;

    // Build app state
    let state = AppState {
        db,
        extractor,
        company,
        discovery,
        documents,
        posting,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the frontend host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
