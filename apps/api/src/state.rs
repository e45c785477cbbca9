use std::sync::Arc;

use sqlx::PgPool;

use crate::company::aggregator::CompanyAggregator;
use crate::company::discovery::UrlDiscovery;
use crate::documents::store::DocumentStore;
use crate::parsing::extractor::FallbackExtractor;
use crate::parsing::posting::PostingFetcher;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// LLM extractor with the heuristic extractor behind it.
    pub extractor: Arc<FallbackExtractor>,
    pub company: Arc<CompanyAggregator>,
    /// Default: `SimulatedSearch`. Swap the provider for a real search API.
    pub discovery: Arc<UrlDiscovery>,
    pub documents: DocumentStore,
    pub posting: PostingFetcher,
}
