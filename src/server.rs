//! HTTP surface: the citation metrics endpoint and a health check.

use crate::config::Config;
use crate::error::Result;
use crate::models::AuthorMetrics;
use crate::resolver::{Resolution, Resolver};
use crate::strategy::DataSourceStrategy;
use axum::{
    extract::State,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Shared state; built once at startup and never mutated
pub struct AppState {
    pub author_id: String,
    pub resolver: Resolver,
    pub strategies: Vec<Arc<dyn DataSourceStrategy>>,
    pub debug_payload: bool,
}

impl AppState {
    /// Build state from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            author_id: config.author_id.clone(),
            resolver: config.build_resolver(),
            strategies: config.build_strategies()?,
            debug_payload: config.debug_payload,
        })
    }
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET]);

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/scholar", get(scholar_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_handler() -> &'static str {
    "OK"
}

/// Body returned when every data source failed
#[derive(Debug, Serialize)]
struct FailureResponse {
    error: &'static str,
    message: String,
    fallback: AuthorMetrics,
}

/// Extra fields appended to a successful body in debug mode
#[derive(Debug, Serialize)]
struct DebugInfo {
    articles_count: u64,
    has_graph_data: bool,
    graph_years: Vec<i32>,
    failures: Vec<String>,
}

#[derive(Debug, Serialize)]
struct DebugResponse {
    #[serde(flatten)]
    metrics: AuthorMetrics,
    debug: DebugInfo,
}

impl DebugResponse {
    fn from_resolution(resolution: Resolution) -> Self {
        let metrics = resolution.metrics;
        let debug = DebugInfo {
            articles_count: metrics.publication_count,
            has_graph_data: !metrics.citations_by_year.is_empty(),
            graph_years: metrics.citations_by_year.iter().map(|y| y.year).collect(),
            failures: resolution
                .failures
                .iter()
                .map(|f| format!("{}: {}", f.strategy, f.message))
                .collect(),
        };
        Self { metrics, debug }
    }
}

/// Citation metrics endpoint handler
async fn scholar_handler(State(state): State<Arc<AppState>>) -> Response {
    info!(author_id = %state.author_id, "Citation metrics request");

    let resolution = state
        .resolver
        .resolve_detailed(&state.author_id, &state.strategies)
        .await;

    if resolution.is_exhausted() {
        let message = resolution.failure_summary();
        error!(message = %message, "Failed to fetch citation data");
        let body = FailureResponse {
            error: "Failed to fetch citation data",
            message,
            fallback: resolution.metrics,
        };
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
    }

    if state.debug_payload {
        Json(DebugResponse::from_resolution(resolution)).into_response()
    } else {
        Json(resolution.metrics).into_response()
    }
}
