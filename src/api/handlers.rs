//! API Handlers
//!
//! HTTP request handlers for each cache endpoint.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::info;

use crate::analytics::{run_query, MonthFilter, QueryKind, FLIGHTS};
use crate::cache::CacheFacade;
use crate::error::{CacheError, Result};
use crate::models::{
    ClearResponse, DatasetQuery, DatasetResponse, HealthResponse, MetricsResponse, QueryResponse,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Cache facade; connected once at startup
    pub cache: Arc<CacheFacade>,
}

impl AppState {
    /// Creates a new AppState around a connected facade.
    pub fn new(cache: CacheFacade) -> Self {
        Self {
            cache: Arc::new(cache),
        }
    }
}

/// Handler for GET /datasets/:name
///
/// Loads the dataset from the cache, populating it from the source on a miss.
pub async fn dataset_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<DatasetQuery>,
) -> Result<Json<DatasetResponse>> {
    if let Some(error_msg) = params.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let started = Instant::now();
    let rows = state.cache.dataset(&name).await?;
    info!(
        "Served {} ({} rows) in {:.2}s",
        name,
        rows.len(),
        started.elapsed().as_secs_f64()
    );

    Ok(Json(DatasetResponse::new(name, rows, params.limit())))
}

/// Handler for DELETE /datasets/:name
pub async fn clear_dataset_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ClearResponse>> {
    let deleted = state.cache.clear_dataset(&name).await?;
    Ok(Json(ClearResponse::new(name, deleted)))
}

/// Handler for GET /queries/:query_type/:query_value
///
/// Returns the cached aggregation or computes it over the cached datasets.
pub async fn query_handler(
    State(state): State<AppState>,
    Path((query_type, query_value)): Path<(String, String)>,
) -> Result<Json<QueryResponse>> {
    let kind: QueryKind = query_type.parse()?;
    let filter: MonthFilter = query_value.parse()?;

    let started = Instant::now();
    let rows = run_query(&state.cache, kind, filter).await?;
    let elapsed = started.elapsed();
    info!(
        "Answered {} for {} in {:.2}s",
        kind.as_str(),
        filter,
        elapsed.as_secs_f64()
    );

    Ok(Json(QueryResponse {
        dataset: FLIGHTS.to_string(),
        query_type: kind.as_str().to_string(),
        query_value: filter.to_string(),
        rows,
        elapsed_ms: elapsed.as_millis(),
    }))
}

/// Handler for GET /metrics
///
/// Returns the query cache hit/miss totals.
pub async fn metrics_handler(State(state): State<AppState>) -> Result<Json<MetricsResponse>> {
    let metrics = state.cache.cache_metrics().await?;
    Ok(Json(MetricsResponse::from(metrics)))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
