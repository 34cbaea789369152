//! Router assembly for the dataset cache API.

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_dataset_handler, dataset_handler, health_handler, metrics_handler, query_handler,
    AppState,
};

/// Builds the router serving every cache endpoint.
///
/// | Method | Path                                 | Handler                 |
/// |--------|--------------------------------------|-------------------------|
/// | GET    | `/datasets/:name`                    | [`dataset_handler`]     |
/// | DELETE | `/datasets/:name`                    | [`clear_dataset_handler`] |
/// | GET    | `/queries/:query_type/:query_value`  | [`query_handler`]       |
/// | GET    | `/metrics`                           | [`metrics_handler`]     |
/// | GET    | `/health`                            | [`health_handler`]      |
///
/// Requests are traced through `tower_http`; CORS is wide open.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/datasets/:name",
            get(dataset_handler).delete(clear_dataset_handler),
        )
        .route("/queries/:query_type/:query_value", get(query_handler))
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .layer(permissive_cors())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn permissive_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}
