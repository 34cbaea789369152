//! API Module
//!
//! HTTP handlers and routing for the dataset cache REST API.
//!
//! # Endpoints
//! - `GET /datasets/:name` - Load a dataset through the cache
//! - `DELETE /datasets/:name` - Drop a cached dataset
//! - `GET /queries/:query_type/:query_value` - Cached aggregation result
//! - `GET /metrics` - Query cache hit/miss totals
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
