//! Response DTOs for the cache API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheMetrics;
use crate::data::Row;

/// Response body for GET /datasets/:name
#[derive(Debug, Clone, Serialize)]
pub struct DatasetResponse {
    /// Dataset name
    pub name: String,
    /// Number of rows in the whole dataset
    pub total_rows: usize,
    /// Leading rows, up to the requested limit
    pub rows: Vec<Row>,
}

impl DatasetResponse {
    /// Creates a DatasetResponse keeping the first `limit` rows
    pub fn new(name: impl Into<String>, mut rows: Vec<Row>, limit: usize) -> Self {
        let total_rows = rows.len();
        rows.truncate(limit);
        Self {
            name: name.into(),
            total_rows,
            rows,
        }
    }
}

/// Response body for DELETE /datasets/:name
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    /// Human readable outcome
    pub message: String,
    /// Dataset name
    pub name: String,
    /// 1 if a cached entry was removed, 0 otherwise
    pub deleted: u64,
}

impl ClearResponse {
    /// Creates a new ClearResponse
    pub fn new(name: impl Into<String>, deleted: u64) -> Self {
        let name = name.into();
        let message = if deleted > 0 {
            format!("Dataset '{}' cleared from cache", name)
        } else {
            format!("Dataset '{}' was not cached", name)
        };
        Self {
            message,
            name,
            deleted,
        }
    }
}

/// Response body for GET /queries/:query_type/:query_value
#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    /// Dataset the query runs over
    pub dataset: String,
    pub query_type: String,
    pub query_value: String,
    /// Result rows
    pub rows: Vec<Row>,
    /// Wall time spent answering, in milliseconds
    pub elapsed_ms: u128,
}

/// Response body for GET /metrics
#[derive(Debug, Clone, Serialize)]
pub struct MetricsResponse {
    /// Number of query cache hits
    pub hits: u64,
    /// Number of query cache misses
    pub misses: u64,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<CacheMetrics> for MetricsResponse {
    fn from(metrics: CacheMetrics) -> Self {
        Self {
            hits: metrics.hits,
            misses: metrics.misses,
            hit_rate: metrics.hit_rate(),
        }
    }
}

/// Response body for GET /health
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always "healthy" when the process answers
    pub status: String,
    /// Crate version serving the request
    pub version: String,
    /// RFC 3339 time of the check
    pub timestamp: String,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// JSON body returned with every error status.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Value;

    #[test]
    fn test_dataset_response_truncates() {
        let rows: Vec<Row> = (0..5)
            .map(|i| {
                let mut row = Row::new();
                row.insert("ID".to_string(), Value::Int(i));
                row
            })
            .collect();
        let resp = DatasetResponse::new("airlines", rows, 2);

        assert_eq!(resp.total_rows, 5);
        assert_eq!(resp.rows.len(), 2);
    }

    #[test]
    fn test_clear_response_message() {
        assert!(ClearResponse::new("flights", 1).message.contains("cleared"));
        assert!(ClearResponse::new("flights", 0)
            .message
            .contains("not cached"));
    }

    #[test]
    fn test_metrics_response_hit_rate() {
        let resp = MetricsResponse::from(CacheMetrics {
            hits: 80,
            misses: 20,
        });
        assert!((resp.hit_rate - 0.8).abs() < 0.001);
    }

    #[test]
    fn test_health_response_reports_version() {
        let value = serde_json::to_value(HealthResponse::healthy()).unwrap();
        assert_eq!(value["status"], "healthy");
        assert_eq!(value["version"], env!("CARGO_PKG_VERSION"));
        assert!(value["timestamp"].as_str().is_some());
    }

    #[test]
    fn test_error_response_shape() {
        let value = serde_json::to_value(ErrorResponse::new("Unknown dataset: trains")).unwrap();
        assert_eq!(value, serde_json::json!({"error": "Unknown dataset: trains"}));
    }
}
