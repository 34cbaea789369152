//! Request DTOs for the cache API
//!
//! Defines the query string parameters accepted by the endpoints.

use serde::Deserialize;

/// Default number of rows returned by GET /datasets/:name
pub const DEFAULT_ROW_LIMIT: usize = 20;

/// Upper bound on rows returned by GET /datasets/:name
pub const MAX_ROW_LIMIT: usize = 10_000;

/// Query string for GET /datasets/:name
///
/// # Fields
/// - `limit`: How many leading rows to include in the response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatasetQuery {
    /// Optional row limit
    #[serde(default)]
    pub limit: Option<usize>,
}

impl DatasetQuery {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        match self.limit {
            Some(limit) if limit > MAX_ROW_LIMIT => Some(format!(
                "limit exceeds maximum of {} rows",
                MAX_ROW_LIMIT
            )),
            _ => None,
        }
    }

    /// The effective row limit.
    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_ROW_LIMIT)
    }
}
