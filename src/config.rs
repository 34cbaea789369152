//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Which key-value store backs the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// External Redis server
    Redis,
    /// In-process store, useful for local runs without Redis
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "redis" => Ok(StoreBackend::Redis),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend '{}'", other)),
        }
    }
}

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Redis host name
    pub redis_host: String,
    /// Redis port
    pub redis_port: u16,
    /// Redis database index
    pub redis_db: i64,
    /// Target number of chunks a dataset is split into
    pub default_chunks: usize,
    /// TTL in seconds applied to dataset and query entries alike
    pub cache_ttl: u64,
    /// Directory holding the source CSV files
    pub data_dir: PathBuf,
    /// HTTP server port
    pub server_port: u16,
    /// Store implementation
    pub store_backend: StoreBackend,
    /// Expiry sweep interval in seconds for the memory backend
    pub cleanup_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `REDIS_HOST` - Redis host (default: localhost)
    /// - `REDIS_PORT` - Redis port (default: 6379)
    /// - `REDIS_DB` - Redis database index (default: 0)
    /// - `DEFAULT_CHUNKS` - Target chunk count per dataset (default: 100)
    /// - `CACHE_TTL` - Entry TTL in seconds (default: 300)
    /// - `DATA_DIR` - Source CSV directory (default: data)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `STORE_BACKEND` - `redis` or `memory` (default: redis)
    /// - `CLEANUP_INTERVAL` - Memory backend sweep in seconds (default: 1)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            redis_host: env::var("REDIS_HOST").unwrap_or(defaults.redis_host),
            redis_port: parse_var("REDIS_PORT").unwrap_or(defaults.redis_port),
            redis_db: parse_var("REDIS_DB").unwrap_or(defaults.redis_db),
            default_chunks: parse_var("DEFAULT_CHUNKS").unwrap_or(defaults.default_chunks),
            cache_ttl: parse_var("CACHE_TTL").unwrap_or(defaults.cache_ttl),
            data_dir: env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            store_backend: parse_var("STORE_BACKEND").unwrap_or(defaults.store_backend),
            cleanup_interval: parse_var("CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
        }
    }

    /// Connection URL for the configured Redis database.
    pub fn redis_url(&self) -> String {
        format!(
            "redis://{}:{}/{}",
            self.redis_host, self.redis_port, self.redis_db
        )
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis_host: "localhost".to_string(),
            redis_port: 6379,
            redis_db: 0,
            default_chunks: 100,
            cache_ttl: 300,
            data_dir: PathBuf::from("data"),
            server_port: 3000,
            store_backend: StoreBackend::Redis,
            cleanup_interval: 1,
        }
    }
}
