//! Redis Store Module
//!
//! `KvStore` over a multiplexed async Redis connection.

use std::collections::HashMap;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tracing::info;

use crate::error::{CacheError, Result};
use crate::store::KvStore;

// == Redis Store ==
/// Store backed by a Redis server.
#[derive(Clone)]
pub struct RedisStore {
    conn: MultiplexedConnection,
}

impl RedisStore {
    /// Opens a connection to `url` (`redis://host:port/db`).
    ///
    /// Any failure here is reported as [`CacheError::Connection`].
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| CacheError::Connection(format!("{}: {}", url, e)))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| CacheError::Connection(format!("{}: {}", url, e)))?;
        info!("Connected to Redis at {}", url);
        Ok(Self { conn })
    }

    fn conn(&self) -> MultiplexedConnection {
        self.conn.clone()
    }
}

#[async_trait]
impl KvStore for RedisStore {
    async fn ping(&self) -> Result<()> {
        let reply: String = redis::cmd("PING").query_async(&mut self.conn()).await?;
        if reply == "PONG" {
            Ok(())
        } else {
            Err(CacheError::Connection(format!(
                "unexpected PING reply '{}'",
                reply
            )))
        }
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.conn().exists(key).await?)
    }

    async fn del(&self, key: &str) -> Result<u64> {
        Ok(self.conn().del(key).await?)
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<()> {
        let _: i64 = self.conn().hset(key, field, value).await?;
        Ok(())
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>> {
        Ok(self.conn().hgetall(key).await?)
    }

    async fn hlen(&self, key: &str) -> Result<u64> {
        Ok(self.conn().hlen(key).await?)
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>> {
        Ok(self.conn().hget(key, field).await?)
    }

    async fn expire(&self, key: &str, seconds: u64) -> Result<bool> {
        let applied: i64 = redis::cmd("EXPIRE")
            .arg(key)
            .arg(seconds)
            .query_async(&mut self.conn())
            .await?;
        Ok(applied == 1)
    }

    async fn incr(&self, key: &str) -> Result<u64> {
        Ok(self.conn().incr(key, 1_u64).await?)
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.conn().get(key).await?)
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        redis::cmd("RENAME")
            .arg(from)
            .arg(to)
            .query_async::<_, ()>(&mut self.conn())
            .await?;
        Ok(())
    }
}
