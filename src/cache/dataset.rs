//! Dataset Cache Module
//!
//! Stores a whole dataset as one hash entry whose fields are chunk indices and
//! whose values are serialized chunks. The entry carries a single TTL, so all
//! chunks of a dataset expire together.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::chunking::compute_chunk_size;
use crate::cache::keys::{chunk_field, dataset_key, staging_key};
use crate::data::{decode_rows, encode_rows, Row, SourceReader};
use crate::error::{CacheError, Result};
use crate::store::KvStore;

/// Chunks read ahead of the store writes.
const READ_AHEAD_CHUNKS: usize = 2;

// == Dataset Cache ==
/// Cache-aside storage for full datasets.
#[derive(Clone)]
pub struct DatasetCache {
    store: Arc<dyn KvStore>,
    source: Arc<dyn SourceReader>,
    /// TTL in seconds applied to each dataset entry
    ttl: u64,
    /// Number of chunks a dataset is split into
    target_chunks: usize,
}

impl DatasetCache {
    pub fn new(
        store: Arc<dyn KvStore>,
        source: Arc<dyn SourceReader>,
        ttl: u64,
        target_chunks: usize,
    ) -> Self {
        Self {
            store,
            source,
            ttl,
            target_chunks,
        }
    }

    // == Populate ==
    /// Reads `name` from the source and writes it into the cache.
    ///
    /// Any previous entry is deleted first. Chunks are written to a private
    /// staging key which is renamed onto the dataset key only once every chunk
    /// is in place, so readers never see a partial entry and two concurrent
    /// populates never interleave chunks. The staging key's TTL is refreshed
    /// after every chunk, so an abandoned attempt still expires, and the
    /// staged chunk count is checked before the rename.
    ///
    /// Returns the number of chunks written.
    pub async fn populate(&self, name: &str) -> Result<usize> {
        let key = dataset_key(name);
        self.store.del(&key).await?;

        let chunk_size = compute_chunk_size(self.source.clone(), name, self.target_chunks).await?;
        info!(
            "Reading {} from source (slow), chunk size {}",
            name, chunk_size
        );

        let staging = staging_key(name);
        let outcome = self.write_chunks(name, &staging, chunk_size).await;
        let (chunks, rows) = match outcome {
            Ok(written) => written,
            Err(err) => {
                self.discard(&staging).await;
                warn!("Failed to cache {}: {}", name, err);
                return Err(err);
            }
        };

        if chunks == 0 {
            warn!("Failed to cache {}: source yielded no rows", name);
            return Err(CacheError::EmptyDataset(name.to_string()));
        }

        if let Err(err) = self.commit(&staging, &key, chunks).await {
            self.discard(&staging).await;
            warn!("Failed to cache {}: {}", name, err);
            return Err(err);
        }

        info!(
            "Successfully cached {} ({} rows in {} chunks)",
            name, rows, chunks
        );
        Ok(chunks)
    }

    /// Streams chunks from the source into `staging`. Returns (chunks, rows).
    async fn write_chunks(
        &self,
        name: &str,
        staging: &str,
        chunk_size: usize,
    ) -> Result<(usize, usize)> {
        let (mut received, reader) = spawn_chunk_reader(self.source.clone(), name, chunk_size);
        let mut chunks = 0;
        let mut rows = 0;
        while let Some(chunk) = received.recv().await {
            let chunk = chunk?;
            let payload = encode_rows(&chunk)?;
            self.store
                .hset(staging, &chunk_field(chunks), &payload)
                .await?;
            self.store.expire(staging, self.ttl).await?;
            debug!("Cached {} chunk {} ({} rows)", name, chunks, chunk.len());
            chunks += 1;
            rows += chunk.len();
        }
        reader
            .await
            .map_err(|e| CacheError::Internal(format!("reading {} failed: {}", name, e)))?;
        Ok((chunks, rows))
    }

    /// Moves a fully written stage onto `key` and gives it the full TTL.
    async fn commit(&self, staging: &str, key: &str, chunks: usize) -> Result<()> {
        let staged = self.store.hlen(staging).await?;
        if staged != chunks as u64 {
            return Err(CacheError::Store(format!(
                "{} holds {} of {} chunks",
                staging, staged, chunks
            )));
        }
        self.store.rename(staging, key).await?;
        if !self.store.expire(key, self.ttl).await? {
            return Err(CacheError::Store(format!(
                "{} expired before its TTL was set",
                key
            )));
        }
        Ok(())
    }

    async fn discard(&self, staging: &str) {
        if let Err(err) = self.store.del(staging).await {
            warn!("Could not remove staging entry {}: {}", staging, err);
        }
    }

    // == Load ==
    /// Reassembles `name` from the cache.
    ///
    /// Returns `Ok(None)` when nothing is cached. Chunks are ordered by their
    /// numeric index; a non-numeric or non-contiguous field set, or any chunk
    /// that fails to decode, fails the whole load.
    pub async fn load(&self, name: &str) -> Result<Option<Vec<Row>>> {
        let key = dataset_key(name);
        let fields = self.store.hgetall(&key).await?;
        if fields.is_empty() {
            debug!("No cached chunks for {}", name);
            return Ok(None);
        }

        let mut chunks = fields
            .into_iter()
            .map(|(field, payload)| {
                field
                    .parse::<usize>()
                    .map(|index| (index, payload))
                    .map_err(|_| {
                        CacheError::CorruptEntry(format!("{} has chunk field '{}'", key, field))
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        chunks.sort_unstable_by_key(|(index, _)| *index);

        let mut rows = Vec::new();
        for (position, (index, payload)) in chunks.iter().enumerate() {
            if *index != position {
                return Err(CacheError::CorruptEntry(format!(
                    "{} is missing chunk {}",
                    key, position
                )));
            }
            rows.extend(decode_rows(payload)?);
        }

        info!("Loaded {} from cache ({} rows)", name, rows.len());
        Ok(Some(rows))
    }

    // == Clear ==
    /// Deletes the cached entry for `name`. Returns 1 if one existed, else 0.
    pub async fn clear(&self, name: &str) -> Result<u64> {
        let deleted = self.store.del(&dataset_key(name)).await?;
        if deleted > 0 {
            info!("Cleared cached {}", name);
        }
        Ok(deleted)
    }

    // == Load Or Populate ==
    /// Returns the cached dataset, populating it from the source on a miss.
    ///
    /// A cached entry that fails to load is treated like a miss and rebuilt.
    pub async fn load_or_populate(&self, name: &str) -> Result<Vec<Row>> {
        match self.load(name).await {
            Ok(Some(rows)) => return Ok(rows),
            Ok(None) => info!("{} not in cache, loading from source", name),
            Err(err) => warn!("Cached {} unreadable ({}), reloading from source", name, err),
        }

        self.populate(name).await?;
        self.load(name).await?.ok_or_else(|| {
            CacheError::Internal(format!("{} vanished right after populate", name))
        })
    }
}

/// Reads `name` on the blocking thread pool, handing chunks over in order.
///
/// Reading stops after the first error, or once the receiver is dropped.
fn spawn_chunk_reader(
    source: Arc<dyn SourceReader>,
    name: &str,
    chunk_size: usize,
) -> (mpsc::Receiver<Result<Vec<Row>>>, JoinHandle<()>) {
    let (sender, receiver) = mpsc::channel(READ_AHEAD_CHUNKS);
    let name = name.to_string();
    let reader = tokio::task::spawn_blocking(move || {
        let chunks = match source.read_chunks(&name, chunk_size) {
            Ok(chunks) => chunks,
            Err(err) => {
                let _ = sender.blocking_send(Err(err));
                return;
            }
        };
        for chunk in chunks {
            let failed = chunk.is_err();
            if sender.blocking_send(chunk).is_err() || failed {
                break;
            }
        }
    });
    (receiver, reader)
}
