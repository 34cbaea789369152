//! Chunk sizing for dataset population.

use std::sync::Arc;

use crate::data::SourceReader;
use crate::error::{CacheError, Result};

/// Rows per chunk so that `name` splits into about `target_chunks` chunks.
///
/// Scans the whole source once to count rows, on the blocking thread pool.
/// Never returns 0: a dataset smaller than the target gets single-row chunks.
pub async fn compute_chunk_size(
    source: Arc<dyn SourceReader>,
    name: &str,
    target_chunks: usize,
) -> Result<usize> {
    let name = name.to_string();
    let total_rows = tokio::task::spawn_blocking(move || source.row_count(&name))
        .await
        .map_err(|e| CacheError::Internal(format!("row count task failed: {}", e)))??;
    Ok(chunk_size_for(total_rows, target_chunks))
}

/// `max(1, total_rows / target_chunks)`, with a zero target treated as 1.
pub fn chunk_size_for(total_rows: usize, target_chunks: usize) -> usize {
    (total_rows / target_chunks.max(1)).max(1)
}
