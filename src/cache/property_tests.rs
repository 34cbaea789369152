//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the chunking and accounting laws of the cache.

use std::sync::Arc;

use chrono::NaiveDate;
use proptest::prelude::*;

use crate::cache::{chunk_size_for, DatasetCache, MetricsCounter, QueryCache};
use crate::data::{ChunkIter, Row, SourceReader, Value};
use crate::error::{CacheError, Result};
use crate::store::{KvStore, MemoryStore};

// == Test Configuration ==
const TEST_TTL: u64 = 300;

/// Source serving the same in-memory rows for every name.
struct VecSource {
    rows: Vec<Row>,
}

impl SourceReader for VecSource {
    fn row_count(&self, _name: &str) -> Result<usize> {
        Ok(self.rows.len())
    }

    fn read_chunks(&self, _name: &str, chunk_size: usize) -> Result<ChunkIter<'_>> {
        Ok(Box::new(
            self.rows.chunks(chunk_size).map(|chunk| Ok::<_, CacheError>(chunk.to_vec())),
        ))
    }
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(future)
}

// == Strategies ==
/// Generates cell values of every supported type
fn value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<i64>().prop_map(Value::Int),
        (-1.0e9f64..1.0e9).prop_map(Value::Float),
        (2000i32..2030, 1u32..=12, 1u32..=28).prop_map(|(y, m, d)| {
            Value::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
        }),
        "[a-zA-Z ]{0,12}".prop_map(Value::Text),
    ]
}

/// Generates rows sharing one fixed set of columns
fn rows_strategy() -> impl Strategy<Value = Vec<Row>> {
    prop::collection::vec(
        (value_strategy(), value_strategy(), value_strategy()),
        1..60,
    )
    .prop_map(|cells| {
        cells
            .into_iter()
            .map(|(a, b, c)| {
                let mut row = Row::new();
                row.insert("ORIGIN".to_string(), a);
                row.insert("DEPARTURE".to_string(), b);
                row.insert("DELAY".to_string(), c);
                row
            })
            .collect()
    })
}

#[derive(Debug, Clone)]
enum QueryOp {
    Lookup { value: u8 },
    Store { value: u8 },
}

fn query_op_strategy() -> impl Strategy<Value = QueryOp> {
    prop_oneof![
        (0u8..5).prop_map(|value| QueryOp::Lookup { value }),
        (0u8..5).prop_map(|value| QueryOp::Store { value }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // Chunk size is never zero; small datasets get one row per chunk and
    // large ones at most twice the target chunk count.
    #[test]
    fn prop_chunk_size_bounds(total in 0usize..100_000, target in 0usize..500) {
        let size = chunk_size_for(total, target);
        prop_assert!(size >= 1);
        prop_assert_eq!(size, std::cmp::max(1, total / target.max(1)));

        let chunks = total.div_ceil(size);
        if total >= target.max(1) {
            prop_assert!(chunks <= target.max(1) * 2);
        } else {
            prop_assert_eq!(chunks, total);
        }
    }

    // Concatenating chunks in ascending numeric field order reproduces the
    // source rows exactly, for any chunk-count configuration.
    #[test]
    fn prop_chunk_round_trip(rows in rows_strategy(), target in 1usize..40) {
        let source = Arc::new(VecSource { rows: rows.clone() });
        let store = Arc::new(MemoryStore::new());
        let cache = DatasetCache::new(store.clone(), source, TEST_TTL, target);

        let (chunks, fields, loaded) = block_on(async {
            let chunks = cache.populate("flights").await.unwrap();
            let fields = store.hgetall("flights_data").await.unwrap();
            let loaded = cache.load("flights").await.unwrap();
            (chunks, fields, loaded)
        });

        prop_assert_eq!(chunks, fields.len());
        for index in 0..chunks {
            prop_assert!(fields.contains_key(&index.to_string()), "missing chunk {}", index);
        }
        prop_assert_eq!(loaded, Some(rows));
    }

    // Hits and misses equal the number of lookups that found or missed a
    // stored result; stores never touch the counters.
    #[test]
    fn prop_query_accounting(ops in prop::collection::vec(query_op_strategy(), 1..40)) {
        let store = Arc::new(MemoryStore::new());
        let metrics = MetricsCounter::new(store.clone());
        let cache = QueryCache::new(store, metrics.clone(), TEST_TTL);

        let (expected_hits, expected_misses, snapshot) = block_on(async {
            let mut stored = std::collections::HashSet::new();
            let mut hits = 0u64;
            let mut misses = 0u64;
            for op in ops {
                match op {
                    QueryOp::Lookup { value } => {
                        let found = cache
                            .lookup("flights", "per_airport", &value.to_string())
                            .await;
                        assert_eq!(found.is_some(), stored.contains(&value));
                        if found.is_some() { hits += 1 } else { misses += 1 }
                    }
                    QueryOp::Store { value } => {
                        cache
                            .store("flights", "per_airport", &value.to_string(), &[])
                            .await
                            .unwrap();
                        stored.insert(value);
                    }
                }
            }
            (hits, misses, metrics.snapshot().await.unwrap())
        });

        prop_assert_eq!(snapshot.hits, expected_hits, "Hits mismatch");
        prop_assert_eq!(snapshot.misses, expected_misses, "Misses mismatch");
    }
}
