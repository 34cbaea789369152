//! Data Module
//!
//! Row model, payload codec and the source readers that feed the cache.

mod codec;
mod source;
mod value;

pub use codec::{decode_rows, encode_rows};
pub use source::{ChunkIter, CsvSource, DatasetCatalog, SourceReader};
pub use value::{Row, Value};
