//! The codec adapter: value encodings and byte-level compression for column chunks.
//!
//! Encodings operate on the canonical values section of a column (see `columnix-array`) and
//! produce another byte buffer. Compression operates on the whole chunk body. On write a chunk is
//! encoded then compressed; on read it is decompressed then decoded.

pub use chunk::*;
pub use compress::*;
pub use delta::*;
pub use dict::*;

mod chunk;
mod compress;
mod delta;
mod dict;

use columnix_array::min_values_len;
use columnix_dtype::{ColumnType, EncodingKind};
use columnix_error::ColumnixResult;

/// A reversible transform over the canonical values section of one column chunk.
pub trait Encoding: Send + Sync {
    /// The tag recorded for chunks written with this encoding.
    fn kind(&self) -> EncodingKind;

    /// Encode the canonical `values` of `row_count` rows of `column_type`.
    fn encode(
        &self,
        column_type: ColumnType,
        row_count: usize,
        values: &[u8],
    ) -> ColumnixResult<Vec<u8>>;

    /// Rebuild the canonical values of `row_count` rows of `column_type` from `encoded`.
    fn decode(
        &self,
        column_type: ColumnType,
        row_count: usize,
        encoded: &[u8],
    ) -> ColumnixResult<Vec<u8>>;

    /// The smallest encoded section that can hold `row_count` rows of `column_type`.
    fn min_encoded_len(&self, column_type: ColumnType, row_count: usize) -> ColumnixResult<usize> {
        min_values_len(column_type, row_count)
    }
}

/// Stores values in their canonical layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainEncoding;

impl Encoding for PlainEncoding {
    fn kind(&self) -> EncodingKind {
        EncodingKind::None
    }

    fn encode(&self, _: ColumnType, _: usize, values: &[u8]) -> ColumnixResult<Vec<u8>> {
        Ok(values.to_vec())
    }

    fn decode(&self, _: ColumnType, _: usize, encoded: &[u8]) -> ColumnixResult<Vec<u8>> {
        Ok(encoded.to_vec())
    }
}

/// The implementation of `kind`.
pub fn encoding_for(kind: EncodingKind) -> &'static dyn Encoding {
    match kind {
        EncodingKind::None => &PlainEncoding,
        EncodingKind::Delta => &DeltaEncoding,
        EncodingKind::Dict => &DictEncoding,
    }
}
