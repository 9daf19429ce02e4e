use std::borrow::Cow;

use columnix_array::{ColumnArray, ColumnStats, packed_bits_len};
use columnix_dtype::{ColumnDef, ColumnType, CompressionKind, EncodingKind};
use columnix_error::{ColumnixResult, cx_bail, cx_err};
use log::trace;

use crate::{compress, decompress, encoding_for};

/// One column of one row group, encoded and compressed, ready to be written.
#[derive(Debug, Clone)]
pub struct EncodedChunk {
    /// The bytes to store.
    pub bytes: Vec<u8>,
    /// The size of the body before compression.
    pub decompressed_len: usize,
    /// The number of rows.
    pub row_count: usize,
    /// The encoding applied to the values section.
    pub encoding: EncodingKind,
    /// The compression actually applied to the body.
    pub compression: CompressionKind,
    /// Statistics over the chunk's values.
    pub stats: ColumnStats,
}

/// What a reader needs to know to turn stored bytes back into a [`ColumnArray`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkLayout {
    /// The type of the column.
    pub column_type: ColumnType,
    /// The number of rows.
    pub row_count: usize,
    /// The number of null rows, which decides whether a validity section is present.
    pub null_count: usize,
    /// The size of the body before compression.
    pub decompressed_len: usize,
    /// The encoding of the values section.
    pub encoding: EncodingKind,
    /// The compression of the body.
    pub compression: CompressionKind,
}

/// Serialize `array` in canonical layout, then encode and compress it as `column` asks.
///
/// The body is `[validity][values]`, with the validity section only present when the chunk has
/// nulls. When compression does not shrink the body, the chunk is stored uncompressed and
/// [`EncodedChunk::compression`] says so.
pub fn encode_chunk(column: &ColumnDef, array: &ColumnArray) -> ColumnixResult<EncodedChunk> {
    if array.column_type() != column.column_type() {
        cx_bail!(
            TypeMismatch: "Column {} is {} but the chunk holds {}",
            column.name(),
            column.column_type(),
            array.column_type()
        );
    }

    let row_count = array.len();
    let values = array.values_to_bytes()?;
    let encoding = column.encoding();
    let encoded = encoding_for(encoding).encode(column.column_type(), row_count, &values)?;

    let mut body = array.validity_to_bytes().unwrap_or_default();
    body.extend_from_slice(&encoded);
    let decompressed_len = body.len();

    let compressed = match compress(column.compression(), column.level(), &body)? {
        Cow::Owned(compressed) if compressed.len() < body.len() => Some(compressed),
        _ => None,
    };
    let (bytes, compression) = match compressed {
        Some(compressed) => (compressed, column.compression()),
        None => (body, CompressionKind::None),
    };

    trace!(
        "Encoded {} rows of column {} as {encoding}/{compression}: {} -> {} bytes",
        row_count,
        column.name(),
        decompressed_len,
        bytes.len()
    );

    Ok(EncodedChunk {
        bytes,
        decompressed_len,
        row_count,
        encoding,
        compression,
        stats: array.statistics(),
    })
}

/// Decompress and decode a chunk written by [`encode_chunk`].
///
/// The row and null counts of `layout` are checked against the recorded body size before
/// anything is allocated for them.
pub fn decode_chunk(layout: &ChunkLayout, bytes: &[u8]) -> ColumnixResult<ColumnArray> {
    if layout.null_count > layout.row_count {
        cx_bail!(
            CorruptData: "Chunk of {} rows records {} nulls",
            layout.row_count,
            layout.null_count
        );
    }
    if !layout.encoding.supports(layout.column_type) {
        cx_bail!(
            CorruptData: "Chunk of type {} cannot use encoding {}",
            layout.column_type,
            layout.encoding
        );
    }
    let encoding = encoding_for(layout.encoding);

    let validity_len = if layout.null_count > 0 {
        packed_bits_len(layout.row_count)
    } else {
        0
    };
    let min_len = encoding
        .min_encoded_len(layout.column_type, layout.row_count)?
        .checked_add(validity_len)
        .ok_or_else(|| cx_err!(CorruptData: "Chunk of {} rows is too large", layout.row_count))?;
    if layout.decompressed_len < min_len {
        cx_bail!(
            CorruptData: "Chunk of {} {} rows needs at least {min_len} bytes but records {}",
            layout.row_count,
            layout.column_type,
            layout.decompressed_len
        );
    }

    let body = decompress(layout.compression, bytes, layout.decompressed_len)?;
    let (validity, encoded) = if layout.null_count > 0 {
        let (validity, encoded) = body.split_at(validity_len);
        (Some(validity), encoded)
    } else {
        (None, body.as_ref())
    };

    let values = encoding.decode(layout.column_type, layout.row_count, encoded)?;
    let array =
        ColumnArray::try_from_canonical(layout.column_type, layout.row_count, validity, &values)?;

    if array.null_count() != layout.null_count {
        cx_bail!(
            CorruptData: "Chunk records {} nulls but its validity holds {}",
            layout.null_count,
            array.null_count()
        );
    }
    Ok(array)
}
