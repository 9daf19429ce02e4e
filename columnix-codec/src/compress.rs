use std::borrow::Cow;

use columnix_dtype::CompressionKind;
use columnix_error::{ColumnixResult, cx_bail, cx_err};
use lz4::block::CompressionMode;

/// Compress `data` with `kind` at `level`.
///
/// The output does not record the input size; it must be kept alongside the output and passed
/// to [`decompress`].
pub fn compress(kind: CompressionKind, level: i32, data: &[u8]) -> ColumnixResult<Cow<'_, [u8]>> {
    if data.is_empty() {
        return Ok(Cow::Borrowed(data));
    }
    let level = kind.validate_level(level)?;
    let compressed = match kind {
        CompressionKind::None => return Ok(Cow::Borrowed(data)),
        CompressionKind::Lz4 => {
            lz4::block::compress(data, Some(CompressionMode::FAST(level)), false)?
        }
        CompressionKind::Lz4Hc => {
            lz4::block::compress(data, Some(CompressionMode::HIGHCOMPRESSION(level)), false)?
        }
        CompressionKind::Zstd => zstd::bulk::compress(data, level)?,
    };
    Ok(Cow::Owned(compressed))
}

/// The most one compressed byte can expand to. LZ4 stays under 255:1 and a Zstd RLE block spends
/// four bytes on at most 128 KiB.
const fn max_expansion(kind: CompressionKind) -> usize {
    match kind {
        CompressionKind::None => 1,
        CompressionKind::Lz4 | CompressionKind::Lz4Hc => 255,
        CompressionKind::Zstd => 32 * 1024,
    }
}

/// Decompress `data`, which must expand to exactly `decompressed_len` bytes.
///
/// A `decompressed_len` that `data` could never expand to is rejected before the output buffer
/// is allocated.
pub fn decompress(
    kind: CompressionKind,
    data: &[u8],
    decompressed_len: usize,
) -> ColumnixResult<Cow<'_, [u8]>> {
    if kind == CompressionKind::None || (data.is_empty() && decompressed_len == 0) {
        if data.len() != decompressed_len {
            cx_bail!(
                CorruptData: "Uncompressed chunk is {} bytes but {decompressed_len} were recorded",
                data.len()
            );
        }
        return Ok(Cow::Borrowed(data));
    }
    if decompressed_len > data.len().saturating_mul(max_expansion(kind)) {
        cx_bail!(
            CorruptData: "{kind} chunk of {} bytes cannot expand to {decompressed_len} bytes",
            data.len()
        );
    }

    let decompressed = match kind {
        CompressionKind::None => return Ok(Cow::Borrowed(data)),
        CompressionKind::Lz4 | CompressionKind::Lz4Hc => {
            let size = i32::try_from(decompressed_len).map_err(
                |_| cx_err!(CorruptData: "LZ4 chunk of {decompressed_len} bytes is too large"),
            )?;
            lz4::block::decompress(data, Some(size))
                .map_err(|e| cx_err!(CorruptData: "Failed to decompress {kind} chunk: {e}"))?
        }
        CompressionKind::Zstd => zstd::bulk::decompress(data, decompressed_len)
            .map_err(|e| cx_err!(CorruptData: "Failed to decompress {kind} chunk: {e}"))?,
    };

    if decompressed.len() != decompressed_len {
        cx_bail!(
            CorruptData: "{kind} chunk decompressed to {} bytes but {decompressed_len} were recorded",
            decompressed.len()
        );
    }
    Ok(Cow::Owned(decompressed))
}
