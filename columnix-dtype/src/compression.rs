use std::fmt::{Display, Formatter};
use std::ops::RangeInclusive;

use columnix_error::{ColumnixResult, cx_bail, cx_err};
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// The level used when a column does not choose one.
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 1;

/// A byte-level compression algorithm applied to encoded column chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum CompressionKind {
    /// Chunks are stored uncompressed.
    None = 0,
    /// LZ4 block compression; the level is the acceleration factor.
    Lz4 = 1,
    /// LZ4 high-compression mode.
    Lz4Hc = 2,
    /// Zstandard.
    Zstd = 3,
}

#[allow(clippy::derivable_impls)]
impl Default for CompressionKind {
    fn default() -> Self {
        Self::None
    }
}

impl CompressionKind {
    /// The levels accepted by the algorithm, or `None` when the level is ignored.
    pub const fn level_range(self) -> Option<RangeInclusive<i32>> {
        match self {
            CompressionKind::None => None,
            CompressionKind::Lz4 => Some(1..=65537),
            CompressionKind::Lz4Hc => Some(1..=12),
            CompressionKind::Zstd => Some(1..=22),
        }
    }

    /// Check `level` against this algorithm, returning the level to record.
    ///
    /// Levels are ignored, and normalized to [`DEFAULT_COMPRESSION_LEVEL`], when there is no
    /// compression.
    pub fn validate_level(self, level: i32) -> ColumnixResult<i32> {
        let Some(range) = self.level_range() else {
            return Ok(DEFAULT_COMPRESSION_LEVEL);
        };
        if !range.contains(&level) {
            cx_bail!(
                InvalidConfiguration: "Compression level {level} is outside {}..={} for {self}",
                range.start(),
                range.end()
            );
        }
        Ok(level)
    }

    /// Decode a compression tag read from a file.
    pub fn from_tag(tag: u8) -> ColumnixResult<Self> {
        Self::try_from(tag).map_err(|_| cx_err!(CorruptData: "Unknown compression tag {tag}"))
    }
}

impl Display for CompressionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CompressionKind::None => write!(f, "none"),
            CompressionKind::Lz4 => write!(f, "lz4"),
            CompressionKind::Lz4Hc => write!(f, "lz4hc"),
            CompressionKind::Zstd => write!(f, "zstd"),
        }
    }
}
