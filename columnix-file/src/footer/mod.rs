//! The footer: the schema and an index of every row group and column chunk in a file.

mod eof;
mod format;

use columnix_array::ColumnStats;
use columnix_codec::{ChunkLayout, EncodedChunk};
use columnix_dtype::{ColumnType, CompressionKind, EncodingKind, Schema};
use columnix_error::{ColumnixResult, cx_err};
pub(crate) use eof::*;
pub(crate) use format::*;

fn to_usize(value: u64, what: &str) -> ColumnixResult<usize> {
    usize::try_from(value).map_err(|_| cx_err!(CorruptData: "{what} {value} does not fit in memory"))
}

/// Where one column of one row group is stored, and how to decode it.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnChunkMetadata {
    offset: u64,
    length: u64,
    decompressed_len: u64,
    null_count: u64,
    encoding: EncodingKind,
    compression: CompressionKind,
    stats: ColumnStats,
}

impl ColumnChunkMetadata {
    pub(crate) fn new(offset: u64, chunk: &EncodedChunk) -> Self {
        Self {
            offset,
            length: chunk.bytes.len() as u64,
            decompressed_len: chunk.decompressed_len as u64,
            null_count: chunk.stats.null_count,
            encoding: chunk.encoding,
            compression: chunk.compression,
            stats: chunk.stats.clone(),
        }
    }

    /// Offset of the chunk relative to the start of its row group.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Stored length of the chunk.
    pub fn length(&self) -> u64 {
        self.length
    }

    /// Length of the chunk body once decompressed.
    pub fn decompressed_len(&self) -> u64 {
        self.decompressed_len
    }

    /// The number of null rows.
    pub fn null_count(&self) -> u64 {
        self.null_count
    }

    /// The encoding used for the chunk's values.
    pub fn encoding(&self) -> EncodingKind {
        self.encoding
    }

    /// The compression actually applied to the chunk, which is
    /// [`CompressionKind::None`] when compressing did not help.
    pub fn compression(&self) -> CompressionKind {
        self.compression
    }

    /// Statistics of the chunk's values.
    pub fn stats(&self) -> &ColumnStats {
        &self.stats
    }

    pub(crate) fn layout(
        &self,
        column_type: ColumnType,
        row_count: u64,
    ) -> ColumnixResult<ChunkLayout> {
        Ok(ChunkLayout {
            column_type,
            row_count: to_usize(row_count, "Row count")?,
            null_count: to_usize(self.null_count, "Null count")?,
            decompressed_len: to_usize(self.decompressed_len, "Decompressed length")?,
            encoding: self.encoding,
            compression: self.compression,
        })
    }
}

/// A row group: where its block is stored and the chunk of every column inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct RowGroupMetadata {
    offset: u64,
    length: u64,
    row_count: u64,
    columns: Vec<ColumnChunkMetadata>,
}

impl RowGroupMetadata {
    pub(crate) fn new(
        offset: u64,
        length: u64,
        row_count: u64,
        columns: Vec<ColumnChunkMetadata>,
    ) -> Self {
        Self {
            offset,
            length,
            row_count,
            columns,
        }
    }

    /// Absolute offset of the row group's block.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Length of the row group's block, including alignment padding.
    pub fn length(&self) -> u64 {
        self.length
    }

    /// The number of rows.
    pub fn row_count(&self) -> u64 {
        self.row_count
    }

    /// The column chunks, in schema order.
    pub fn columns(&self) -> &[ColumnChunkMetadata] {
        &self.columns
    }

    /// The chunk of column `idx`.
    pub fn column(&self, idx: usize) -> ColumnixResult<&ColumnChunkMetadata> {
        self.columns
            .get(idx)
            .ok_or_else(|| cx_err!(OutOfBounds: idx, 0, self.columns.len()))
    }
}

/// Everything the footer records about a file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileMetadata {
    schema: Schema,
    row_groups: Vec<RowGroupMetadata>,
    row_count: u64,
}

impl FileMetadata {
    pub(crate) fn try_new(
        schema: Schema,
        row_groups: Vec<RowGroupMetadata>,
    ) -> ColumnixResult<Self> {
        let row_count = row_groups
            .iter()
            .try_fold(0u64, |total, row_group| total.checked_add(row_group.row_count()))
            .ok_or_else(|| {
                cx_err!(CorruptData: "Row counts of {} row groups overflow u64", row_groups.len())
            })?;
        Ok(Self {
            schema,
            row_groups,
            row_count,
        })
    }

    /// The schema of every row.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The row groups, in file order.
    pub fn row_groups(&self) -> &[RowGroupMetadata] {
        &self.row_groups
    }

    /// The row group at `idx`.
    pub fn row_group(&self, idx: usize) -> ColumnixResult<&RowGroupMetadata> {
        self.row_groups
            .get(idx)
            .ok_or_else(|| cx_err!(OutOfBounds: idx, 0, self.row_groups.len()))
    }

    /// The total number of rows.
    pub fn row_count(&self) -> u64 {
        self.row_count
    }

    /// Statistics of column `idx` over the whole file.
    pub fn column_stats(&self, idx: usize) -> ColumnixResult<ColumnStats> {
        self.schema.column(idx)?;
        let mut stats = ColumnStats::default();
        for row_group in &self.row_groups {
            stats.merge(row_group.column(idx)?.stats());
        }
        Ok(stats)
    }
}
