use bytes::{Buf, BufMut, BytesMut};
use columnix_array::ColumnStats;
use columnix_dtype::{
    ColumnDef, ColumnType, CompressionKind, EncodingKind, Nullability, Schema, Value,
};
use columnix_error::{ColumnixError, ColumnixResult, cx_bail, cx_err};
use itertools::Itertools;

use crate::{ColumnChunkMetadata, FileMetadata, RowGroupMetadata, VERSION};

const HAS_MIN_MAX: u8 = 1;

/// Serialize `metadata` into footer bytes.
pub(crate) fn write_footer(metadata: &FileMetadata) -> ColumnixResult<Vec<u8>> {
    let schema = metadata.schema();
    let mut buf = BytesMut::new();
    buf.put_u16_le(VERSION);
    buf.put_u16_le(0);
    buf.put_u32_le(count(schema.len(), "Column count")?);

    for column in schema {
        let name = column.name().as_bytes();
        let name_len = u16::try_from(name.len())
            .map_err(|_| cx_err!(SchemaError: "Column name of {} bytes is too long", name.len()))?;
        buf.put_u16_le(name_len);
        buf.put_slice(name);
        buf.put_u8(column.column_type().into());
        buf.put_u8(column.encoding().into());
        buf.put_u8(column.compression().into());
        buf.put_u8(column.nullability().into());
        buf.put_i32_le(column.level());
    }

    buf.put_u32_le(count(metadata.row_groups().len(), "Row group count")?);
    for row_group in metadata.row_groups() {
        buf.put_u64_le(row_group.offset());
        buf.put_u64_le(row_group.length());
        buf.put_u64_le(row_group.row_count());
        for (column, chunk) in schema.iter().zip_eq(row_group.columns()) {
            buf.put_u64_le(chunk.offset());
            buf.put_u64_le(chunk.length());
            buf.put_u64_le(chunk.decompressed_len());
            buf.put_u64_le(chunk.null_count());
            buf.put_u8(chunk.encoding().into());
            buf.put_u8(chunk.compression().into());
            buf.put_u16_le(0);
            write_stats(&mut buf, column.column_type(), chunk.stats())?;
        }
    }

    buf.put_u64_le(metadata.row_count());
    Ok(buf.to_vec())
}

fn count(len: usize, what: &str) -> ColumnixResult<u32> {
    u32::try_from(len).map_err(|_| cx_err!(InvalidArgument: "{what} {len} exceeds u32"))
}

fn write_stats(
    buf: &mut BytesMut,
    column_type: ColumnType,
    stats: &ColumnStats,
) -> ColumnixResult<()> {
    match (&stats.min, &stats.max) {
        (Some(min), Some(max)) => {
            buf.put_u8(HAS_MIN_MAX);
            write_value(buf, column_type, min)?;
            write_value(buf, column_type, max)
        }
        _ => {
            buf.put_u8(0);
            Ok(())
        }
    }
}

fn write_value(buf: &mut BytesMut, column_type: ColumnType, value: &Value) -> ColumnixResult<()> {
    match (column_type, value) {
        (ColumnType::Bit, Value::Bit(b)) => buf.put_u8(u8::from(*b)),
        (ColumnType::Int32, Value::Int32(v)) => buf.put_i32_le(*v),
        (ColumnType::Int64, Value::Int64(v)) => buf.put_i64_le(*v),
        (ColumnType::Float32, Value::Float32(v)) => buf.put_f32_le(*v),
        (ColumnType::Float64, Value::Float64(v)) => buf.put_f64_le(*v),
        (ColumnType::String, Value::String(s)) => {
            buf.put_u32_le(count(s.len(), "Statistic length")?);
            buf.put_slice(s.as_bytes());
        }
        (t, v) => cx_bail!(AssertionFailed: "Statistic {v} does not match column type {t}"),
    }
    Ok(())
}

/// A bounds-checked reader over footer bytes.
struct FooterCursor<'a> {
    buf: &'a [u8],
}

impl<'a> FooterCursor<'a> {
    fn need(&self, len: usize, what: &str) -> ColumnixResult<()> {
        if self.buf.remaining() < len {
            cx_bail!(
                CorruptData: "Footer truncated reading {what}: need {len} bytes, {} left",
                self.buf.remaining()
            );
        }
        Ok(())
    }

    fn u8(&mut self, what: &str) -> ColumnixResult<u8> {
        self.need(1, what)?;
        Ok(self.buf.get_u8())
    }

    fn u16(&mut self, what: &str) -> ColumnixResult<u16> {
        self.need(2, what)?;
        Ok(self.buf.get_u16_le())
    }

    fn u32(&mut self, what: &str) -> ColumnixResult<u32> {
        self.need(4, what)?;
        Ok(self.buf.get_u32_le())
    }

    fn i32(&mut self, what: &str) -> ColumnixResult<i32> {
        self.need(4, what)?;
        Ok(self.buf.get_i32_le())
    }

    fn u64(&mut self, what: &str) -> ColumnixResult<u64> {
        self.need(8, what)?;
        Ok(self.buf.get_u64_le())
    }

    fn slice(&mut self, len: usize, what: &str) -> ColumnixResult<&'a [u8]> {
        self.need(len, what)?;
        let (head, tail) = self.buf.split_at(len);
        self.buf = tail;
        Ok(head)
    }

    fn str(&mut self, len: usize, what: &str) -> ColumnixResult<&'a str> {
        std::str::from_utf8(self.slice(len, what)?)
            .map_err(|e| cx_err!(CorruptData: "{what} is not UTF-8: {e}"))
    }

    fn value(&mut self, column_type: ColumnType) -> ColumnixResult<Value> {
        Ok(match column_type {
            ColumnType::Bit => match self.u8("bit statistic")? {
                0 => Value::Bit(false),
                1 => Value::Bit(true),
                other => cx_bail!(CorruptData: "Invalid bit statistic {other}"),
            },
            ColumnType::Int32 => Value::Int32(self.i32("i32 statistic")?),
            ColumnType::Int64 => Value::Int64(self.u64("i64 statistic")? as i64),
            ColumnType::Float32 => Value::Float32(f32::from_bits(self.u32("f32 statistic")?)),
            ColumnType::Float64 => Value::Float64(f64::from_bits(self.u64("f64 statistic")?)),
            ColumnType::String => {
                let len = self.u32("string statistic length")? as usize;
                Value::from(self.str(len, "string statistic")?)
            }
        })
    }

    fn stats(&mut self, column_type: ColumnType, null_count: u64) -> ColumnixResult<ColumnStats> {
        let flags = self.u8("statistics flags")?;
        if flags & !HAS_MIN_MAX != 0 {
            cx_bail!(CorruptData: "Unknown statistics flags {flags:#04x}");
        }
        let (min, max) = if flags & HAS_MIN_MAX != 0 {
            (
                Some(self.value(column_type)?),
                Some(self.value(column_type)?),
            )
        } else {
            (None, None)
        };
        Ok(ColumnStats {
            null_count,
            min,
            max,
        })
    }
}

fn corrupt_definition(err: ColumnixError) -> ColumnixError {
    cx_err!(CorruptData: "Footer holds an invalid column definition: {err}")
}

fn read_column(cursor: &mut FooterCursor<'_>) -> ColumnixResult<ColumnDef> {
    let name_len = cursor.u16("column name length")? as usize;
    let name = cursor.str(name_len, "column name")?;
    let column_type = ColumnType::from_tag(cursor.u8("column type")?)?;
    let encoding = EncodingKind::from_tag(cursor.u8("column encoding")?)?;
    let compression = CompressionKind::from_tag(cursor.u8("column compression")?)?;
    let nullability = match cursor.u8("column nullability")? {
        0 => Nullability::NonNullable,
        1 => Nullability::Nullable,
        other => cx_bail!(CorruptData: "Unknown nullability tag {other}"),
    };
    let level = cursor.i32("compression level")?;
    ColumnDef::try_from_parts(name, column_type, nullability, encoding, compression, level)
        .map_err(corrupt_definition)
}

fn read_chunk(
    cursor: &mut FooterCursor<'_>,
    column: &ColumnDef,
    row_count: u64,
) -> ColumnixResult<ColumnChunkMetadata> {
    let offset = cursor.u64("chunk offset")?;
    let length = cursor.u64("chunk length")?;
    let decompressed_len = cursor.u64("chunk decompressed length")?;
    let null_count = cursor.u64("chunk null count")?;
    let encoding = EncodingKind::from_tag(cursor.u8("chunk encoding")?)?;
    let compression = CompressionKind::from_tag(cursor.u8("chunk compression")?)?;
    cursor.u16("reserved")?;
    if null_count > row_count {
        cx_bail!(
            CorruptData: "Chunk of column {} records {null_count} nulls in {row_count} rows",
            column.name()
        );
    }
    if !encoding.supports(column.column_type()) {
        cx_bail!(
            CorruptData: "Chunk of column {} cannot use encoding {encoding}",
            column.name()
        );
    }
    let stats = cursor.stats(column.column_type(), null_count)?;
    Ok(ColumnChunkMetadata {
        offset,
        length,
        decompressed_len,
        null_count,
        encoding,
        compression,
        stats,
    })
}

/// Parse footer bytes written by [`write_footer`].
pub(crate) fn read_footer(bytes: &[u8]) -> ColumnixResult<FileMetadata> {
    let mut cursor = FooterCursor { buf: bytes };
    let version = cursor.u16("footer version")?;
    if version != VERSION {
        cx_bail!(CorruptData: "Unsupported footer version {version}");
    }
    cursor.u16("reserved")?;

    let column_count = cursor.u32("column count")?;
    let mut schema = Schema::empty();
    for _ in 0..column_count {
        schema
            .push(read_column(&mut cursor)?)
            .map_err(corrupt_definition)?;
    }

    let row_group_count = cursor.u32("row group count")?;
    let mut row_groups = Vec::new();
    for _ in 0..row_group_count {
        let offset = cursor.u64("row group offset")?;
        let length = cursor.u64("row group length")?;
        let row_count = cursor.u64("row group row count")?;
        if row_count == 0 {
            cx_bail!(CorruptData: "Row group at {offset} has no rows");
        }
        let columns = schema
            .iter()
            .map(|column| read_chunk(&mut cursor, column, row_count))
            .collect::<ColumnixResult<Vec<_>>>()?;
        row_groups.push(RowGroupMetadata::new(offset, length, row_count, columns));
    }

    let total = cursor.u64("total row count")?;
    if cursor.buf.has_remaining() {
        cx_bail!(
            CorruptData: "Footer has {} trailing bytes",
            cursor.buf.remaining()
        );
    }

    let metadata = FileMetadata::try_new(schema, row_groups)?;
    if metadata.row_count() != total {
        cx_bail!(
            CorruptData: "Footer records {total} rows but its row groups hold {}",
            metadata.row_count()
        );
    }
    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use columnix_error::ColumnixError;

    use super::*;

    fn metadata() -> FileMetadata {
        let schema = Schema::try_from_columns([
            ColumnDef::try_new(ColumnType::Int64, "ts")
                .unwrap()
                .with_encoding(EncodingKind::Delta)
                .unwrap()
                .with_compression(CompressionKind::Zstd, 3)
                .unwrap(),
            ColumnDef::try_new(ColumnType::String, "email")
                .unwrap()
                .with_nullability(Nullability::NonNullable),
            ColumnDef::try_new(ColumnType::Bit, "active").unwrap(),
        ])
        .unwrap();
        let chunk = |offset, min: Option<Value>, max: Option<Value>| ColumnChunkMetadata {
            offset,
            length: 16,
            decompressed_len: 24,
            null_count: 1,
            encoding: EncodingKind::None,
            compression: CompressionKind::None,
            stats: ColumnStats {
                null_count: 1,
                min,
                max,
            },
        };
        let row_group = RowGroupMetadata::new(
            8,
            48,
            2,
            vec![
                chunk(0, Some(1_400_000_000_000i64.into()), Some(1_400_000_001_000i64.into())),
                chunk(16, Some("bar@baz.com".into()), Some("foo@bar.com".into())),
                chunk(32, None, None),
            ],
        );
        FileMetadata::try_new(schema, vec![row_group]).unwrap()
    }

    fn single_column(row_counts: &[u64]) -> FileMetadata {
        let schema =
            Schema::try_from_columns([ColumnDef::try_new(ColumnType::Int64, "ts").unwrap()])
                .unwrap();
        let row_groups = row_counts
            .iter()
            .enumerate()
            .map(|(idx, &row_count)| {
                RowGroupMetadata::new(
                    8 + 16 * idx as u64,
                    16,
                    row_count,
                    vec![ColumnChunkMetadata {
                        offset: 0,
                        length: 16,
                        decompressed_len: 16,
                        null_count: 0,
                        encoding: EncodingKind::None,
                        compression: CompressionKind::None,
                        stats: ColumnStats::default(),
                    }],
                )
            })
            .collect();
        FileMetadata::try_new(schema, row_groups).unwrap()
    }

    #[test]
    fn footer_roundtrip() {
        let metadata = metadata();
        let bytes = write_footer(&metadata).unwrap();
        assert_eq!(read_footer(&bytes).unwrap(), metadata);
    }

    #[test]
    fn trailing_bytes_are_corrupt() {
        let mut bytes = write_footer(&metadata()).unwrap();
        bytes.push(0);
        assert!(matches!(
            read_footer(&bytes).unwrap_err(),
            ColumnixError::CorruptData(..)
        ));
    }

    #[test]
    fn truncation_is_corrupt() {
        let bytes = write_footer(&metadata()).unwrap();
        for len in [0, 3, 10, bytes.len() / 2, bytes.len() - 1] {
            assert!(matches!(
                read_footer(&bytes[..len]).unwrap_err(),
                ColumnixError::CorruptData(..)
            ));
        }
    }

    #[test]
    fn wrong_total_is_corrupt() {
        let mut bytes = write_footer(&metadata()).unwrap();
        let at = bytes.len() - 8;
        bytes[at..].copy_from_slice(&3u64.to_le_bytes());
        assert!(read_footer(&bytes).is_err());
    }

    #[test]
    fn unknown_type_tag_is_corrupt() {
        let mut bytes = write_footer(&metadata()).unwrap();
        // version, reserved, column count, name length, "ts"
        bytes[4 + 4 + 2 + 2] = 42;
        assert!(matches!(
            read_footer(&bytes).unwrap_err(),
            ColumnixError::CorruptData(..)
        ));
    }

    #[test]
    fn overflowing_row_counts_are_corrupt() {
        let mut bytes = write_footer(&single_column(&[2, 2])).unwrap();
        // version, reserved, column count, "ts" definition, row group count
        let first_group = 4 + 4 + (2 + 2 + 4 + 4) + 4;
        // offset, length, row count, then one chunk of 4 u64s, tags, reserved, no statistics
        let group_len = 8 * 3 + 8 * 4 + 4 + 1;
        for group in 0..2 {
            let at = first_group + group * group_len + 16;
            bytes[at..at + 8].copy_from_slice(&u64::MAX.to_le_bytes());
        }
        let total = bytes.len() - 8;
        bytes[total..].copy_from_slice(&u64::MAX.to_le_bytes());
        assert!(matches!(
            read_footer(&bytes).unwrap_err(),
            ColumnixError::CorruptData(..)
        ));
    }

    #[test]
    fn more_nulls_than_rows_are_corrupt() {
        let mut bytes = write_footer(&single_column(&[2])).unwrap();
        let null_count = 4 + 4 + (2 + 2 + 4 + 4) + 4 + 8 * 3 + 8 * 3;
        bytes[null_count..null_count + 8].copy_from_slice(&3u64.to_le_bytes());
        assert!(matches!(
            read_footer(&bytes).unwrap_err(),
            ColumnixError::CorruptData(..)
        ));
    }

    #[test]
    fn summed_row_counts_overflow() {
        let schema = Schema::empty();
        let row_groups = vec![
            RowGroupMetadata::new(8, 0, u64::MAX, vec![]),
            RowGroupMetadata::new(8, 0, 1, vec![]),
        ];
        assert!(matches!(
            FileMetadata::try_new(schema, row_groups).unwrap_err(),
            ColumnixError::CorruptData(..)
        ));
    }
}
