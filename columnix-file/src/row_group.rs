use columnix_array::{ColumnArray, ColumnBuffer};
use columnix_codec::encode_chunk;
use columnix_dtype::{Schema, Value};
use columnix_error::{ColumnixResult, cx_bail};
use columnix_io::{ALIGNMENT, ColumnixWrite, PositionedWriter, padding_for};
use itertools::Itertools;
use log::debug;

use crate::{ColumnChunkMetadata, RowGroupMetadata};

/// Buffers the rows of the row group being built, one [`ColumnBuffer`] per schema column.
///
/// Every buffer always holds the same number of rows: a row is either appended to all of them
/// or to none.
#[derive(Debug)]
pub struct RowGroupWriter {
    buffers: Vec<ColumnBuffer>,
    row_group_size: usize,
}

impl RowGroupWriter {
    /// Buffers for `schema`, flushed every `row_group_size` rows.
    pub fn new(schema: &Schema, row_group_size: usize) -> Self {
        Self {
            buffers: schema
                .iter()
                .map(|column| ColumnBuffer::new(column.clone(), row_group_size))
                .collect(),
            row_group_size,
        }
    }

    /// Check that `row` could be appended, without appending it.
    pub fn check_row(&self, row: &[Value]) -> ColumnixResult<()> {
        if row.len() != self.buffers.len() {
            cx_bail!(RowArityError: self.buffers.len(), row.len());
        }
        for (buffer, value) in self.buffers.iter().zip_eq(row) {
            buffer.check(value)?;
        }
        Ok(())
    }

    /// Append one value to every column, or fail without modifying any buffer.
    pub fn append_row(&mut self, row: &[Value]) -> ColumnixResult<()> {
        self.check_row(row)?;
        for (buffer, value) in self.buffers.iter_mut().zip_eq(row) {
            buffer.append(value)?;
        }
        Ok(())
    }

    /// The number of buffered rows.
    pub fn row_count(&self) -> usize {
        self.buffers.first().map_or(0, ColumnBuffer::len)
    }

    /// Whether no rows are buffered.
    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    /// Whether the row group holds `row_group_size` rows.
    pub fn is_full(&self) -> bool {
        self.row_count() >= self.row_group_size
    }

    /// The buffers, in schema order.
    pub fn buffers(&self) -> &[ColumnBuffer] {
        &self.buffers
    }

    /// Take the buffered rows, leaving every buffer empty.
    fn take(&mut self) -> ColumnixResult<Vec<ColumnArray>> {
        self.buffers.iter_mut().map(ColumnBuffer::take).collect()
    }

    /// Encode the buffered rows and write them as one block at the writer's current position.
    ///
    /// Every chunk is encoded before any byte is written. On failure the buffered rows are
    /// discarded. Returns `None`, writing nothing, when no rows are buffered.
    pub fn flush<W: ColumnixWrite>(
        &mut self,
        write: &mut PositionedWriter<W>,
    ) -> ColumnixResult<Option<RowGroupMetadata>> {
        if self.is_empty() {
            return Ok(None);
        }
        let row_count = self.row_count();
        let arrays = self.take()?;

        let mut block = Vec::new();
        let mut columns = Vec::with_capacity(arrays.len());
        for (buffer, array) in self.buffers.iter().zip_eq(&arrays) {
            let chunk = encode_chunk(buffer.column(), array)?;
            columns.push(ColumnChunkMetadata::new(block.len() as u64, &chunk));
            block.extend_from_slice(&chunk.bytes);
            block.resize(
                block.len() + padding_for(block.len() as u64, ALIGNMENT),
                0,
            );
        }

        write.pad_to(ALIGNMENT)?;
        let offset = write.position();
        write.write_all(&block)?;
        debug!(
            "Flushed row group of {row_count} rows, {} bytes at offset {offset}",
            block.len()
        );

        Ok(Some(RowGroupMetadata::new(
            offset,
            block.len() as u64,
            row_count as u64,
            columns,
        )))
    }
}

#[cfg(test)]
mod tests {
    use columnix_codec::decode_chunk;
    use columnix_dtype::{ColumnDef, ColumnType, CompressionKind};
    use columnix_error::ColumnixError;

    use super::*;

    fn schema() -> Schema {
        Schema::try_from_columns([
            ColumnDef::try_new(ColumnType::Int64, "ts").unwrap(),
            ColumnDef::try_new(ColumnType::String, "email")
                .unwrap()
                .with_compression(CompressionKind::Lz4, 1)
                .unwrap(),
            ColumnDef::try_new(ColumnType::Int32, "id").unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn rejected_rows_leave_every_buffer_untouched() {
        let mut writer = RowGroupWriter::new(&schema(), 4);
        writer
            .append_row(&[1i64.into(), "a".into(), 1i32.into()])
            .unwrap();

        let err = writer
            .append_row(&[2i64.into(), "b".into(), 2i64.into()])
            .unwrap_err();
        assert!(matches!(err, ColumnixError::TypeMismatch(..)));
        let err = writer.append_row(&[2i64.into()]).unwrap_err();
        assert!(matches!(err, ColumnixError::RowArityError { .. }));

        assert!(writer.buffers().iter().all(|b| b.len() == 1));
    }

    #[test]
    fn flush_writes_aligned_block() {
        let mut writer = RowGroupWriter::new(&schema(), 2);
        let mut sink = PositionedWriter::new(Vec::new());
        sink.write_all(&[0u8; 3]).unwrap();

        assert!(writer.flush(&mut sink).unwrap().is_none());
        assert_eq!(sink.position(), 3);

        writer
            .append_row(&[1i64.into(), "foo@bar.com".into(), 23i32.into()])
            .unwrap();
        writer
            .append_row(&[2i64.into(), Value::Null, 45i32.into()])
            .unwrap();
        assert!(writer.is_full());

        let metadata = writer.flush(&mut sink).unwrap().unwrap();
        assert!(writer.is_empty());
        assert_eq!(metadata.offset(), 8);
        assert_eq!(metadata.row_count(), 2);
        assert_eq!(metadata.length() % 8, 0);
        assert_eq!(sink.position(), 8 + metadata.length());
        assert!(metadata.columns().iter().all(|c| c.offset() % 8 == 0));

        let bytes = sink.into_inner();
        let email = metadata.column(1).unwrap();
        assert_eq!(email.null_count(), 1);
        let start = (metadata.offset() + email.offset()) as usize;
        let chunk = &bytes[start..start + email.length() as usize];
        let array = decode_chunk(
            &email.layout(ColumnType::String, metadata.row_count()).unwrap(),
            chunk,
        )
        .unwrap();
        assert_eq!(array.get_str(0).unwrap(), Some("foo@bar.com"));
        assert_eq!(array.get_str(1).unwrap(), None);
    }
}
