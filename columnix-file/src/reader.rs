use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use columnix_array::ColumnArray;
use columnix_codec::decode_chunk;
use columnix_dtype::{ColumnType, Schema, Value};
use columnix_error::{ColumnixError, ColumnixResult, ResultExt, cx_bail, cx_err};
use columnix_io::{ColumnixReadAt, MmapFile};
use log::{debug, trace, warn};

use crate::{
    EOF_SIZE, EndOfFile, FileMetadata, HEADER_SIZE, RowGroupMetadata, check_header, read_footer,
};

/// One row group of a file, with its columns decoded on first access.
#[derive(Debug)]
pub struct RowGroupReader {
    index: usize,
    metadata: RowGroupMetadata,
    column_types: Vec<ColumnType>,
    block: Bytes,
    columns: Vec<Option<ColumnArray>>,
}

impl RowGroupReader {
    fn new(index: usize, metadata: RowGroupMetadata, schema: &Schema, block: Bytes) -> Self {
        Self {
            index,
            columns: (0..schema.len()).map(|_| None).collect(),
            column_types: schema.iter().map(|c| c.column_type()).collect(),
            metadata,
            block,
        }
    }

    /// The position of this row group in the file.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The footer entry of this row group.
    pub fn metadata(&self) -> &RowGroupMetadata {
        &self.metadata
    }

    /// The number of rows.
    pub fn row_count(&self) -> u64 {
        self.metadata.row_count()
    }

    /// Column `idx`, decoding it if this is its first access.
    pub fn column(&mut self, idx: usize) -> ColumnixResult<&ColumnArray> {
        let slot = self
            .columns
            .get_mut(idx)
            .ok_or_else(|| cx_err!(OutOfBounds: idx, 0, self.column_types.len()))?;
        let array = match slot.take() {
            Some(array) => array,
            None => {
                let array = decode_column(&self.metadata, &self.column_types, &self.block, idx)?;
                trace!(
                    "Decoded column {idx} of row group {}: {} rows",
                    self.index,
                    array.len()
                );
                array
            }
        };
        Ok(slot.insert(array))
    }

    /// Column `idx` if it has already been decoded.
    pub fn decoded(&self, idx: usize) -> Option<&ColumnArray> {
        self.columns.get(idx).and_then(Option::as_ref)
    }
}

fn decode_column(
    metadata: &RowGroupMetadata,
    column_types: &[ColumnType],
    block: &Bytes,
    idx: usize,
) -> ColumnixResult<ColumnArray> {
    let chunk = metadata.column(idx)?;
    let column_type = column_types
        .get(idx)
        .copied()
        .ok_or_else(|| cx_err!(OutOfBounds: idx, 0, column_types.len()))?;
    let bytes = chunk
        .offset()
        .checked_add(chunk.length())
        .and_then(|end| block.get(chunk.offset() as usize..end as usize))
        .ok_or_else(|| {
            cx_err!(
                CorruptData: "Column {idx} at {}+{} is outside its row group of {} bytes",
                chunk.offset(),
                chunk.length(),
                block.len()
            )
        })?;
    decode_chunk(&chunk.layout(column_type, metadata.row_count())?, bytes)
        .with_context(|| format!("Failed to decode column {idx} of {column_type}"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Start,
    Row { group: usize, row: u64 },
    End,
}

/// Reads a Columnix file.
///
/// The header, end-of-file marker and footer are validated when the reader is created. Rows are
/// then walked with a cursor: [`FileReader::next`] moves to the next row, crossing row group
/// boundaries transparently, and the typed accessors read the cells of the current row. Only
/// the row group under the cursor is held in memory, and only the columns that are read are
/// decoded.
///
/// A failure to read or decode a row group is sticky: it is reported by [`FileReader::error`]
/// and by every later call, and [`FileReader::next`] returns `false` from then on.
pub struct FileReader<R> {
    read: R,
    metadata: FileMetadata,
    position: Position,
    current: Option<RowGroupReader>,
    error: Option<Arc<ColumnixError>>,
}

impl FileReader<MmapFile> {
    /// Memory-map and open the file at `path`.
    pub fn open(path: impl AsRef<Path>) -> ColumnixResult<Self> {
        let path = path.as_ref();
        let file = MmapFile::open(path).map_err(|e| {
            ColumnixError::from(e).with_context(format!("Failed to open {}", path.display()))
        })?;
        Self::new(file)
    }
}

macro_rules! typed_accessor {
    ($name:ident, $T:ty, $column_type:ident) => {
        #[doc = concat!("The current row's ", stringify!($column_type), " value in column `col`.")]
        pub fn $name(&mut self, col: usize) -> ColumnixResult<$T> {
            let (array, row) = self.cell(col, Some(ColumnType::$column_type))?;
            array.$name(row)?.ok_or_else(|| null_value(col))
        }
    };
}

impl<R: ColumnixReadAt> FileReader<R> {
    /// Open a file held by `read`, validating its header, end-of-file marker and footer.
    pub fn new(read: R) -> ColumnixResult<Self> {
        let size = read.size()?;
        let min_size = (HEADER_SIZE + EOF_SIZE) as u64;
        if size < min_size {
            cx_bail!(CorruptData: "Malformed file, {size} bytes is smaller than {min_size}");
        }

        check_header(&read.read_byte_range(0..HEADER_SIZE as u64)?)?;
        let footer_end = size - EOF_SIZE as u64;
        let eof = EndOfFile::parse(&read.read_byte_range(footer_end..size)?)?;
        if eof.footer_offset < HEADER_SIZE as u64
            || eof.footer_offset.checked_add(eof.footer_len.into()) != Some(footer_end)
        {
            cx_bail!(
                CorruptData: "Malformed file, footer at {}+{} does not end at {footer_end}",
                eof.footer_offset,
                eof.footer_len
            );
        }

        let metadata = read_footer(&read.read_byte_range(eof.footer_offset..footer_end)?)?;
        check_layout(&metadata, eof.footer_offset)?;
        debug!(
            "Opened file of {} rows in {} row groups, {} columns",
            metadata.row_count(),
            metadata.row_groups().len(),
            metadata.schema().len()
        );

        Ok(Self {
            read,
            metadata,
            position: Position::Start,
            current: None,
            error: None,
        })
    }

    /// The footer of the file.
    pub fn metadata(&self) -> &FileMetadata {
        &self.metadata
    }

    /// The schema of every row.
    pub fn schema(&self) -> &Schema {
        self.metadata.schema()
    }

    /// The total number of rows.
    pub fn row_count(&self) -> u64 {
        self.metadata.row_count()
    }

    /// Load row group `idx`, independently of the cursor.
    pub fn row_group(&self, idx: usize) -> ColumnixResult<RowGroupReader> {
        let metadata = self.metadata.row_group(idx)?;
        let block = self
            .read
            .read_byte_range(metadata.offset()..metadata.offset() + metadata.length())?;
        Ok(RowGroupReader::new(
            idx,
            metadata.clone(),
            self.metadata.schema(),
            block,
        ))
    }

    /// Advance the cursor to the next row, returning `false` once every row has been read or an
    /// error has occurred.
    ///
    /// The cursor is not an [`Iterator`]: the typed accessors borrow the row group it has decoded.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> bool {
        if self.error.is_some() {
            self.position = Position::End;
            return false;
        }
        let (mut group, mut row) = match self.position {
            Position::Start => (0, 0),
            Position::Row { group, row } => (group, row + 1),
            Position::End => return false,
        };
        loop {
            let Some(metadata) = self.metadata.row_groups().get(group) else {
                self.position = Position::End;
                self.current = None;
                return false;
            };
            if row < metadata.row_count() {
                break;
            }
            group += 1;
            row = 0;
        }

        if self.current.as_ref().is_none_or(|current| current.index() != group) {
            self.current = None;
            match self.row_group(group) {
                Ok(row_group) => self.current = Some(row_group),
                Err(e) => {
                    self.fail(e);
                    return false;
                }
            }
        }
        self.position = Position::Row { group, row };
        true
    }

    /// Move the cursor back before the first row.
    ///
    /// A sticky error is kept: a reader that failed stays exhausted.
    pub fn rewind(&mut self) {
        self.position = Position::Start;
        self.current = None;
    }

    /// The error that stopped iteration, if any.
    pub fn error(&self) -> Option<&ColumnixError> {
        self.error.as_deref()
    }

    /// The index of the current row in the file, if the cursor is on a row.
    pub fn row_index(&self) -> Option<u64> {
        match self.position {
            Position::Row { group, row } => Some(
                self.metadata.row_groups()[..group]
                    .iter()
                    .map(RowGroupMetadata::row_count)
                    .sum::<u64>()
                    + row,
            ),
            Position::Start | Position::End => None,
        }
    }

    typed_accessor!(get_bit, bool, Bit);
    typed_accessor!(get_i32, i32, Int32);
    typed_accessor!(get_i64, i64, Int64);
    typed_accessor!(get_f32, f32, Float32);
    typed_accessor!(get_f64, f64, Float64);

    /// The current row's String value in column `col`.
    pub fn get_str(&mut self, col: usize) -> ColumnixResult<&str> {
        let (array, row) = self.cell(col, Some(ColumnType::String))?;
        array.get_str(row)?.ok_or_else(|| null_value(col))
    }

    /// Whether the current row is null in column `col`.
    pub fn is_null(&mut self, col: usize) -> ColumnixResult<bool> {
        let (array, row) = self.cell(col, None)?;
        Ok(!array.is_valid(row))
    }

    /// The current row's value in column `col`, of whichever type the column has.
    pub fn get_value(&mut self, col: usize) -> ColumnixResult<Value> {
        let (array, row) = self.cell(col, None)?;
        array.value(row)
    }

    /// Every value of the current row, in schema order.
    pub fn read_row(&mut self) -> ColumnixResult<Vec<Value>> {
        (0..self.metadata.schema().len())
            .map(|col| self.get_value(col))
            .collect()
    }

    fn cell(
        &mut self,
        col: usize,
        expected: Option<ColumnType>,
    ) -> ColumnixResult<(&ColumnArray, usize)> {
        if let Some(error) = &self.error {
            return Err(ColumnixError::Shared(error.clone()));
        }
        let column = self.metadata.schema().column(col)?;
        if let Some(expected) = expected {
            if column.column_type() != expected {
                cx_bail!(
                    TypeMismatch: "Column {} is {}, not {expected}",
                    column.name(),
                    column.column_type()
                );
            }
        }

        let row = match self.position {
            Position::Row { row, .. } => row as usize,
            Position::Start => cx_bail!(InvalidState: "Cursor is before the first row"),
            Position::End => cx_bail!(InvalidState: "Cursor is past the last row"),
        };
        let current = self
            .current
            .as_mut()
            .ok_or_else(|| cx_err!(InvalidState: "No row group is loaded"))?;
        if let Err(e) = current.column(col) {
            return Err(self.fail(e));
        }

        let array = self
            .current
            .as_ref()
            .and_then(|current| current.decoded(col))
            .ok_or_else(|| cx_err!(AssertionFailed: "Column {col} was not cached"))?;
        Ok((array, row))
    }

    fn fail(&mut self, err: ColumnixError) -> ColumnixError {
        warn!("Columnix reader failed: {err}");
        let err = Arc::new(err);
        self.error = Some(err.clone());
        self.position = Position::End;
        self.current = None;
        ColumnixError::Shared(err)
    }
}

fn null_value(col: usize) -> ColumnixError {
    cx_err!(NullValue: "Column {col} is null in the current row")
}

/// Check that every row group lies between the header and the footer, in file order, and that
/// every column chunk lies within its row group.
fn check_layout(metadata: &FileMetadata, footer_offset: u64) -> ColumnixResult<()> {
    let mut previous_end = HEADER_SIZE as u64;
    for (idx, row_group) in metadata.row_groups().iter().enumerate() {
        let end = row_group.offset().checked_add(row_group.length());
        if row_group.offset() < previous_end || end.is_none_or(|end| end > footer_offset) {
            cx_bail!(
                CorruptData: "Row group {idx} at {}+{} is outside the data section {previous_end}..{footer_offset}",
                row_group.offset(),
                row_group.length()
            );
        }
        for (col, chunk) in row_group.columns().iter().enumerate() {
            let chunk_end = chunk.offset().checked_add(chunk.length());
            if chunk_end.is_none_or(|end| end > row_group.length()) {
                cx_bail!(
                    CorruptData: "Column {col} of row group {idx} at {}+{} is outside its block of {} bytes",
                    chunk.offset(),
                    chunk.length(),
                    row_group.length()
                );
            }
        }
        previous_end = row_group.offset() + row_group.length();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use columnix_dtype::{ColumnDef, row};
    use rstest::rstest;

    use super::*;
    use crate::{FileWriter, WriteOptions};

    fn file(rows: &[Vec<Value>], row_group_size: usize) -> Bytes {
        let mut writer = FileWriter::new(
            Vec::new(),
            WriteOptions::default()
                .with_row_group_size(row_group_size)
                .with_sync(false),
        )
        .unwrap();
        writer
            .add_column(ColumnDef::try_new(ColumnType::Int64, "ts").unwrap())
            .unwrap();
        writer
            .add_column(ColumnDef::try_new(ColumnType::String, "email").unwrap())
            .unwrap();
        writer
            .add_column(ColumnDef::try_new(ColumnType::Int32, "id").unwrap())
            .unwrap();
        for row in rows {
            writer.put(row).unwrap();
        }
        writer.finish().unwrap();
        Bytes::from(writer.into_inner().unwrap())
    }

    fn rows() -> Vec<Vec<Value>> {
        vec![
            row![1400000000000i64, "foo@bar.com", 23i32],
            row![1400000001000i64, None::<String>, 45i32],
            row![1400000002000i64, "baz@bar.com", None::<i32>],
        ]
    }

    #[test]
    fn cursor_walks_row_groups() {
        let mut reader = FileReader::new(file(&rows(), 2)).unwrap();
        assert_eq!(reader.row_count(), 3);
        assert_eq!(reader.metadata().row_groups().len(), 2);

        assert!(matches!(
            reader.get_i64(0).unwrap_err(),
            ColumnixError::InvalidState(..)
        ));

        assert!(reader.next());
        assert_eq!(reader.row_index(), Some(0));
        assert_eq!(reader.get_i64(0).unwrap(), 1400000000000);
        assert_eq!(reader.get_str(1).unwrap(), "foo@bar.com");
        assert_eq!(reader.get_i32(2).unwrap(), 23);

        assert!(reader.next());
        assert!(reader.is_null(1).unwrap());
        assert!(matches!(
            reader.get_str(1).unwrap_err(),
            ColumnixError::NullValue(..)
        ));
        assert_eq!(reader.get_value(1).unwrap(), Value::Null);

        assert!(reader.next());
        assert_eq!(reader.row_index(), Some(2));
        assert_eq!(reader.current.as_ref().unwrap().index(), 1);
        assert_eq!(reader.read_row().unwrap(), rows()[2]);

        assert!(!reader.next());
        assert!(!reader.next());
        assert!(reader.error().is_none());
        assert!(matches!(
            reader.get_i64(0).unwrap_err(),
            ColumnixError::InvalidState(..)
        ));

        reader.rewind();
        assert!(reader.next());
        assert_eq!(reader.get_i64(0).unwrap(), 1400000000000);
    }

    #[test]
    fn columns_decode_on_first_access() {
        let mut reader = FileReader::new(file(&rows(), 10)).unwrap();
        assert!(reader.next());
        assert!(reader.current.as_ref().unwrap().decoded(1).is_none());
        reader.get_i32(2).unwrap();
        let current = reader.current.as_ref().unwrap();
        assert!(current.decoded(1).is_none());
        assert!(current.decoded(2).is_some());
    }

    #[rstest]
    #[case(0, ColumnType::Int32)]
    #[case(1, ColumnType::Int64)]
    #[case(2, ColumnType::String)]
    fn accessor_type_mismatch(#[case] col: usize, #[case] wrong: ColumnType) {
        let mut reader = FileReader::new(file(&rows(), 2)).unwrap();
        assert!(reader.next());
        let err = match wrong {
            ColumnType::Int32 => reader.get_i32(col).unwrap_err(),
            ColumnType::Int64 => reader.get_i64(col).unwrap_err(),
            _ => reader.get_str(col).map(|_| ()).unwrap_err(),
        };
        assert!(matches!(err, ColumnixError::TypeMismatch(..)));
        assert!(reader.error().is_none());
        assert!(matches!(
            reader.get_bit(7).unwrap_err(),
            ColumnixError::OutOfBounds(..)
        ));
    }

    #[test]
    fn random_access_row_group() {
        let reader = FileReader::new(file(&rows(), 2)).unwrap();
        let mut row_group = reader.row_group(1).unwrap();
        assert_eq!(row_group.row_count(), 1);
        assert_eq!(
            row_group.column(1).unwrap().get_str(0).unwrap(),
            Some("baz@bar.com")
        );
        assert!(matches!(
            row_group.column(3).unwrap_err(),
            ColumnixError::OutOfBounds(..)
        ));
        assert!(reader.row_group(2).is_err());
    }

    #[test]
    fn decode_failure_is_sticky() {
        let bytes = file(&rows(), 2);
        let reader = FileReader::new(bytes.clone()).unwrap();
        let row_group = &reader.metadata().row_groups()[0];
        let email = (row_group.offset() + row_group.columns()[1].offset()) as usize;

        // The email chunk is uncompressed: one validity byte, then the string offsets.
        let mut corrupted = bytes.to_vec();
        corrupted[email + 1..email + 5].fill(0xff);
        let mut reader = FileReader::new(Bytes::from(corrupted)).unwrap();

        assert!(reader.next());
        assert_eq!(reader.get_i64(0).unwrap(), 1400000000000);
        let err = reader.get_str(1).map(|_| ()).unwrap_err();
        assert!(err.is_terminal());
        assert!(matches!(err.root(), ColumnixError::CorruptData(..)));
        assert!(reader.error().is_some());

        assert!(!reader.next());
        reader.rewind();
        assert!(!reader.next());
        assert!(matches!(
            reader.get_i32(2).unwrap_err(),
            ColumnixError::Shared(..)
        ));
    }

    #[test]
    fn empty_file() {
        let mut writer = FileWriter::new(Vec::new(), WriteOptions::default()).unwrap();
        writer
            .add_column(ColumnDef::try_new(ColumnType::Bit, "flag").unwrap())
            .unwrap();
        writer.finish_with_sync(false).unwrap();
        let mut reader = FileReader::new(Bytes::from(writer.into_inner().unwrap())).unwrap();
        assert_eq!(reader.row_count(), 0);
        assert_eq!(reader.schema().len(), 1);
        assert!(!reader.next());
        assert!(reader.error().is_none());
    }
}
