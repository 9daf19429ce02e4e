use std::fmt::{Display, Formatter};
use std::fs::File;
use std::path::Path;

use columnix_dtype::{ColumnDef, Schema, Value};
use columnix_error::{ColumnixError, ColumnixResult, cx_bail, cx_err};
use columnix_io::{ColumnixWrite, PositionedWriter};
use log::{debug, info, warn};

use crate::{
    EndOfFile, FileMetadata, RowGroupMetadata, RowGroupWriter, WriteOptions, header_bytes,
    write_footer,
};

/// The lifecycle of a [`FileWriter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    /// Columns may be added; no row has been written yet.
    Configuring,
    /// Rows are being written; the schema is frozen.
    Writing,
    /// The footer has been written.
    Finished,
    /// An unrecoverable error occurred; nothing more will be written.
    Failed,
}

impl Display for WriterState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            WriterState::Configuring => write!(f, "configuring"),
            WriterState::Writing => write!(f, "writing"),
            WriterState::Finished => write!(f, "finished"),
            WriterState::Failed => write!(f, "failed"),
        }
    }
}

/// Writes rows into a Columnix file.
///
/// The header is written on construction. Columns are added with [`FileWriter::add_column`]
/// until the first [`FileWriter::put`], after which the schema is frozen. Rows are buffered and
/// flushed as a row group every [`WriteOptions::row_group_size`] rows; [`FileWriter::finish`]
/// flushes the remaining rows and writes the footer.
///
/// Invalid input is rejected without changing anything. An IO or encoding failure while
/// flushing moves the writer to [`WriterState::Failed`], after which every call fails with
/// [`ColumnixError::InvalidState`]. A writer dropped before finishing leaves a file without a
/// footer, which readers reject.
pub struct FileWriter<W: ColumnixWrite> {
    write: Option<PositionedWriter<W>>,
    options: WriteOptions,
    schema: Schema,
    state: WriterState,
    row_group: Option<RowGroupWriter>,
    row_groups: Vec<RowGroupMetadata>,
    rows_written: u64,
}

impl FileWriter<File> {
    /// Create or truncate the file at `path` and write its header.
    pub fn create(path: impl AsRef<Path>, options: WriteOptions) -> ColumnixResult<Self> {
        let path = path.as_ref();
        options.validate()?;
        let file = File::create(path).map_err(|e| {
            ColumnixError::from(e).with_context(format!("Failed to create {}", path.display()))
        })?;
        Self::new(file, options)
    }
}

impl<W: ColumnixWrite> FileWriter<W> {
    /// Start a file in `sink` by writing its header.
    pub fn new(sink: W, options: WriteOptions) -> ColumnixResult<Self> {
        options.validate()?;
        let mut write = PositionedWriter::new(sink);
        write.write_all(&header_bytes())?;
        Ok(Self {
            write: Some(write),
            options,
            schema: Schema::empty(),
            state: WriterState::Configuring,
            row_group: None,
            row_groups: Vec::new(),
            rows_written: 0,
        })
    }

    /// Start a file in `sink` with the columns of `schema`.
    pub fn try_new_with_schema(
        sink: W,
        schema: Schema,
        options: WriteOptions,
    ) -> ColumnixResult<Self> {
        let mut writer = Self::new(sink, options)?;
        for column in schema.columns() {
            writer.add_column(column.clone())?;
        }
        Ok(writer)
    }

    /// Append a column to the schema, returning its index.
    ///
    /// Fails with [`ColumnixError::SchemaError`] once rows have been written or if the name is
    /// already taken.
    pub fn add_column(&mut self, column: ColumnDef) -> ColumnixResult<usize> {
        match self.state {
            WriterState::Configuring => {}
            WriterState::Writing => cx_bail!(
                SchemaError: "Cannot add column {} after rows have been written",
                column.name()
            ),
            state => cx_bail!(InvalidState: "Cannot add a column to a {state} writer"),
        }
        if column.name().len() > u16::MAX as usize {
            cx_bail!(
                SchemaError: "Column name of {} bytes is too long",
                column.name().len()
            );
        }
        // Buffers built by a rejected first row no longer match the schema.
        self.row_group = None;
        self.schema.push(column)
    }

    /// Write one row, with one value per column in schema order.
    ///
    /// The whole row is validated before any of it is buffered. When the row completes a row
    /// group, the row group is flushed.
    pub fn put(&mut self, row: &[Value]) -> ColumnixResult<()> {
        self.check_open()?;
        if self.schema.is_empty() {
            cx_bail!(SchemaError: "Cannot write rows without any columns");
        }

        let row_group_size = self.options.row_group_size();
        let schema = &self.schema;
        let row_group = self
            .row_group
            .get_or_insert_with(|| RowGroupWriter::new(schema, row_group_size));
        row_group.append_row(row)?;
        let is_full = row_group.is_full();
        self.state = WriterState::Writing;
        self.rows_written += 1;

        if is_full {
            if let Err(e) = self.flush() {
                return Err(self.fail(e));
            }
        }
        Ok(())
    }

    /// Write one row given as any sequence of values.
    pub fn put_row<I>(&mut self, row: I) -> ColumnixResult<()>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let row: Vec<Value> = row.into_iter().map(Into::into).collect();
        self.put(&row)
    }

    /// Flush the pending rows, write the footer, and sync if [`WriteOptions::sync`] asks for it.
    pub fn finish(&mut self) -> ColumnixResult<FileMetadata> {
        self.finish_with_sync(self.options.sync())
    }

    /// Flush the pending rows, write the footer, and sync if `sync` is set.
    ///
    /// A row group with no pending rows is not written.
    pub fn finish_with_sync(&mut self, sync: bool) -> ColumnixResult<FileMetadata> {
        self.check_open()?;
        match self.write_tail(sync) {
            Ok(metadata) => {
                self.state = WriterState::Finished;
                info!(
                    "Finished file of {} rows in {} row groups",
                    metadata.row_count(),
                    metadata.row_groups().len()
                );
                Ok(metadata)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    fn write_tail(&mut self, sync: bool) -> ColumnixResult<FileMetadata> {
        self.flush()?;

        let metadata = FileMetadata::try_new(self.schema.clone(), self.row_groups.clone())?;
        let footer = write_footer(&metadata)?;
        let footer_len = u32::try_from(footer.len())
            .map_err(|_| cx_err!("Footer of {} bytes exceeds u32", footer.len()))?;

        let write = self.sink()?;
        let eof = EndOfFile {
            footer_offset: write.position(),
            footer_len,
        };
        write.write_all(&footer)?;
        write.write_all(&eof.to_bytes())?;
        if sync {
            write.sync()?;
        } else {
            write.flush()?;
        }
        Ok(metadata)
    }

    fn flush(&mut self) -> ColumnixResult<()> {
        let Some(row_group) = self.row_group.as_mut() else {
            return Ok(());
        };
        let Some(write) = self.write.as_mut() else {
            cx_bail!(InvalidState: "Writer has no sink");
        };
        if let Some(metadata) = row_group.flush(write)? {
            debug!(
                "Row group {} holds {} rows",
                self.row_groups.len(),
                metadata.row_count()
            );
            self.row_groups.push(metadata);
        }
        Ok(())
    }

    fn fail(&mut self, err: ColumnixError) -> ColumnixError {
        warn!("Columnix writer failed: {err}");
        self.state = WriterState::Failed;
        self.row_group = None;
        err
    }

    fn check_open(&self) -> ColumnixResult<()> {
        match self.state {
            WriterState::Configuring | WriterState::Writing => Ok(()),
            state => cx_bail!(InvalidState: "Writer is {state}"),
        }
    }

    fn sink(&mut self) -> ColumnixResult<&mut PositionedWriter<W>> {
        self.write
            .as_mut()
            .ok_or_else(|| cx_err!(InvalidState: "Writer has no sink"))
    }

    /// Where the writer is in its lifecycle.
    pub fn state(&self) -> WriterState {
        self.state
    }

    /// The options the writer was created with.
    pub fn options(&self) -> &WriteOptions {
        &self.options
    }

    /// The columns configured so far.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The number of rows accepted, including rows not yet flushed.
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// The number of row groups flushed.
    pub fn row_groups_written(&self) -> usize {
        self.row_groups.len()
    }

    /// The number of rows waiting for the next flush.
    pub fn pending_rows(&self) -> usize {
        self.row_group.as_ref().map_or(0, RowGroupWriter::row_count)
    }

    /// The sink of a finished writer.
    pub fn into_inner(mut self) -> ColumnixResult<W> {
        if self.state != WriterState::Finished {
            cx_bail!(InvalidState: "Writer is {}, not finished", self.state);
        }
        self.write
            .take()
            .map(PositionedWriter::into_inner)
            .ok_or_else(|| cx_err!(InvalidState: "Writer has no sink"))
    }
}

impl<W: ColumnixWrite> Drop for FileWriter<W> {
    fn drop(&mut self) {
        if matches!(
            self.state,
            WriterState::Configuring | WriterState::Writing
        ) {
            warn!(
                "Columnix writer dropped without finishing; {} rows were accepted and the file is incomplete",
                self.rows_written
            );
        }
    }
}
