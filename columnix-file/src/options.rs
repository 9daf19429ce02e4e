use columnix_error::{ColumnixResult, cx_bail};

/// The number of rows per row group unless configured otherwise.
pub const DEFAULT_ROW_GROUP_SIZE: usize = 100_000;

/// Options accepted by a [`FileWriter`](crate::FileWriter).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    row_group_size: usize,
    sync: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
            sync: true,
        }
    }
}

impl WriteOptions {
    /// Flush a row group every `row_group_size` rows.
    pub fn with_row_group_size(mut self, row_group_size: usize) -> Self {
        self.row_group_size = row_group_size;
        self
    }

    /// Whether [`FileWriter::finish`](crate::FileWriter::finish) forces the file to durable
    /// storage.
    pub fn with_sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    /// The number of rows per row group.
    pub fn row_group_size(&self) -> usize {
        self.row_group_size
    }

    /// Whether finishing syncs the file.
    pub fn sync(&self) -> bool {
        self.sync
    }

    /// Check that the options can be used to write a file.
    pub fn validate(&self) -> ColumnixResult<()> {
        if self.row_group_size == 0 {
            cx_bail!(InvalidConfiguration: "Row group size must be positive");
        }
        Ok(())
    }
}
