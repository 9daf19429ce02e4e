//! Columnix: a columnar on-disk format for rows of typed values.
//!
//! ```
//! use columnix::dtype::{ColumnDef, ColumnType, row};
//! use columnix::file::{FileReader, FileWriter, WriteOptions};
//!
//! let mut writer = FileWriter::new(Vec::new(), WriteOptions::default()).unwrap();
//! writer.add_column(ColumnDef::try_new(ColumnType::Int64, "ts").unwrap()).unwrap();
//! writer.add_column(ColumnDef::try_new(ColumnType::String, "email").unwrap()).unwrap();
//! writer.put(&row![1400000000000i64, "foo@bar.com"]).unwrap();
//! writer.finish_with_sync(false).unwrap();
//!
//! let bytes = bytes::Bytes::from(writer.into_inner().unwrap());
//! let mut reader = FileReader::new(bytes).unwrap();
//! while reader.next() {
//!     assert_eq!(reader.get_str(1).unwrap(), "foo@bar.com");
//! }
//! ```

pub use columnix_dtype::{ColumnDef, ColumnType, CompressionKind, EncodingKind, Schema, Value};
pub use columnix_error::{ColumnixError, ColumnixResult};
pub use columnix_file::{FileReader, FileWriter, WriteOptions, WriterState};
pub use {
    columnix_array as array, columnix_codec as codec, columnix_dtype as dtype,
    columnix_error as error, columnix_file as file, columnix_io as io,
};
