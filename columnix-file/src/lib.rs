#![allow(clippy::cast_possible_truncation)]
//! Read and write Columnix files.
//!
//! A file holds rows of a fixed [`Schema`](columnix_dtype::Schema), split into row groups. Within
//! a row group every column is stored as one independently encoded and compressed chunk, so a
//! reader can decode a single column of a single row group without touching the rest.
//!
//! # Writing
//!
//! A [`FileWriter`] is configured with columns, then fed rows with [`FileWriter::put`]. Rows are
//! buffered per column and flushed as a row group whenever
//! [`WriteOptions::row_group_size`] rows have accumulated. [`FileWriter::finish`] flushes the
//! last, partial row group and writes the footer.
//!
//! # Reading
//!
//! A [`FileReader`] parses the footer on open, then walks rows with a cursor
//! ([`FileReader::next`]) and typed accessors. Row groups are loaded as the cursor reaches them
//! and columns are decoded on first access.
//!
//! # File Format
//!
//! All integers are little-endian.
//!
//! ```text
//! ┌────────────────────────────┐
//! │      8-byte Header         │
//! │ (Magic, Version, Reserved) │
//! ├────────────────────────────┤
//! │                            │
//! │        Row Group 0         │
//! │ (one chunk per column, in  │
//! │  schema order, each padded │
//! │    to 8-byte alignment)    │
//! │                            │
//! ├────────────────────────────┤
//! │            ...             │
//! ├────────────────────────────┤
//! │                            │
//! │          Footer            │
//! │  (Schema, Row Group Index, │
//! │    Chunk Statistics)       │
//! │                            │
//! ├────────────────────────────┤
//! │     16-byte End of File    │
//! │ (Footer Offset, Footer     │
//! │   Length, Magic Bytes)     │
//! └────────────────────────────┘
//! ```
//!
//! A file whose writer was never finished has no end-of-file marker and is rejected by the
//! reader.

mod footer;
mod options;
mod reader;
mod row_group;
#[cfg(test)]
mod tests;
mod writer;

pub use footer::*;
pub use forever_constant::*;
pub use options::*;
pub use reader::*;
pub use row_group::*;
pub use writer::*;

/// The current version of the Columnix file format
pub const VERSION: u16 = 1;

/// Constants that will never change (i.e., doing so would break backwards compatibility)
mod forever_constant {
    /// The extension for Columnix files
    pub const COLUMNIX_FILE_EXTENSION: &str = "clnx";

    /// The magic bytes opening and closing a Columnix file
    pub const MAGIC_BYTES: [u8; 4] = *b"CLNX";
    /// The size of the header in bytes
    pub const HEADER_SIZE: usize = 8;
    /// The size of the EOF marker in bytes
    pub const EOF_SIZE: usize = 16;

}
