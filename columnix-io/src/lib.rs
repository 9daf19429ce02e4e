//! Core traits and implementations for blocking IO.
//!
//! The Columnix file format writes through a [`ColumnixWrite`] sink, which adds durable syncing to
//! [`std::io::Write`], and reads through a [`ColumnixReadAt`] source that serves positional byte
//! ranges. Files on disk are read through a memory map.

pub use mmap::*;
pub use read::*;
pub use write::*;

mod mmap;
mod read;
mod write;

/// Alignment, in bytes, of every column chunk within a file.
pub const ALIGNMENT: usize = 8;
