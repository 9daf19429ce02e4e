//! In-memory columns for Columnix.
//!
//! A [`ColumnBuffer`] accumulates the values of one column for the row group that is currently
//! being built. Taking the buffer yields a [`ColumnArray`], which knows how to lay itself out in
//! the canonical byte format consumed by the codecs, and how to rebuild itself from those bytes
//! on the read path.
//!
//! # Canonical layout
//!
//! All integers are little-endian. Bitmaps are packed eight rows per byte, most significant bit
//! first.
//!
//! | type                        | values section                                             |
//! |-----------------------------|------------------------------------------------------------|
//! | `Bit`                       | `ceil(rows / 8)` bytes of packed bits                       |
//! | `Int32`, `Float32`          | `rows * 4` bytes                                            |
//! | `Int64`, `Float64`          | `rows * 8` bytes                                            |
//! | `String`                    | `rows + 1` `u32` offsets followed by the UTF-8 bytes        |
//!
//! Null rows hold a zero placeholder in fixed-width sections and an empty string in the string
//! section, so every section spans all rows.

pub use array::*;
pub use builder::*;
pub use canonical::*;
pub use stats::*;
pub use validity::*;

mod array;
mod builder;
mod canonical;
mod stats;
mod validity;
