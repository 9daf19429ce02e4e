use std::io;
use std::ops::Range;
use std::sync::Arc;

use bytes::Bytes;
use columnix_error::cx_err;

/// A source that serves positional reads.
///
/// Reads return [`Bytes`] so that in-memory and memory-mapped sources can hand out slices
/// without copying.
pub trait ColumnixReadAt {
    /// Read the bytes in `range`.
    ///
    /// If the source does not have the requested bytes, fails with
    /// [`UnexpectedEof`][std::io::ErrorKind::UnexpectedEof].
    fn read_byte_range(&self, range: Range<u64>) -> io::Result<Bytes>;

    /// The number of bytes readable.
    fn size(&self) -> io::Result<u64>;
}

impl<T: ColumnixReadAt + ?Sized> ColumnixReadAt for Arc<T> {
    fn read_byte_range(&self, range: Range<u64>) -> io::Result<Bytes> {
        T::read_byte_range(self, range)
    }

    fn size(&self) -> io::Result<u64> {
        T::size(self)
    }
}

impl<T: ColumnixReadAt + ?Sized> ColumnixReadAt for &T {
    fn read_byte_range(&self, range: Range<u64>) -> io::Result<Bytes> {
        T::read_byte_range(self, range)
    }

    fn size(&self) -> io::Result<u64> {
        T::size(self)
    }
}

impl ColumnixReadAt for Bytes {
    fn read_byte_range(&self, range: Range<u64>) -> io::Result<Bytes> {
        let len = self.len() as u64;
        if range.start > range.end || range.end > len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                cx_err!("Range {range:?} is outside {len} bytes"),
            ));
        }
        // both ends are within the buffer
        Ok(self.slice(range.start as usize..range.end as usize))
    }

    fn size(&self) -> io::Result<u64> {
        Ok(self.len() as u64)
    }
}
