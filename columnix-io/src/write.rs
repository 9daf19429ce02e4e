use std::fs::File;
use std::io::{self, Cursor, Write};

/// A sink the file writer can stream bytes into and make durable.
pub trait ColumnixWrite: Write {
    /// Force everything written so far to durable storage.
    ///
    /// In-memory sinks have nothing to sync.
    fn sync(&mut self) -> io::Result<()>;
}

impl ColumnixWrite for File {
    fn sync(&mut self) -> io::Result<()> {
        self.flush()?;
        self.sync_all()
    }
}

impl ColumnixWrite for Vec<u8> {
    fn sync(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl ColumnixWrite for Cursor<Vec<u8>> {
    fn sync(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<W: ColumnixWrite + ?Sized> ColumnixWrite for &mut W {
    fn sync(&mut self) -> io::Result<()> {
        (**self).sync()
    }
}

impl<W: ColumnixWrite + ?Sized> ColumnixWrite for Box<W> {
    fn sync(&mut self) -> io::Result<()> {
        (**self).sync()
    }
}

/// A writer that tracks how many bytes have passed through it.
///
/// Offsets recorded in a file's footer are positions reported by this writer.
#[derive(Debug)]
pub struct PositionedWriter<W> {
    inner: W,
    position: u64,
}

impl<W: ColumnixWrite> PositionedWriter<W> {
    /// Wrap `inner`, counting positions from zero.
    pub fn new(inner: W) -> Self {
        Self { inner, position: 0 }
    }

    /// The number of bytes written so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Write all of `buf`.
    pub fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.inner.write_all(buf)?;
        self.position += buf.len() as u64;
        Ok(())
    }

    /// Write zeros until the position is a multiple of `alignment`, returning how many were
    /// written.
    pub fn pad_to(&mut self, alignment: usize) -> io::Result<usize> {
        let padding = padding_for(self.position, alignment);
        if padding > 0 {
            self.write_all(&[0u8; 64][..padding])?;
        }
        Ok(padding)
    }

    /// Flush and sync the underlying sink.
    pub fn sync(&mut self) -> io::Result<()> {
        self.inner.flush()?;
        self.inner.sync()
    }

    /// Flush the underlying sink.
    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    /// The underlying sink.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Unwrap the underlying sink.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// The number of bytes needed to bring `position` up to a multiple of `alignment`, which must be
/// a power of two no larger than 64.
pub const fn padding_for(position: u64, alignment: usize) -> usize {
    let alignment = alignment as u64;
    ((alignment - position % alignment) % alignment) as usize
}
