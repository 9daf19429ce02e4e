use std::fs::File;
use std::io;
use std::ops::Range;
use std::path::Path;

use bytes::Bytes;
use memmap2::Mmap;

use crate::ColumnixReadAt;

/// A read-only file mapped into memory.
///
/// Cloning is cheap and shares the mapping, which is released when the last clone and every
/// [`Bytes`] read from it are dropped.
#[derive(Debug, Clone)]
pub struct MmapFile {
    bytes: Bytes,
}

impl MmapFile {
    /// Map the file at `path`.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::open(path)?;
        // SAFETY: the mapping is read-only. Files written by this crate are never modified in
        // place once finished.
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Self {
            bytes: Bytes::from_owner(mmap),
        })
    }

    /// The whole file.
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }
}

impl ColumnixReadAt for MmapFile {
    fn read_byte_range(&self, range: Range<u64>) -> io::Result<Bytes> {
        self.bytes.read_byte_range(range)
    }

    fn size(&self) -> io::Result<u64> {
        Ok(self.bytes.len() as u64)
    }
}
