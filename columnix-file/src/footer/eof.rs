use bytes::{Buf, BufMut};
use columnix_error::{ColumnixResult, cx_bail};

use crate::{EOF_SIZE, HEADER_SIZE, MAGIC_BYTES, VERSION};

/// The bytes every file starts with.
pub(crate) fn header_bytes() -> [u8; HEADER_SIZE] {
    let mut header = [0u8; HEADER_SIZE];
    let mut buf = &mut header[..];
    buf.put_slice(&MAGIC_BYTES);
    buf.put_u16_le(VERSION);
    buf.put_u16_le(0);
    header
}

/// Check the header of a file.
pub(crate) fn check_header(header: &[u8]) -> ColumnixResult<()> {
    if header.len() != HEADER_SIZE {
        cx_bail!(CorruptData: "Malformed file, header is {} bytes", header.len());
    }
    let (magic, mut rest) = header.split_at(MAGIC_BYTES.len());
    if magic != MAGIC_BYTES {
        cx_bail!(CorruptData: "Malformed file, invalid magic bytes, got {magic:?}");
    }
    let version = rest.get_u16_le();
    if version != VERSION {
        cx_bail!(CorruptData: "Malformed file, unsupported version {version}");
    }
    Ok(())
}

/// The end-of-file marker: where the footer is, closed by the magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct EndOfFile {
    pub footer_offset: u64,
    pub footer_len: u32,
}

impl EndOfFile {
    pub fn to_bytes(self) -> [u8; EOF_SIZE] {
        let mut eof = [0u8; EOF_SIZE];
        let mut buf = &mut eof[..];
        buf.put_u64_le(self.footer_offset);
        buf.put_u32_le(self.footer_len);
        buf.put_slice(&MAGIC_BYTES);
        eof
    }

    pub fn parse(eof: &[u8]) -> ColumnixResult<Self> {
        if eof.len() != EOF_SIZE {
            cx_bail!(CorruptData: "Malformed file, end of file marker is {} bytes", eof.len());
        }
        let magic = &eof[EOF_SIZE - MAGIC_BYTES.len()..];
        if magic != MAGIC_BYTES {
            cx_bail!(
                CorruptData: "Malformed file, invalid trailing magic bytes, got {magic:?}; the file may be incomplete"
            );
        }
        let mut buf = eof;
        Ok(Self {
            footer_offset: buf.get_u64_le(),
            footer_len: buf.get_u32_le(),
        })
    }
}
