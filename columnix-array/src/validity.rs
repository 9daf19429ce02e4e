use bit_vec::BitVec;
use columnix_error::{ColumnixResult, cx_bail};

use crate::packed_bits_len;

/// The validity of each row of a column: a set bit marks a non-null row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validity {
    bits: BitVec,
    null_count: usize,
}

impl Validity {
    /// An empty validity with room for `capacity` rows.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bits: BitVec::with_capacity(capacity),
            null_count: 0,
        }
    }

    /// `len` rows, all of them valid.
    pub fn all_valid(len: usize) -> Self {
        Self {
            bits: BitVec::from_elem(len, true),
            null_count: 0,
        }
    }

    /// Parse a packed bitmap of `len` rows.
    pub fn from_bytes(bytes: &[u8], len: usize) -> ColumnixResult<Self> {
        if bytes.len() != packed_bits_len(len) {
            cx_bail!(
                CorruptData: "Validity bitmap of {len} rows must be {} bytes, found {}",
                packed_bits_len(len),
                bytes.len()
            );
        }
        let mut bits = BitVec::from_bytes(bytes);
        bits.truncate(len);
        let null_count = bits.iter().filter(|valid| !valid).count();
        Ok(Self { bits, null_count })
    }

    /// Pack the bitmap, eight rows per byte.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.bits.to_bytes()
    }

    /// Record the validity of the next row.
    pub fn append(&mut self, valid: bool) {
        self.bits.push(valid);
        if !valid {
            self.null_count += 1;
        }
    }

    /// Whether row `idx` holds a value. Rows past the end are reported as null.
    pub fn is_valid(&self, idx: usize) -> bool {
        self.bits.get(idx).unwrap_or(false)
    }

    /// The number of rows.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Whether there are no rows.
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// The number of null rows.
    pub fn null_count(&self) -> usize {
        self.null_count
    }
}
