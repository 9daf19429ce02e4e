use std::fmt::{Display, Formatter};

use columnix_error::{ColumnixResult, cx_err};
use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::ColumnType;

/// A reversible value-level transform applied to a column's values before compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum EncodingKind {
    /// Values are stored in their canonical layout.
    None = 0,
    /// Integers are stored as the first value followed by wrapping differences.
    Delta = 1,
    /// Values are replaced by `u32` codes into a table of distinct values.
    Dict = 2,
}

#[allow(clippy::derivable_impls)]
impl Default for EncodingKind {
    fn default() -> Self {
        Self::None
    }
}

impl EncodingKind {
    /// Whether this encoding can be applied to columns of `column_type`.
    pub const fn supports(self, column_type: ColumnType) -> bool {
        match self {
            EncodingKind::None => true,
            EncodingKind::Delta => column_type.is_int(),
            EncodingKind::Dict => !matches!(column_type, ColumnType::Bit),
        }
    }

    /// Decode an encoding tag read from a file.
    pub fn from_tag(tag: u8) -> ColumnixResult<Self> {
        Self::try_from(tag).map_err(|_| cx_err!(CorruptData: "Unknown encoding tag {tag}"))
    }
}

impl Display for EncodingKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            EncodingKind::None => write!(f, "none"),
            EncodingKind::Delta => write!(f, "delta"),
            EncodingKind::Dict => write!(f, "dict"),
        }
    }
}
