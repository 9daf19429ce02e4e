use std::fmt::{Display, Formatter};

use columnix_error::{ColumnixResult, cx_err};
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// The closed set of value types a column can hold.
///
/// The discriminant is the tag written to the file footer and must never change.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, IntoPrimitive, TryFromPrimitive,
)]
#[repr(u8)]
pub enum ColumnType {
    /// A single bit, stored bit-packed
    Bit = 0,
    /// A signed 32-bit integer
    Int32 = 1,
    /// A signed 64-bit integer
    Int64 = 2,
    /// An IEEE-754 single precision float
    Float32 = 3,
    /// An IEEE-754 double precision float
    Float64 = 4,
    /// A variable-length UTF-8 string
    String = 5,
}

impl ColumnType {
    /// Every column type, in tag order.
    pub const ALL: [ColumnType; 6] = [
        ColumnType::Bit,
        ColumnType::Int32,
        ColumnType::Int64,
        ColumnType::Float32,
        ColumnType::Float64,
        ColumnType::String,
    ];

    /// The width in bytes of one value, for byte-aligned fixed-width types.
    ///
    /// [`ColumnType::Bit`] is bit-packed and [`ColumnType::String`] is variable-width, neither has
    /// a byte width.
    pub const fn fixed_width(self) -> Option<usize> {
        match self {
            ColumnType::Int32 | ColumnType::Float32 => Some(4),
            ColumnType::Int64 | ColumnType::Float64 => Some(8),
            ColumnType::Bit | ColumnType::String => None,
        }
    }

    /// Whether values of this type are length-prefixed rather than fixed-width.
    pub const fn is_variable_width(self) -> bool {
        matches!(self, ColumnType::String)
    }

    /// Whether this is one of the signed integer types.
    pub const fn is_int(self) -> bool {
        matches!(self, ColumnType::Int32 | ColumnType::Int64)
    }

    /// Whether this is one of the floating point types.
    pub const fn is_float(self) -> bool {
        matches!(self, ColumnType::Float32 | ColumnType::Float64)
    }

    /// Decode a type tag read from a file.
    pub fn from_tag(tag: u8) -> ColumnixResult<Self> {
        Self::try_from(tag).map_err(|_| cx_err!(CorruptData: "Unknown column type tag {tag}"))
    }

    /// The short lowercase name of the type.
    pub const fn name(&self) -> &'static str {
        match self {
            ColumnType::Bit => "bit",
            ColumnType::Int32 => "i32",
            ColumnType::Int64 => "i64",
            ColumnType::Float32 => "f32",
            ColumnType::Float64 => "f64",
            ColumnType::String => "str",
        }
    }
}

impl Display for ColumnType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn never_change_these_tags() {
        let tags: Vec<u8> = ColumnType::ALL.iter().map(|t| u8::from(*t)).collect();
        assert_eq!(tags, vec![0, 1, 2, 3, 4, 5]);
    }

    #[rstest]
    #[case(ColumnType::Bit, None)]
    #[case(ColumnType::Int32, Some(4))]
    #[case(ColumnType::Int64, Some(8))]
    #[case(ColumnType::Float32, Some(4))]
    #[case(ColumnType::Float64, Some(8))]
    #[case(ColumnType::String, None)]
    fn widths(#[case] column_type: ColumnType, #[case] width: Option<usize>) {
        assert_eq!(column_type.fixed_width(), width);
        assert_eq!(ColumnType::from_tag(column_type.into()).unwrap(), column_type);
    }

    #[test]
    fn unknown_tag_is_corrupt() {
        assert!(ColumnType::from_tag(6).is_err());
        assert!(ColumnType::from_tag(u8::MAX).is_err());
    }
}
