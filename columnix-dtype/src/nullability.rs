use std::fmt::{Display, Formatter};

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Whether a column accepts `null` values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum Nullability {
    /// Values in this column are guaranteed to be non-null
    NonNullable = 0,
    /// Values in this column may be null
    Nullable = 1,
}

// Not derived: a `#[default]` variant makes `TryFromPrimitive` map unknown tags to it.
#[allow(clippy::derivable_impls)]
impl Default for Nullability {
    fn default() -> Self {
        Self::Nullable
    }
}

impl Nullability {
    /// A self-describing displayed form.
    ///
    /// The usual Display renders [Nullability::NonNullable] as the empty string.
    pub fn verbose_display(&self) -> impl Display {
        match self {
            Nullability::NonNullable => "NonNullable",
            Nullability::Nullable => "Nullable",
        }
    }
}

impl From<bool> for Nullability {
    fn from(value: bool) -> Self {
        if value {
            Self::Nullable
        } else {
            Self::NonNullable
        }
    }
}

impl From<Nullability> for bool {
    fn from(value: Nullability) -> Self {
        match value {
            Nullability::NonNullable => false,
            Nullability::Nullable => true,
        }
    }
}

impl Display for Nullability {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonNullable => write!(f, ""),
            Self::Nullable => write!(f, "?"),
        }
    }
}
