use std::fmt::{Display, Formatter};
use std::sync::Arc;

use columnix_error::{ColumnixResult, cx_bail};

use crate::{
    ColumnType, CompressionKind, DEFAULT_COMPRESSION_LEVEL, EncodingKind, Nullability, Value,
};

/// The name of a column
pub type ColumnName = Arc<str>;

/// The definition of a single column: its name, value type, and how its chunks are stored.
///
/// All settings are validated when they are applied, so a `ColumnDef` that exists is always
/// internally consistent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnDef {
    name: ColumnName,
    column_type: ColumnType,
    nullability: Nullability,
    encoding: EncodingKind,
    compression: CompressionKind,
    level: i32,
}

impl ColumnDef {
    /// Create a nullable, uncompressed, unencoded column.
    pub fn try_new(column_type: ColumnType, name: impl Into<ColumnName>) -> ColumnixResult<Self> {
        let name = name.into();
        if name.is_empty() {
            cx_bail!(SchemaError: "Column names must not be empty");
        }
        Ok(Self {
            name,
            column_type,
            nullability: Nullability::default(),
            encoding: EncodingKind::None,
            compression: CompressionKind::None,
            level: DEFAULT_COMPRESSION_LEVEL,
        })
    }

    /// Set the value encoding, which must support the column's type.
    pub fn with_encoding(mut self, encoding: EncodingKind) -> ColumnixResult<Self> {
        if !encoding.supports(self.column_type) {
            cx_bail!(
                InvalidConfiguration: "Encoding {encoding} does not support {} column {}",
                self.column_type,
                self.name
            );
        }
        self.encoding = encoding;
        Ok(self)
    }

    /// Set the compression algorithm and level, validating the level for that algorithm.
    pub fn with_compression(
        mut self,
        compression: CompressionKind,
        level: i32,
    ) -> ColumnixResult<Self> {
        self.level = compression.validate_level(level)?;
        self.compression = compression;
        Ok(self)
    }

    /// Set whether the column accepts nulls.
    pub fn with_nullability(mut self, nullability: Nullability) -> Self {
        self.nullability = nullability;
        self
    }

    /// Reassemble a definition from its stored parts, re-running every validation.
    pub fn try_from_parts(
        name: impl Into<ColumnName>,
        column_type: ColumnType,
        nullability: Nullability,
        encoding: EncodingKind,
        compression: CompressionKind,
        level: i32,
    ) -> ColumnixResult<Self> {
        Self::try_new(column_type, name)?
            .with_nullability(nullability)
            .with_encoding(encoding)?
            .with_compression(compression, level)
    }

    /// The column's name.
    pub fn name(&self) -> &ColumnName {
        &self.name
    }

    /// The column's value type.
    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    /// Whether the column accepts nulls.
    pub fn nullability(&self) -> Nullability {
        self.nullability
    }

    /// Whether the column accepts nulls.
    pub fn is_nullable(&self) -> bool {
        self.nullability.into()
    }

    /// The value encoding applied before compression.
    pub fn encoding(&self) -> EncodingKind {
        self.encoding
    }

    /// The compression algorithm.
    pub fn compression(&self) -> CompressionKind {
        self.compression
    }

    /// The compression level, meaningful only when compression is not
    /// [`CompressionKind::None`].
    pub fn level(&self) -> i32 {
        self.level
    }

    /// Check that `value` may be stored in this column.
    pub fn check_value(&self, value: &Value) -> ColumnixResult<()> {
        match value.column_type() {
            None if self.is_nullable() => Ok(()),
            None => cx_bail!(TypeMismatch: "Column {} is not nullable", self.name),
            Some(t) if t == self.column_type => Ok(()),
            Some(t) => cx_bail!(
                TypeMismatch: "Column {} has type {} but the value {} is {}",
                self.name,
                self.column_type,
                value,
                t
            ),
        }
    }
}

impl Display for ColumnDef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}{}", self.name, self.column_type, self.nullability)?;
        if self.encoding != EncodingKind::None {
            write!(f, " [{}]", self.encoding)?;
        }
        if self.compression != CompressionKind::None {
            write!(f, " [{}:{}]", self.compression, self.level)?;
        }
        Ok(())
    }
}
