use std::fmt::{Display, Formatter};

use columnix_error::{ColumnixResult, cx_bail, cx_err};
use itertools::Itertools;

use crate::{ColumnDef, Value};

/// An ordered list of column definitions.
///
/// A column is identified by its position; names are unique within a schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Schema {
    columns: Vec<ColumnDef>,
}

impl Schema {
    /// Create a schema with no columns.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a schema from column definitions, rejecting duplicate names.
    pub fn try_from_columns(columns: impl IntoIterator<Item = ColumnDef>) -> ColumnixResult<Self> {
        let mut schema = Self::empty();
        for column in columns {
            schema.push(column)?;
        }
        Ok(schema)
    }

    /// Append a column, returning its index.
    pub fn push(&mut self, column: ColumnDef) -> ColumnixResult<usize> {
        if self.find(column.name()).is_some() {
            cx_bail!(SchemaError: "Duplicate column name {}", column.name());
        }
        self.columns.push(column);
        Ok(self.columns.len() - 1)
    }

    /// The number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the schema has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// The column definitions, in order.
    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// Iterate over the column definitions, in order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &ColumnDef> {
        self.columns.iter()
    }

    /// The definition of the column at `idx`.
    pub fn column(&self, idx: usize) -> ColumnixResult<&ColumnDef> {
        self.columns
            .get(idx)
            .ok_or_else(|| cx_err!(OutOfBounds: idx, 0, self.columns.len()))
    }

    /// The index of the column called `name`.
    pub fn find(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name().as_ref() == name)
    }

    /// Check that `row` has one value per column and that every value fits its column.
    pub fn check_row(&self, row: &[Value]) -> ColumnixResult<()> {
        if row.len() != self.columns.len() {
            cx_bail!(RowArityError: self.columns.len(), row.len());
        }
        for (column, value) in self.columns.iter().zip_eq(row) {
            column.check_value(value)?;
        }
        Ok(())
    }
}

impl Display for Schema {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{{}}}", self.columns.iter().join(", "))
    }
}

impl<'a> IntoIterator for &'a Schema {
    type Item = &'a ColumnDef;
    type IntoIter = std::slice::Iter<'a, ColumnDef>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}

#[cfg(test)]
mod tests {
    use columnix_error::ColumnixError;

    use super::*;
    use crate::ColumnType;

    fn schema() -> Schema {
        Schema::try_from_columns([
            ColumnDef::try_new(ColumnType::Int64, "ts").unwrap(),
            ColumnDef::try_new(ColumnType::String, "email").unwrap(),
            ColumnDef::try_new(ColumnType::Int32, "id").unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn duplicate_names() {
        let mut schema = schema();
        let err = schema
            .push(ColumnDef::try_new(ColumnType::Bit, "email").unwrap())
            .unwrap_err();
        assert!(matches!(err, ColumnixError::SchemaError(..)));
        assert_eq!(schema.len(), 3);
        assert_eq!(schema.find("id"), Some(2));
    }

    #[test]
    fn check_row() {
        let schema = schema();
        schema
            .check_row(&[1i64.into(), "a".into(), 1i32.into()])
            .unwrap();
        assert!(matches!(
            schema.check_row(&[1i64.into()]).unwrap_err(),
            ColumnixError::RowArityError {
                expected: 3,
                actual: 1,
                ..
            }
        ));
        assert!(matches!(
            schema
                .check_row(&[1i64.into(), "a".into(), 1i64.into()])
                .unwrap_err(),
            ColumnixError::TypeMismatch(..)
        ));
    }

    #[test]
    fn out_of_bounds_column() {
        assert!(matches!(
            schema().column(3).unwrap_err(),
            ColumnixError::OutOfBounds(3, 0, 3, _)
        ));
    }

    #[test]
    fn display() {
        assert_eq!(schema().to_string(), "{ts: i64?, email: str?, id: i32?}");
    }
}
