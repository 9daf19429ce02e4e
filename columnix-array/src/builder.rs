use std::mem;

use columnix_dtype::{ColumnDef, ColumnType, Value};
use columnix_error::{ColumnixResult, cx_bail};

use crate::{ColumnArray, ColumnValues};

/// Accumulates the values of one column for the row group being built.
///
/// A buffer is bound to a column definition and holds at most `capacity` rows. Appends are
/// validated before anything is stored, so a failed append leaves the buffer untouched.
#[derive(Debug, Clone)]
pub struct ColumnBuffer {
    column: ColumnDef,
    capacity: usize,
    array: ColumnArray,
}

impl ColumnBuffer {
    /// An empty buffer for `column` that fills up after `capacity` rows.
    pub fn new(column: ColumnDef, capacity: usize) -> Self {
        let array = ColumnArray::with_capacity(column.column_type(), capacity);
        Self {
            column,
            capacity,
            array,
        }
    }

    /// The column this buffer accumulates.
    pub fn column(&self) -> &ColumnDef {
        &self.column
    }

    /// The type of the buffered values.
    pub fn column_type(&self) -> ColumnType {
        self.column.column_type()
    }

    /// Check that `value` could be appended, without appending it.
    pub fn check(&self, value: &Value) -> ColumnixResult<()> {
        if self.is_full() {
            cx_bail!(
                InvalidState: "Buffer for column {} is full at {} rows",
                self.column.name(),
                self.capacity
            );
        }
        self.column.check_value(value)?;
        if let (ColumnValues::String(strings), Value::String(s)) = (self.array.values(), value) {
            strings.check_push(s.len())?;
        }
        Ok(())
    }

    /// Append one value, or fail without modifying the buffer.
    pub fn append(&mut self, value: &Value) -> ColumnixResult<()> {
        self.check(value)?;
        self.array.push(value);
        Ok(())
    }

    /// The number of buffered rows.
    pub fn len(&self) -> usize {
        self.array.len()
    }

    /// Whether no rows are buffered.
    pub fn is_empty(&self) -> bool {
        self.array.is_empty()
    }

    /// The number of rows the buffer holds before it must be taken.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether the buffer holds `capacity` rows.
    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    /// The number of buffered nulls.
    pub fn null_count(&self) -> usize {
        self.array.null_count()
    }

    /// The buffered rows so far.
    pub fn array(&self) -> &ColumnArray {
        &self.array
    }

    /// Take the buffered rows, leaving the buffer empty and ready for the next row group.
    pub fn take(&mut self) -> ColumnixResult<ColumnArray> {
        if self.is_empty() {
            cx_bail!(InvalidState: "Buffer for column {} is empty", self.column.name());
        }
        let fresh = ColumnArray::with_capacity(self.column_type(), self.capacity);
        Ok(mem::replace(&mut self.array, fresh))
    }
}

#[cfg(test)]
mod tests {
    use columnix_dtype::Nullability;
    use columnix_error::ColumnixError;

    use super::*;

    fn buffer(column_type: ColumnType, capacity: usize) -> ColumnBuffer {
        ColumnBuffer::new(ColumnDef::try_new(column_type, "c").unwrap(), capacity)
    }

    #[test]
    fn fills_and_takes() {
        let mut buf = buffer(ColumnType::Int64, 2);
        buf.append(&1i64.into()).unwrap();
        assert!(!buf.is_full());
        buf.append(&Value::Null).unwrap();
        assert!(buf.is_full());
        assert_eq!(buf.null_count(), 1);
        assert!(matches!(
            buf.append(&3i64.into()).unwrap_err(),
            ColumnixError::InvalidState(..)
        ));

        let array = buf.take().unwrap();
        assert_eq!(array.len(), 2);
        assert_eq!(array.get_i64(0).unwrap(), Some(1));
        assert_eq!(array.get_i64(1).unwrap(), None);
        assert!(buf.is_empty());
        assert_eq!(buf.null_count(), 0);
    }

    #[test]
    fn take_empty_is_invalid() {
        let mut buf = buffer(ColumnType::String, 4);
        assert!(matches!(
            buf.take().unwrap_err(),
            ColumnixError::InvalidState(..)
        ));
    }

    #[test]
    fn rejected_values_leave_buffer_untouched() {
        let mut buf = ColumnBuffer::new(
            ColumnDef::try_new(ColumnType::String, "email")
                .unwrap()
                .with_nullability(Nullability::NonNullable),
            4,
        );
        buf.append(&"a".into()).unwrap();
        assert!(matches!(
            buf.append(&Value::Null).unwrap_err(),
            ColumnixError::TypeMismatch(..)
        ));
        assert!(matches!(
            buf.append(&5i32.into()).unwrap_err(),
            ColumnixError::TypeMismatch(..)
        ));
        assert_eq!(buf.len(), 1);
        assert_eq!(buf.array().get_str(0).unwrap(), Some("a"));
    }

    #[test]
    fn strings_fill_and_take_twice() {
        let mut buf = buffer(ColumnType::String, 2);
        assert!(buf.is_empty());
        buf.append(&"foo@bar.com".into()).unwrap();
        buf.append(&"".into()).unwrap();
        assert!(buf.is_full());

        let array = buf.take().unwrap();
        assert_eq!(array.len(), 2);
        assert_eq!(array.get_str(0).unwrap(), Some("foo@bar.com"));
        assert_eq!(array.get_str(1).unwrap(), Some(""));

        buf.append(&"baz".into()).unwrap();
        assert_eq!(buf.len(), 1);
        assert_eq!(buf.take().unwrap().get_str(0).unwrap(), Some("baz"));
    }
}
