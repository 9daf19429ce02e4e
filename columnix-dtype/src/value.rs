use std::fmt::{Display, Formatter};

use crate::ColumnType;

/// A single cell of a row: either `null` or a value of one of the [`ColumnType`]s.
///
/// Rows are plain slices of values, in schema column order.
#[derive(Debug, Clone, Default, PartialEq, PartialOrd)]
pub enum Value {
    /// The absence of a value
    #[default]
    Null,
    /// A [`ColumnType::Bit`] value
    Bit(bool),
    /// A [`ColumnType::Int32`] value
    Int32(i32),
    /// A [`ColumnType::Int64`] value
    Int64(i64),
    /// A [`ColumnType::Float32`] value
    Float32(f32),
    /// A [`ColumnType::Float64`] value
    Float64(f64),
    /// A [`ColumnType::String`] value
    String(String),
}

/// A row of values, one per schema column.
pub type Row = Vec<Value>;

impl Value {
    /// The type of the value, or `None` for [`Value::Null`].
    pub fn column_type(&self) -> Option<ColumnType> {
        match self {
            Value::Null => None,
            Value::Bit(_) => Some(ColumnType::Bit),
            Value::Int32(_) => Some(ColumnType::Int32),
            Value::Int64(_) => Some(ColumnType::Int64),
            Value::Float32(_) => Some(ColumnType::Float32),
            Value::Float64(_) => Some(ColumnType::Float64),
            Value::String(_) => Some(ColumnType::String),
        }
    }

    /// Whether this is [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The boolean, if this is a [`Value::Bit`].
    pub fn as_bit(&self) -> Option<bool> {
        match self {
            Value::Bit(b) => Some(*b),
            _ => None,
        }
    }

    /// The integer, if this is a [`Value::Int32`].
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int32(v) => Some(*v),
            _ => None,
        }
    }

    /// The integer, if this is a [`Value::Int64`].
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// The float, if this is a [`Value::Float32`].
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Value::Float32(v) => Some(*v),
            _ => None,
        }
    }

    /// The float, if this is a [`Value::Float64`].
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float64(v) => Some(*v),
            _ => None,
        }
    }

    /// The string, if this is a [`Value::String`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Equality that treats floats by bit pattern, so `NaN` equals itself.
    pub fn bitwise_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Float32(a), Value::Float32(b)) => a.to_bits() == b.to_bits(),
            (Value::Float64(a), Value::Float64(b)) => a.to_bits() == b.to_bits(),
            (a, b) => a == b,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bit(b) => write!(f, "{b}"),
            Value::Int32(v) => write!(f, "{v}i32"),
            Value::Int64(v) => write!(f, "{v}i64"),
            Value::Float32(v) => write!(f, "{v}f32"),
            Value::Float64(v) => write!(f, "{v}f64"),
            Value::String(s) => {
                if s.chars().count() > 10 {
                    let head: String = s.chars().take(5).collect();
                    write!(f, "\"{head}..\"")
                } else {
                    write!(f, "\"{s}\"")
                }
            }
        }
    }
}

macro_rules! value_from {
    ($T:ty, $variant:ident) => {
        impl From<$T> for Value {
            fn from(value: $T) -> Self {
                Value::$variant(value)
            }
        }
    };
}

value_from!(bool, Bit);
value_from!(i32, Int32);
value_from!(i64, Int64);
value_from!(f32, Float32);
value_from!(f64, Float64);
value_from!(String, String);

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Build a [`Row`] from a list of expressions convertible into [`Value`].
///
/// ```
/// use columnix_dtype::{row, Value};
///
/// let r = row![1400000000000i64, "foo@bar.com", None::<i32>];
/// assert_eq!(r[2], Value::Null);
/// ```
#[macro_export]
macro_rules! row {
    () => { Vec::<$crate::Value>::new() };
    ($($x:expr),+ $(,)?) => {
        vec![$($crate::Value::from($x)),+]
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions() {
        assert_eq!(Value::from(true).column_type(), Some(ColumnType::Bit));
        assert_eq!(Value::from(7i32).as_i32(), Some(7));
        assert_eq!(Value::from(7i64).as_i32(), None);
        assert_eq!(Value::from("a").as_str(), Some("a"));
        assert_eq!(Value::from(None::<f64>), Value::Null);
        assert_eq!(Value::from(Some(1.5f64)), Value::Float64(1.5));
    }

    #[test]
    fn nan_is_bitwise_equal() {
        let nan = Value::Float64(f64::NAN);
        assert_ne!(nan, nan.clone());
        assert!(nan.bitwise_eq(&nan.clone()));
    }

    #[test]
    fn display_truncates_long_strings() {
        assert_eq!(Value::from("abcdefghijklmnop").to_string(), "\"abcde..\"");
        assert_eq!(Value::Null.to_string(), "null");
    }

    #[test]
    fn row_macro() {
        let r = row![1i64, "x", None::<i32>, true];
        assert_eq!(
            r,
            vec![
                Value::Int64(1),
                Value::String("x".into()),
                Value::Null,
                Value::Bit(true)
            ]
        );
    }
}
