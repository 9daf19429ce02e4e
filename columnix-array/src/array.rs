use bit_vec::BitVec;
use columnix_dtype::{ColumnType, Value};
use columnix_error::{ColumnixResult, cx_bail, cx_err};

use crate::{
    ColumnStats, NativeValue, StringLayout, Validity, fixed_values_len, min_values_len,
    read_native, write_native, write_strings,
};

/// Variable-length strings stored as offsets into one shared buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringValues {
    offsets: Vec<u32>,
    data: String,
}

impl Default for StringValues {
    fn default() -> Self {
        Self {
            offsets: vec![0],
            data: String::new(),
        }
    }
}

impl StringValues {
    /// Check that a string of `len` bytes can be appended without overflowing the offsets.
    pub fn check_push(&self, len: usize) -> ColumnixResult<()> {
        let total = self.data.len() as u64 + len as u64;
        if total > u32::MAX as u64 {
            cx_bail!(
                InvalidArgument: "String data of one column chunk cannot exceed {} bytes",
                u32::MAX
            );
        }
        Ok(())
    }

    fn push(&mut self, value: &str) {
        self.data.push_str(value);
        // check_push keeps the data length within u32
        self.offsets.push(self.data.len() as u32);
    }

    /// The number of strings.
    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Whether there are no strings.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The string at `idx`, which must be in bounds.
    pub fn get(&self, idx: usize) -> &str {
        &self.data[self.offsets[idx] as usize..self.offsets[idx + 1] as usize]
    }

    /// Iterate over the strings.
    pub fn iter(&self) -> impl Iterator<Item = &str> + Clone + '_ {
        self.offsets
            .windows(2)
            .map(|w| &self.data[w[0] as usize..w[1] as usize])
    }

    fn try_from_layout(layout: &StringLayout<'_>) -> ColumnixResult<Self> {
        let data = String::from_utf8(layout.data().to_vec())
            .map_err(|e| cx_err!(CorruptData: "String data is not UTF-8: {e}"))?;
        let offsets = layout.offsets().to_vec();
        if let Some(o) = offsets.iter().find(|o| !data.is_char_boundary(**o as usize)) {
            cx_bail!(CorruptData: "String offset {o} splits a UTF-8 character");
        }
        Ok(Self { offsets, data })
    }
}

/// The values of a column, one variant per [`ColumnType`].
///
/// Null rows hold a placeholder so that every variant spans all rows.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    /// Bit-packed booleans
    Bit(BitVec),
    /// 32-bit integers
    Int32(Vec<i32>),
    /// 64-bit integers
    Int64(Vec<i64>),
    /// 32-bit floats
    Float32(Vec<f32>),
    /// 64-bit floats
    Float64(Vec<f64>),
    /// UTF-8 strings
    String(StringValues),
}

impl ColumnValues {
    /// Empty values of `column_type`, with room for `capacity` rows.
    pub fn with_capacity(column_type: ColumnType, capacity: usize) -> Self {
        match column_type {
            ColumnType::Bit => ColumnValues::Bit(BitVec::with_capacity(capacity)),
            ColumnType::Int32 => ColumnValues::Int32(Vec::with_capacity(capacity)),
            ColumnType::Int64 => ColumnValues::Int64(Vec::with_capacity(capacity)),
            ColumnType::Float32 => ColumnValues::Float32(Vec::with_capacity(capacity)),
            ColumnType::Float64 => ColumnValues::Float64(Vec::with_capacity(capacity)),
            ColumnType::String => {
                let mut offsets = Vec::with_capacity(capacity.saturating_add(1));
                offsets.push(0);
                ColumnValues::String(StringValues {
                    offsets,
                    data: String::new(),
                })
            }
        }
    }

    /// The type of the values.
    pub fn column_type(&self) -> ColumnType {
        match self {
            ColumnValues::Bit(_) => ColumnType::Bit,
            ColumnValues::Int32(_) => ColumnType::Int32,
            ColumnValues::Int64(_) => ColumnType::Int64,
            ColumnValues::Float32(_) => ColumnType::Float32,
            ColumnValues::Float64(_) => ColumnType::Float64,
            ColumnValues::String(_) => ColumnType::String,
        }
    }

    /// The number of rows, including null placeholders.
    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Bit(v) => v.len(),
            ColumnValues::Int32(v) => v.len(),
            ColumnValues::Int64(v) => v.len(),
            ColumnValues::Float32(v) => v.len(),
            ColumnValues::Float64(v) => v.len(),
            ColumnValues::String(v) => v.len(),
        }
    }

    /// Whether there are no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append `value`, or the type's placeholder for [`Value::Null`].
    ///
    /// The caller has already checked the value's type.
    fn push(&mut self, value: &Value) {
        match (self, value) {
            (ColumnValues::Bit(v), Value::Bit(b)) => v.push(*b),
            (ColumnValues::Int32(v), Value::Int32(x)) => v.push(*x),
            (ColumnValues::Int64(v), Value::Int64(x)) => v.push(*x),
            (ColumnValues::Float32(v), Value::Float32(x)) => v.push(*x),
            (ColumnValues::Float64(v), Value::Float64(x)) => v.push(*x),
            (ColumnValues::String(v), Value::String(s)) => v.push(s),
            (values, _) => values.push_placeholder(),
        }
    }

    fn push_placeholder(&mut self) {
        match self {
            ColumnValues::Bit(v) => v.push(false),
            ColumnValues::Int32(v) => v.push(0),
            ColumnValues::Int64(v) => v.push(0),
            ColumnValues::Float32(v) => v.push(0.0),
            ColumnValues::Float64(v) => v.push(0.0),
            ColumnValues::String(v) => v.push(""),
        }
    }
}

/// A column of values with their validity, as taken from a
/// [`ColumnBuffer`](crate::ColumnBuffer) or decoded from a file.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnArray {
    validity: Validity,
    values: ColumnValues,
}

macro_rules! typed_getter {
    ($name:ident, $variant:ident, $T:ty) => {
        #[doc = concat!("The value at `idx` of a [`ColumnType::", stringify!($variant), "`] column, or `None` if it is null.")]
        pub fn $name(&self, idx: usize) -> ColumnixResult<Option<$T>> {
            self.check_index(idx)?;
            match &self.values {
                ColumnValues::$variant(v) => {
                    Ok(self.validity.is_valid(idx).then(|| v[idx]))
                }
                other => cx_bail!(
                    TypeMismatch: "Requested {} from a {} column",
                    ColumnType::$variant,
                    other.column_type()
                ),
            }
        }
    };
}

impl ColumnArray {
    /// An empty column of `column_type` with room for `capacity` rows.
    pub fn with_capacity(column_type: ColumnType, capacity: usize) -> Self {
        Self {
            validity: Validity::with_capacity(capacity),
            values: ColumnValues::with_capacity(column_type, capacity),
        }
    }

    /// Assemble a column from its parts, which must describe the same number of rows.
    pub fn try_new(validity: Validity, values: ColumnValues) -> ColumnixResult<Self> {
        if validity.len() != values.len() {
            cx_bail!(
                CorruptData: "Validity has {} rows but values have {}",
                validity.len(),
                values.len()
            );
        }
        Ok(Self { validity, values })
    }

    pub(crate) fn push(&mut self, value: &Value) {
        self.validity.append(!value.is_null());
        self.values.push(value);
    }

    /// The type of the column.
    pub fn column_type(&self) -> ColumnType {
        self.values.column_type()
    }

    /// The number of rows, including nulls.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The per-row validity.
    pub fn validity(&self) -> &Validity {
        &self.validity
    }

    /// The values, including null placeholders.
    pub fn values(&self) -> &ColumnValues {
        &self.values
    }

    /// The string values, if this is a string column.
    pub fn string_values(&self) -> Option<&StringValues> {
        match &self.values {
            ColumnValues::String(s) => Some(s),
            _ => None,
        }
    }

    /// The number of null rows.
    pub fn null_count(&self) -> usize {
        self.validity.null_count()
    }

    /// Whether row `idx` holds a value.
    pub fn is_valid(&self, idx: usize) -> bool {
        self.validity.is_valid(idx)
    }

    fn check_index(&self, idx: usize) -> ColumnixResult<()> {
        if idx >= self.len() {
            cx_bail!(OutOfBounds: idx, 0, self.len());
        }
        Ok(())
    }

    typed_getter!(get_i32, Int32, i32);
    typed_getter!(get_i64, Int64, i64);
    typed_getter!(get_f32, Float32, f32);
    typed_getter!(get_f64, Float64, f64);

    /// The value at `idx` of a [`ColumnType::Bit`] column, or `None` if it is null.
    pub fn get_bit(&self, idx: usize) -> ColumnixResult<Option<bool>> {
        self.check_index(idx)?;
        match &self.values {
            ColumnValues::Bit(v) => Ok(self
                .validity
                .is_valid(idx)
                .then(|| v.get(idx).unwrap_or(false))),
            other => cx_bail!(
                TypeMismatch: "Requested {} from a {} column",
                ColumnType::Bit,
                other.column_type()
            ),
        }
    }

    /// The value at `idx` of a [`ColumnType::String`] column, or `None` if it is null.
    pub fn get_str(&self, idx: usize) -> ColumnixResult<Option<&str>> {
        self.check_index(idx)?;
        match &self.values {
            ColumnValues::String(v) => Ok(self.validity.is_valid(idx).then(|| v.get(idx))),
            other => cx_bail!(
                TypeMismatch: "Requested {} from a {} column",
                ColumnType::String,
                other.column_type()
            ),
        }
    }

    /// The value at `idx` as a [`Value`].
    pub fn value(&self, idx: usize) -> ColumnixResult<Value> {
        self.check_index(idx)?;
        if !self.validity.is_valid(idx) {
            return Ok(Value::Null);
        }
        Ok(match &self.values {
            ColumnValues::Bit(v) => Value::Bit(v.get(idx).unwrap_or(false)),
            ColumnValues::Int32(v) => Value::Int32(v[idx]),
            ColumnValues::Int64(v) => Value::Int64(v[idx]),
            ColumnValues::Float32(v) => Value::Float32(v[idx]),
            ColumnValues::Float64(v) => Value::Float64(v[idx]),
            ColumnValues::String(v) => Value::String(v.get(idx).to_string()),
        })
    }

    /// Summary statistics over the non-null rows.
    pub fn statistics(&self) -> ColumnStats {
        ColumnStats::compute(self)
    }

    /// The packed validity bitmap, or `None` when every row is valid.
    pub fn validity_to_bytes(&self) -> Option<Vec<u8>> {
        (self.null_count() > 0).then(|| self.validity.to_bytes())
    }

    /// Serialize the values section in canonical layout.
    pub fn values_to_bytes(&self) -> ColumnixResult<Vec<u8>> {
        let mut out = Vec::new();
        match &self.values {
            ColumnValues::Bit(v) => out.extend_from_slice(&v.to_bytes()),
            ColumnValues::Int32(v) => write_native(v, &mut out),
            ColumnValues::Int64(v) => write_native(v, &mut out),
            ColumnValues::Float32(v) => write_native(v, &mut out),
            ColumnValues::Float64(v) => write_native(v, &mut out),
            ColumnValues::String(v) => write_strings(v.iter().map(str::as_bytes), &mut out)?,
        }
        Ok(out)
    }

    /// Rebuild a column of `row_count` rows from its canonical sections.
    ///
    /// A missing validity section means every row is valid.
    pub fn try_from_canonical(
        column_type: ColumnType,
        row_count: usize,
        validity: Option<&[u8]>,
        values: &[u8],
    ) -> ColumnixResult<Self> {
        let min_len = min_values_len(column_type, row_count)?;
        if values.len() < min_len {
            cx_bail!(
                CorruptData: "{column_type} values of {row_count} rows need at least {min_len} bytes, found {}",
                values.len()
            );
        }
        if let Some(expected) = fixed_values_len(column_type, row_count)? {
            if values.len() != expected {
                cx_bail!(
                    CorruptData: "{column_type} values of {row_count} rows must be {expected} bytes, found {}",
                    values.len()
                );
            }
        }

        let validity = match validity {
            Some(bytes) => Validity::from_bytes(bytes, row_count)?,
            None => Validity::all_valid(row_count),
        };

        let values = match column_type {
            ColumnType::Bit => {
                let mut bits = BitVec::from_bytes(values);
                bits.truncate(row_count);
                ColumnValues::Bit(bits)
            }
            ColumnType::Int32 => ColumnValues::Int32(read_native(values, row_count)?),
            ColumnType::Int64 => ColumnValues::Int64(read_native(values, row_count)?),
            ColumnType::Float32 => ColumnValues::Float32(read_native(values, row_count)?),
            ColumnType::Float64 => ColumnValues::Float64(read_native(values, row_count)?),
            ColumnType::String => ColumnValues::String(StringValues::try_from_layout(
                &StringLayout::parse(values, row_count)?,
            )?),
        };

        Self::try_new(validity, values)
    }
}

impl<T: NativeValue> FromIterator<Option<T>> for ColumnArray
where
    Value: From<Option<T>>,
{
    fn from_iter<I: IntoIterator<Item = Option<T>>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut array = ColumnArray::with_capacity(T::COLUMN_TYPE, iter.size_hint().0);
        for v in iter {
            array.push(&Value::from(v));
        }
        array
    }
}
