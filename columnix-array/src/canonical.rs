use columnix_dtype::ColumnType;
use columnix_error::{ColumnixExpect, ColumnixResult, cx_bail, cx_err};

/// Width of a string offset in the canonical layout.
pub const OFFSET_WIDTH: usize = size_of::<u32>();

/// The number of bytes needed to bit-pack `len` rows.
pub const fn packed_bits_len(len: usize) -> usize {
    len.div_ceil(8)
}

/// The exact size of the canonical values section, for types whose size only depends on the row
/// count.
pub fn fixed_values_len(
    column_type: ColumnType,
    row_count: usize,
) -> ColumnixResult<Option<usize>> {
    match column_type {
        ColumnType::Bit => Ok(Some(packed_bits_len(row_count))),
        ColumnType::String => Ok(None),
        t => t
            .fixed_width()
            .map(|width| section_len(row_count, width))
            .transpose(),
    }
}

/// The smallest values section that can hold `row_count` rows of `column_type`.
///
/// Row counts read from a file are checked against this before anything is allocated for them.
pub fn min_values_len(column_type: ColumnType, row_count: usize) -> ColumnixResult<usize> {
    match fixed_values_len(column_type, row_count)? {
        Some(len) => Ok(len),
        None => row_count
            .checked_add(1)
            .ok_or_else(|| cx_err!(CorruptData: "String section of {row_count} rows is too large"))
            .and_then(|offsets| section_len(offsets, OFFSET_WIDTH)),
    }
}

fn section_len(count: usize, width: usize) -> ColumnixResult<usize> {
    count
        .checked_mul(width)
        .ok_or_else(|| cx_err!(CorruptData: "{count} values of {width} bytes do not fit in memory"))
}

/// A fixed-width native type stored little-endian in the canonical layout.
pub trait NativeValue: Copy + Default + PartialOrd + 'static {
    /// The column type this native type backs.
    const COLUMN_TYPE: ColumnType;
    /// Width in bytes.
    const WIDTH: usize;

    /// Append the little-endian bytes of `self`.
    fn write_le(self, out: &mut Vec<u8>);

    /// Read one value from exactly [`NativeValue::WIDTH`] bytes.
    fn read_le(bytes: &[u8]) -> Self;
}

macro_rules! native_value {
    ($T:ty, $column_type:ident) => {
        impl NativeValue for $T {
            const COLUMN_TYPE: ColumnType = ColumnType::$column_type;
            const WIDTH: usize = size_of::<$T>();

            #[inline]
            fn write_le(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }

            #[inline]
            fn read_le(bytes: &[u8]) -> Self {
                <$T>::from_le_bytes(bytes.try_into().cx_expect("NativeValue::read_le width"))
            }
        }
    };
}

native_value!(i32, Int32);
native_value!(i64, Int64);
native_value!(f32, Float32);
native_value!(f64, Float64);

/// Write a slice of native values in canonical layout.
pub fn write_native<T: NativeValue>(values: &[T], out: &mut Vec<u8>) {
    out.reserve(values.len() * T::WIDTH);
    for v in values {
        v.write_le(out);
    }
}

/// Read `row_count` native values, which must exactly fill `bytes`.
pub fn read_native<T: NativeValue>(bytes: &[u8], row_count: usize) -> ColumnixResult<Vec<T>> {
    let expected = section_len(row_count, T::WIDTH)?;
    if bytes.len() != expected {
        cx_bail!(
            CorruptData: "{} values of {} rows must be {} bytes, found {}",
            T::COLUMN_TYPE,
            row_count,
            expected,
            bytes.len()
        );
    }
    Ok(bytes.chunks_exact(T::WIDTH).map(T::read_le).collect())
}

/// A borrowed view over a string section in canonical layout.
#[derive(Debug, Clone)]
pub struct StringLayout<'a> {
    offsets: Vec<u32>,
    data: &'a [u8],
}

impl<'a> StringLayout<'a> {
    /// Parse and validate `row_count` strings from `bytes`.
    ///
    /// Offsets must start at zero, never decrease, and end exactly at the end of the data.
    pub fn parse(bytes: &'a [u8], row_count: usize) -> ColumnixResult<Self> {
        let offsets_len = min_values_len(ColumnType::String, row_count)?;
        if bytes.len() < offsets_len {
            cx_bail!(
                CorruptData: "String section of {row_count} rows needs {offsets_len} offset bytes, found {}",
                bytes.len()
            );
        }
        let (offset_bytes, data) = bytes.split_at(offsets_len);
        let offsets: Vec<u32> = offset_bytes
            .chunks_exact(OFFSET_WIDTH)
            .map(|c| u32::from_le_bytes(c.try_into().cx_expect("offset width")))
            .collect();

        if offsets.first() != Some(&0) {
            cx_bail!(CorruptData: "String offsets must start at 0");
        }
        if !offsets.is_sorted() {
            cx_bail!(CorruptData: "String offsets must not decrease");
        }
        let end = offsets.last().copied().unwrap_or_default() as usize;
        if end != data.len() {
            cx_bail!(
                CorruptData: "String offsets end at {end} but there are {} data bytes",
                data.len()
            );
        }
        Ok(Self { offsets, data })
    }

    /// The number of strings.
    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Whether there are no strings.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The bytes of string `idx`.
    pub fn value(&self, idx: usize) -> ColumnixResult<&'a [u8]> {
        if idx >= self.len() {
            return Err(cx_err!(OutOfBounds: idx, 0, self.len()));
        }
        let start = self.offsets[idx] as usize;
        let end = self.offsets[idx + 1] as usize;
        Ok(&self.data[start..end])
    }

    /// Iterate over the bytes of every string.
    pub fn iter(&self) -> impl Iterator<Item = &'a [u8]> + '_ {
        let data = self.data;
        self.offsets
            .windows(2)
            .map(move |w| &data[w[0] as usize..w[1] as usize])
    }

    /// The raw offsets, `len() + 1` of them.
    pub fn offsets(&self) -> &[u32] {
        &self.offsets
    }

    /// The concatenated string bytes.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }
}

/// Write strings in canonical layout.
pub fn write_strings<'a, I>(strings: I, out: &mut Vec<u8>) -> ColumnixResult<()>
where
    I: IntoIterator<Item = &'a [u8]>,
    I::IntoIter: Clone,
{
    let strings = strings.into_iter();
    let mut offset = 0u32;
    out.extend_from_slice(&offset.to_le_bytes());
    for s in strings.clone() {
        let len = u32::try_from(s.len())
            .map_err(|_| cx_err!(InvalidArgument: "String of {} bytes is too long", s.len()))?;
        offset = offset.checked_add(len).ok_or_else(
            || cx_err!(InvalidArgument: "String section exceeds {} bytes", u32::MAX),
        )?;
        out.extend_from_slice(&offset.to_le_bytes());
    }
    for s in strings {
        out.extend_from_slice(s);
    }
    Ok(())
}
