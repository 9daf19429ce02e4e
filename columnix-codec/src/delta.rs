use columnix_array::{NativeValue, read_native, write_native};
use columnix_dtype::{ColumnType, EncodingKind};
use columnix_error::{ColumnixResult, cx_bail};

use crate::Encoding;

/// Integers stored as the first value followed by the wrapping difference to each next value.
///
/// The output has the same width as the input, so the gain comes from compressing the small
/// differences of slowly changing columns such as timestamps.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeltaEncoding;

trait DeltaValue: NativeValue {
    fn wrapping_sub(self, rhs: Self) -> Self;
    fn wrapping_add(self, rhs: Self) -> Self;
}

macro_rules! delta_value {
    ($T:ty) => {
        impl DeltaValue for $T {
            #[inline]
            fn wrapping_sub(self, rhs: Self) -> Self {
                <$T>::wrapping_sub(self, rhs)
            }

            #[inline]
            fn wrapping_add(self, rhs: Self) -> Self {
                <$T>::wrapping_add(self, rhs)
            }
        }
    };
}

delta_value!(i32);
delta_value!(i64);

fn encode_typed<T: DeltaValue>(values: &[u8], row_count: usize) -> ColumnixResult<Vec<u8>> {
    let values = read_native::<T>(values, row_count)?;
    let mut prev = T::default();
    let deltas: Vec<T> = values
        .iter()
        .map(|&v| {
            let d = v.wrapping_sub(prev);
            prev = v;
            d
        })
        .collect();
    let mut out = Vec::with_capacity(row_count * T::WIDTH);
    write_native(&deltas, &mut out);
    Ok(out)
}

fn decode_typed<T: DeltaValue>(encoded: &[u8], row_count: usize) -> ColumnixResult<Vec<u8>> {
    let deltas = read_native::<T>(encoded, row_count)?;
    let mut acc = T::default();
    let values: Vec<T> = deltas
        .iter()
        .map(|&d| {
            acc = acc.wrapping_add(d);
            acc
        })
        .collect();
    let mut out = Vec::with_capacity(row_count * T::WIDTH);
    write_native(&values, &mut out);
    Ok(out)
}

impl Encoding for DeltaEncoding {
    fn kind(&self) -> EncodingKind {
        EncodingKind::Delta
    }

    fn encode(
        &self,
        column_type: ColumnType,
        row_count: usize,
        values: &[u8],
    ) -> ColumnixResult<Vec<u8>> {
        match column_type {
            ColumnType::Int32 => encode_typed::<i32>(values, row_count),
            ColumnType::Int64 => encode_typed::<i64>(values, row_count),
            other => cx_bail!(InvalidConfiguration: "Delta encoding does not support {other}"),
        }
    }

    fn decode(
        &self,
        column_type: ColumnType,
        row_count: usize,
        encoded: &[u8],
    ) -> ColumnixResult<Vec<u8>> {
        match column_type {
            ColumnType::Int32 => decode_typed::<i32>(encoded, row_count),
            ColumnType::Int64 => decode_typed::<i64>(encoded, row_count),
            other => cx_bail!(CorruptData: "Delta encoded chunk of unsupported type {other}"),
        }
    }
}
