use std::cmp::Ordering;

use columnix_dtype::Value;
use itertools::{Itertools, MinMaxResult};

use crate::{ColumnArray, ColumnValues};

/// Summary statistics of one column chunk.
///
/// `min` and `max` cover the non-null rows only, and are absent when there are none. Float `NaN`s
/// are skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnStats {
    /// The number of null rows
    pub null_count: u64,
    /// The smallest non-null value
    pub min: Option<Value>,
    /// The largest non-null value
    pub max: Option<Value>,
}

fn min_max<T, I>(values: I, cmp: impl Fn(&T, &T) -> Ordering) -> Option<(T, T)>
where
    I: Iterator<Item = T>,
    T: Clone,
{
    match values.minmax_by(cmp) {
        MinMaxResult::NoElements => None,
        MinMaxResult::OneElement(v) => Some((v.clone(), v)),
        MinMaxResult::MinMax(min, max) => Some((min, max)),
    }
}

impl ColumnStats {
    /// Compute the statistics of `array`.
    pub fn compute(array: &ColumnArray) -> Self {
        let null_count = array.null_count() as u64;
        let valid = |idx: &usize| array.is_valid(*idx);
        let rows = 0..array.len();

        let bounds = match array.values() {
            ColumnValues::Bit(v) => min_max(
                rows.filter(valid).filter_map(|i| v.get(i)),
                bool::cmp,
            )
            .map(|(a, b)| (Value::Bit(a), Value::Bit(b))),
            ColumnValues::Int32(v) => min_max(rows.filter(valid).map(|i| v[i]), i32::cmp)
                .map(|(a, b)| (Value::Int32(a), Value::Int32(b))),
            ColumnValues::Int64(v) => min_max(rows.filter(valid).map(|i| v[i]), i64::cmp)
                .map(|(a, b)| (Value::Int64(a), Value::Int64(b))),
            ColumnValues::Float32(v) => min_max(
                rows.filter(valid).map(|i| v[i]).filter(|f| !f.is_nan()),
                f32::total_cmp,
            )
            .map(|(a, b)| (Value::Float32(a), Value::Float32(b))),
            ColumnValues::Float64(v) => min_max(
                rows.filter(valid).map(|i| v[i]).filter(|f| !f.is_nan()),
                f64::total_cmp,
            )
            .map(|(a, b)| (Value::Float64(a), Value::Float64(b))),
            ColumnValues::String(v) => {
                min_max(rows.filter(valid).map(|i| v.get(i)), |a, b| a.cmp(b))
                    .map(|(a, b)| (Value::from(a), Value::from(b)))
            }
        };

        let (min, max) = bounds.unzip();
        Self {
            null_count,
            min,
            max,
        }
    }

    /// Combine with the statistics of another chunk of the same column.
    pub fn merge(&mut self, other: &ColumnStats) {
        self.null_count += other.null_count;
        self.min = pick(self.min.take(), other.min.clone(), Ordering::Less);
        self.max = pick(self.max.take(), other.max.clone(), Ordering::Greater);
    }
}

fn pick(a: Option<Value>, b: Option<Value>, keep: Ordering) -> Option<Value> {
    match (a, b) {
        (Some(a), Some(b)) => match b.partial_cmp(&a) {
            Some(ord) if ord == keep => Some(b),
            _ => Some(a),
        },
        (a, b) => a.or(b),
    }
}
