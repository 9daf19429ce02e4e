use std::collections::hash_map::Entry;

use columnix_array::{OFFSET_WIDTH, StringLayout, min_values_len, write_strings};
use columnix_dtype::{ColumnType, EncodingKind};
use columnix_error::{ColumnixExpect, ColumnixResult, cx_bail, cx_err};
use rustc_hash::FxHashMap;

use crate::Encoding;

const CODE_WIDTH: usize = size_of::<u32>();

/// Values replaced by `u32` codes into a table of the distinct values, in first-seen order.
///
/// Layout: `u32` table length, the table in canonical layout, then one `u32` code per row.
/// Fixed-width values are deduplicated by their bytes, so floats compare by bit pattern.
#[derive(Debug, Clone, Copy, Default)]
pub struct DictEncoding;

struct DictBuilder<'a> {
    lookup: FxHashMap<&'a [u8], u32>,
    values: Vec<&'a [u8]>,
    codes: Vec<u32>,
}

impl<'a> DictBuilder<'a> {
    fn with_capacity(row_count: usize) -> Self {
        Self {
            lookup: FxHashMap::default(),
            values: Vec::new(),
            codes: Vec::with_capacity(row_count),
        }
    }

    #[inline]
    fn encode_value(&mut self, v: &'a [u8]) -> ColumnixResult<()> {
        let code = match self.lookup.entry(v) {
            Entry::Occupied(o) => *o.get(),
            Entry::Vacant(vac) => {
                let next_code = u32::try_from(self.values.len())
                    .map_err(|_| cx_err!(InvalidArgument: "Dictionary exceeds u32 codes"))?;
                vac.insert(next_code);
                self.values.push(v);
                next_code
            }
        };
        self.codes.push(code);
        Ok(())
    }

    fn finish(self, column_type: ColumnType) -> ColumnixResult<Vec<u8>> {
        let mut out = Vec::new();
        // encode_value keeps the table length within u32
        out.extend_from_slice(&(self.values.len() as u32).to_le_bytes());
        if column_type == ColumnType::String {
            write_strings(self.values.iter().copied(), &mut out)?;
        } else {
            for v in &self.values {
                out.extend_from_slice(v);
            }
        }
        out.reserve(self.codes.len() * CODE_WIDTH);
        for code in self.codes {
            out.extend_from_slice(&code.to_le_bytes());
        }
        Ok(out)
    }
}

fn section_end(parts: &[usize]) -> ColumnixResult<usize> {
    parts
        .iter()
        .try_fold(0usize, |end, &len| end.checked_add(len))
        .ok_or_else(|| cx_err!(CorruptData: "Dictionary chunk sections overflow the address space"))
}

fn read_u32(bytes: &[u8], at: usize) -> ColumnixResult<u32> {
    bytes
        .get(at..at.saturating_add(CODE_WIDTH))
        .map(|b| u32::from_le_bytes(b.try_into().cx_expect("u32 width")))
        .ok_or_else(|| cx_err!(CorruptData: "Dictionary chunk truncated at byte {at}"))
}

impl Encoding for DictEncoding {
    fn kind(&self) -> EncodingKind {
        EncodingKind::Dict
    }

    fn encode(
        &self,
        column_type: ColumnType,
        row_count: usize,
        values: &[u8],
    ) -> ColumnixResult<Vec<u8>> {
        let mut builder = DictBuilder::with_capacity(row_count);
        match column_type {
            ColumnType::Bit => {
                cx_bail!(InvalidConfiguration: "Dictionary encoding does not support {column_type}")
            }
            ColumnType::String => {
                for v in StringLayout::parse(values, row_count)?.iter() {
                    builder.encode_value(v)?;
                }
            }
            t => {
                let width = t
                    .fixed_width()
                    .ok_or_else(|| cx_err!("No fixed width for {t}"))?;
                if values.len() != width * row_count {
                    cx_bail!(
                        InvalidArgument: "{t} values of {row_count} rows must be {} bytes, found {}",
                        width * row_count,
                        values.len()
                    );
                }
                for v in values.chunks_exact(width) {
                    builder.encode_value(v)?;
                }
            }
        }
        builder.finish(column_type)
    }

    fn min_encoded_len(&self, _: ColumnType, row_count: usize) -> ColumnixResult<usize> {
        row_count
            .checked_mul(CODE_WIDTH)
            .and_then(|codes| codes.checked_add(CODE_WIDTH))
            .ok_or_else(|| {
                cx_err!(CorruptData: "Dictionary chunk of {row_count} rows is too large")
            })
    }

    fn decode(
        &self,
        column_type: ColumnType,
        row_count: usize,
        encoded: &[u8],
    ) -> ColumnixResult<Vec<u8>> {
        let dict_len = read_u32(encoded, 0)? as usize;
        let table_start = CODE_WIDTH;

        let table_end = match column_type {
            ColumnType::Bit => {
                cx_bail!(CorruptData: "Dictionary encoded chunk of unsupported type {column_type}")
            }
            ColumnType::String => {
                let offsets_end = section_end(&[
                    table_start,
                    min_values_len(ColumnType::String, dict_len)?,
                ])?;
                let data_len = read_u32(encoded, offsets_end - OFFSET_WIDTH)? as usize;
                section_end(&[offsets_end, data_len])?
            }
            t => section_end(&[table_start, min_values_len(t, dict_len)?])?,
        };

        let codes_len = row_count.checked_mul(CODE_WIDTH).ok_or_else(|| {
            cx_err!(CorruptData: "Dictionary chunk of {row_count} rows is too large")
        })?;
        let expected = section_end(&[table_end, codes_len])?;
        if encoded.len() != expected {
            cx_bail!(
                CorruptData: "Dictionary chunk of {row_count} rows and {dict_len} entries must be {expected} bytes, found {}",
                encoded.len()
            );
        }
        let (table, codes) = encoded[table_start..].split_at(table_end - table_start);

        let lookup: Vec<&[u8]> = match column_type {
            ColumnType::String => StringLayout::parse(table, dict_len)?.iter().collect(),
            t => table
                .chunks_exact(t.fixed_width().unwrap_or(1))
                .collect(),
        };

        let mut values: Vec<&[u8]> = Vec::with_capacity(row_count);
        for code in codes.chunks_exact(CODE_WIDTH) {
            let code = u32::from_le_bytes(code.try_into().cx_expect("code width")) as usize;
            let value = lookup.get(code).copied().ok_or_else(
                || cx_err!(CorruptData: "Dictionary code {code} out of range for {dict_len} entries"),
            )?;
            values.push(value);
        }

        let mut out = Vec::new();
        if column_type == ColumnType::String {
            write_strings(values.iter().copied(), &mut out)?;
        } else {
            for v in values {
                out.extend_from_slice(v);
            }
        }
        Ok(out)
    }
}
