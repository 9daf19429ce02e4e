#![allow(clippy::unwrap_used)]

use columnix_array::{ColumnArray, ColumnBuffer};
use columnix_codec::{ChunkLayout, decode_chunk, encode_chunk};
use columnix_dtype::{ColumnDef, ColumnType, CompressionKind, EncodingKind, Value};
use divan::Bencher;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn main() {
    divan::main();
}

const ROWS: usize = 65_536;

const CODECS: &[(EncodingKind, CompressionKind)] = &[
    (EncodingKind::None, CompressionKind::None),
    (EncodingKind::Delta, CompressionKind::Lz4),
    (EncodingKind::Delta, CompressionKind::Zstd),
    (EncodingKind::Dict, CompressionKind::Lz4Hc),
];

fn timestamps(column: &ColumnDef) -> ColumnArray {
    let mut rng = StdRng::seed_from_u64(0);
    let mut buffer = ColumnBuffer::new(column.clone(), ROWS);
    let mut ts = 1_400_000_000_000i64;
    for _ in 0..ROWS {
        ts += rng.random_range(0..1000);
        let value = if rng.random_bool(0.05) {
            Value::Null
        } else {
            Value::Int64(ts)
        };
        buffer.append(&value).unwrap();
    }
    buffer.take().unwrap()
}

fn column((encoding, compression): (EncodingKind, CompressionKind)) -> ColumnDef {
    ColumnDef::try_new(ColumnType::Int64, "ts")
        .unwrap()
        .with_encoding(encoding)
        .unwrap()
        .with_compression(compression, 3)
        .unwrap()
}

#[divan::bench(args = CODECS)]
fn encode(bencher: Bencher, codec: &(EncodingKind, CompressionKind)) {
    let column = column(*codec);
    let array = timestamps(&column);
    bencher
        .with_inputs(|| &array)
        .bench_refs(|array| encode_chunk(&column, array).unwrap());
}

#[divan::bench(args = CODECS)]
fn decode(bencher: Bencher, codec: &(EncodingKind, CompressionKind)) {
    let column = column(*codec);
    let array = timestamps(&column);
    let chunk = encode_chunk(&column, &array).unwrap();
    let layout = ChunkLayout {
        column_type: ColumnType::Int64,
        row_count: chunk.row_count,
        null_count: chunk.stats.null_count as usize,
        decompressed_len: chunk.decompressed_len,
        encoding: chunk.encoding,
        compression: chunk.compression,
    };
    bencher
        .with_inputs(|| &chunk.bytes)
        .bench_refs(|bytes| decode_chunk(&layout, bytes).unwrap());
}
