use bytes::Bytes;
use columnix_dtype::{ColumnDef, ColumnType, CompressionKind, EncodingKind, Value, row};
use columnix_error::ColumnixError;
use rstest::rstest;

use crate::*;

fn write(schema: &[ColumnDef], rows: &[Vec<Value>], row_group_size: usize) -> Vec<u8> {
    let mut writer = FileWriter::new(
        Vec::new(),
        WriteOptions::default()
            .with_row_group_size(row_group_size)
            .with_sync(false),
    )
    .unwrap();
    for column in schema {
        writer.add_column(column.clone()).unwrap();
    }
    for row in rows {
        writer.put(row).unwrap();
    }
    writer.finish().unwrap();
    writer.into_inner().unwrap()
}

fn read_all(bytes: Vec<u8>) -> Vec<Vec<Value>> {
    let mut reader = FileReader::new(Bytes::from(bytes)).unwrap();
    let mut rows = Vec::new();
    while reader.next() {
        rows.push(reader.read_row().unwrap());
    }
    assert!(reader.error().is_none());
    rows
}

fn events() -> (Vec<ColumnDef>, Vec<Vec<Value>>) {
    let schema = vec![
        ColumnDef::try_new(ColumnType::Int64, "ts")
            .unwrap()
            .with_encoding(EncodingKind::Delta)
            .unwrap(),
        ColumnDef::try_new(ColumnType::String, "email")
            .unwrap()
            .with_encoding(EncodingKind::Dict)
            .unwrap()
            .with_compression(CompressionKind::Zstd, 3)
            .unwrap(),
        ColumnDef::try_new(ColumnType::Float64, "score")
            .unwrap()
            .with_compression(CompressionKind::Lz4, 1)
            .unwrap(),
        ColumnDef::try_new(ColumnType::Bit, "active").unwrap(),
    ];
    let rows = (0..50i64)
        .map(|i| {
            row![
                1400000000000i64 + i * 1000,
                (i % 7 != 0).then(|| format!("user{}@bar.com", i % 3)),
                i as f64 / 4.0,
                (i % 5 != 0).then_some(i % 2 == 0),
            ]
        })
        .collect();
    (schema, rows)
}

#[rstest]
fn round_trip(#[values(1, 3, 16, 50, 1000)] row_group_size: usize) {
    let (schema, rows) = events();
    let bytes = write(&schema, &rows, row_group_size);
    assert_eq!(read_all(bytes), rows);
}

#[test]
fn footer_describes_row_groups() {
    let (schema, rows) = events();
    let mut reader = FileReader::new(Bytes::from(write(&schema, &rows, 16))).unwrap();
    let metadata = reader.metadata();
    assert_eq!(metadata.schema().columns(), schema.as_slice());
    assert_eq!(
        metadata
            .row_groups()
            .iter()
            .map(RowGroupMetadata::row_count)
            .collect::<Vec<_>>(),
        vec![16, 16, 16, 2]
    );
    assert!(
        metadata
            .row_groups()
            .iter()
            .all(|rg| rg.offset() % 8 == 0 && rg.length() % 8 == 0)
    );

    let email = metadata.row_groups()[0].column(1).unwrap();
    assert_eq!(email.encoding(), EncodingKind::Dict);
    assert_eq!(email.null_count(), 3);

    let ts = metadata.column_stats(0).unwrap();
    assert_eq!(ts.null_count, 0);
    assert_eq!(ts.min, Some(Value::Int64(1400000000000)));
    assert_eq!(ts.max, Some(Value::Int64(1400000049000)));

    assert!(reader.next());
    assert_eq!(reader.get_f64(2).unwrap(), 0.0);
    assert!(reader.is_null(3).unwrap());
}

#[test]
fn finish_without_pending_rows() {
    let (schema, rows) = events();
    let exact = write(&schema, &rows[..32], 16);
    let reader = FileReader::new(Bytes::from(exact.clone())).unwrap();
    assert_eq!(reader.metadata().row_groups().len(), 2);
    assert_eq!(read_all(exact), rows[..32].to_vec());
}

#[test]
fn unfinished_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("unfinished.clnx");
    let (schema, rows) = events();

    let mut writer =
        FileWriter::create(&path, WriteOptions::default().with_row_group_size(16)).unwrap();
    for column in schema {
        writer.add_column(column).unwrap();
    }
    for row in &rows {
        writer.put(row).unwrap();
    }
    assert_eq!(writer.row_groups_written(), 3);
    drop(writer);

    let err = FileReader::open(&path).err().unwrap();
    assert!(matches!(err, ColumnixError::CorruptData(..)));
}

#[rstest]
#[case::empty(0)]
#[case::header_only(8)]
#[case::short(23)]
fn too_short(#[case] len: usize) {
    let (schema, rows) = events();
    let bytes = write(&schema, &rows, 16);
    let err = FileReader::new(Bytes::from(bytes[..len].to_vec()))
        .err()
        .unwrap();
    assert!(matches!(err, ColumnixError::CorruptData(..)));
}

#[test]
fn truncated_file_is_rejected() {
    let (schema, rows) = events();
    let bytes = write(&schema, &rows, 16);
    let err = FileReader::new(Bytes::from(bytes[..bytes.len() - 1].to_vec()))
        .err()
        .unwrap();
    assert!(matches!(err, ColumnixError::CorruptData(..)));
}

#[test]
fn bad_header_is_rejected() {
    let (schema, rows) = events();
    let mut bytes = write(&schema, &rows, 16);
    bytes[0] = b'X';
    let err = FileReader::new(Bytes::from(bytes)).err().unwrap();
    assert!(matches!(err, ColumnixError::CorruptData(..)));
}

#[test]
fn footer_offset_out_of_range() {
    let (schema, rows) = events();
    let mut bytes = write(&schema, &rows, 16);
    let eof = bytes.len() - EOF_SIZE;
    bytes[eof..eof + 8].copy_from_slice(&4u64.to_le_bytes());
    let err = FileReader::new(Bytes::from(bytes)).err().unwrap();
    assert!(matches!(err, ColumnixError::CorruptData(..)));
}

#[test]
fn row_group_outside_data_section() {
    let (schema, rows) = events();
    let bytes = write(&schema, &rows, 16);
    let metadata = FileReader::new(Bytes::from(bytes.clone()))
        .unwrap()
        .metadata()
        .clone();

    // Point the last row group at the footer.
    let footer_offset = metadata.row_groups()[3].offset() + metadata.row_groups()[3].length();
    let mut row_groups = metadata.row_groups().to_vec();
    let last = row_groups.pop().unwrap();
    row_groups.push(RowGroupMetadata::new(
        footer_offset,
        last.length(),
        last.row_count(),
        last.columns().to_vec(),
    ));
    let footer = write_footer(
        &FileMetadata::try_new(metadata.schema().clone(), row_groups).unwrap(),
    )
    .unwrap();

    let mut forged = bytes[..footer_offset as usize].to_vec();
    forged.extend_from_slice(&footer);
    forged.extend_from_slice(
        &EndOfFile {
            footer_offset,
            footer_len: footer.len() as u32,
        }
        .to_bytes(),
    );
    let err = FileReader::new(Bytes::from(forged)).err().unwrap();
    assert!(matches!(err, ColumnixError::CorruptData(..)));
}

#[test]
fn columns_are_independent() {
    let schema = vec![
        ColumnDef::try_new(ColumnType::Int32, "a").unwrap(),
        ColumnDef::try_new(ColumnType::String, "b").unwrap(),
    ];
    let rows: Vec<_> = (0..10i32).map(|i| row![i, format!("{i}")]).collect();
    let bytes = write(&schema, &rows, 4);
    let reader = FileReader::new(Bytes::from(bytes)).unwrap();

    let mut row_group = reader.row_group(2).unwrap();
    assert_eq!(row_group.row_count(), 2);
    assert_eq!(row_group.column(1).unwrap().get_str(1).unwrap(), Some("9"));
    assert!(row_group.decoded(0).is_none());
}

#[test]
fn on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(format!("events.{COLUMNIX_FILE_EXTENSION}"));
    let (schema, rows) = events();

    let mut writer = FileWriter::create(&path, WriteOptions::default().with_row_group_size(7))
        .unwrap();
    for column in schema {
        writer.add_column(column).unwrap();
    }
    for row in &rows {
        writer.put(row).unwrap();
    }
    let written = writer.finish().unwrap();
    drop(writer);

    let mut reader = FileReader::open(&path).unwrap();
    assert_eq!(reader.metadata(), &written);
    let mut count = 0;
    while reader.next() {
        assert_eq!(reader.read_row().unwrap(), rows[count]);
        count += 1;
    }
    assert_eq!(count, rows.len());
}

#[test]
fn missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = FileReader::open(dir.path().join("missing.clnx")).err().unwrap();
    assert!(matches!(err.root(), ColumnixError::IOError(..)));
}
