mod common;

use chainring::{
    sans::{codec::Architecture, data::Value, header::HeaderError},
    store::{ByteStore, Error},
};
use common::{FitBuilder, SINT32, UINT8, UINT32};

fn heart_rate_document() -> Vec<u8> {
    let mut builder = FitBuilder::new();
    builder
        .definition(0, 20, Architecture::Little, &[(253, 4, UINT32), (3, 1, UINT8)])
        .data(0, &[0x10, 0x27, 0x00, 0x00, 142]);
    builder.build()
}

#[test]
fn decode_single_record() {
    let mut store = ByteStore::from_bytes(heart_rate_document());
    store.decode().unwrap();

    assert_eq!(store.definitions().len(), 1);
    assert_eq!(store.data_records().len(), 1);

    let definition = &store.definitions()[0];
    assert_eq!(definition.global, 20);
    assert_eq!(definition.architecture, Architecture::Little);
    assert_eq!(definition.record_len(), 6);
    assert_eq!(definition.field(253).unwrap().offset, 1);
    assert_eq!(definition.field(3).unwrap().offset, 5);

    let data = store.data_records()[0];
    assert_eq!(data.offset, 14 + 12);
    assert_eq!(data.definition, 0);
    assert_eq!(data.time_offset, None);

    let heart_rate = definition.field(3).unwrap();
    assert_eq!(store.read_value(&data, heart_rate).unwrap(), Value::U8(142));

    let timestamp = definition.field(253).unwrap();
    assert_eq!(store.read_value(&data, timestamp).unwrap(), Value::U32(10_000));
}

#[test]
fn decode_is_idempotent() {
    let mut store = ByteStore::from_bytes(heart_rate_document());
    store.decode().unwrap();
    store.decode().unwrap();

    assert!(store.is_decoded());
    assert_eq!(store.data_records().len(), 1);
}

#[test]
fn decode_short_header() {
    let mut builder = FitBuilder::new().with_header_size(12);
    builder
        .definition(0, 20, Architecture::Little, &[(3, 1, UINT8)])
        .data(0, &[90])
        .data(0, &[91]);

    let mut store = ByteStore::from_bytes(builder.build());
    store.decode().unwrap();

    let header = store.header().unwrap();
    assert_eq!(header.header_size, 12);
    assert_eq!(header.header_crc, None);
    assert_eq!(store.data_records()[0].offset, 12 + 9);
    assert_eq!(store.data_records()[1].offset, 12 + 9 + 2);
}

#[test]
fn latest_definition_wins() {
    let mut builder = FitBuilder::new();
    builder
        .definition(0, 20, Architecture::Little, &[(3, 1, UINT8)])
        .data(0, &[100])
        .definition(0, 21, Architecture::Little, &[(0, 1, UINT8), (1, 1, UINT8)])
        .data(0, &[0, 4]);

    let mut store = ByteStore::from_bytes(builder.build());
    store.decode().unwrap();

    let globals: Vec<u16> = store
        .data_records()
        .iter()
        .map(|d| store.definition(d).global)
        .collect();

    assert_eq!(globals, [20, 21]);
    assert_eq!(store.data_records()[1].definition, 1);

    let first = store.data_records()[0];
    let second = store.data_records()[1];
    let layout = store.definition(&second);
    assert_eq!(layout.data_size, 2);
    assert_eq!(store.read_value(&second, layout.field(0).unwrap()).unwrap(), Value::U8(0));
    assert_eq!(store.read_value(&second, layout.field(1).unwrap()).unwrap(), Value::U8(4));
    assert_eq!(second.offset, first.offset + 2 + 12);

    let earlier = store.definition(&first);
    assert_eq!(store.read_value(&first, earlier.field(3).unwrap()).unwrap(), Value::U8(100));
}

#[test]
fn interleaved_local_messages() {
    let mut builder = FitBuilder::new();
    builder
        .definition(0, 20, Architecture::Little, &[(3, 1, UINT8)])
        .definition(1, 18, Architecture::Little, &[(5, 1, UINT8)])
        .data(1, &[2])
        .data(0, &[120])
        .data(1, &[1]);

    let mut store = ByteStore::from_bytes(builder.build());
    store.decode().unwrap();

    let globals: Vec<u16> = store
        .data_records()
        .iter()
        .map(|d| store.definition(d).global)
        .collect();

    assert_eq!(globals, [18, 20, 18]);
}

#[test]
fn missing_definition() {
    let mut builder = FitBuilder::new();
    builder
        .definition(0, 20, Architecture::Little, &[(3, 1, UINT8)])
        .data(3, &[100]);

    let mut store = ByteStore::from_bytes(builder.build());

    match store.decode() {
        Err(Error::MissingDefinition { local, offset }) => {
            assert_eq!(local, 3);
            assert_eq!(offset, 14 + 9);
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn truncated_record() {
    let mut builder = FitBuilder::new();
    builder
        .definition(0, 20, Architecture::Little, &[(253, 4, UINT32)])
        .data(0, &[0, 0]);

    let mut document = builder.build();
    document.truncate(document.len() - 2);

    let mut store = ByteStore::from_bytes(document);
    assert!(matches!(store.decode(), Err(Error::OutOfBounds(_))));
}

#[test]
fn unknown_header_length() {
    let mut document = heart_rate_document();
    document[0] = 13;

    let mut store = ByteStore::from_bytes(document);
    assert!(matches!(
        store.decode(),
        Err(Error::Header(HeaderError::UnknownHeaderLength(13)))
    ));
}

#[test]
fn not_fit_data() {
    let mut document = heart_rate_document();
    document[8..12].copy_from_slice(b"FIT.");

    let mut store = ByteStore::from_bytes(document);
    assert!(matches!(
        store.decode(),
        Err(Error::Header(HeaderError::NotFitData))
    ));
}

#[test]
fn truncated_header() {
    let mut store = ByteStore::from_bytes(vec![14, 0x20, 0, 0]);
    assert!(matches!(
        store.decode(),
        Err(Error::Header(HeaderError::Truncated { found: 4 }))
    ));
}

#[test]
fn big_endian_definition() {
    let mut builder = FitBuilder::new();
    builder
        .definition(2, 20, Architecture::Big, &[(253, 4, UINT32), (0, 4, SINT32)])
        .data(2, &[0, 0, 0x27, 0x10, 0xFF, 0xFF, 0xFF, 0xFE]);

    let mut store = ByteStore::from_bytes(builder.build());
    store.decode().unwrap();

    let definition = &store.definitions()[0];
    assert_eq!(definition.global, 20);
    assert_eq!(definition.architecture, Architecture::Big);

    let data = store.data_records()[0];
    let timestamp = definition.field(253).unwrap();
    let lat = definition.field(0).unwrap();

    assert_eq!(store.read_value(&data, timestamp).unwrap(), Value::U32(10_000));
    assert_eq!(store.read_value(&data, lat).unwrap(), Value::I32(-2));
}

#[test]
fn compressed_timestamp_header() {
    let mut builder = FitBuilder::new();
    builder
        .definition(1, 20, Architecture::Little, &[(3, 1, UINT8)])
        .compressed(1, 17, &[130]);

    let mut store = ByteStore::from_bytes(builder.build());
    store.decode().unwrap();

    let data = store.data_records()[0];
    assert_eq!(data.local, 1);
    assert_eq!(data.time_offset, Some(17));
    assert_eq!(store.definition(&data).global, 20);
}

#[test]
fn developer_fields_follow_standard_fields() {
    let mut builder = FitBuilder::new();
    builder
        .developer_definition(0, 20, Architecture::Little, &[(3, 1, UINT8)], &[(0, 2, 0)])
        .data(0, &[150, 0x34, 0x12]);

    let mut store = ByteStore::from_bytes(builder.build());
    store.decode().unwrap();

    let definition = &store.definitions()[0];
    assert_eq!(definition.record_len(), 4);
    assert!(definition.field(0).is_none());

    let developer = definition.developer_field(0).unwrap();
    assert!(developer.developer);
    assert_eq!(developer.offset, 2);
    assert_eq!(definition.developer_fields().count(), 1);
    assert_eq!(definition.standard_fields().count(), 1);
}

#[test]
fn unknown_base_type_reads_as_bytes() {
    let mut builder = FitBuilder::new();
    builder
        .definition(0, 20, Architecture::Little, &[(3, 3, 0x1F)])
        .data(0, &[1, 2, 3]);

    let mut store = ByteStore::from_bytes(builder.build());
    store.decode().unwrap();

    let data = store.data_records()[0];
    let field = store.definition(&data).field(3).unwrap().clone();
    assert_eq!(store.read_value(&data, &field).unwrap(), Value::Bytes(vec![1, 2, 3]));
}

#[test]
fn built_document_checksum() {
    let store = ByteStore::from_bytes(heart_rate_document());
    assert!(store.verify_crc());
    assert_eq!(store.stored_crc(), Some(store.crc()));
}
