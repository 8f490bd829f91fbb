mod common;

use chainring::{
    sans::{
        codec::{Architecture, OutOfBounds},
        data::Value,
    },
    scan::{FieldLocation, scan, product::ProductScanner},
    store::{ByteStore, RawValue},
};
use common::{FitBuilder, UINT16, UINT32};

/// A `file_id` record with product 1000 and a `device_info` record with
/// product 1000 stored big-endian.
fn product_document() -> (Vec<u8>, usize, usize) {
    let mut builder = FitBuilder::new();

    builder.definition(0, 0, Architecture::Little, &[(1, 2, UINT16), (2, 2, UINT16)]);
    let file_id = builder.offset() + 3;
    builder.data(0, &[1, 0, 0xE8, 0x03]);

    builder.definition(1, 23, Architecture::Big, &[(253, 4, UINT32), (4, 2, UINT16)]);
    let device_info = builder.offset() + 5;
    builder.data(1, &[0, 0, 0, 1, 0x03, 0xE8]);

    (builder.build(), file_id, device_info)
}

#[test]
fn overwrite_field_and_checksum() {
    let (document, file_id, _) = product_document();
    let mut store = ByteStore::from_bytes(document.clone());
    store.decode().unwrap();

    assert_eq!(store.reader(file_id).u16(Architecture::Little).unwrap(), 1000);

    store.writer(file_id).u16(2000, Architecture::Little).unwrap();
    assert!(!store.verify_crc());

    let crc = store.write_crc().unwrap();
    assert!(store.verify_crc());
    assert_eq!(store.stored_crc(), Some(crc));

    let patched = store.bytes();
    assert_eq!(patched.len(), document.len());
    assert_eq!(&patched[file_id..file_id + 2], &2000u16.to_le_bytes());
    assert_eq!(&patched[..file_id], &document[..file_id]);
    assert_eq!(
        &patched[file_id + 2..patched.len() - 2],
        &document[file_id + 2..document.len() - 2]
    );
}

/// Bitwise CRC-16/ARC over every byte but the final two.
fn reference_crc(document: &[u8]) -> u16 {
    let mut crc = 0u16;
    for b in &document[..document.len() - 2] {
        crc ^= *b as u16;
        for _ in 0..8 {
            crc = if crc & 1 != 0 { (crc >> 1) ^ 0xA001 } else { crc >> 1 };
        }
    }
    crc
}

#[test]
fn unmodified_document_saves_identically() {
    let mut builder = FitBuilder::new().with_header_size(12);
    builder.definition(0, 0, Architecture::Little, &[(3, 4, UINT32)]);
    let field = builder.offset() + 1;
    builder.data(0, &1000u32.to_le_bytes());
    let original = builder.build();

    let mut store = ByteStore::from_bytes(original.clone());
    store.decode().unwrap();
    assert_eq!(store.data_records().len(), 1);

    let data = store.data_records()[0];
    let value = store.read_value(&data, store.definition(&data).field(3).unwrap()).unwrap();
    assert_eq!(value, Value::U32(1000));
    assert_eq!(data.field_offset(store.definition(&data).field(3).unwrap()), field);

    store.write_crc().unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("copy.fit");
    store.save(&path).unwrap();

    let reloaded = ByteStore::load(&path).unwrap();
    assert_eq!(reloaded.bytes(), original);

    store.writer(field).u32(2000, Architecture::Little).unwrap();
    store.write_crc().unwrap();
    store.save(&path).unwrap();

    let mut patched = ByteStore::load(&path).unwrap();
    patched.decode().unwrap();

    let data = patched.data_records()[0];
    let value = patched.read_value(&data, patched.definition(&data).field(3).unwrap()).unwrap();
    assert_eq!(value, Value::U32(2000));
    assert_eq!(patched.stored_crc(), Some(reference_crc(patched.bytes())));
    assert_eq!(patched.size(), original.len());
}

#[test]
fn save_and_reload() {
    let (document, file_id, _) = product_document();
    let mut store = ByteStore::from_bytes(document);
    store.writer(file_id).u16(2000, Architecture::Little).unwrap();
    store.write_crc().unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("patched.fit");
    store.save(&path).unwrap();

    let mut reloaded = ByteStore::load(&path).unwrap();
    reloaded.decode().unwrap();

    assert!(reloaded.verify_crc());
    assert_eq!(reloaded.reader(file_id).u16(Architecture::Little).unwrap(), 2000);
}

#[test]
fn replace_products_in_both_byte_orders() {
    let (document, file_id, device_info) = product_document();
    let mut store = ByteStore::from_bytes(document);

    let mut scanner = ProductScanner::matching(1000);
    scan(&mut store, &mut scanner).unwrap();

    let found: Vec<(u16, usize, Architecture)> = scanner
        .products()
        .iter()
        .map(|p| (p.global, p.location.offset, p.location.architecture))
        .collect();

    assert_eq!(
        found,
        [
            (0, file_id, Architecture::Little),
            (23, device_info, Architecture::Big)
        ]
    );

    assert_eq!(scanner.replace(&mut store, 3121).unwrap(), 2);

    let mut rescan = ProductScanner::new();
    scan(&mut store, &mut rescan).unwrap();

    let products: Vec<u16> = rescan
        .products()
        .iter()
        .map(|p| p.read(&store).unwrap())
        .collect();

    assert_eq!(products, [3121, 3121]);
    assert_eq!(&store.bytes()[device_info..device_info + 2], &3121u16.to_be_bytes());
}

#[test]
fn product_search_skips_other_ids() {
    let (document, _, _) = product_document();
    let mut store = ByteStore::from_bytes(document);

    let mut scanner = ProductScanner::matching(42);
    scan(&mut store, &mut scanner).unwrap();

    assert!(scanner.products().is_empty());
}

#[test]
fn set_raw_follows_record_byte_order() {
    let (document, file_id, device_info) = product_document();
    let mut store = ByteStore::from_bytes(document);

    let arch = store.set_raw(device_info, &RawValue::U16(0x0102)).unwrap();
    assert_eq!(arch, Architecture::Big);
    assert_eq!(&store.bytes()[device_info..device_info + 2], &[0x01, 0x02]);

    let arch = store.set_raw(file_id, &RawValue::I16(-2)).unwrap();
    assert_eq!(arch, Architecture::Little);
    assert_eq!(&store.bytes()[file_id..file_id + 2], &[0xFE, 0xFF]);
}

#[test]
fn set_raw_outside_records() {
    let (document, _, _) = product_document();
    let mut store = ByteStore::from_bytes(document);

    let arch = store.set_raw(4, &RawValue::Str("ab".into())).unwrap();
    assert_eq!(arch, Architecture::Little);
    assert_eq!(&store.bytes()[4..6], b"ab");
    assert_eq!(store.architecture_at(4), None);
}

#[test]
fn set_raw_past_end() {
    let (document, _, _) = product_document();
    let size = document.len();
    let mut store = ByteStore::from_bytes(document);

    assert!(store.set_raw(size - 1, &RawValue::U32(1)).is_err());
}

#[test]
fn field_location_round_trip() {
    let (document, _, device_info) = product_document();
    let mut store = ByteStore::from_bytes(document);
    store.decode().unwrap();

    let data = store.data_records()[1];
    let location = FieldLocation::find(store.definition(&data), &data, 4, 2).unwrap();
    assert_eq!(location.offset, device_info);
    assert_eq!(location.size, 2);

    location.write_u16(&mut store, 7).unwrap();
    assert_eq!(location.read_u16(&store).unwrap(), 7);

    assert_eq!(FieldLocation::find(store.definition(&data), &data, 4, 4), None);
    assert_eq!(FieldLocation::find(store.definition(&data), &data, 9, 2), None);
}

#[test]
fn write_crc_needs_two_bytes() {
    let mut store = ByteStore::from_bytes(vec![0]);
    assert_eq!(
        store.write_crc(),
        Err(OutOfBounds {
            offset: 0,
            len: 2,
            size: 1
        })
    );
}
