mod common;

use chainring::{
    developer::{ANY_OWNER, DeveloperField, DeveloperFields},
    sans::{codec::Architecture, data::BaseType},
    store::ByteStore,
};
use common::{FitBuilder, UINT8, UINT16, describe, description};

fn custom_pace(owner: u16) -> FitBuilder {
    let mut builder = FitBuilder::new();
    describe(&mut builder, 0);
    builder
        .data(0, &description(0, 5, UINT16, "CustomPace", 10, "s/km", owner))
        .developer_definition(1, 20, Architecture::Little, &[(3, 1, UINT8)], &[(5, 2, 0)])
        .data(1, &[150, 0x2C, 0x01]);
    builder
}

#[test]
fn description_registers_field() {
    let mut store = ByteStore::from_bytes(custom_pace(20).build());
    store.decode().unwrap();

    let registry = store.developer_fields();
    assert_eq!(registry.len(), 1);

    let field = registry.get(20, 5).unwrap();
    assert_eq!(field.name, "CustomPace");
    assert_eq!(field.units, "s/km");
    assert_eq!(field.owner, 20);
    assert_eq!(field.developer_data_index, Some(0));
    assert_eq!(field.base_type, Some(BaseType::UInt16));
    assert_eq!(field.scale, 10.0);
    assert_eq!(field.offset, 0.0);
    assert_eq!(field.physical(300.0), 30.0);

    assert!(registry.get(21, 5).is_none());
    assert!(registry.get(20, 6).is_none());

    // The data record using the field decodes as usual.
    let data = store.data_records()[1];
    let definition = store.definition(&data);
    let developer = definition.developer_field(5).unwrap();

    let raw = store
        .reader(data.field_offset(developer))
        .u16(definition.architecture)
        .unwrap();
    assert_eq!(raw, 300);
}

#[test]
fn description_without_owner_matches_any_message() {
    let mut store = ByteStore::from_bytes(custom_pace(u16::MAX).build());
    store.decode().unwrap();

    let registry = store.developer_fields();
    assert_eq!(registry.get(20, 5).unwrap().owner, ANY_OWNER);
    assert_eq!(registry.get(18, 5).unwrap().name, "CustomPace");
}

#[test]
fn duplicate_description_is_rejected() {
    let mut builder = custom_pace(20);
    builder.data(0, &description(0, 5, UINT16, "OtherPace", 1, "", 20));

    let mut store = ByteStore::from_bytes(builder.build());
    store.decode().unwrap();

    let registry = store.developer_fields();
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.get(20, 5).unwrap().name, "CustomPace");
}

#[test]
fn invalid_scale_defaults_to_one() {
    let mut builder = FitBuilder::new();
    describe(&mut builder, 0);
    builder.data(0, &description(0, 7, UINT8, "Effort", 0xFF, "", 20));

    let mut store = ByteStore::from_bytes(builder.build());
    store.decode().unwrap();

    let field = store.developer_fields().get(20, 7).unwrap();
    assert_eq!(field.scale, 1.0);
    assert_eq!(field.physical(42.0), 42.0);
}

#[test]
fn description_without_number_is_skipped() {
    let mut builder = FitBuilder::new();
    describe(&mut builder, 0);
    builder.data(0, &description(0, 0xFF, UINT8, "Nothing", 1, "", 20));

    let mut store = ByteStore::from_bytes(builder.build());
    store.decode().unwrap();

    assert!(store.developer_fields().is_empty());
}

#[test]
fn register_directly() {
    let mut registry = DeveloperFields::new();
    let field = DeveloperField {
        owner: 20,
        number: 1,
        developer_data_index: None,
        name: "Power".into(),
        units: "W".into(),
        base_type: None,
        scale: 1.0,
        offset: 0.0,
    };

    assert!(registry.register(field.clone()));
    assert!(!registry.register(field));
    assert_eq!(registry.iter().count(), 1);
}
