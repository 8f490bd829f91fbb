//! Typed extraction of field values from data records.
//!
//! [`publish`] walks the standard fields of one data record and pushes every
//! valid value into a [`FromFields`] receiver. Receivers are usually derived.
//! See the [`FromFields`](macro@FromFields) and
//! [`FromRecords`](macro@FromRecords) macros for details.

use crate::{
    sans::{
        codec::{OutOfBounds, Reader},
        data::Value,
        definition::DefinitionRecord,
    },
    store::DataRecord,
};

/// Derive [`FromRecords`] for a struct holding a collection of records.
///
/// # Example
///
/// To collect a single record, add the `record(N)` attribute to an `Option<T>`
/// struct field, where `N` is the global message number and `T` is a type
/// implementing [`FromFields`] and [`Default`]. Additional records received
/// for the same message number will overwrite earlier ones. To collect
/// multiple occurrences of a record, apply the attribute to a `Vec<T>`
/// instead. Several message numbers may share one receiver.
///
/// ```
/// #[derive(Debug, Default, FromRecords)]
/// struct Summary {
///     #[record(0)]
///     file_id: Option<FileId>,
///     #[record(18, 19)]
///     splits: Vec<Split>,
/// }
/// ```
pub use chainring_derive::FromRecords;

/// Produce record receivers for a document.
///
/// See the [`FromRecords`](macro@FromRecords) derive macro for an automatic
/// implementation of this trait.
pub trait FromRecords {
    /// Retrieve a receiver for a record, if one exists.
    fn add_record(&mut self, id: u16) -> Option<&mut dyn FromFields>;
}

/// Derive [`FromFields`] for a struct representing a single record.
///
/// # Examples
///
/// To receive a single value for a record field, add the `field(N)` attribute
/// to an `Option<T>` struct field, where `N` is the field number and `T` is
/// the corresponding Rust primitive, or `String` for string fields.
/// Additional values received for the same field replace earlier ones.
///
/// To receive the time offset stored in compressed timestamp headers, supply
/// `time` in place of a field number.
///
/// ```
/// #[derive(Debug, Default, FromFields)]
/// struct Record {
///     #[field(time)]
///     time_offset: Option<u8>,
///     #[field(0)]
///     position_lat: Option<i32>,
///     #[field(1)]
///     position_long: Option<i32>,
///     #[field(5)]
///     distance: Option<u32>,
/// }
/// ```
///
/// To receive arrays, or to convert while receiving, supply an accumulator
/// closure. Since the element type cannot be inferred, the second argument
/// must be typed.
///
/// ```
/// #[derive(Debug, Default, FromFields)]
/// struct Zones {
///     #[field(1, |v, hr: u8| v.push(hr))]
///     heart_rate: Vec<u8>,
/// }
/// ```
pub use chainring_derive::FromFields;

/// Receive field values for a record.
///
/// Values holding the 'invalid' marker of their base type are skipped.
/// Array fields are published element by element, calling the receiver
/// repeatedly. Byte fields are published byte by byte through `add_u8`.
///
/// The default implementation of each method ignores received values.
#[allow(unused_variables)]
pub trait FromFields {
    /// Add the compressed time offset to the record.
    fn add_time_offset(&mut self, _: u8) {}
    /// Add a `u8` for a field to the record. This receives the base types
    /// `enum`, `uint8`, `uint8z` and `byte`.
    fn add_u8(&mut self, field: u8, _: u8) {}
    fn add_u16(&mut self, field: u8, _: u16) {}
    fn add_u32(&mut self, field: u8, _: u32) {}
    fn add_u64(&mut self, field: u8, _: u64) {}

    fn add_i8(&mut self, field: u8, _: i8) {}
    fn add_i16(&mut self, field: u8, _: i16) {}
    fn add_i32(&mut self, field: u8, _: i32) {}
    fn add_i64(&mut self, field: u8, _: i64) {}

    fn add_f32(&mut self, field: u8, _: f32) {}
    fn add_f64(&mut self, field: u8, _: f64) {}

    /// Add a string for a field to the record.
    fn add_str(&mut self, field: u8, _: &str) {}
}

/// Publish the standard fields of a data record to a receiver.
///
/// Developer fields are not published; their numbers share a namespace
/// with neither standard fields nor each other across developers.
pub fn publish<O: FromFields + ?Sized>(
    document: &[u8],
    definition: &DefinitionRecord,
    data: &DataRecord,
    o: &mut O,
) -> Result<(), OutOfBounds> {
    if let Some(time) = data.time_offset {
        o.add_time_offset(time);
    }

    for field in definition.standard_fields() {
        let base_type = field.base_type();
        let mut r = Reader::new(document, data.offset + field.offset);
        let value = r.value(base_type, field.size as usize, definition.architecture)?;

        match &value {
            Value::Array(items) => {
                for item in items.iter().filter(|v| !v.is_invalid(base_type)) {
                    publish_value(o, field.number, item);
                }
            }
            value if value.is_invalid(base_type) => {}
            value => publish_value(o, field.number, value),
        }
    }

    Ok(())
}

fn publish_value<O: FromFields + ?Sized>(o: &mut O, field: u8, value: &Value) {
    match value {
        Value::U8(v) => o.add_u8(field, *v),
        Value::I8(v) => o.add_i8(field, *v),
        Value::U16(v) => o.add_u16(field, *v),
        Value::I16(v) => o.add_i16(field, *v),
        Value::U32(v) => o.add_u32(field, *v),
        Value::I32(v) => o.add_i32(field, *v),
        Value::U64(v) => o.add_u64(field, *v),
        Value::I64(v) => o.add_i64(field, *v),
        Value::F32(v) => o.add_f32(field, *v),
        Value::F64(v) => o.add_f64(field, *v),
        Value::Str(s) => o.add_str(field, s),
        Value::Array(items) => items.iter().for_each(|v| publish_value(o, field, v)),
        Value::Bytes(bytes) => bytes.iter().for_each(|b| o.add_u8(field, *b)),
    }
}
