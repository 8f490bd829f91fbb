//! Date-time fields, and shifting them all at once.

use log::info;

use super::{FieldLocation, Flow, Scanner};
use crate::{
    profile::{FieldKind, Profile},
    sans::{codec::OutOfBounds, data::TIMESTAMP_FIELD, definition::DefinitionRecord},
    store::{ByteStore, DataRecord, Error},
};

/// A valid date-time field found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampField {
    pub global: u16,
    pub field: u8,
    /// Profile name of the field, when known.
    pub name: Option<&'static str>,
    pub location: FieldLocation,
}

impl TimestampField {
    pub fn read(&self, store: &ByteStore) -> Result<u32, OutOfBounds> {
        self.location.read_u32(store)
    }
}

/// Collects every valid date-time field: fields the profile marks as date
/// times, and field 253 of any message.
pub struct TimestampScanner<'p> {
    profile: &'p dyn Profile,
    fields: Vec<TimestampField>,
}

impl<'p> TimestampScanner<'p> {
    pub fn new(profile: &'p dyn Profile) -> Self {
        Self {
            profile,
            fields: Vec::new(),
        }
    }

    pub fn fields(&self) -> &[TimestampField] {
        &self.fields
    }

    pub fn into_fields(self) -> Vec<TimestampField> {
        self.fields
    }
}

impl Scanner for TimestampScanner<'_> {
    fn reset(&mut self) {
        self.fields.clear();
    }

    fn record(
        &mut self,
        store: &ByteStore,
        definition: &DefinitionRecord,
        data: &DataRecord,
    ) -> Result<Flow, Error> {
        for field in definition.standard_fields().filter(|f| f.size == 4) {
            let meta = self.profile.field(definition.global, field.number);
            let is_time = meta.is_some_and(|m| m.kind == FieldKind::DateTime);

            if !is_time && field.number != TIMESTAMP_FIELD {
                continue;
            }

            let location = FieldLocation {
                offset: data.field_offset(field),
                size: field.size,
                architecture: definition.architecture,
            };

            if location.read_u32(store)? == u32::MAX {
                continue;
            }

            self.fields.push(TimestampField {
                global: definition.global,
                field: field.number,
                name: meta.map(|m| m.name),
                location,
            });
        }

        Ok(Flow::Continue)
    }
}

/// Move every field so the earliest one becomes `earliest`, keeping the
/// distance between them. Returns the number of fields written.
pub fn shift(store: &mut ByteStore, fields: &[TimestampField], earliest: u32) -> Result<usize, OutOfBounds> {
    let mut values = Vec::with_capacity(fields.len());
    for field in fields {
        values.push(field.read(store)?);
    }

    let Some(oldest) = values.iter().copied().min() else {
        return Ok(0);
    };

    let delta = earliest as i64 - oldest as i64;
    if delta == 0 {
        return Ok(0);
    }

    for (field, value) in fields.iter().zip(values) {
        // Never produce the invalid marker.
        let shifted = (value as i64 + delta).clamp(0, u32::MAX as i64 - 1) as u32;
        field.location.write_u32(store, shifted)?;
    }

    info!("Shifted {} timestamps by {delta} s.", fields.len());
    Ok(fields.len())
}
