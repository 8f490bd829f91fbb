//! Registry of developer fields declared by field description records.

use std::collections::{HashMap, hash_map::Entry};

use log::{debug, warn};

use crate::{
    fields::{FromFields, publish},
    sans::{codec::OutOfBounds, data::BaseType, definition::DefinitionRecord},
    store::DataRecord,
};

/// Owner of a developer field whose description names no native message.
/// Such fields match any message on lookup.
pub const ANY_OWNER: u16 = u16::MAX;

/// Metadata of a developer field.
#[derive(Debug, Clone, PartialEq)]
pub struct DeveloperField {
    /// Global message number the field belongs to, or [`ANY_OWNER`].
    pub owner: u16,
    /// Field number used in definition records.
    pub number: u8,
    pub developer_data_index: Option<u8>,
    pub name: String,
    pub units: String,
    pub base_type: Option<BaseType>,
    pub scale: f64,
    pub offset: f64,
}

impl DeveloperField {
    /// Convert a stored number to its physical value.
    pub fn physical(&self, raw: f64) -> f64 {
        raw / self.scale - self.offset
    }
}

#[derive(Debug, Default, FromFields)]
struct FieldDescription {
    #[field(0)]
    developer_data_index: Option<u8>,
    #[field(1)]
    field_definition_number: Option<u8>,
    #[field(2)]
    fit_base_type_id: Option<u8>,
    #[field(3)]
    field_name: Option<String>,
    #[field(6)]
    scale: Option<u8>,
    #[field(7)]
    offset: Option<i8>,
    #[field(8)]
    units: Option<String>,
    #[field(14)]
    native_mesg_num: Option<u16>,
}

impl FieldDescription {
    fn into_field(self) -> Option<DeveloperField> {
        Some(DeveloperField {
            owner: self.native_mesg_num.unwrap_or(ANY_OWNER),
            number: self.field_definition_number?,
            developer_data_index: self.developer_data_index,
            name: self.field_name.unwrap_or_default(),
            units: self.units.unwrap_or_default(),
            base_type: self.fit_base_type_id.and_then(BaseType::from_raw),
            scale: self.scale.filter(|s| *s != 0).map_or(1.0, f64::from),
            offset: self.offset.map_or(0.0, f64::from),
        })
    }
}

/// Developer fields known so far, keyed by owner and field number.
#[derive(Debug, Default, Clone)]
pub struct DeveloperFields {
    fields: HashMap<(u16, u8), DeveloperField>,
}

impl DeveloperFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a field. A second registration for the same owner and number
    /// is rejected, keeping the first, and `false` is returned.
    pub fn register(&mut self, field: DeveloperField) -> bool {
        match self.fields.entry((field.owner, field.number)) {
            Entry::Occupied(existing) => {
                warn!(
                    "Ignoring duplicate developer field {} ({:?}) for message #{}, already registered as {:?}.",
                    field.number,
                    field.name,
                    field.owner,
                    existing.get().name,
                );
                false
            }
            Entry::Vacant(slot) => {
                debug!(
                    "Registered developer field {} ({:?}) for message #{}.",
                    field.number, field.name, field.owner
                );
                slot.insert(field);
                true
            }
        }
    }

    /// Decode a field description data record and register its field.
    /// Descriptions without a field number are skipped.
    pub fn register_description(
        &mut self,
        document: &[u8],
        definition: &DefinitionRecord,
        data: &DataRecord,
    ) -> Result<Option<&DeveloperField>, OutOfBounds> {
        let mut description = FieldDescription::default();
        publish(document, definition, data, &mut description)?;

        let Some(field) = description.into_field() else {
            warn!("Field description at offset {} has no field number.", data.offset);
            return Ok(None);
        };

        let key = (field.owner, field.number);

        Ok(if self.register(field) {
            self.fields.get(&key)
        } else {
            None
        })
    }

    /// Look up a developer field of a message, falling back to fields
    /// registered without an owner.
    pub fn get(&self, owner: u16, number: u8) -> Option<&DeveloperField> {
        self.fields
            .get(&(owner, number))
            .or_else(|| self.fields.get(&(ANY_OWNER, number)))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeveloperField> {
        self.fields.values()
    }
}
