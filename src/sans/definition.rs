//! Definition records and their field layouts.

use log::trace;
use zerocopy::FromBytes;

use super::{
    codec::{Architecture, OutOfBounds, Reader},
    data::BaseType,
};

/// The fixed part of a definition record, following its record header.
#[repr(C, packed)]
#[derive(FromBytes)]
struct DefinitionMessage {
    _reserved: u8,
    architecture: u8,
    global_message: [u8; 2],
    field_count: u8,
}

/// A field declaration: number, size, and base type byte.
#[repr(C, packed)]
#[derive(FromBytes)]
struct FieldHeader {
    field: u8,
    size: u8,
    base_type: u8,
}

/// A field in a definition record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefinition {
    /// Field number. Its meaning is assigned by the profile.
    pub number: u8,
    /// Size in bytes.
    pub size: u8,
    /// The base type byte as declared. For developer fields this is the
    /// developer data index.
    pub raw_base_type: u8,
    /// Bit 7 of the base type byte.
    pub endian_capable: bool,
    /// Offset from the start of a data record. The first field sits at 1,
    /// after the record header byte.
    pub offset: usize,
    pub developer: bool,
}

impl FieldDefinition {
    /// The declared base type. Unknown base types are read as bytes.
    pub fn base_type(&self) -> BaseType {
        BaseType::from_raw(self.raw_base_type).unwrap_or(BaseType::Byte)
    }
}

/// A definition record, establishing the layout of subsequent data records
/// with the same local message number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionRecord {
    /// Document offset of the record header byte.
    pub offset: usize,
    pub architecture: Architecture,
    /// Global message number. Its meaning is assigned by the profile.
    pub global: u16,
    /// Local message number, 0 to 15.
    pub local: u8,
    /// Standard fields followed by developer fields.
    pub fields: Vec<FieldDefinition>,
    /// Sum of all field sizes.
    pub data_size: usize,
}

impl DefinitionRecord {
    /// Decode a definition record whose header byte sits at `offset`. The
    /// reader must be positioned just past the header byte.
    pub fn parse(
        r: &mut Reader<'_>,
        offset: usize,
        local: u8,
        developer: bool,
    ) -> Result<Self, OutOfBounds> {
        let DefinitionMessage {
            architecture,
            global_message,
            field_count,
            ..
        } = zerocopy::transmute!(r.take::<5>()?);

        let architecture = Architecture::from_raw(architecture);
        let global = match architecture {
            Architecture::Little => u16::from_le_bytes(global_message),
            Architecture::Big => u16::from_be_bytes(global_message),
        };

        let mut record = Self {
            offset,
            architecture,
            global,
            local,
            fields: Vec::with_capacity(field_count as usize),
            data_size: 0,
        };

        record.parse_fields(r, field_count, false)?;

        if developer {
            let developer_count = r.u8()?;
            record.parse_fields(r, developer_count, true)?;
        }

        Ok(record)
    }

    fn parse_fields(
        &mut self,
        r: &mut Reader<'_>,
        count: u8,
        developer: bool,
    ) -> Result<(), OutOfBounds> {
        for _ in 0..count {
            let FieldHeader {
                field,
                size,
                base_type,
            } = zerocopy::transmute!(r.take::<3>()?);

            let definition = FieldDefinition {
                number: field,
                size,
                raw_base_type: base_type,
                endian_capable: base_type & BaseType::ENDIAN_MASK != 0,
                offset: 1 + self.data_size,
                developer,
            };

            trace!(
                "global #{} field {} size {} base {:#04x} offset {}{}",
                self.global,
                definition.number,
                definition.size,
                definition.raw_base_type,
                definition.offset,
                if developer { " (developer)" } else { "" },
            );

            self.data_size += size as usize;
            self.fields.push(definition);
        }

        Ok(())
    }

    /// Length of one data record under this definition, header byte included.
    pub fn record_len(&self) -> usize {
        1 + self.data_size
    }

    /// Find a standard field by number.
    pub fn field(&self, number: u8) -> Option<&FieldDefinition> {
        self.fields
            .iter()
            .find(|f| !f.developer && f.number == number)
    }

    /// Find a developer field by number.
    pub fn developer_field(&self, number: u8) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.developer && f.number == number)
    }

    pub fn standard_fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.iter().filter(|f| !f.developer)
    }

    pub fn developer_fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.iter().filter(|f| f.developer)
    }
}
