//! In-memory documents: loading, record decoding, patching and saving.
//!
//! A [`ByteStore`] owns the whole document. Decoding builds an ordered list
//! of definition records and of data records referencing them; neither list
//! copies field values, which are read from the underlying bytes on demand.
//! Patching overwrites bytes in place, so record layout never changes and a
//! patched document only differs from its source in the written fields and
//! the trailing checksum.

use std::{fs, path::Path};

use either::Either::{self, Left, Right};
use log::{debug, info};
use thiserror::Error;

use crate::{
    developer::DeveloperFields,
    profile::mesg,
    sans::{
        check::document_crc,
        codec::{Architecture, OutOfBounds, Reader, Writer},
        data::Value,
        definition::{DefinitionRecord, FieldDefinition},
        header::{Header, HeaderError, RecordHeader},
    },
};

/// Errors occurring while loading, decoding or saving a document.
#[derive(Debug, Error)]
pub enum Error {
    /// An error reading or writing the file.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Incorrect file header.
    #[error("Incorrect file header: {0}")]
    Header(#[from] HeaderError),
    /// A record extends past the end of the document.
    #[error(transparent)]
    OutOfBounds(#[from] OutOfBounds),
    /// A data record uses a local message number with no definition.
    #[error("Data record at offset {offset} has no definition for local message {local}.")]
    MissingDefinition { local: u8, offset: usize },
}

/// A data record in a decoded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataRecord {
    /// Document offset of the record header byte.
    pub offset: usize,
    /// Index of the definition record active for this record's local message
    /// when it was decoded.
    pub definition: usize,
    pub local: u8,
    /// Time offset of a compressed timestamp header.
    pub time_offset: Option<u8>,
}

impl DataRecord {
    /// Document offset of a field of this record.
    pub fn field_offset(&self, field: &FieldDefinition) -> usize {
        self.offset + field.offset
    }
}

/// A value written by [`ByteStore::set_raw`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    /// String bytes, written without a terminator.
    Str(String),
}

impl RawValue {
    fn write(&self, w: &mut Writer<'_>, arch: Architecture) -> Result<(), OutOfBounds> {
        match self {
            Self::U8(v) => w.u8(*v),
            Self::I8(v) => w.i8(*v),
            Self::U16(v) => w.u16(*v, arch),
            Self::I16(v) => w.i16(*v, arch),
            Self::U32(v) => w.u32(*v, arch),
            Self::I32(v) => w.i32(*v, arch),
            Self::Str(s) => w.bytes(s.as_bytes()),
        }
    }
}

/// An in-memory document.
#[derive(Debug, Clone, Default)]
pub struct ByteStore {
    bytes: Vec<u8>,
    header: Option<Header>,
    definitions: Vec<DefinitionRecord>,
    records: Vec<DataRecord>,
    developer_fields: DeveloperFields,
    decoded: bool,
}

impl ByteStore {
    /// Read a whole file into memory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        Ok(Self::from_bytes(fs::read(path)?))
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            ..Self::default()
        }
    }

    /// Length of the document in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Decode and store the document header.
    pub fn parse_header(&mut self) -> Result<Header, Error> {
        let header = Header::parse(&self.bytes)?;
        self.header = Some(header);
        Ok(header)
    }

    pub fn header(&self) -> Option<&Header> {
        self.header.as_ref()
    }

    pub fn is_decoded(&self) -> bool {
        self.decoded
    }

    /// Decode the header and every record. Decoding happens once; later
    /// calls return immediately.
    ///
    /// Field description records register their developer fields as they
    /// are met, so any later data record can resolve them.
    pub fn decode(&mut self) -> Result<(), Error> {
        if self.decoded {
            return Ok(());
        }

        let header = self.parse_header()?;
        let end = header.data_end();

        let mut definitions: Vec<DefinitionRecord> = Vec::new();
        let mut records = Vec::new();
        let mut developer_fields = DeveloperFields::new();

        // Index of the latest definition for each local message.
        let mut active = [None; 16];

        let mut r = Reader::new(&self.bytes, header.data_start());

        while r.offset() < end {
            match next_record(&mut r, &active, &definitions)? {
                Left(definition) => {
                    debug!(
                        "Definition at {}: global #{}, local #{}, {:?}, {} fields, {} bytes.",
                        definition.offset,
                        definition.global,
                        definition.local,
                        definition.architecture,
                        definition.fields.len(),
                        definition.data_size,
                    );

                    active[definition.local as usize] = Some(definitions.len());
                    definitions.push(definition);
                }
                Right(data) => {
                    let definition = &definitions[data.definition];

                    debug!(
                        "Data at {}: global #{}, local #{}{}.",
                        data.offset,
                        definition.global,
                        data.local,
                        if data.time_offset.is_some() { " compressed" } else { "" },
                    );

                    if definition.global == mesg::FIELD_DESCRIPTION {
                        developer_fields.register_description(&self.bytes, definition, &data)?;
                    }

                    records.push(data);
                }
            }
        }

        info!(
            "Decoded {} definitions and {} data records.",
            definitions.len(),
            records.len()
        );

        self.definitions = definitions;
        self.records = records;
        self.developer_fields = developer_fields;
        self.decoded = true;

        Ok(())
    }

    /// Definition records in document order.
    pub fn definitions(&self) -> &[DefinitionRecord] {
        &self.definitions
    }

    /// Data records in document order.
    pub fn data_records(&self) -> &[DataRecord] {
        &self.records
    }

    /// The definition a data record was decoded with.
    pub fn definition(&self, data: &DataRecord) -> &DefinitionRecord {
        &self.definitions[data.definition]
    }

    pub fn developer_fields(&self) -> &DeveloperFields {
        &self.developer_fields
    }

    /// A read cursor at a document offset.
    pub fn reader(&self, offset: usize) -> Reader<'_> {
        Reader::new(&self.bytes, offset)
    }

    /// A write cursor at a document offset.
    pub fn writer(&mut self, offset: usize) -> Writer<'_> {
        Writer::new(&mut self.bytes, offset)
    }

    /// Read a field of a data record, decoded by its declared base type.
    pub fn read_value(&self, data: &DataRecord, field: &FieldDefinition) -> Result<Value, OutOfBounds> {
        let definition = self.definition(data);
        self.reader(data.field_offset(field))
            .value(field.base_type(), field.size as usize, definition.architecture)
    }

    /// Architecture of the data record spanning a document offset.
    pub fn architecture_at(&self, offset: usize) -> Option<Architecture> {
        let i = self.records.partition_point(|d| d.offset <= offset);
        let data = self.records.get(i.checked_sub(1)?)?;
        let definition = self.definition(data);

        (offset < data.offset + definition.record_len()).then_some(definition.architecture)
    }

    /// Write a value at a document offset, in the byte order of the data
    /// record spanning it (little-endian outside data records). Returns the
    /// byte order used.
    pub fn set_raw(&mut self, offset: usize, value: &RawValue) -> Result<Architecture, Error> {
        self.decode()?;

        let arch = self.architecture_at(offset).unwrap_or_default();
        value.write(&mut self.writer(offset), arch)?;

        Ok(arch)
    }

    /// Compute the checksum of every byte but the final two.
    pub fn crc(&self) -> u16 {
        document_crc(&self.bytes)
    }

    /// The checksum stored in the final two bytes.
    pub fn stored_crc(&self) -> Option<u16> {
        self.bytes.last_chunk::<2>().map(|c| u16::from_le_bytes(*c))
    }

    /// Whether the stored checksum matches the document.
    pub fn verify_crc(&self) -> bool {
        self.stored_crc() == Some(self.crc())
    }

    /// Recompute the checksum and write it into the final two bytes,
    /// little-endian. Returns the checksum written.
    pub fn write_crc(&mut self) -> Result<u16, OutOfBounds> {
        let size = self.size();
        let Some(offset) = size.checked_sub(2) else {
            Err(OutOfBounds { offset: 0, len: 2, size })?
        };

        let crc = self.crc();
        self.writer(offset).u16(crc, Architecture::Little)?;

        Ok(crc)
    }

    /// Write the document verbatim to a file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        fs::write(path, &self.bytes)?;
        Ok(())
    }
}

/// Decode the record at the cursor, leaving the cursor at the next record.
fn next_record(
    r: &mut Reader<'_>,
    active: &[Option<usize>; 16],
    definitions: &[DefinitionRecord],
) -> Result<Either<DefinitionRecord, DataRecord>, Error> {
    let offset = r.offset();

    match RecordHeader::parse(r.u8()?) {
        RecordHeader::Definition { local, developer } => {
            Ok(Left(DefinitionRecord::parse(r, offset, local, developer)?))
        }
        RecordHeader::Data { local, time_offset } => {
            let Some(definition) = active[local as usize] else {
                Err(Error::MissingDefinition { local, offset })?
            };

            r.skip(definitions[definition].data_size)?;

            Ok(Right(DataRecord {
                offset,
                definition,
                local,
                time_offset,
            }))
        }
    }
}
