//! Visitors over the data records of a decoded document.
//!
//! A [`Scanner`] receives every data record in document order together with
//! its definition. It steers the walk through the [`Flow`] it returns:
//! stopping early once it has what it needs, or rejecting the document as
//! filtered out. [`scan`] drives one scanner over one document and reports
//! how the walk ended.

use log::debug;

use crate::{
    sans::{
        codec::{Architecture, OutOfBounds},
        definition::DefinitionRecord,
    },
    store::{ByteStore, DataRecord, Error},
};

pub mod activity;
pub mod coordinates;
pub mod print;
pub mod product;
pub mod replace;
pub mod session;
pub mod timestamp;

/// What the walk does after a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// End the walk after this record.
    Stop,
    /// Abandon the document, giving a reason.
    FilteredOut(String),
}

/// How a walk ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Every record was visited.
    Completed,
    /// The scanner stopped the walk early.
    Stopped,
    /// The scanner rejected the document.
    FilteredOut(String),
}

impl Outcome {
    pub fn is_filtered_out(&self) -> bool {
        matches!(self, Self::FilteredOut(_))
    }
}

/// A visitor over data records.
pub trait Scanner {
    /// Called once before the first record.
    fn reset(&mut self) {}

    /// Called for each data record in document order.
    fn record(
        &mut self,
        store: &ByteStore,
        definition: &DefinitionRecord,
        data: &DataRecord,
    ) -> Result<Flow, Error> {
        let _ = store;
        debug!(
            "global #{}, local #{}, data offset {}",
            definition.global, data.local, data.offset
        );
        Ok(Flow::Continue)
    }

    /// Called once after the last visited record, unless the document was
    /// filtered out or visiting failed.
    fn end(&mut self) {}
}

/// Decode a document if needed and walk its data records with a scanner.
pub fn scan<S: Scanner + ?Sized>(store: &mut ByteStore, scanner: &mut S) -> Result<Outcome, Error> {
    store.decode()?;
    scan_decoded(store, scanner)
}

/// Walk the data records of an already decoded document. An undecoded
/// document has no records to visit.
pub fn scan_decoded<S: Scanner + ?Sized>(store: &ByteStore, scanner: &mut S) -> Result<Outcome, Error> {
    scanner.reset();

    let mut outcome = Outcome::Completed;

    for data in store.data_records() {
        match scanner.record(store, store.definition(data), data)? {
            Flow::Continue => {}
            Flow::Stop => {
                outcome = Outcome::Stopped;
                break;
            }
            Flow::FilteredOut(reason) => {
                debug!("Filtered out at offset {}: {reason}", data.offset);
                return Ok(Outcome::FilteredOut(reason));
            }
        }
    }

    scanner.end();

    Ok(outcome)
}

/// The absolute position of a field value in a document.
///
/// Mutating scanners record locations rather than values, so a later write
/// lands where the value was found, in the byte order it was stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLocation {
    pub offset: usize,
    pub size: u8,
    pub architecture: Architecture,
}

impl FieldLocation {
    /// Locate a standard field of a data record. Fields declared with
    /// another width than `size` are not located.
    pub fn find(definition: &DefinitionRecord, data: &DataRecord, number: u8, size: u8) -> Option<Self> {
        let field = definition.field(number).filter(|f| f.size == size)?;

        Some(Self {
            offset: data.field_offset(field),
            size: field.size,
            architecture: definition.architecture,
        })
    }

    pub fn read_u16(&self, store: &ByteStore) -> Result<u16, OutOfBounds> {
        store.reader(self.offset).u16(self.architecture)
    }

    pub fn read_u32(&self, store: &ByteStore) -> Result<u32, OutOfBounds> {
        store.reader(self.offset).u32(self.architecture)
    }

    pub fn read_i32(&self, store: &ByteStore) -> Result<i32, OutOfBounds> {
        store.reader(self.offset).i32(self.architecture)
    }

    pub fn write_u16(&self, store: &mut ByteStore, value: u16) -> Result<(), OutOfBounds> {
        store.writer(self.offset).u16(value, self.architecture)
    }

    pub fn write_u32(&self, store: &mut ByteStore, value: u32) -> Result<(), OutOfBounds> {
        store.writer(self.offset).u32(value, self.architecture)
    }

    pub fn write_i32(&self, store: &mut ByteStore, value: i32) -> Result<(), OutOfBounds> {
        store.writer(self.offset).i32(value, self.architecture)
    }
}
