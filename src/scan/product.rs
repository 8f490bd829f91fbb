//! Product ids of the recording device.

use log::info;

use super::{FieldLocation, Flow, Scanner};
use crate::{
    profile::mesg,
    sans::{codec::OutOfBounds, definition::DefinitionRecord},
    store::{ByteStore, DataRecord, Error},
};

/// Product field of `file_id` records.
pub const FILE_ID_PRODUCT: u8 = 2;
/// Product field of `device_info` records.
pub const DEVICE_INFO_PRODUCT: u8 = 4;

/// A product id found in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductId {
    /// Global message the id was found in.
    pub global: u16,
    pub location: FieldLocation,
}

impl ProductId {
    pub fn read(&self, store: &ByteStore) -> Result<u16, OutOfBounds> {
        self.location.read_u16(store)
    }
}

/// Collects valid product ids from `file_id` and `device_info` records,
/// optionally only those equal to a searched id.
#[derive(Debug, Default)]
pub struct ProductScanner {
    search: Option<u16>,
    products: Vec<ProductId>,
}

impl ProductScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only collect occurrences of one product id.
    pub fn matching(product: u16) -> Self {
        Self {
            search: Some(product),
            products: Vec::new(),
        }
    }

    pub fn products(&self) -> &[ProductId] {
        &self.products
    }

    /// Overwrite every collected product id. Returns the number of writes.
    pub fn replace(&self, store: &mut ByteStore, product: u16) -> Result<usize, OutOfBounds> {
        for found in &self.products {
            found.location.write_u16(store, product)?;
        }

        info!("Replaced {} product ids with {product}.", self.products.len());
        Ok(self.products.len())
    }
}

impl Scanner for ProductScanner {
    fn reset(&mut self) {
        self.products.clear();
    }

    fn record(
        &mut self,
        store: &ByteStore,
        definition: &DefinitionRecord,
        data: &DataRecord,
    ) -> Result<Flow, Error> {
        let number = match definition.global {
            mesg::FILE_ID => FILE_ID_PRODUCT,
            mesg::DEVICE_INFO => DEVICE_INFO_PRODUCT,
            _ => return Ok(Flow::Continue),
        };

        let Some(location) = FieldLocation::find(definition, data, number, 2) else {
            return Ok(Flow::Continue);
        };

        let product = location.read_u16(store)?;

        if product != u16::MAX && self.search.is_none_or(|s| s == product) {
            self.products.push(ProductId {
                global: definition.global,
                location,
            });
        }

        Ok(Flow::Continue)
    }
}
