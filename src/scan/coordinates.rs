//! Positions of `record` messages.

use super::{Flow, Scanner};
use crate::{
    geo::Position,
    profile::mesg,
    sans::definition::DefinitionRecord,
    sport,
    store::{ByteStore, DataRecord, Error},
};

pub const POSITION_LAT: u8 = 0;
pub const POSITION_LONG: u8 = 1;

const SPORT_FIELD: u8 = 0;

/// Collects latitudes and longitudes in semicircles, independently of each
/// other, in record order.
///
/// With a sport other than [`sport::ALL`], a document whose `sport` record
/// names a different sport is filtered out.
#[derive(Debug)]
pub struct CoordinatesScanner {
    sport: u8,
    latitudes: Vec<i32>,
    longitudes: Vec<i32>,
}

impl Default for CoordinatesScanner {
    fn default() -> Self {
        Self::new(sport::ALL)
    }
}

impl CoordinatesScanner {
    pub fn new(sport: u8) -> Self {
        Self {
            sport,
            latitudes: Vec::new(),
            longitudes: Vec::new(),
        }
    }

    pub fn latitudes(&self) -> &[i32] {
        &self.latitudes
    }

    pub fn longitudes(&self) -> &[i32] {
        &self.longitudes
    }

    /// Valid positions of records carrying both coordinates.
    pub fn positions(&self) -> Vec<Position> {
        self.latitudes
            .iter()
            .zip(&self.longitudes)
            .filter(|(lat, lon)| **lat != i32::MAX && **lon != i32::MAX)
            .map(|(lat, lon)| Position::from_semicircles(*lat, *lon))
            .collect()
    }
}

impl Scanner for CoordinatesScanner {
    fn reset(&mut self) {
        self.latitudes.clear();
        self.longitudes.clear();
    }

    fn record(
        &mut self,
        store: &ByteStore,
        definition: &DefinitionRecord,
        data: &DataRecord,
    ) -> Result<Flow, Error> {
        let arch = definition.architecture;

        match definition.global {
            mesg::SPORT if self.sport != sport::ALL => {
                if let Some(field) = definition.field(SPORT_FIELD) {
                    let found = store.reader(data.field_offset(field)).u8()?;

                    if found != self.sport {
                        return Ok(Flow::FilteredOut(format!("Sport {found} is filtered out.")));
                    }
                }
            }
            mesg::RECORD => {
                for field in definition.standard_fields().filter(|f| f.size == 4) {
                    let values = match field.number {
                        POSITION_LAT => &mut self.latitudes,
                        POSITION_LONG => &mut self.longitudes,
                        _ => continue,
                    };

                    values.push(store.reader(data.field_offset(field)).i32(arch)?);
                }
            }
            _ => {}
        }

        Ok(Flow::Continue)
    }
}
