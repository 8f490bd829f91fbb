//! Name and sport of an activity, for directory listings.

use super::{Flow, Scanner};
use crate::{
    fields::{FromFields, publish},
    profile::mesg,
    sans::definition::DefinitionRecord,
    sport,
    store::{ByteStore, DataRecord, Error},
};

/// Fields of a `sport` record.
#[derive(Debug, Default, Clone, PartialEq, Eq, FromFields)]
pub struct SportFields {
    #[field(0)]
    pub sport: Option<u8>,
    #[field(1)]
    pub sub_sport: Option<u8>,
    #[field(3)]
    pub name: Option<String>,
}

impl SportFields {
    /// Display name of the sport, preferring the sub-sport.
    pub fn sport_name(&self) -> &'static str {
        sport::display_name(self.sport.unwrap_or(0), self.sub_sport.unwrap_or(0))
    }
}

/// Reads the first `sport` record of a document, then stops.
#[derive(Debug, Default)]
pub struct ActivityScanner {
    sport: Option<SportFields>,
}

impl ActivityScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// The `sport` record, if the document has one.
    pub fn sport(&self) -> Option<&SportFields> {
        self.sport.as_ref()
    }

    pub fn into_sport(self) -> Option<SportFields> {
        self.sport
    }
}

impl Scanner for ActivityScanner {
    fn reset(&mut self) {
        self.sport = None;
    }

    fn record(
        &mut self,
        store: &ByteStore,
        definition: &DefinitionRecord,
        data: &DataRecord,
    ) -> Result<Flow, Error> {
        if definition.global != mesg::SPORT {
            return Ok(Flow::Continue);
        }

        let mut fields = SportFields::default();
        publish(store.bytes(), definition, data, &mut fields)?;
        self.sport = Some(fields);

        Ok(Flow::Stop)
    }
}
