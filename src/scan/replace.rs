//! Replacing the route of an activity with another track.
//!
//! [`CoordinateReplacementScanner`] records where the positions of every
//! `record` message and of the session live. [`replace`] then places each
//! record on the new track by its recorded distance and rewrites the
//! session start and end positions.

use log::info;
use thiserror::Error;

use super::{FieldLocation, Flow, Scanner, coordinates};
use crate::{
    geo::Position,
    profile::{Profile, mesg},
    sans::{codec::OutOfBounds, definition::DefinitionRecord},
    store::{self, ByteStore, DataRecord},
};

/// Distance field of `record` messages.
pub const RECORD_DISTANCE: u8 = 5;

pub const SESSION_START_LAT: u8 = 3;
pub const SESSION_START_LONG: u8 = 4;
pub const SESSION_END_LAT: u8 = 38;
pub const SESSION_END_LONG: u8 = 39;

/// Errors replacing coordinates.
#[derive(Debug, Error)]
pub enum Error {
    #[error("At least two positions and two track points are needed, got {records} and {points}.")]
    NotEnoughPoints { records: usize, points: usize },
    #[error(transparent)]
    Store(#[from] store::Error),
}

impl From<OutOfBounds> for Error {
    fn from(e: OutOfBounds) -> Self {
        Self::Store(e.into())
    }
}

/// Position fields of one `record` message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordOffsets {
    pub lat: Option<FieldLocation>,
    pub lon: Option<FieldLocation>,
    pub distance: Option<FieldLocation>,
}

/// Position fields of a `session` message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionOffsets {
    pub start_lat: Option<FieldLocation>,
    pub start_lon: Option<FieldLocation>,
    pub end_lat: Option<FieldLocation>,
    pub end_lon: Option<FieldLocation>,
}

/// Collects position field locations. When a document has several
/// sessions, the last one is kept.
#[derive(Debug, Default)]
pub struct CoordinateReplacementScanner {
    records: Vec<RecordOffsets>,
    session: Option<SessionOffsets>,
}

impl CoordinateReplacementScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[RecordOffsets] {
        &self.records
    }

    pub fn session(&self) -> Option<&SessionOffsets> {
        self.session.as_ref()
    }
}

impl Scanner for CoordinateReplacementScanner {
    fn reset(&mut self) {
        self.records.clear();
        self.session = None;
    }

    fn record(
        &mut self,
        _: &ByteStore,
        definition: &DefinitionRecord,
        data: &DataRecord,
    ) -> Result<Flow, store::Error> {
        let find = |number| FieldLocation::find(definition, data, number, 4);

        match definition.global {
            mesg::RECORD => {
                let offsets = RecordOffsets {
                    lat: find(coordinates::POSITION_LAT),
                    lon: find(coordinates::POSITION_LONG),
                    distance: find(RECORD_DISTANCE),
                };

                if offsets.lat.is_some() || offsets.lon.is_some() {
                    self.records.push(offsets);
                }
            }
            mesg::SESSION => {
                self.session = Some(SessionOffsets {
                    start_lat: find(SESSION_START_LAT),
                    start_lon: find(SESSION_START_LONG),
                    end_lat: find(SESSION_END_LAT),
                    end_lon: find(SESSION_END_LONG),
                });
            }
            _ => {}
        }

        Ok(Flow::Continue)
    }
}

/// A point of a track with its distance from the start along the track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackPoint {
    pub position: Position,
    /// Metres.
    pub distance: f64,
}

/// An ordered track.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Track {
    points: Vec<TrackPoint>,
}

impl Track {
    /// Build a track, measuring cumulative great-circle distance.
    pub fn from_points(positions: impl IntoIterator<Item = Position>) -> Self {
        let mut points: Vec<TrackPoint> = Vec::new();

        for position in positions {
            let distance = points
                .last()
                .map_or(0.0, |p| p.distance + p.position.distance_to(position));

            points.push(TrackPoint { position, distance });
        }

        Self { points }
    }

    pub fn points(&self) -> &[TrackPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Length of the track in metres.
    pub fn total_distance(&self) -> f64 {
        self.points.last().map_or(0.0, |p| p.distance)
    }

    /// Place a distance on the track: the first point at least that far
    /// along, or with interpolation a point on the segment leading to it.
    /// Advances `index` monotonically.
    fn locate(&self, index: &mut usize, distance: f64, interpolate: bool) -> Position {
        let points = &self.points;

        while *index + 1 < points.len() && distance > points[*index].distance {
            *index += 1;
        }

        let point = points[*index];

        if interpolate && *index > 0 && distance < point.distance {
            let previous = points[*index - 1];
            let bearing = previous.position.bearing_to(point.position);
            return previous.position.destination(bearing, distance - previous.distance);
        }

        point.position
    }
}

/// How [`replace`] places records on the track.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReplaceMode {
    /// Snap each record to the first track point at or beyond its distance.
    #[default]
    Simple,
    /// Interpolate each record along the track segment containing it.
    Advanced,
    /// Only rewrite the session start and end positions.
    SessionOnly,
}

/// Rewrite positions from a track. Returns the number of records moved.
///
/// Records are placed by their recorded distance, scaled per the profile.
/// Records without a valid distance reuse the previous record's. The
/// session start and end become the first and last track points.
pub fn replace(
    store: &mut ByteStore,
    scanner: &CoordinateReplacementScanner,
    track: &Track,
    mode: ReplaceMode,
    profile: &dyn Profile,
) -> Result<usize, Error> {
    let records = scanner.records();
    let (Some(first), Some(last)) = (track.points().first(), track.points().last()) else {
        Err(Error::NotEnoughPoints {
            records: records.len(),
            points: track.len(),
        })?
    };

    if track.len() < 2 || (mode != ReplaceMode::SessionOnly && records.len() < 2) {
        Err(Error::NotEnoughPoints {
            records: records.len(),
            points: track.len(),
        })?
    }

    let (scale, offset) = profile
        .field(mesg::RECORD, RECORD_DISTANCE)
        .map_or((1.0, 0.0), |m| (m.scale, m.offset));

    let mut moved = 0;

    if mode != ReplaceMode::SessionOnly {
        let mut index = 0;
        let mut distance = 0.0;

        for record in records {
            if let Some(location) = record.distance {
                let raw = location.read_u32(store)?;
                if raw != u32::MAX {
                    distance = raw as f64 / scale - offset;
                }
            }

            let position = track.locate(&mut index, distance, mode == ReplaceMode::Advanced);
            write_position(store, record.lat, record.lon, position)?;
            moved += 1;
        }
    }

    if let Some(session) = scanner.session() {
        write_position(store, session.start_lat, session.start_lon, first.position)?;
        write_position(store, session.end_lat, session.end_lon, last.position)?;
    }

    info!("Moved {moved} records onto a track of {:.0} m.", track.total_distance());
    Ok(moved)
}

fn write_position(
    store: &mut ByteStore,
    lat: Option<FieldLocation>,
    lon: Option<FieldLocation>,
    position: Position,
) -> Result<(), OutOfBounds> {
    let (lat_semicircles, lon_semicircles) = position.to_semicircles();

    if let Some(lat) = lat {
        lat.write_i32(store, lat_semicircles)?;
    }
    if let Some(lon) = lon {
        lon.write_i32(store, lon_semicircles)?;
    }

    Ok(())
}
