//! Angle encodings and great-circle helpers on a spherical Earth.
//!
//! Angles passed to the great-circle functions are in radians, distances in
//! metres.

use core::f64::consts::PI;

/// Mean Earth radius in metres.
pub const EARTH_RADIUS: f64 = 6_371_000.0;

const SEMICIRCLES_PER_HALF_TURN: f64 = 2_147_483_648.0; // 2^31

/// Convert semicircles to degrees.
pub fn degrees_from_semicircles(value: i32) -> f64 {
    value as f64 * (180.0 / SEMICIRCLES_PER_HALF_TURN)
}

/// Wrap an angle in degrees into `[-180, 180)`.
pub fn wrap_degrees(degrees: f64) -> f64 {
    (degrees + 180.0).rem_euclid(360.0) - 180.0
}

/// Convert degrees to semicircles. The angle is wrapped into `[-180, 180)`
/// first, so +180 encodes as `i32::MIN`. `i32::MAX` marks an invalid
/// coordinate and is never produced.
pub fn semicircles_from_degrees(degrees: f64) -> i32 {
    let semicircles = (wrap_degrees(degrees) * (SEMICIRCLES_PER_HALF_TURN / 180.0)) as i64;
    semicircles.clamp(i32::MIN as i64, i32::MAX as i64 - 1) as i32
}

/// Convert radians to semicircles, as [`semicircles_from_degrees`].
pub fn semicircles_from_radians(radians: f64) -> i32 {
    semicircles_from_degrees(radians * (180.0 / PI))
}

/// A latitude and longitude in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub lat: f64,
    pub lon: f64,
}

impl Position {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn from_semicircles(lat: i32, lon: i32) -> Self {
        Self::new(degrees_from_semicircles(lat), degrees_from_semicircles(lon))
    }

    /// Encode as semicircles, clamping latitude to the poles and wrapping
    /// longitude.
    pub fn to_semicircles(self) -> (i32, i32) {
        (
            semicircles_from_degrees(self.lat.clamp(-90.0, 90.0)),
            semicircles_from_degrees(self.lon),
        )
    }

    fn radians(self) -> (f64, f64) {
        (self.lat.to_radians(), self.lon.to_radians())
    }

    /// Great-circle distance to another position, in metres.
    pub fn distance_to(self, other: Position) -> f64 {
        let (lat1, lon1) = self.radians();
        let (lat2, lon2) = other.radians();
        haversine(lat1, lon1, lat2, lon2)
    }

    /// Initial bearing towards another position, in radians.
    pub fn bearing_to(self, other: Position) -> f64 {
        let (lat1, lon1) = self.radians();
        let (lat2, lon2) = other.radians();
        bearing(lat1, lon1, lat2, lon2)
    }

    /// The position reached by travelling `distance` metres along `bearing`.
    pub fn destination(self, bearing: f64, distance: f64) -> Position {
        let (lat, lon) = self.radians();
        let (lat, lon) = destination(lat, lon, bearing, distance);
        Position::new(lat.to_degrees(), wrap_degrees(lon.to_degrees()))
    }
}

/// Great-circle distance by the haversine formula.
pub fn haversine(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS * c
}

/// Initial bearing from the first point towards the second.
pub fn bearing(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlon = lon2 - lon1;

    let x = lat2.cos() * dlon.sin();
    let y = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();

    x.atan2(y)
}

/// Destination point given a start, bearing and distance.
pub fn destination(lat: f64, lon: f64, bearing: f64, distance: f64) -> (f64, f64) {
    let delta = distance / EARTH_RADIUS;

    let lat2 = (lat.sin() * delta.cos() + lat.cos() * delta.sin() * bearing.cos()).asin();
    let lon2 = lon
        + (bearing.sin() * delta.sin() * lat.cos()).atan2(delta.cos() - lat.sin() * lat2.sin());

    (lat2, lon2)
}
