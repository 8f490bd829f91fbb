mod common;

use chainring::{
    geo::{Position, degrees_from_semicircles},
    profile::BasicProfile,
    sans::codec::Architecture,
    scan::{
        scan,
        coordinates::CoordinatesScanner,
        replace::{CoordinateReplacementScanner, Error, ReplaceMode, Track, replace},
    },
    store::ByteStore,
};
use common::{FitBuilder, SINT32, UINT16, records};

fn track() -> Track {
    Track::from_points([
        Position::new(0.0, 0.0),
        Position::new(0.0, 0.001),
        Position::new(0.0, 0.002),
    ])
}

/// Records at 0, 50, 200 and 300 metres, one without a valid distance,
/// and a session.
fn activity() -> ByteStore {
    let mut builder = FitBuilder::new();
    records(
        &mut builder,
        0,
        &[
            (10, 10, 0),
            (10, 10, 5_000),
            (10, 10, u32::MAX),
            (10, 10, 20_000),
            (10, 10, 30_000),
        ],
    );

    builder
        .definition(
            1,
            18,
            Architecture::Little,
            &[(3, 4, SINT32), (4, 4, SINT32), (38, 4, SINT32), (39, 4, SINT32)],
        )
        .data(1, &[7u8; 16]);

    ByteStore::from_bytes(builder.build())
}

fn positions(store: &mut ByteStore) -> Vec<Position> {
    let mut scanner = CoordinatesScanner::default();
    scan(store, &mut scanner).unwrap();
    scanner.positions()
}

fn session(store: &ByteStore) -> [i32; 4] {
    let data = *store.data_records().last().unwrap();
    let mut r = store.reader(data.offset + 1);
    [(); 4].map(|_| r.i32(Architecture::Little).unwrap())
}

#[test]
fn track_distances() {
    let track = track();
    let step = Position::new(0.0, 0.0).distance_to(Position::new(0.0, 0.001));

    assert_eq!(track.len(), 3);
    assert_eq!(track.points()[0].distance, 0.0);
    assert!((step - 111.19).abs() < 0.01);
    assert!((track.total_distance() - 2.0 * step).abs() < 1e-6);
}

#[test]
fn simple_replacement() {
    let mut store = activity();
    let mut scanner = CoordinateReplacementScanner::new();
    scan(&mut store, &mut scanner).unwrap();

    assert_eq!(scanner.records().len(), 5);
    assert!(scanner.session().is_some());

    let track = track();
    let moved = replace(&mut store, &scanner, &track, ReplaceMode::Simple, &BasicProfile).unwrap();
    assert_eq!(moved, 5);

    let points: Vec<Position> = track.points().iter().map(|p| p.position).collect();
    let expected = [points[0], points[1], points[1], points[2], points[2]];

    let found = positions(&mut store);
    for (found, expected) in found.iter().zip(expected) {
        let (lat, lon) = expected.to_semicircles();
        assert_eq!(*found, Position::from_semicircles(lat, lon));
    }

    let (start_lat, start_lon) = points[0].to_semicircles();
    let (end_lat, end_lon) = points[2].to_semicircles();
    assert_eq!(session(&store), [start_lat, start_lon, end_lat, end_lon]);
}

#[test]
fn advanced_replacement_interpolates() {
    let mut store = activity();
    let mut scanner = CoordinateReplacementScanner::new();
    scan(&mut store, &mut scanner).unwrap();

    let track = track();
    replace(&mut store, &scanner, &track, ReplaceMode::Advanced, &BasicProfile).unwrap();

    let found = positions(&mut store);
    let step = track.points()[1].distance;
    let degrees_per_metre = 0.001 / step;

    let expected_lon = [
        0.0,
        50.0 * degrees_per_metre,
        50.0 * degrees_per_metre,
        0.001 + (200.0 - step) * degrees_per_metre,
        0.002,
    ];

    for (position, lon) in found.iter().zip(expected_lon) {
        assert!(position.lat.abs() < 1e-6, "{position:?}");
        assert!((position.lon - lon).abs() < 1e-6, "{position:?} != {lon}");
    }
}

#[test]
fn session_only_replacement() {
    let mut store = activity();
    let mut scanner = CoordinateReplacementScanner::new();
    scan(&mut store, &mut scanner).unwrap();

    let track = track();
    let moved = replace(&mut store, &scanner, &track, ReplaceMode::SessionOnly, &BasicProfile).unwrap();
    assert_eq!(moved, 0);

    let unchanged = degrees_from_semicircles(10);
    assert!(positions(&mut store).iter().all(|p| p.lat == unchanged && p.lon == unchanged));
    assert_eq!(session(&store)[0], 0);
    assert_eq!(session(&store)[3], track.points()[2].position.to_semicircles().1);
}

#[test]
fn short_track_is_rejected() {
    let mut store = activity();
    let mut scanner = CoordinateReplacementScanner::new();
    scan(&mut store, &mut scanner).unwrap();

    let track = Track::from_points([Position::new(1.0, 1.0)]);
    let result = replace(&mut store, &scanner, &track, ReplaceMode::Simple, &BasicProfile);

    assert!(matches!(
        result,
        Err(Error::NotEnoughPoints {
            records: 5,
            points: 1
        })
    ));

    let empty = Track::default();
    assert!(empty.is_empty());
    assert!(replace(&mut store, &scanner, &empty, ReplaceMode::SessionOnly, &BasicProfile).is_err());
}

#[test]
fn document_without_records_is_rejected() {
    let mut builder = FitBuilder::new();
    records(&mut builder, 0, &[(1, 1, 0)]);

    let mut store = ByteStore::from_bytes(builder.build());
    let mut scanner = CoordinateReplacementScanner::new();
    scan(&mut store, &mut scanner).unwrap();

    let result = replace(&mut store, &scanner, &track(), ReplaceMode::Advanced, &BasicProfile);
    assert!(matches!(result, Err(Error::NotEnoughPoints { records: 1, points: 3 })));
}

#[test]
fn distance_of_another_width_is_ignored() {
    let mut builder = FitBuilder::new();
    builder.definition(0, 20, Architecture::Little, &[(0, 4, SINT32), (1, 4, SINT32), (5, 2, UINT16)]);
    for distance in [0u16, 20_000] {
        let mut payload = 10i32.to_le_bytes().to_vec();
        payload.extend(10i32.to_le_bytes());
        payload.extend(distance.to_le_bytes());
        builder.data(0, &payload);
    }

    let mut store = ByteStore::from_bytes(builder.build());
    let mut scanner = CoordinateReplacementScanner::new();
    scan(&mut store, &mut scanner).unwrap();

    assert_eq!(scanner.records().len(), 2);
    assert!(scanner.records().iter().all(|r| r.lat.is_some() && r.distance.is_none()));

    let track = track();
    assert_eq!(replace(&mut store, &scanner, &track, ReplaceMode::Simple, &BasicProfile).unwrap(), 2);

    let start = track.points()[0].position;
    assert_eq!(positions(&mut store), [start, start]);
}
