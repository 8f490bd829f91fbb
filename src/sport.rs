//! Sport and sub-sport names.

use std::{collections::HashMap, sync::LazyLock};

pub const RUNNING: u8 = 1;
pub const CYCLING: u8 = 2;
pub const SWIMMING: u8 = 5;
pub const TRAINING: u8 = 10;
pub const MULTISPORT: u8 = 18;
/// Matches every sport in filters.
pub const ALL: u8 = 254;

pub const STRENGTH_TRAINING: u8 = 20;

/// An immutable two-way mapping between numbers and names.
#[derive(Debug)]
pub struct NameTable {
    names: HashMap<u8, &'static str>,
    numbers: HashMap<&'static str, u8>,
}

impl NameTable {
    fn new(entries: &[(u8, &'static str)]) -> Self {
        Self {
            names: entries.iter().copied().collect(),
            numbers: entries.iter().map(|(n, s)| (*s, *n)).collect(),
        }
    }

    pub fn name(&self, number: u8) -> Option<&'static str> {
        self.names.get(&number).copied()
    }

    pub fn number(&self, name: &str) -> Option<u8> {
        self.numbers.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

pub static SPORTS: LazyLock<NameTable> = LazyLock::new(|| {
    NameTable::new(&[
        (0, "Generic"),
        (RUNNING, "Running"),
        (CYCLING, "Cycling"),
        (3, "Transition"),
        (4, "Fitness Equipment"),
        (SWIMMING, "Swimming"),
        (6, "Basketball"),
        (7, "Soccer"),
        (8, "Tennis"),
        (9, "American Football"),
        (TRAINING, "Training"),
        (11, "Walking"),
        (12, "Cross Country Skiing"),
        (13, "Alpine Skiing"),
        (14, "Snowboarding"),
        (15, "Rowing"),
        (16, "Mountaineering"),
        (17, "Hiking"),
        (MULTISPORT, "Multisport"),
        (19, "Paddling"),
        (20, "Flying"),
        (21, "E-Biking"),
        (22, "Motorcycling"),
        (23, "Boating"),
        (24, "Driving"),
        (25, "Golf"),
        (26, "Hang Gliding"),
        (27, "Horseback Riding"),
        (28, "Hunting"),
        (29, "Fishing"),
        (30, "Inline Skating"),
        (31, "Rock Climbing"),
        (32, "Sailing"),
        (33, "Ice Skating"),
        (34, "Sky Diving"),
        (35, "Snowshoeing"),
        (36, "Snowmobiling"),
        (37, "Stand Up Paddleboarding"),
        (38, "Surfing"),
        (39, "Wakeboarding"),
        (40, "Water Skiing"),
        (41, "Kayaking"),
        (42, "Rafting"),
        (43, "Windsurfing"),
        (44, "Kitesurfing"),
        (45, "Tactical"),
        (46, "Jumpmaster"),
        (47, "Boxing"),
        (48, "Floor Climbing"),
        (53, "Diving"),
        (ALL, "All"),
    ])
});

pub static SUB_SPORTS: LazyLock<NameTable> = LazyLock::new(|| {
    NameTable::new(&[
        (1, "Treadmill"),
        (2, "Street"),
        (3, "Trail"),
        (4, "Track"),
        (5, "Spin"),
        (6, "Indoor Cycling"),
        (7, "Road"),
        (8, "Mountain"),
        (9, "Downhill"),
        (10, "Recumbent"),
        (11, "Cyclocross"),
        (12, "Hand Cycling"),
        (13, "Track Cycling"),
        (14, "Indoor Rowing"),
        (15, "Elliptical"),
        (16, "Stair Climbing"),
        (17, "Lap Swimming"),
        (18, "Open Water"),
        (19, "Flexibility Training"),
        (STRENGTH_TRAINING, "Strength Training"),
        (21, "Warm Up"),
        (22, "Match"),
        (23, "Exercise"),
        (24, "Challenge"),
        (25, "Indoor Skiing"),
        (26, "Cardio Training"),
        (27, "Indoor Walking"),
        (28, "E-Bike Fitness"),
        (29, "BMX"),
        (30, "Casual Walking"),
        (31, "Speed Walking"),
        (32, "Bike to Run Transition"),
        (33, "Run to Bike Transition"),
        (34, "Swim to Bike Transition"),
        (35, "ATV"),
        (36, "Motocross"),
        (37, "Backcountry"),
        (38, "Resort"),
        (39, "RC Drone"),
        (40, "Winglet"),
        (58, "Virtual Activity"),
    ])
});

/// Display name of a sport, preferring a known sub-sport.
pub fn display_name(sport: u8, sub_sport: u8) -> &'static str {
    if sub_sport > 0 {
        if let Some(name) = SUB_SPORTS.name(sub_sport) {
            return name;
        }
    }

    SPORTS.name(sport).unwrap_or("Unknown")
}
