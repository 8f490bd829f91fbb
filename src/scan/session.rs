//! Session summaries of activities, merged across multisport sessions.

use std::path::PathBuf;

use super::{Flow, Scanner, activity::SportFields};
use crate::{
    fields::{FromFields, FromRecords, publish},
    sans::definition::DefinitionRecord,
    sport,
    store::{ByteStore, DataRecord, Error},
};

/// Session field of the number of sets in strength training.
pub const TOTAL_SETS: u8 = 151;

#[derive(Debug, Default, FromFields)]
struct SessionFields {
    #[field(253)]
    timestamp: Option<u32>,
    #[field(5)]
    sport: Option<u8>,
    #[field(6)]
    sub_sport: Option<u8>,
    #[field(7)]
    total_elapsed_time: Option<u32>,
    #[field(8)]
    total_timer_time: Option<u32>,
    #[field(9)]
    total_distance: Option<u32>,
    #[field(11)]
    total_calories: Option<u16>,
    #[field(14)]
    avg_speed: Option<u16>,
    #[field(16)]
    avg_heart_rate: Option<u8>,
    #[field(17)]
    max_heart_rate: Option<u8>,
    #[field(151)]
    total_sets: Option<u16>,
}

impl SessionFields {
    fn summary(&self) -> SessionSummary {
        let nonzero = |v: Option<u8>| v.filter(|v| *v != 0).map_or(0, u16::from);

        SessionSummary {
            timestamp: self.timestamp.unwrap_or(0),
            sport: self.sport.unwrap_or(0),
            sub_sport: self.sub_sport.unwrap_or(0),
            total_elapsed_time: self.total_elapsed_time.map_or(0.0, |ms| ms as f64 / 1000.0),
            total_timer_time: self.total_timer_time.map_or(0.0, |ms| ms as f64 / 1000.0),
            total_distance: self.total_distance.map_or(0.0, |cm| cm as f64 / 100.0),
            total_calories: self.total_calories.unwrap_or(0),
            avg_speed: self.avg_speed.unwrap_or(0),
            avg_heart_rate: nonzero(self.avg_heart_rate),
            max_heart_rate: nonzero(self.max_heart_rate),
            total_sets: self.total_sets.unwrap_or(0),
        }
    }
}

#[derive(Debug, Default, FromRecords)]
struct ActivityRecords {
    #[record(12)]
    sport: Option<SportFields>,
    #[record(18)]
    sessions: Vec<SessionFields>,
}

/// Totals of one session. Missing or invalid values are zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SessionSummary {
    pub timestamp: u32,
    pub sport: u8,
    pub sub_sport: u8,
    /// Seconds.
    pub total_elapsed_time: f64,
    /// Seconds.
    pub total_timer_time: f64,
    /// Metres.
    pub total_distance: f64,
    pub total_calories: u16,
    /// Millimetres per second.
    pub avg_speed: u16,
    pub avg_heart_rate: u16,
    pub max_heart_rate: u16,
    pub total_sets: u16,
}

impl SessionSummary {
    pub fn sport_name(&self) -> &'static str {
        sport::display_name(self.sport, self.sub_sport)
    }

    fn is_strength(&self) -> bool {
        self.sport == sport::TRAINING && self.sub_sport == sport::STRENGTH_TRAINING
    }

    /// Elapsed time as `H:MM:SS`, or `M:SS` under an hour.
    pub fn formatted_duration(&self) -> String {
        if self.total_elapsed_time <= 0.0 {
            return "--:--".to_owned();
        }

        let total = self.total_elapsed_time as u64;
        let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);

        if h > 0 {
            format!("{h}:{m:02}:{s:02}")
        } else {
            format!("{m}:{s:02}")
        }
    }

    /// Distance in kilometres. Short swims are in metres and strength
    /// training reports its set count instead.
    pub fn formatted_distance(&self) -> String {
        if self.is_strength() {
            return match self.total_sets {
                0 => "-- sets".to_owned(),
                sets => format!("{sets} sets"),
            };
        }

        if self.total_distance <= 0.0 {
            return "-- km".to_owned();
        }

        if self.sport == sport::SWIMMING && self.total_distance < 2000.0 {
            return format!("{:.0} m", self.total_distance);
        }

        format!("{:.2} km", self.total_distance / 1000.0)
    }

    /// Speed in km/h with pace per kilometre. Swims report pace per 100 m
    /// and strength training its duration.
    pub fn formatted_speed(&self) -> String {
        let kmh = if self.avg_speed > 0 && self.avg_speed < u16::MAX {
            self.avg_speed as f64 / 1000.0 * 3.6
        } else if self.total_distance > 0.0 && self.total_elapsed_time > 0.0 {
            (self.total_distance / 1000.0) / (self.total_elapsed_time / 3600.0)
        } else {
            0.0
        };

        if kmh <= 0.0 {
            return "--".to_owned();
        }

        if self.is_strength() {
            let total = self.total_elapsed_time as u64;
            return format!("{}:{:02} duration", total / 60, total % 60);
        }

        if self.sport == sport::SWIMMING {
            let pace = 100.0 / (kmh / 3.6);
            return format!("{}:{:02} /100m", (pace / 60.0) as u64, pace as u64 % 60);
        }

        let pace = 60.0 / kmh;
        let minutes = pace.trunc();
        let seconds = ((pace - minutes) * 60.0) as u64;

        format!("{kmh:.2} km/h, {}:{seconds:02} /km", minutes as u64)
    }

    pub fn formatted_heart_rate(&self) -> String {
        match self.avg_heart_rate {
            0 => "--".to_owned(),
            hr => hr.to_string(),
        }
    }
}

/// The sport record and sessions of one activity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivitySummary {
    pub file_name: Option<PathBuf>,
    pub name: Option<String>,
    pub sport: u8,
    pub sub_sport: u8,
    pub sessions: Vec<SessionSummary>,
}

impl ActivitySummary {
    pub fn sport_name(&self) -> &'static str {
        sport::display_name(self.sport, self.sub_sport)
    }

    pub fn is_multisport(&self) -> bool {
        self.sport == sport::MULTISPORT
    }

    pub fn has_data(&self) -> bool {
        !self.sessions.is_empty() || self.sport > 0
    }

    /// Combine all sessions into one.
    ///
    /// Totals are summed. Average heart rate and speed are weighted by
    /// elapsed time, and the maximum heart rate is the largest one, both
    /// over sessions with a positive elapsed time. The sport is the
    /// activity's own and the timestamp the first session's.
    pub fn merged(&self) -> SessionSummary {
        let Some(first) = self.sessions.first() else {
            return SessionSummary::default();
        };

        let mut merged = SessionSummary {
            timestamp: first.timestamp,
            sport: self.sport,
            sub_sport: self.sub_sport,
            ..SessionSummary::default()
        };

        let (mut weight, mut heart_rate, mut speed) = (0.0, 0.0, 0.0);

        for session in &self.sessions {
            merged.total_elapsed_time += session.total_elapsed_time;
            merged.total_timer_time += session.total_timer_time;
            merged.total_distance += session.total_distance;
            merged.total_calories = merged.total_calories.saturating_add(session.total_calories);
            merged.total_sets = merged.total_sets.saturating_add(session.total_sets);

            if session.total_elapsed_time > 0.0 {
                weight += session.total_elapsed_time;
                heart_rate += session.avg_heart_rate as f64 * session.total_elapsed_time;
                speed += session.avg_speed as f64 * session.total_elapsed_time;
                merged.max_heart_rate = merged.max_heart_rate.max(session.max_heart_rate);
            }
        }

        if weight > 0.0 {
            merged.avg_heart_rate = (heart_rate / weight) as u16;
            merged.avg_speed = (speed / weight) as u16;
        }

        merged
    }
}

/// Collects the sport record and the sessions of a document.
///
/// Sessions with neither a sport nor an elapsed time are dropped. When
/// several `sport` records exist the last one wins.
#[derive(Debug, Default)]
pub struct SessionScanner {
    file_name: Option<PathBuf>,
    records: ActivityRecords,
}

impl SessionScanner {
    pub fn new(file_name: impl Into<PathBuf>) -> Self {
        Self {
            file_name: Some(file_name.into()),
            records: ActivityRecords::default(),
        }
    }

    pub fn summary(&self) -> ActivitySummary {
        let sport = self.records.sport.clone().unwrap_or_default();

        ActivitySummary {
            file_name: self.file_name.clone(),
            name: sport.name,
            sport: sport.sport.unwrap_or(0),
            sub_sport: sport.sub_sport.unwrap_or(0),
            sessions: self
                .records
                .sessions
                .iter()
                .map(SessionFields::summary)
                .filter(|s| s.sport > 0 || s.total_elapsed_time > 0.0)
                .collect(),
        }
    }
}

impl Scanner for SessionScanner {
    fn reset(&mut self) {
        self.records = ActivityRecords::default();
    }

    fn record(
        &mut self,
        store: &ByteStore,
        definition: &DefinitionRecord,
        data: &DataRecord,
    ) -> Result<Flow, Error> {
        if let Some(receiver) = self.records.add_record(definition.global) {
            publish(store.bytes(), definition, data, receiver)?;
        }

        Ok(Flow::Continue)
    }
}
