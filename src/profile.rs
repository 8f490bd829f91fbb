//! Field names, scales and semantic types for known messages.
//!
//! The decoder never interprets field numbers itself. Consumers needing names
//! or physical conversions resolve them through a [`Profile`]. The built-in
//! [`BasicProfile`] covers the messages common to activity files; anything
//! else can be supplied by implementing the trait.

/// Global message numbers used by the built-in scanners.
pub mod mesg {
    pub const FILE_ID: u16 = 0;
    pub const SPORT: u16 = 12;
    pub const SESSION: u16 = 18;
    pub const LAP: u16 = 19;
    pub const RECORD: u16 = 20;
    pub const EVENT: u16 = 21;
    pub const DEVICE_INFO: u16 = 23;
    pub const ACTIVITY: u16 = 34;
    pub const FILE_CREATOR: u16 = 49;
    pub const FIELD_DESCRIPTION: u16 = 206;
    pub const DEVELOPER_DATA_ID: u16 = 207;
}

/// How a field's stored number should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Plain,
    /// Seconds since the device epoch.
    DateTime,
    /// Elapsed seconds, multiplied by the field scale.
    Duration,
    /// An angle in semicircles.
    Semicircles,
}

/// Profile metadata for one field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldMeta {
    pub number: u8,
    pub name: &'static str,
    pub scale: f64,
    pub offset: f64,
    pub units: &'static str,
    pub kind: FieldKind,
}

impl FieldMeta {
    /// Whether the field stores a scaled or offset physical quantity.
    pub fn is_scaled(&self) -> bool {
        self.scale > 1.0 || self.offset != 0.0
    }
}

/// Lookup of message and field metadata by number.
pub trait Profile {
    /// Name of a global message.
    fn message_name(&self, global: u16) -> Option<&'static str>;

    /// Metadata of a field in a global message.
    fn field(&self, global: u16, number: u8) -> Option<FieldMeta>;

    /// Number of a global message by name.
    fn message_number(&self, name: &str) -> Option<u16>;

    /// Number of a field in a global message by name.
    fn field_number(&self, global: u16, name: &str) -> Option<u8>;
}

/// A built-in catalog of common activity file messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicProfile;

struct MessageMeta {
    number: u16,
    name: &'static str,
    fields: &'static [FieldMeta],
}

const fn plain(number: u8, name: &'static str) -> FieldMeta {
    scaled(number, name, 1.0, 0.0, "")
}

const fn scaled(number: u8, name: &'static str, scale: f64, offset: f64, units: &'static str) -> FieldMeta {
    FieldMeta {
        number,
        name,
        scale,
        offset,
        units,
        kind: FieldKind::Plain,
    }
}

const fn time(number: u8, name: &'static str) -> FieldMeta {
    FieldMeta {
        kind: FieldKind::DateTime,
        units: "s",
        ..plain(number, name)
    }
}

const fn duration(number: u8, name: &'static str, scale: f64) -> FieldMeta {
    FieldMeta {
        kind: FieldKind::Duration,
        ..scaled(number, name, scale, 0.0, "s")
    }
}

const fn angle(number: u8, name: &'static str) -> FieldMeta {
    FieldMeta {
        kind: FieldKind::Semicircles,
        units: "semicircles",
        ..plain(number, name)
    }
}

const MESSAGES: &[MessageMeta] = &[
    MessageMeta {
        number: mesg::FILE_ID,
        name: "file_id",
        fields: &[
            plain(0, "type"),
            plain(1, "manufacturer"),
            plain(2, "product"),
            plain(3, "serial_number"),
            time(4, "time_created"),
            plain(5, "number"),
            plain(8, "product_name"),
        ],
    },
    MessageMeta {
        number: mesg::SPORT,
        name: "sport",
        fields: &[plain(0, "sport"), plain(1, "sub_sport"), plain(3, "name")],
    },
    MessageMeta {
        number: mesg::SESSION,
        name: "session",
        fields: &[
            time(253, "timestamp"),
            plain(254, "message_index"),
            plain(0, "event"),
            plain(1, "event_type"),
            time(2, "start_time"),
            angle(3, "start_position_lat"),
            angle(4, "start_position_long"),
            plain(5, "sport"),
            plain(6, "sub_sport"),
            duration(7, "total_elapsed_time", 1000.0),
            duration(8, "total_timer_time", 1000.0),
            scaled(9, "total_distance", 100.0, 0.0, "m"),
            plain(10, "total_cycles"),
            scaled(11, "total_calories", 1.0, 0.0, "kcal"),
            scaled(14, "avg_speed", 1000.0, 0.0, "m/s"),
            scaled(15, "max_speed", 1000.0, 0.0, "m/s"),
            scaled(16, "avg_heart_rate", 1.0, 0.0, "bpm"),
            scaled(17, "max_heart_rate", 1.0, 0.0, "bpm"),
            plain(18, "avg_cadence"),
            plain(19, "max_cadence"),
            scaled(22, "total_ascent", 1.0, 0.0, "m"),
            scaled(23, "total_descent", 1.0, 0.0, "m"),
            plain(25, "first_lap_index"),
            plain(26, "num_laps"),
            angle(29, "nec_lat"),
            angle(30, "nec_long"),
            angle(31, "swc_lat"),
            angle(32, "swc_long"),
            angle(38, "end_position_lat"),
            angle(39, "end_position_long"),
        ],
    },
    MessageMeta {
        number: mesg::LAP,
        name: "lap",
        fields: &[
            time(253, "timestamp"),
            plain(254, "message_index"),
            plain(0, "event"),
            plain(1, "event_type"),
            time(2, "start_time"),
            angle(3, "start_position_lat"),
            angle(4, "start_position_long"),
            angle(5, "end_position_lat"),
            angle(6, "end_position_long"),
            duration(7, "total_elapsed_time", 1000.0),
            duration(8, "total_timer_time", 1000.0),
            scaled(9, "total_distance", 100.0, 0.0, "m"),
            scaled(11, "total_calories", 1.0, 0.0, "kcal"),
            scaled(13, "avg_speed", 1000.0, 0.0, "m/s"),
            scaled(14, "max_speed", 1000.0, 0.0, "m/s"),
            scaled(15, "avg_heart_rate", 1.0, 0.0, "bpm"),
            scaled(16, "max_heart_rate", 1.0, 0.0, "bpm"),
        ],
    },
    MessageMeta {
        number: mesg::RECORD,
        name: "record",
        fields: &[
            time(253, "timestamp"),
            angle(0, "position_lat"),
            angle(1, "position_long"),
            scaled(2, "altitude", 5.0, 500.0, "m"),
            scaled(3, "heart_rate", 1.0, 0.0, "bpm"),
            scaled(4, "cadence", 1.0, 0.0, "rpm"),
            scaled(5, "distance", 100.0, 0.0, "m"),
            scaled(6, "speed", 1000.0, 0.0, "m/s"),
            scaled(7, "power", 1.0, 0.0, "watts"),
            scaled(13, "temperature", 1.0, 0.0, "C"),
            scaled(73, "enhanced_speed", 1000.0, 0.0, "m/s"),
            scaled(78, "enhanced_altitude", 5.0, 500.0, "m"),
        ],
    },
    MessageMeta {
        number: mesg::EVENT,
        name: "event",
        fields: &[
            time(253, "timestamp"),
            plain(0, "event"),
            plain(1, "event_type"),
            plain(3, "data"),
            plain(4, "event_group"),
        ],
    },
    MessageMeta {
        number: mesg::DEVICE_INFO,
        name: "device_info",
        fields: &[
            time(253, "timestamp"),
            plain(0, "device_index"),
            plain(1, "device_type"),
            plain(2, "manufacturer"),
            plain(3, "serial_number"),
            plain(4, "product"),
            scaled(5, "software_version", 100.0, 0.0, ""),
            scaled(10, "battery_voltage", 256.0, 0.0, "V"),
            plain(27, "product_name"),
        ],
    },
    MessageMeta {
        number: mesg::ACTIVITY,
        name: "activity",
        fields: &[
            time(253, "timestamp"),
            duration(0, "total_timer_time", 1000.0),
            plain(1, "num_sessions"),
            plain(2, "type"),
            plain(3, "event"),
            plain(4, "event_type"),
            time(5, "local_timestamp"),
        ],
    },
    MessageMeta {
        number: mesg::FILE_CREATOR,
        name: "file_creator",
        fields: &[plain(0, "software_version"), plain(1, "hardware_version")],
    },
    MessageMeta {
        number: mesg::FIELD_DESCRIPTION,
        name: "field_description",
        fields: &[
            plain(0, "developer_data_index"),
            plain(1, "field_definition_number"),
            plain(2, "fit_base_type_id"),
            plain(3, "field_name"),
            plain(6, "scale"),
            plain(7, "offset"),
            plain(8, "units"),
            plain(14, "native_mesg_num"),
            plain(15, "native_field_num"),
        ],
    },
    MessageMeta {
        number: mesg::DEVELOPER_DATA_ID,
        name: "developer_data_id",
        fields: &[
            plain(0, "developer_id"),
            plain(1, "application_id"),
            plain(2, "manufacturer_id"),
            plain(3, "developer_data_index"),
            plain(4, "application_version"),
        ],
    },
];

fn message(global: u16) -> Option<&'static MessageMeta> {
    MESSAGES.iter().find(|m| m.number == global)
}

impl Profile for BasicProfile {
    fn message_name(&self, global: u16) -> Option<&'static str> {
        message(global).map(|m| m.name)
    }

    fn field(&self, global: u16, number: u8) -> Option<FieldMeta> {
        message(global)?
            .fields
            .iter()
            .find(|f| f.number == number)
            .copied()
    }

    fn message_number(&self, name: &str) -> Option<u16> {
        MESSAGES.iter().find(|m| m.name == name).map(|m| m.number)
    }

    fn field_number(&self, global: u16, name: &str) -> Option<u8> {
        message(global)?
            .fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.number)
    }
}
