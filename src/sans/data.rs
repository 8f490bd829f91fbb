//! Base types, decoded values and the device timestamp epoch.

use core::fmt;

use chrono::{DateTime, Utc};
use zerocopy::{Immutable, KnownLayout, TryFromBytes};

/// Seconds between the Unix epoch and the device epoch (1989-12-31 00:00 UTC).
pub const EPOCH_OFFSET: i64 = 631_065_600;

/// Field number reserved for record timestamps in every message.
pub const TIMESTAMP_FIELD: u8 = 253;

/// A field's base type, from the low five bits of its base type byte.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromBytes, KnownLayout, Immutable)]
pub enum BaseType {
    Enum = 0x00,
    SInt8 = 0x01,
    UInt8 = 0x02,
    SInt16 = 0x03,
    UInt16 = 0x04,
    SInt32 = 0x05,
    UInt32 = 0x06,
    String = 0x07,
    Float32 = 0x08,
    Float64 = 0x09,
    UInt8Z = 0x0A,
    UInt16Z = 0x0B,
    UInt32Z = 0x0C,
    Byte = 0x0D,
    SInt64 = 0x0E,
    UInt64 = 0x0F,
    UInt64Z = 0x10,
}

impl BaseType {
    /// Bits of the base type byte selecting the base type number.
    pub const NUMBER_MASK: u8 = 0x1F;
    /// Bit of the base type byte marking a multi-byte, endian-capable type.
    pub const ENDIAN_MASK: u8 = 0x80;

    /// Resolve a raw base type byte. Unknown numbers yield `None`.
    pub fn from_raw(raw: u8) -> Option<Self> {
        zerocopy::try_transmute!(raw & Self::NUMBER_MASK).ok()
    }

    /// Size in bytes of a single element.
    pub fn width(&self) -> usize {
        match self {
            Self::Enum | Self::SInt8 | Self::UInt8 | Self::UInt8Z | Self::Byte | Self::String => 1,
            Self::SInt16 | Self::UInt16 | Self::UInt16Z => 2,
            Self::SInt32 | Self::UInt32 | Self::UInt32Z | Self::Float32 => 4,
            Self::Float64 | Self::SInt64 | Self::UInt64 | Self::UInt64Z => 8,
        }
    }

    /// The bit pattern (as a little-endian integer) marking an invalid element.
    pub fn invalid(&self) -> u64 {
        match self {
            Self::Enum | Self::UInt8 | Self::Byte => 0xFF,
            Self::SInt8 => 0x7F,
            Self::SInt16 => 0x7FFF,
            Self::UInt16 => 0xFFFF,
            Self::SInt32 => 0x7FFF_FFFF,
            Self::UInt32 | Self::Float32 => 0xFFFF_FFFF,
            Self::SInt64 => 0x7FFF_FFFF_FFFF_FFFF,
            Self::UInt64 | Self::Float64 => u64::MAX,
            Self::String | Self::UInt8Z | Self::UInt16Z | Self::UInt32Z | Self::UInt64Z => 0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Enum => "enum",
            Self::SInt8 => "sint8",
            Self::UInt8 => "uint8",
            Self::SInt16 => "sint16",
            Self::UInt16 => "uint16",
            Self::SInt32 => "sint32",
            Self::UInt32 => "uint32",
            Self::String => "string",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::UInt8Z => "uint8z",
            Self::UInt16Z => "uint16z",
            Self::UInt32Z => "uint32z",
            Self::Byte => "byte",
            Self::SInt64 => "sint64",
            Self::UInt64 => "uint64",
            Self::UInt64Z => "uint64z",
        }
    }
}

/// A decoded field value.
///
/// Values are returned as stored; use [`Value::is_invalid`] with the field's
/// base type to detect the 'invalid' marker.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
    F32(f32),
    F64(f64),
    /// A string field, truncated at its first null byte.
    Str(String),
    /// A field holding several elements of its base type.
    Array(Vec<Value>),
    /// A field whose size does not fit its base type.
    Bytes(Vec<u8>),
}

impl Value {
    /// The little-endian bit pattern of a scalar value.
    fn bits(&self) -> Option<u64> {
        Some(match *self {
            Self::U8(v) => v as u64,
            Self::I8(v) => v as u8 as u64,
            Self::U16(v) => v as u64,
            Self::I16(v) => v as u16 as u64,
            Self::U32(v) => v as u64,
            Self::I32(v) => v as u32 as u64,
            Self::U64(v) => v,
            Self::I64(v) => v as u64,
            Self::F32(v) => v.to_bits() as u64,
            Self::F64(v) => v.to_bits(),
            Self::Str(_) | Self::Array(_) | Self::Bytes(_) => return None,
        })
    }

    /// Whether the value holds the 'invalid' marker of a base type. Arrays
    /// are invalid only when every element is.
    pub fn is_invalid(&self, base_type: BaseType) -> bool {
        match self {
            Self::Str(s) => s.is_empty(),
            Self::Array(items) => items.iter().all(|v| v.is_invalid(base_type)),
            Self::Bytes(bytes) => bytes.iter().all(|b| *b == 0xFF),
            scalar => scalar.bits() == Some(base_type.invalid()),
        }
    }

    /// Numeric scalar as a float.
    pub fn as_f64(&self) -> Option<f64> {
        Some(match *self {
            Self::U8(v) => v as f64,
            Self::I8(v) => v as f64,
            Self::U16(v) => v as f64,
            Self::I16(v) => v as f64,
            Self::U32(v) => v as f64,
            Self::I32(v) => v as f64,
            Self::U64(v) => v as f64,
            Self::I64(v) => v as f64,
            Self::F32(v) => v as f64,
            Self::F64(v) => v,
            Self::Str(_) | Self::Array(_) | Self::Bytes(_) => return None,
        })
    }

    /// Integer scalar widened to `i64`. Floats and `u64` values above
    /// `i64::MAX` yield `None`.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::U8(v) => Some(v as i64),
            Self::I8(v) => Some(v as i64),
            Self::U16(v) => Some(v as i64),
            Self::I16(v) => Some(v as i64),
            Self::U32(v) => Some(v as i64),
            Self::I32(v) => Some(v as i64),
            Self::U64(v) => i64::try_from(v).ok(),
            Self::I64(v) => Some(v),
            _ => None,
        }
    }

    /// Convert a stored number into a physical quantity: `raw / scale - offset`.
    pub fn physical(&self, scale: f64, offset: f64) -> Option<f64> {
        self.as_f64().map(|raw| raw / scale - offset)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::U8(v) => v.to_string(),
            Self::I8(v) => v.to_string(),
            Self::U16(v) => v.to_string(),
            Self::I16(v) => v.to_string(),
            Self::U32(v) => v.to_string(),
            Self::I32(v) => v.to_string(),
            Self::U64(v) => v.to_string(),
            Self::I64(v) => v.to_string(),
            Self::F32(v) => v.to_string(),
            Self::F64(v) => v.to_string(),
            Self::Str(s) => s.clone(),
            Self::Array(items) => items
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(","),
            Self::Bytes(bytes) => bytes
                .iter()
                .map(|b| format!("{b:02x}"))
                .collect::<Vec<_>>()
                .join(""),
        };

        f.pad(&s)
    }
}

/// Convert a device timestamp into a calendar time. The 'invalid' marker
/// yields `None`.
pub fn date_time(raw: u32) -> Option<DateTime<Utc>> {
    if raw == u32::MAX {
        return None;
    }

    DateTime::from_timestamp(raw as i64 + EPOCH_OFFSET, 0)
}

/// Convert a calendar time into a device timestamp, if representable.
pub fn device_time(time: DateTime<Utc>) -> Option<u32> {
    u32::try_from(time.timestamp() - EPOCH_OFFSET).ok()
}

/// Format a device timestamp as `YYYY-MM-DD HH:MM:SS` in UTC.
pub fn format_date_time(raw: u32) -> String {
    match date_time(raw) {
        Some(t) => t.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => raw.to_string(),
    }
}

/// Format a duration stored as `seconds * scale` as `H:MM:SS` with a
/// fractional part when the scale carries sub-second precision.
pub fn format_duration(raw: u32, scale: f64) -> String {
    let seconds = raw as f64 / scale.max(1.0);
    let whole = seconds.trunc() as u64;
    let (h, m, s) = (whole / 3600, (whole % 3600) / 60, whole % 60);

    if scale > 1.0 {
        let hundredths = ((seconds - whole as f64) * 100.0).round().min(99.0) as u64;
        format!("{h}:{m:02}:{s:02}.{hundredths:02}")
    } else {
        format!("{h}:{m:02}:{s:02}")
    }
}
