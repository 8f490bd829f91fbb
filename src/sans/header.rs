//! Document and record headers.

use tartan_bitfield::bitfield;
use thiserror::Error;
use zerocopy::FromBytes;

/// Marker found at bytes 8 to 11 of every document.
pub const MAGIC: &[u8; 4] = b".FIT";

/// An error decoding a document header.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HeaderError {
    /// Incorrect filetype marker.
    #[error("Incorrect file type marker.")]
    NotFitData,
    /// Unknown header length.
    #[error("Unknown header length ({0}).")]
    UnknownHeaderLength(u8),
    /// Fewer bytes than a header requires.
    #[error("Document too short for a header ({found} bytes).")]
    Truncated { found: usize },
}

#[repr(C, packed)]
#[derive(FromBytes)]
struct FileHeader {
    header_size: u8,
    protocol_version: u8,
    profile_version: [u8; 2],
    data_size: [u8; 4],
    data_type: [u8; 4],
}

/// The fixed document header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Header length in bytes, 12 or 14.
    pub header_size: u8,
    pub protocol_version: u8,
    pub profile_version: u16,
    /// Length of the record section in bytes.
    pub data_size: u32,
    /// Header checksum stored by 14-byte headers. Never validated.
    pub header_crc: Option<u16>,
}

impl Header {
    /// Decode a header from the start of a document.
    pub fn parse(r: &[u8]) -> Result<Self, HeaderError> {
        let Some(fixed) = r.first_chunk::<12>() else {
            Err(HeaderError::Truncated { found: r.len() })?
        };

        let FileHeader {
            header_size,
            protocol_version,
            profile_version,
            data_size,
            data_type,
        } = zerocopy::transmute!(*fixed);

        let header_crc = match header_size {
            12 => None,
            14 => {
                let Some(crc) = r.get(12..14) else {
                    Err(HeaderError::Truncated { found: r.len() })?
                };
                Some(u16::from_le_bytes([crc[0], crc[1]]))
            }
            _ => Err(HeaderError::UnknownHeaderLength(header_size))?,
        };

        if &data_type != MAGIC {
            Err(HeaderError::NotFitData)?;
        }

        Ok(Self {
            header_size,
            protocol_version,
            profile_version: u16::from_le_bytes(profile_version),
            data_size: u32::from_le_bytes(data_size),
            header_crc,
        })
    }

    /// Offset of the first record.
    pub fn data_start(&self) -> usize {
        self.header_size as usize
    }

    /// Offset one past the last record byte.
    pub fn data_end(&self) -> usize {
        self.data_start() + self.data_size as usize
    }
}

bitfield! {
    struct RecordHeaderBits(u8) {
        [7] is_compressed,
    }
}

bitfield! {
    struct CompressedHeader(u8) {
        [0..5] time_offset: u8,
        [5..7] local_message: u8,
    }
}

bitfield! {
    struct NormalHeader(u8) {
        [0..4] local_message: u8,
        [5] is_developer,
        [6] is_definition,
    }
}

/// The leading type byte of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordHeader {
    /// A definition record for a local message, optionally declaring
    /// developer fields after its standard fields.
    Definition { local: u8, developer: bool },
    /// A data record, with the time offset of compressed timestamp headers.
    Data { local: u8, time_offset: Option<u8> },
}

impl RecordHeader {
    /// Decode a record header byte.
    pub fn parse(r: u8) -> Self {
        if RecordHeaderBits(r).is_compressed() {
            let header = CompressedHeader(r);

            Self::Data {
                local: header.local_message(),
                time_offset: Some(header.time_offset()),
            }
        } else {
            let header = NormalHeader(r);
            let local = header.local_message();

            if header.is_definition() {
                Self::Definition {
                    local,
                    developer: header.is_developer(),
                }
            } else {
                Self::Data {
                    local,
                    time_offset: None,
                }
            }
        }
    }

    pub fn local(&self) -> u8 {
        match *self {
            Self::Definition { local, .. } | Self::Data { local, .. } => local,
        }
    }
}
