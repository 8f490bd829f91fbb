#![allow(dead_code)]

use chainring::sans::{check::compute_crc, codec::Architecture};

pub const ENUM: u8 = 0x00;
pub const SINT8: u8 = 0x01;
pub const UINT8: u8 = 0x02;
pub const UINT16: u8 = 0x84;
pub const SINT32: u8 = 0x85;
pub const UINT32: u8 = 0x86;
pub const STRING: u8 = 0x07;

/// Assembles documents record by record.
pub struct FitBuilder {
    header_size: u8,
    records: Vec<u8>,
}

impl FitBuilder {
    pub fn new() -> Self {
        Self {
            header_size: 14,
            records: Vec::new(),
        }
    }

    pub fn with_header_size(mut self, header_size: u8) -> Self {
        self.header_size = header_size;
        self
    }

    /// Document offset at which the next record starts.
    pub fn offset(&self) -> usize {
        self.header_size as usize + self.records.len()
    }

    pub fn definition(
        &mut self,
        local: u8,
        global: u16,
        arch: Architecture,
        fields: &[(u8, u8, u8)],
    ) -> &mut Self {
        self.define(local, global, arch, fields, None)
    }

    pub fn developer_definition(
        &mut self,
        local: u8,
        global: u16,
        arch: Architecture,
        fields: &[(u8, u8, u8)],
        developer: &[(u8, u8, u8)],
    ) -> &mut Self {
        self.define(local, global, arch, fields, Some(developer))
    }

    fn define(
        &mut self,
        local: u8,
        global: u16,
        arch: Architecture,
        fields: &[(u8, u8, u8)],
        developer: Option<&[(u8, u8, u8)]>,
    ) -> &mut Self {
        let header = 0x40 | local | if developer.is_some() { 0x20 } else { 0 };
        self.records.extend([header, 0, arch.raw()]);
        self.records.extend(match arch {
            Architecture::Little => global.to_le_bytes(),
            Architecture::Big => global.to_be_bytes(),
        });

        self.records.push(fields.len() as u8);
        for (number, size, base_type) in fields {
            self.records.extend([*number, *size, *base_type]);
        }

        if let Some(developer) = developer {
            self.records.push(developer.len() as u8);
            for (number, size, index) in developer {
                self.records.extend([*number, *size, *index]);
            }
        }

        self
    }

    pub fn data(&mut self, local: u8, payload: &[u8]) -> &mut Self {
        self.records.push(local & 0x0F);
        self.records.extend_from_slice(payload);
        self
    }

    pub fn compressed(&mut self, local: u8, time_offset: u8, payload: &[u8]) -> &mut Self {
        self.records.push(0x80 | (local & 0x03) << 5 | (time_offset & 0x1F));
        self.records.extend_from_slice(payload);
        self
    }

    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.records.extend_from_slice(bytes);
        self
    }

    /// The finished document, with header and trailing checksum.
    pub fn build(&self) -> Vec<u8> {
        let mut document = vec![self.header_size, 0x20];
        document.extend(2132u16.to_le_bytes());
        document.extend((self.records.len() as u32).to_le_bytes());
        document.extend(b".FIT");

        if self.header_size == 14 {
            let crc = compute_crc(0, &document);
            document.extend(crc.to_le_bytes());
        }

        document.extend_from_slice(&self.records);

        let crc = compute_crc(0, &document);
        document.extend(crc.to_le_bytes());
        document
    }
}

/// A null-padded string field.
pub fn string(value: &str, size: usize) -> Vec<u8> {
    let mut bytes = value.as_bytes().to_vec();
    bytes.resize(size, 0);
    bytes
}

/// A field description payload for the layout of [`describe`].
pub fn description(
    index: u8,
    number: u8,
    base_type: u8,
    name: &str,
    scale: u8,
    units: &str,
    owner: u16,
) -> Vec<u8> {
    let mut payload = vec![index, number, base_type];
    payload.extend(string(name, 16));
    payload.extend([scale, 0]);
    payload.extend(string(units, 8));
    payload.extend(owner.to_le_bytes());
    payload
}

/// Define local message `local` as a little-endian field description.
pub fn describe(builder: &mut FitBuilder, local: u8) {
    builder.definition(
        local,
        206,
        Architecture::Little,
        &[
            (0, 1, UINT8),
            (1, 1, UINT8),
            (2, 1, UINT8),
            (3, 16, STRING),
            (6, 1, UINT8),
            (7, 1, SINT8),
            (8, 8, STRING),
            (14, 2, UINT16),
        ],
    );
}

/// Little-endian `record` messages with position and distance.
pub fn records(builder: &mut FitBuilder, local: u8, points: &[(i32, i32, u32)]) {
    builder.definition(
        local,
        20,
        Architecture::Little,
        &[(0, 4, SINT32), (1, 4, SINT32), (5, 4, UINT32)],
    );

    for (lat, lon, distance) in points {
        let mut payload = lat.to_le_bytes().to_vec();
        payload.extend(lon.to_le_bytes());
        payload.extend(distance.to_le_bytes());
        builder.data(local, &payload);
    }
}
