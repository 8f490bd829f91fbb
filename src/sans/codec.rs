//! Endianness-aware cursors over document bytes.
//!
//! Every read and write advances the cursor past the bytes it touched, so
//! consecutive fields can be visited in declared order without recomputing
//! offsets. Multi-byte accesses take the byte order of the enclosing
//! definition record.

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::data::{self, BaseType, Value};

/// Byte order of multi-byte values in a definition record's data records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Architecture {
    #[default]
    Little,
    Big,
}

impl Architecture {
    /// Decode the architecture byte of a definition record: 0 is
    /// little-endian, anything else big-endian.
    pub fn from_raw(raw: u8) -> Self {
        if raw == 0 { Self::Little } else { Self::Big }
    }

    pub fn raw(&self) -> u8 {
        match self {
            Self::Little => 0,
            Self::Big => 1,
        }
    }
}

/// An access past the end of the document.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("Access of {len} bytes at offset {offset} exceeds the document ({size} bytes).")]
pub struct OutOfBounds {
    pub offset: usize,
    pub len: usize,
    pub size: usize,
}

fn span(offset: usize, len: usize, size: usize) -> Result<core::ops::Range<usize>, OutOfBounds> {
    match offset.checked_add(len) {
        Some(end) if end <= size => Ok(offset..end),
        _ => Err(OutOfBounds { offset, len, size }),
    }
}

macro_rules! read_primitive {
    ($($name:ident: $t:ty),* $(,)?) => {$(
        #[doc = concat!("Read a `", stringify!($t), "` in the given byte order.")]
        pub fn $name(&mut self, arch: Architecture) -> Result<$t, OutOfBounds> {
            let r = self.take::<{ size_of::<$t>() }>()?;
            Ok(match arch {
                Architecture::Little => <$t>::from_le_bytes(r),
                Architecture::Big => <$t>::from_be_bytes(r),
            })
        }
    )*};
}

macro_rules! write_primitive {
    ($($name:ident: $t:ty),* $(,)?) => {$(
        #[doc = concat!("Write a `", stringify!($t), "` in the given byte order.")]
        pub fn $name(&mut self, value: $t, arch: Architecture) -> Result<(), OutOfBounds> {
            let r = match arch {
                Architecture::Little => value.to_le_bytes(),
                Architecture::Big => value.to_be_bytes(),
            };
            self.bytes(&r)
        }
    )*};
}

/// A read cursor.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    pub fn new(bytes: &'a [u8], offset: usize) -> Self {
        Self { bytes, offset }
    }

    /// Current position of the cursor.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Advance the cursor without reading.
    pub fn skip(&mut self, len: usize) -> Result<(), OutOfBounds> {
        let range = span(self.offset, len, self.bytes.len())?;
        self.offset = range.end;
        Ok(())
    }

    /// Take a number of bytes from the cursor.
    pub fn bytes(&mut self, len: usize) -> Result<&'a [u8], OutOfBounds> {
        let bytes = self.bytes;
        let range = span(self.offset, len, bytes.len())?;
        self.offset = range.end;
        Ok(&bytes[range])
    }

    /// Take an exact number of bytes from the cursor.
    pub fn take<const N: usize>(&mut self) -> Result<[u8; N], OutOfBounds> {
        let mut buf = [0; N];
        buf.copy_from_slice(self.bytes(N)?);
        Ok(buf)
    }

    pub fn u8(&mut self) -> Result<u8, OutOfBounds> {
        Ok(self.take::<1>()?[0])
    }

    pub fn i8(&mut self) -> Result<i8, OutOfBounds> {
        Ok(self.u8()? as i8)
    }

    read_primitive! {
        u16: u16,
        i16: i16,
        u32: u32,
        i32: i32,
        u64: u64,
        i64: i64,
        f32: f32,
        f64: f64,
    }

    /// Read a fixed-length string, truncated at its first null byte.
    /// Invalid UTF-8 sequences are replaced.
    pub fn string(&mut self, len: usize) -> Result<String, OutOfBounds> {
        let bytes = self.bytes(len)?;
        let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
        Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }

    /// Read a device timestamp as a calendar time.
    pub fn date_time(&mut self, arch: Architecture) -> Result<Option<DateTime<Utc>>, OutOfBounds> {
        Ok(data::date_time(self.u32(arch)?))
    }

    /// Read a field of a base type and size.
    pub fn value(
        &mut self,
        base_type: BaseType,
        size: usize,
        arch: Architecture,
    ) -> Result<Value, OutOfBounds> {
        let width = base_type.width();

        match base_type {
            BaseType::String => Ok(Value::Str(self.string(size)?)),
            BaseType::Byte if size != 1 => Ok(Value::Bytes(self.bytes(size)?.to_vec())),
            _ if size == width => self.scalar(base_type, arch),
            _ if size != 0 && size % width == 0 => {
                let items = (0..size / width)
                    .map(|_| self.scalar(base_type, arch))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::Array(items))
            }
            _ => Ok(Value::Bytes(self.bytes(size)?.to_vec())),
        }
    }

    fn scalar(&mut self, base_type: BaseType, arch: Architecture) -> Result<Value, OutOfBounds> {
        Ok(match base_type {
            BaseType::Enum | BaseType::UInt8 | BaseType::UInt8Z | BaseType::Byte => {
                Value::U8(self.u8()?)
            }
            BaseType::SInt8 => Value::I8(self.i8()?),
            BaseType::SInt16 => Value::I16(self.i16(arch)?),
            BaseType::UInt16 | BaseType::UInt16Z => Value::U16(self.u16(arch)?),
            BaseType::SInt32 => Value::I32(self.i32(arch)?),
            BaseType::UInt32 | BaseType::UInt32Z => Value::U32(self.u32(arch)?),
            BaseType::SInt64 => Value::I64(self.i64(arch)?),
            BaseType::UInt64 | BaseType::UInt64Z => Value::U64(self.u64(arch)?),
            BaseType::Float32 => Value::F32(self.f32(arch)?),
            BaseType::Float64 => Value::F64(self.f64(arch)?),
            BaseType::String => Value::Str(self.string(1)?),
        })
    }
}

/// A write cursor. Writes never validate field widths: writing a value wider
/// than the field it targets overwrites the following bytes.
#[derive(Debug)]
pub struct Writer<'a> {
    bytes: &'a mut [u8],
    offset: usize,
}

impl<'a> Writer<'a> {
    pub fn new(bytes: &'a mut [u8], offset: usize) -> Self {
        Self { bytes, offset }
    }

    /// Current position of the cursor.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Copy bytes verbatim to the cursor.
    pub fn bytes(&mut self, r: &[u8]) -> Result<(), OutOfBounds> {
        let range = span(self.offset, r.len(), self.bytes.len())?;
        self.offset = range.end;
        self.bytes[range].copy_from_slice(r);
        Ok(())
    }

    pub fn u8(&mut self, value: u8) -> Result<(), OutOfBounds> {
        self.bytes(&[value])
    }

    pub fn i8(&mut self, value: i8) -> Result<(), OutOfBounds> {
        self.u8(value as u8)
    }

    write_primitive! {
        u16: u16,
        i16: i16,
        u32: u32,
        i32: i32,
        u64: u64,
        i64: i64,
    }

    /// Write a string into a field of `len` bytes, truncating it and padding
    /// the remainder with null bytes.
    pub fn string(&mut self, value: &str, len: usize) -> Result<(), OutOfBounds> {
        let mut field = vec![0; len];
        let n = value.len().min(len);
        field[..n].copy_from_slice(&value.as_bytes()[..n]);
        self.bytes(&field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARCHES: [Architecture; 2] = [Architecture::Little, Architecture::Big];

    #[test]
    fn write_then_read_every_width() {
        for arch in ARCHES {
            let mut buf = [0u8; 32];

            let mut w = Writer::new(&mut buf, 1);
            w.u8(0xAB).unwrap();
            w.u16(0xBEEF, arch).unwrap();
            w.i16(-1234, arch).unwrap();
            w.u32(0xDEAD_BEEF, arch).unwrap();
            w.i32(-5_000_000, arch).unwrap();
            w.u64(0x0102_0304_0506_0708, arch).unwrap();
            w.i64(-42, arch).unwrap();
            assert_eq!(w.offset(), 1 + 1 + 2 + 2 + 4 + 4 + 8 + 8);

            let mut r = Reader::new(&buf, 1);
            assert_eq!(r.u8().unwrap(), 0xAB);
            assert_eq!(r.u16(arch).unwrap(), 0xBEEF);
            assert_eq!(r.i16(arch).unwrap(), -1234);
            assert_eq!(r.u32(arch).unwrap(), 0xDEAD_BEEF);
            assert_eq!(r.i32(arch).unwrap(), -5_000_000);
            assert_eq!(r.u64(arch).unwrap(), 0x0102_0304_0506_0708);
            assert_eq!(r.i64(arch).unwrap(), -42);
        }
    }

    #[test]
    fn byte_order_follows_architecture() {
        let buf = [0x01, 0x02];
        assert_eq!(Reader::new(&buf, 0).u16(Architecture::Little).unwrap(), 0x0201);
        assert_eq!(Reader::new(&buf, 0).u16(Architecture::Big).unwrap(), 0x0102);
    }

    #[test]
    fn rejects_access_past_end() {
        let mut buf = [0u8; 3];
        let err = Reader::new(&buf, 2).u16(Architecture::Little).unwrap_err();
        assert_eq!(err, OutOfBounds { offset: 2, len: 2, size: 3 });
        assert!(Writer::new(&mut buf, 0).u32(1, Architecture::Big).is_err());
        assert_eq!(buf, [0, 0, 0]);
    }

    #[test]
    fn strings_truncate_at_null() {
        let buf = *b"Ride\0junk";
        assert_eq!(Reader::new(&buf, 0).string(9).unwrap(), "Ride");

        let mut out = [0xFFu8; 6];
        Writer::new(&mut out, 0).string("Run", 6).unwrap();
        assert_eq!(&out, b"Run\0\0\0");
    }

    #[test]
    fn values_by_base_type() {
        let buf = [0x10, 0x00, 0x20, 0x00, 0xFF, 0xFF];
        let arch = Architecture::Little;

        let array = Reader::new(&buf, 0).value(BaseType::UInt16, 4, arch).unwrap();
        assert_eq!(array, Value::Array(vec![Value::U16(0x10), Value::U16(0x20)]));

        let invalid = Reader::new(&buf, 4).value(BaseType::UInt16, 2, arch).unwrap();
        assert!(invalid.is_invalid(BaseType::UInt16));

        let odd = Reader::new(&buf, 0).value(BaseType::UInt32, 3, arch).unwrap();
        assert_eq!(odd, Value::Bytes(vec![0x10, 0x00, 0x20]));
    }
}
