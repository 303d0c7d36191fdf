//! Endian-parameterized read/write primitives shared by the header parsers.

use crate::error::{Error, Result};
use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

/// Byte order of a container's header fields and sample data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endian {
    /// Most significant byte first.
    Big,
    /// Least significant byte first.
    Little,
}

impl Endian {
    /// Check whether this is big-endian.
    pub fn is_big(&self) -> bool {
        matches!(self, Endian::Big)
    }

    /// Read an unsigned 16-bit integer.
    pub fn read_u16<R: Read + ?Sized>(&self, reader: &mut R) -> Result<u16> {
        Ok(match self {
            Endian::Big => reader.read_u16::<BigEndian>()?,
            Endian::Little => reader.read_u16::<LittleEndian>()?,
        })
    }

    /// Read an unsigned 32-bit integer.
    pub fn read_u32<R: Read + ?Sized>(&self, reader: &mut R) -> Result<u32> {
        Ok(match self {
            Endian::Big => reader.read_u32::<BigEndian>()?,
            Endian::Little => reader.read_u32::<LittleEndian>()?,
        })
    }

    /// Read an unsigned 64-bit integer.
    pub fn read_u64<R: Read + ?Sized>(&self, reader: &mut R) -> Result<u64> {
        Ok(match self {
            Endian::Big => reader.read_u64::<BigEndian>()?,
            Endian::Little => reader.read_u64::<LittleEndian>()?,
        })
    }

    /// Read a signed 16-bit integer.
    pub fn read_i16<R: Read + ?Sized>(&self, reader: &mut R) -> Result<i16> {
        Ok(self.read_u16(reader)? as i16)
    }

    /// Read a signed 32-bit integer.
    pub fn read_i32<R: Read + ?Sized>(&self, reader: &mut R) -> Result<i32> {
        Ok(self.read_u32(reader)? as i32)
    }

    /// Read a 32-bit IEEE-754 float.
    pub fn read_f32<R: Read + ?Sized>(&self, reader: &mut R) -> Result<f32> {
        Ok(f32::from_bits(self.read_u32(reader)?))
    }

    /// Read a 64-bit IEEE-754 float.
    pub fn read_f64<R: Read + ?Sized>(&self, reader: &mut R) -> Result<f64> {
        Ok(f64::from_bits(self.read_u64(reader)?))
    }

    /// Write an unsigned 16-bit integer.
    pub fn write_u16<W: Write + ?Sized>(&self, writer: &mut W, value: u16) -> Result<()> {
        match self {
            Endian::Big => writer.write_u16::<BigEndian>(value)?,
            Endian::Little => writer.write_u16::<LittleEndian>(value)?,
        }
        Ok(())
    }

    /// Write an unsigned 32-bit integer.
    pub fn write_u32<W: Write + ?Sized>(&self, writer: &mut W, value: u32) -> Result<()> {
        match self {
            Endian::Big => writer.write_u32::<BigEndian>(value)?,
            Endian::Little => writer.write_u32::<LittleEndian>(value)?,
        }
        Ok(())
    }

    /// Write an unsigned 64-bit integer.
    pub fn write_u64<W: Write + ?Sized>(&self, writer: &mut W, value: u64) -> Result<()> {
        match self {
            Endian::Big => writer.write_u64::<BigEndian>(value)?,
            Endian::Little => writer.write_u64::<LittleEndian>(value)?,
        }
        Ok(())
    }
}

/// Read a null-terminated string of at most `max_len` bytes, consuming the
/// terminator. Stops early at end of input.
pub fn read_cstring<R: Read + ?Sized>(reader: &mut R, max_len: usize) -> Result<String> {
    let mut bytes = Vec::new();
    for _ in 0..max_len {
        let mut byte = [0u8; 1];
        match reader.read_exact(&mut byte) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        }
        if byte[0] == 0 {
            break;
        }
        bytes.push(byte[0]);
    }
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Write a null-terminated string.
pub fn write_cstring<W: Write + ?Sized>(writer: &mut W, s: &str) -> Result<()> {
    writer.write_all(s.as_bytes())?;
    writer.write_all(&[0])?;
    Ok(())
}

/// Write a Pascal-style string (length byte plus data), padded so that the
/// total length is even. Returns the number of bytes written.
pub fn write_pstring<W: Write + ?Sized>(writer: &mut W, s: &str) -> Result<u32> {
    let data = s.as_bytes();
    if data.len() > 255 {
        return Err(Error::InvalidParameter("pascal string too long".into()));
    }
    writer.write_u8(data.len() as u8)?;
    writer.write_all(data)?;
    let mut written = 1 + data.len() as u32;
    if written % 2 != 0 {
        writer.write_all(&[0])?;
        written += 1;
    }
    Ok(written)
}

/// Byte length [`write_pstring`] will produce for `s`.
pub fn pstring_len(s: &str) -> u32 {
    let n = 1 + s.len() as u32;
    (n + 1) & !1
}

/// Read an 80-bit extended-precision float: sign bit, 15-bit exponent biased
/// by 16383, 64-bit mantissa with explicit integer bit.
///
/// value = mantissa × 2^(exponent − 16383 − 63), negated when the sign bit is
/// set. `f64` precision is sufficient for audio sample rates.
pub fn read_f80<R: Read + ?Sized>(reader: &mut R) -> Result<f64> {
    let se = reader.read_u16::<BigEndian>()?;
    let mantissa = reader.read_u64::<BigEndian>()?;

    let negative = se & 0x8000 != 0;
    let exponent = (se & 0x7FFF) as i32;

    if exponent == 0 && mantissa == 0 {
        return Ok(0.0);
    }
    if exponent == 0x7FFF {
        return Err(Error::encoding("extended float is infinity or NaN"));
    }

    let value = mantissa as f64 * 2f64.powi(exponent - 16383 - 63);
    Ok(if negative { -value } else { value })
}

/// Write an 80-bit extended-precision float. Exact for every finite,
/// normalized `f64` input; zero maps to all-zero bytes.
pub fn write_f80<W: Write + ?Sized>(writer: &mut W, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(Error::InvalidParameter("extended float must be finite".into()));
    }
    if value == 0.0 {
        writer.write_all(&[0u8; 10])?;
        return Ok(());
    }

    let bits = value.to_bits();
    let sign = ((bits >> 63) as u16) << 15;
    let exp11 = ((bits >> 52) & 0x7FF) as i32;
    let frac = bits & 0x000F_FFFF_FFFF_FFFF;

    if exp11 == 0 {
        // Subnormal doubles are below any representable sample rate.
        writer.write_all(&[0u8; 10])?;
        return Ok(());
    }

    let exponent = (exp11 - 1023 + 16383) as u16;
    let mantissa = (1u64 << 63) | (frac << 11);

    writer.write_u16::<BigEndian>(sign | exponent)?;
    writer.write_u64::<BigEndian>(mantissa)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_endian_integers() {
        let data = [0x12, 0x34, 0x56, 0x78];
        assert_eq!(Endian::Big.read_u32(&mut Cursor::new(&data)).unwrap(), 0x1234_5678);
        assert_eq!(
            Endian::Little.read_u32(&mut Cursor::new(&data)).unwrap(),
            0x7856_3412
        );

        let mut buf = Vec::new();
        Endian::Big.write_u16(&mut buf, 0xBEEF).unwrap();
        assert_eq!(buf, [0xBE, 0xEF]);
    }

    #[test]
    fn test_f80_known_rates() {
        // Reference encodings taken from real AIFF files.
        let cases: &[([u8; 10], f64)] = &[
            ([0x40, 0x0B, 0xFA, 0x00, 0, 0, 0, 0, 0, 0], 8000.0),
            ([0x40, 0x0E, 0xAC, 0x44, 0, 0, 0, 0, 0, 0], 44100.0),
            ([0x40, 0x0E, 0xBB, 0x80, 0, 0, 0, 0, 0, 0], 48000.0),
            ([0x40, 0x0F, 0xBB, 0x80, 0, 0, 0, 0, 0, 0], 96000.0),
        ];
        for (bytes, expected) in cases {
            let value = read_f80(&mut Cursor::new(bytes.as_slice())).unwrap();
            assert!(
                (value - expected).abs() < 0.001,
                "decoded {} expected {}",
                value,
                expected
            );
        }
    }

    #[test]
    fn test_f80_roundtrip() {
        for rate in [8000.0, 11025.0, 22050.0, 44100.0, 48000.0, 88200.0, 96000.0] {
            let mut buf = Vec::new();
            write_f80(&mut buf, rate).unwrap();
            assert_eq!(buf.len(), 10);
            let back = read_f80(&mut Cursor::new(&buf)).unwrap();
            assert!((back - rate).abs() < 0.001);
        }
    }

    #[test]
    fn test_f80_zero_and_negative() {
        let mut buf = Vec::new();
        write_f80(&mut buf, 0.0).unwrap();
        assert_eq!(buf, [0u8; 10]);
        assert_eq!(read_f80(&mut Cursor::new(&buf)).unwrap(), 0.0);

        let mut buf = Vec::new();
        write_f80(&mut buf, -44100.0).unwrap();
        let back = read_f80(&mut Cursor::new(&buf)).unwrap();
        assert!((back + 44100.0).abs() < 0.001);
    }

    #[test]
    fn test_f80_rejects_infinity() {
        let bytes = [0x7F, 0xFF, 0x80, 0, 0, 0, 0, 0, 0, 0];
        assert!(read_f80(&mut Cursor::new(bytes.as_slice())).is_err());
        assert!(write_f80(&mut Vec::new(), f64::INFINITY).is_err());
    }

    #[test]
    fn test_cstring_roundtrip() {
        let mut buf = Vec::new();
        write_cstring(&mut buf, "hello").unwrap();
        assert_eq!(buf.len(), 6);
        let back = read_cstring(&mut Cursor::new(&buf), 64).unwrap();
        assert_eq!(back, "hello");
    }

    #[test]
    fn test_pstring_even_padding() {
        let mut buf = Vec::new();
        let n = write_pstring(&mut buf, "abc").unwrap();
        assert_eq!(n, 4); // length byte + 3 data bytes, already even
        assert_eq!(pstring_len("abc"), 4);

        let mut buf = Vec::new();
        let n = write_pstring(&mut buf, "abcd").unwrap();
        assert_eq!(n, 6); // padded to even
        assert_eq!(pstring_len("abcd"), 6);
        assert_eq!(buf[5], 0);
    }
}
