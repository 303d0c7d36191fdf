//! IRCAM / BICSF sound file headers.
//!
//! The magic word both identifies the container and selects the byte order
//! of every following field. After the fixed preamble comes a sequence of
//! tagged extension records ended by a zero tag; sample data follows the
//! terminator.

use super::{ContainerFormat, ReadSeek};
use crate::bytes::Endian;
use crate::error::{Error, Result};
use crate::sample::SampleFormat;
use crate::spec::AudioFileSpec;
use std::io::{Read, Seek, SeekFrom};
use tracing::debug;

/// Magic words, read big-endian, one per machine variant.
const MAGIC_VAX: u32 = 0x64A3_0100;
const MAGIC_SUN: u32 = 0x64A3_0200;
const MAGIC_MIPS: u32 = 0x64A3_0300;
const MAGIC_NEXT: u32 = 0x64A3_0400;

const END_RECORD: u32 = 0;

/// Registry entry for this container.
pub fn format() -> ContainerFormat {
    ContainerFormat::new("ircam", "sf", probe).with_reader(read_header)
}

fn probe(prefix: &[u8]) -> bool {
    if prefix.len() < 4 {
        return false;
    }
    let magic = u32::from_be_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]);
    matches!(magic, MAGIC_VAX | MAGIC_SUN | MAGIC_MIPS | MAGIC_NEXT)
}

fn read_header(reader: &mut dyn ReadSeek) -> Result<(AudioFileSpec, Endian)> {
    let mut magic_bytes = [0u8; 4];
    reader.read_exact(&mut magic_bytes)?;
    let endian = match u32::from_be_bytes(magic_bytes) {
        MAGIC_VAX | MAGIC_MIPS => Endian::Little,
        MAGIC_SUN | MAGIC_NEXT => Endian::Big,
        _ => return Err(Error::encoding("unrecognized magic word")),
    };

    let sample_rate = endian.read_f32(reader)?;
    let num_channels = endian.read_u32(reader)?;
    if num_channels == 0 {
        return Err(Error::encoding("header declares zero channels"));
    }
    let code = endian.read_u32(reader)?;
    let sample_format = match code {
        1 => SampleFormat::Int8,
        2 => SampleFormat::Int16,
        3 => SampleFormat::Int24,
        0x4_0004 => SampleFormat::Int32,
        4 => SampleFormat::Float32,
        8 => SampleFormat::Float64,
        other => return Err(Error::encoding(format!("unknown sample code 0x{other:X}"))),
    };

    // Extension records: tag, byte length, payload. A zero tag ends the
    // header; truncation before it is a malformed file.
    loop {
        let tag = match endian.read_u32(reader) {
            Ok(t) => t,
            Err(e) if e.is_eof() => return Err(Error::MissingChunk("END")),
            Err(e) => return Err(e),
        };
        let size = match endian.read_u32(reader) {
            Ok(s) => s,
            Err(e) if e.is_eof() => return Err(Error::MissingChunk("END")),
            Err(e) => return Err(e),
        };
        if tag == END_RECORD {
            break;
        }
        debug!(tag, size, "skipping extension record");
        reader.seek(SeekFrom::Current(i64::from(size)))?;
    }

    let data_pos = reader.stream_position()?;
    let end = reader.seek(SeekFrom::End(0))?;
    let data_len = end.saturating_sub(data_pos);

    let mut spec = AudioFileSpec::new(sample_format, num_channels, f64::from(sample_rate), 0);
    spec.container = Some("ircam".to_string());
    spec.num_frames = data_len / spec.frame_size() as u64;

    reader.seek(SeekFrom::Start(data_pos))?;
    Ok((spec, endian))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn synth_ircam(
        magic: u32,
        endian: Endian,
        rate: f32,
        channels: u32,
        code: u32,
        records: &[(u32, &[u8])],
        data: &[u8],
    ) -> Vec<u8> {
        let word = |v: u32| -> [u8; 4] {
            if endian.is_big() {
                v.to_be_bytes()
            } else {
                v.to_le_bytes()
            }
        };
        let mut file = magic.to_be_bytes().to_vec();
        file.extend_from_slice(&word(rate.to_bits()));
        file.extend_from_slice(&word(channels));
        file.extend_from_slice(&word(code));
        for (tag, payload) in records {
            file.extend_from_slice(&word(*tag));
            file.extend_from_slice(&word(payload.len() as u32));
            file.extend_from_slice(payload);
        }
        file.extend_from_slice(&word(END_RECORD));
        file.extend_from_slice(&word(0));
        file.extend_from_slice(data);
        file
    }

    #[test]
    fn test_parse_big_endian_variant() {
        let file = synth_ircam(MAGIC_SUN, Endian::Big, 44100.0, 2, 2, &[], &[0u8; 16]);
        let mut cursor = Cursor::new(file);
        let (spec, endian) = read_header(&mut cursor).unwrap();
        assert_eq!(spec.sample_format, SampleFormat::Int16);
        assert_eq!(spec.num_channels, 2);
        assert_eq!(spec.sample_rate, 44100.0);
        assert_eq!(spec.num_frames, 4);
        assert_eq!(endian, Endian::Big);
        assert_eq!(cursor.position(), 24);
    }

    #[test]
    fn test_parse_little_endian_variant() {
        let file = synth_ircam(MAGIC_VAX, Endian::Little, 22050.0, 1, 4, &[], &[0u8; 12]);
        let (spec, endian) = read_header(&mut Cursor::new(file)).unwrap();
        assert_eq!(spec.sample_format, SampleFormat::Float32);
        assert_eq!(endian, Endian::Little);
        assert_eq!(spec.num_frames, 3);
    }

    #[test]
    fn test_extension_records_skipped() {
        let file = synth_ircam(
            MAGIC_SUN,
            Endian::Big,
            8000.0,
            1,
            1,
            &[(2, b"comment text"), (3, &[1, 2, 3, 4])],
            &[0u8; 5],
        );
        let (spec, _) = read_header(&mut Cursor::new(file)).unwrap();
        assert_eq!(spec.sample_format, SampleFormat::Int8);
        assert_eq!(spec.num_frames, 5);
    }

    #[test]
    fn test_int32_code() {
        let file = synth_ircam(MAGIC_NEXT, Endian::Big, 48000.0, 1, 0x4_0004, &[], &[0u8; 8]);
        let (spec, _) = read_header(&mut Cursor::new(file)).unwrap();
        assert_eq!(spec.sample_format, SampleFormat::Int32);
        assert_eq!(spec.num_frames, 2);
    }

    #[test]
    fn test_missing_terminator() {
        let mut file = MAGIC_SUN.to_be_bytes().to_vec();
        file.extend_from_slice(&44100.0f32.to_bits().to_be_bytes());
        file.extend_from_slice(&1u32.to_be_bytes());
        file.extend_from_slice(&2u32.to_be_bytes());
        // Header ends without an END record.
        let err = read_header(&mut Cursor::new(file)).unwrap_err();
        assert!(matches!(err, Error::MissingChunk("END")));
    }

    #[test]
    fn test_probe() {
        assert!(probe(&MAGIC_VAX.to_be_bytes()));
        assert!(probe(&MAGIC_NEXT.to_be_bytes()));
        assert!(!probe(&[0x64, 0xA3, 0x05, 0x00]));
        assert!(!probe(b".snd"));
    }
}
