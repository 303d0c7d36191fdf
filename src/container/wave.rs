//! WAVE (RIFF) container headers.
//!
//! Reading only; the fmt parser is shared with the Wave64 container, which
//! wraps the same field layout in GUID-tagged chunks.

use super::{read_chunk_header, ContainerFormat, FourCC, ReadSeek};
use crate::bytes::Endian;
use crate::error::{Error, Result};
use crate::sample::SampleFormat;
use crate::spec::AudioFileSpec;
use std::io::{Read, Seek, SeekFrom};
use tracing::debug;

const RIFF: &[u8; 4] = b"RIFF";
const TYPE_WAVE: &[u8; 4] = b"WAVE";
const CHUNK_FMT: FourCC = FourCC(*b"fmt ");
const CHUNK_DATA: FourCC = FourCC(*b"data");

const TAG_PCM: u16 = 0x0001;
const TAG_FLOAT: u16 = 0x0003;
const TAG_EXTENSIBLE: u16 = 0xFFFE;

/// Registry entry for this container.
pub fn format() -> ContainerFormat {
    ContainerFormat::new("wave", "wav", probe).with_reader(read_header)
}

fn probe(prefix: &[u8]) -> bool {
    prefix.len() >= 12 && &prefix[0..4] == RIFF && &prefix[8..12] == TYPE_WAVE
}

/// Resolved fmt chunk contents.
pub(crate) struct FmtInfo {
    pub sample_format: SampleFormat,
    pub num_channels: u16,
    pub sample_rate: u32,
    pub block_align: u16,
}

/// Parse a fmt chunk payload. The caller positions the reader at the payload
/// start and is responsible for skipping past the chunk afterwards; this
/// reads only the fields it interprets.
pub(crate) fn parse_fmt<R: Read + ?Sized>(reader: &mut R, chunk_len: u64) -> Result<FmtInfo> {
    if chunk_len < 16 {
        return Err(Error::encoding("fmt chunk shorter than 16 bytes"));
    }
    let mut tag = Endian::Little.read_u16(reader)?;
    let num_channels = Endian::Little.read_u16(reader)?;
    let sample_rate = Endian::Little.read_u32(reader)?;
    let byte_rate = Endian::Little.read_u32(reader)?;
    let block_align = Endian::Little.read_u16(reader)?;
    let bits_per_sample = Endian::Little.read_u16(reader)?;

    if tag == TAG_EXTENSIBLE {
        if chunk_len < 40 {
            return Err(Error::encoding("extensible fmt chunk shorter than 40 bytes"));
        }
        let ext_size = Endian::Little.read_u16(reader)?;
        if ext_size < 22 {
            return Err(Error::encoding("extensible fmt extension too short"));
        }
        let valid_bits = Endian::Little.read_u16(reader)?;
        if valid_bits != bits_per_sample {
            return Err(Error::unsupported(format!(
                "{valid_bits} valid bits in {bits_per_sample}-bit container"
            )));
        }
        let _channel_mask = Endian::Little.read_u32(reader)?;
        // First two bytes of the sub-format GUID carry the real format tag.
        tag = Endian::Little.read_u16(reader)?;
        if tag != TAG_PCM && tag != TAG_FLOAT {
            return Err(Error::encoding(format!(
                "unsupported extensible sub-format 0x{tag:04X}"
            )));
        }
    }

    if num_channels == 0 {
        return Err(Error::encoding("fmt chunk declares zero channels"));
    }
    if u32::from(bits_per_sample / 8) * u32::from(num_channels) != u32::from(block_align) {
        return Err(Error::encoding("block alignment inconsistent with bit depth"));
    }
    if u64::from(block_align) * u64::from(sample_rate) != u64::from(byte_rate) {
        return Err(Error::encoding("byte rate inconsistent with block alignment"));
    }

    let sample_format = match (tag, bits_per_sample) {
        // Historically 8-bit WAVE data is unsigned; a block alignment equal
        // to the channel count marks the one-byte-per-sample layout.
        (TAG_PCM, 8) if block_align == num_channels => SampleFormat::UInt8,
        (TAG_PCM, 8) => SampleFormat::Int8,
        (TAG_PCM, 16) => SampleFormat::Int16,
        (TAG_PCM, 24) => SampleFormat::Int24,
        (TAG_PCM, 32) => SampleFormat::Int32,
        (TAG_FLOAT, 32) => SampleFormat::Float32,
        (TAG_FLOAT, 64) => SampleFormat::Float64,
        (TAG_PCM, bits) | (TAG_FLOAT, bits) => {
            return Err(Error::encoding(format!("unsupported bit depth {bits}")))
        }
        (other, _) => {
            return Err(Error::encoding(format!("unsupported format tag 0x{other:04X}")))
        }
    };

    Ok(FmtInfo {
        sample_format,
        num_channels,
        sample_rate,
        block_align,
    })
}

fn read_header(reader: &mut dyn ReadSeek) -> Result<(AudioFileSpec, Endian)> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    if &magic != RIFF {
        return Err(Error::encoding("missing RIFF magic"));
    }
    let _riff_len = Endian::Little.read_u32(reader)?;
    let mut riff_type = [0u8; 4];
    reader.read_exact(&mut riff_type)?;
    if &riff_type != TYPE_WAVE {
        return Err(Error::encoding("RIFF type is not WAVE"));
    }

    let mut fmt: Option<FmtInfo> = None;
    let mut data: Option<(u64, u64)> = None;

    while let Some((tag, len)) = read_chunk_header(reader, Endian::Little)? {
        let payload_start = reader.stream_position()?;
        match tag {
            CHUNK_FMT => fmt = Some(parse_fmt(reader, u64::from(len))?),
            CHUNK_DATA => data = Some((payload_start, u64::from(len))),
            other => {
                debug!(chunk = %other, len, "skipping chunk");
            }
        }
        if fmt.is_some() && data.is_some() {
            break;
        }
        let padded = (u64::from(len) + 1) & !1;
        reader.seek(SeekFrom::Start(payload_start + padded))?;
    }

    let fmt = fmt.ok_or(Error::MissingChunk("fmt "))?;
    let (data_pos, data_len) = data.ok_or(Error::MissingChunk("data"))?;

    let mut spec = AudioFileSpec::new(
        fmt.sample_format,
        u32::from(fmt.num_channels),
        f64::from(fmt.sample_rate),
        data_len / u64::from(fmt.block_align),
    );
    spec.container = Some("wave".to_string());

    reader.seek(SeekFrom::Start(data_pos))?;
    Ok((spec, Endian::Little))
}
