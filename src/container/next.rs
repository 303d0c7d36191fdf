//! NeXT / Sun `.snd` headers: a fixed big-endian preamble rather than a
//! chunk list, optionally followed by a free-text annotation.

use super::{ContainerFormat, ReadSeek};
use crate::bytes::{read_cstring, Endian};
use crate::error::{Error, Result};
use crate::sample::SampleFormat;
use crate::spec::AudioFileSpec;
use std::io::{Read, Seek, SeekFrom};
use tracing::debug;

const MAGIC: &[u8; 4] = b".snd";

/// Minimum data offset: the six header fields.
const HEADER_LEN: u32 = 24;

/// Data size value meaning "unknown, read to the end".
const SIZE_UNKNOWN: u32 = 0xFFFF_FFFF;

/// Registry entry for this container.
pub fn format() -> ContainerFormat {
    ContainerFormat::new("next", "au", probe).with_reader(read_header)
}

fn probe(prefix: &[u8]) -> bool {
    prefix.len() >= 4 && &prefix[0..4] == MAGIC
}

fn read_header(reader: &mut dyn ReadSeek) -> Result<(AudioFileSpec, Endian)> {
    let start = reader.stream_position()?;
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(Error::encoding("missing .snd magic"));
    }

    let data_offset = Endian::Big.read_u32(reader)?;
    if data_offset < HEADER_LEN {
        return Err(Error::encoding("data offset overlaps the header"));
    }
    let data_size = Endian::Big.read_u32(reader)?;
    let encoding = Endian::Big.read_u32(reader)?;
    let sample_rate = Endian::Big.read_u32(reader)?;
    let num_channels = Endian::Big.read_u32(reader)?;
    if num_channels == 0 {
        return Err(Error::encoding("header declares zero channels"));
    }

    let sample_format = match encoding {
        2 => SampleFormat::Int8,
        3 => SampleFormat::Int16,
        4 => SampleFormat::Int24,
        5 => SampleFormat::Int32,
        6 => SampleFormat::Float32,
        7 => SampleFormat::Float64,
        1 => return Err(Error::unsupported("mu-law encoding")),
        other => return Err(Error::encoding(format!("unknown encoding code {other}"))),
    };

    let annotation_len = (data_offset - HEADER_LEN) as usize;
    if annotation_len > 0 {
        let annotation = read_cstring(reader, annotation_len)?;
        if !annotation.is_empty() {
            debug!(annotation = %annotation, "sound file annotation");
        }
    }

    let data_pos = start + u64::from(data_offset);
    let data_len = if data_size == SIZE_UNKNOWN {
        let end = reader.seek(SeekFrom::End(0))?;
        end.saturating_sub(data_pos)
    } else {
        u64::from(data_size)
    };

    let mut spec = AudioFileSpec::new(
        sample_format,
        num_channels,
        f64::from(sample_rate),
        0,
    );
    spec.container = Some("next".to_string());
    spec.num_frames = data_len / spec.frame_size() as u64;

    reader.seek(SeekFrom::Start(data_pos))?;
    Ok((spec, Endian::Big))
}
