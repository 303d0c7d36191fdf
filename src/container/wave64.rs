//! Sony Wave64 container headers.
//!
//! Wave64 lifts the RIFF layout past the 4 GiB limit: chunk tags become
//! 16-byte GUIDs whose first four bytes are the familiar FourCC, sizes become
//! 64-bit and include the 24-byte chunk header itself, and chunks align to
//! 8-byte boundaries. The fmt payload is byte-identical to WAVE's, so its
//! parser is shared.

use super::{wave, ContainerFormat, ReadSeek};
use crate::bytes::Endian;
use crate::error::{Error, Result};
use crate::spec::AudioFileSpec;
use std::io::{Read, Seek, SeekFrom};
use tracing::debug;

const GUID_RIFF: [u8; 16] = [
    0x72, 0x69, 0x66, 0x66, 0x2E, 0x91, 0xCF, 0x11, 0xA5, 0xD6, 0x28, 0xDB, 0x04, 0xC1, 0x00,
    0x00,
];

/// Suffix shared by the wave, fmt, and data chunk GUIDs.
const GUID_SUFFIX: [u8; 12] = [
    0xF3, 0xAC, 0xD3, 0x11, 0x8C, 0xD1, 0x00, 0xC0, 0x4F, 0x8E, 0xDB, 0x8A,
];

fn tagged_guid(fourcc: &[u8; 4]) -> [u8; 16] {
    let mut guid = [0u8; 16];
    guid[..4].copy_from_slice(fourcc);
    guid[4..].copy_from_slice(&GUID_SUFFIX);
    guid
}

/// Chunk header plus GUID tag.
const CHUNK_HEADER_LEN: u64 = 24;

/// Registry entry for this container.
pub fn format() -> ContainerFormat {
    ContainerFormat::new("wave64", "w64", probe).with_reader(read_header)
}

fn probe(prefix: &[u8]) -> bool {
    prefix.len() >= 16 && prefix[0..16] == GUID_RIFF
}

fn read_header(reader: &mut dyn ReadSeek) -> Result<(AudioFileSpec, Endian)> {
    let mut guid = [0u8; 16];
    reader.read_exact(&mut guid)?;
    if guid != GUID_RIFF {
        return Err(Error::encoding("missing riff GUID"));
    }
    let _total_size = Endian::Little.read_u64(reader)?;
    reader.read_exact(&mut guid)?;
    if guid != tagged_guid(b"wave") {
        return Err(Error::encoding("riff form is not wave"));
    }

    let guid_fmt = tagged_guid(b"fmt ");
    let guid_data = tagged_guid(b"data");

    let mut fmt: Option<wave::FmtInfo> = None;
    let mut data: Option<(u64, u64)> = None;

    loop {
        let chunk_start = reader.stream_position()?;
        match reader.read_exact(&mut guid) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        }
        let size = match Endian::Little.read_u64(reader) {
            Ok(s) => s,
            Err(e) if e.is_eof() => break,
            Err(e) => return Err(e),
        };
        if size < CHUNK_HEADER_LEN {
            return Err(Error::encoding("chunk size smaller than its header"));
        }
        let payload_len = size - CHUNK_HEADER_LEN;

        if guid == guid_fmt {
            fmt = Some(wave::parse_fmt(reader, payload_len)?);
        } else if guid == guid_data {
            data = Some((chunk_start + CHUNK_HEADER_LEN, payload_len));
        } else {
            debug!(
                chunk = %String::from_utf8_lossy(&guid[..4]),
                payload_len,
                "skipping chunk"
            );
        }
        if fmt.is_some() && data.is_some() {
            break;
        }
        // Chunks start on 8-byte boundaries.
        let aligned = (size + 7) & !7;
        reader.seek(SeekFrom::Start(chunk_start + aligned))?;
    }

    let fmt = fmt.ok_or(Error::MissingChunk("fmt "))?;
    let (data_pos, data_len) = data.ok_or(Error::MissingChunk("data"))?;

    let mut spec = AudioFileSpec::new(
        fmt.sample_format,
        u32::from(fmt.num_channels),
        f64::from(fmt.sample_rate),
        data_len / u64::from(fmt.block_align),
    );
    spec.container = Some("wave64".to_string());

    reader.seek(SeekFrom::Start(data_pos))?;
    Ok((spec, Endian::Little))
}
