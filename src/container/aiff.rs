//! AIFF and AIFF-C container headers.
//!
//! The reader walks the FORM chunk list tolerantly: unknown chunks are
//! skipped, chunk order is irrelevant, and odd chunk lengths are padded to
//! even. The writer emits plain AIFF for integer formats and AIFF-C for
//! float formats, since classic AIFF has no float encoding.

use super::{read_chunk_header, ContainerFormat, FourCC, ReadSeek};
use crate::bytes::{pstring_len, read_f80, write_f80, write_pstring, Endian};
use crate::error::{Error, Result};
use crate::sample::SampleFormat;
use crate::spec::AudioFileSpec;
use std::io::{Read, Seek, SeekFrom, Write};
use tracing::debug;

const FORM: &[u8; 4] = b"FORM";
const TYPE_AIFF: &[u8; 4] = b"AIFF";
const TYPE_AIFC: &[u8; 4] = b"AIFC";
const CHUNK_COMM: FourCC = FourCC(*b"COMM");
const CHUNK_SSND: FourCC = FourCC(*b"SSND");
const CHUNK_FVER: FourCC = FourCC(*b"FVER");

/// AIFF-C version timestamp, the only version ever defined.
const AIFC_VERSION: u32 = 0xA280_5140;

/// Registry entry for this container.
pub fn format() -> ContainerFormat {
    ContainerFormat::new("aiff", "aiff", probe)
        .with_reader(read_header)
        .with_writer(write_header)
}

fn probe(prefix: &[u8]) -> bool {
    prefix.len() >= 12
        && &prefix[0..4] == FORM
        && (&prefix[8..12] == TYPE_AIFF || &prefix[8..12] == TYPE_AIFC)
}

/// Fields of a COMM chunk, before the sample format is resolved.
struct CommInfo {
    num_channels: u16,
    bits_per_sample: u16,
    sample_rate: f64,
    /// AIFF-C compression tag; `None` in a plain AIFF file.
    compression: Option<[u8; 4]>,
}

fn read_header(reader: &mut dyn ReadSeek) -> Result<(AudioFileSpec, Endian)> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    if &magic != FORM {
        return Err(Error::encoding("missing FORM magic"));
    }
    let _form_len = Endian::Big.read_u32(reader)?;
    let mut form_type = [0u8; 4];
    reader.read_exact(&mut form_type)?;
    let is_aifc = match &form_type {
        TYPE_AIFF => false,
        TYPE_AIFC => true,
        _ => return Err(Error::encoding("FORM type is neither AIFF nor AIFC")),
    };

    let mut comm: Option<CommInfo> = None;
    let mut data: Option<(u64, u64)> = None; // (position, byte length)

    while let Some((tag, len)) = read_chunk_header(reader, Endian::Big)? {
        let payload_start = reader.stream_position()?;
        match tag {
            CHUNK_COMM => {
                let num_channels = Endian::Big.read_u16(reader)?;
                // The frame count here is advisory; the SSND chunk length is
                // authoritative.
                let _num_frames = Endian::Big.read_u32(reader)?;
                let bits_per_sample = Endian::Big.read_u16(reader)?;
                let sample_rate = read_f80(reader)?;
                let compression = if is_aifc && len >= 22 {
                    let mut c = [0u8; 4];
                    reader.read_exact(&mut c)?;
                    Some(c)
                } else {
                    None
                };
                comm = Some(CommInfo {
                    num_channels,
                    bits_per_sample,
                    sample_rate,
                    compression,
                });
            }
            CHUNK_SSND => {
                let offset = Endian::Big.read_u32(reader)?;
                let _block_size = Endian::Big.read_u32(reader)?;
                let data_len = u64::from(len)
                    .checked_sub(8 + u64::from(offset))
                    .ok_or_else(|| Error::encoding("SSND chunk shorter than its offset"))?;
                data = Some((payload_start + 8 + u64::from(offset), data_len));
            }
            other => {
                debug!(chunk = %other, len, "skipping chunk");
            }
        }
        if comm.is_some() && data.is_some() {
            break;
        }
        let padded = (u64::from(len) + 1) & !1;
        reader.seek(SeekFrom::Start(payload_start + padded))?;
    }

    let comm = comm.ok_or(Error::MissingChunk("COMM"))?;
    let (data_pos, data_len) = data.ok_or(Error::MissingChunk("SSND"))?;

    let (sample_format, endian) = resolve_format(&comm)?;
    if comm.num_channels == 0 {
        return Err(Error::encoding("COMM chunk declares zero channels"));
    }

    let mut spec = AudioFileSpec::new(
        sample_format,
        u32::from(comm.num_channels),
        comm.sample_rate,
        0,
    );
    spec.container = Some("aiff".to_string());
    spec.num_frames = data_len / spec.frame_size() as u64;

    reader.seek(SeekFrom::Start(data_pos))?;
    Ok((spec, endian))
}

fn resolve_format(comm: &CommInfo) -> Result<(SampleFormat, Endian)> {
    match comm.compression {
        None => {
            let format = match comm.bits_per_sample {
                8 => SampleFormat::Int8,
                16 => SampleFormat::Int16,
                24 => SampleFormat::Int24,
                32 => SampleFormat::Int32,
                other => {
                    return Err(Error::encoding(format!(
                        "unsupported bit depth {other}"
                    )))
                }
            };
            Ok((format, Endian::Big))
        }
        Some(tag) => match &tag {
            b"NONE" => {
                let format = match comm.bits_per_sample {
                    8 => SampleFormat::Int8,
                    16 => SampleFormat::Int16,
                    24 => SampleFormat::Int24,
                    32 => SampleFormat::Int32,
                    other => {
                        return Err(Error::encoding(format!(
                            "unsupported bit depth {other}"
                        )))
                    }
                };
                Ok((format, Endian::Big))
            }
            b"fl32" | b"FL32" => Ok((SampleFormat::Float32, Endian::Big)),
            b"fl64" | b"FL64" => Ok((SampleFormat::Float64, Endian::Big)),
            b"in16" => Ok((SampleFormat::Int16, Endian::Big)),
            b"in24" => Ok((SampleFormat::Int24, Endian::Big)),
            b"in32" => Ok((SampleFormat::Int32, Endian::Big)),
            b"sowt" => Ok((SampleFormat::Int16, Endian::Little)),
            other => Err(Error::encoding(format!(
                "unsupported AIFC compression \"{}\"",
                String::from_utf8_lossy(other)
            ))),
        },
    }
}

fn write_header(writer: &mut dyn Write, spec: &AudioFileSpec) -> Result<Endian> {
    let (is_aifc, compression): (bool, Option<(&[u8; 4], &str)>) = match spec.sample_format {
        SampleFormat::Int8 | SampleFormat::Int16 | SampleFormat::Int24 | SampleFormat::Int32 => {
            (false, None)
        }
        SampleFormat::Float32 => (true, Some((b"fl32", "32-bit float"))),
        SampleFormat::Float64 => (true, Some((b"fl64", "64-bit float"))),
        SampleFormat::UInt8 => {
            return Err(Error::encoding("unsigned 8-bit samples are not representable"))
        }
    };
    if spec.num_channels == 0 || spec.num_channels > u32::from(u16::MAX) {
        return Err(Error::InvalidParameter(format!(
            "channel count {} out of range",
            spec.num_channels
        )));
    }
    let num_frames = u32::try_from(spec.num_frames)
        .map_err(|_| Error::InvalidParameter("frame count exceeds u32".into()))?;

    let comm_len: u32 = match compression {
        None => 18,
        Some((_, name)) => 18 + 4 + pstring_len(name),
    };
    let data_len = spec.data_len();
    let ssnd_len = u32::try_from(8 + data_len)
        .map_err(|_| Error::InvalidParameter("sample data exceeds u32".into()))?;
    let fver_len: u32 = if is_aifc { 8 + 4 } else { 0 };
    let form_len = 4 + fver_len + 8 + comm_len + 8 + ssnd_len;

    writer.write_all(FORM)?;
    Endian::Big.write_u32(writer, form_len)?;
    writer.write_all(if is_aifc { TYPE_AIFC } else { TYPE_AIFF })?;

    if is_aifc {
        writer.write_all(CHUNK_FVER.as_bytes())?;
        Endian::Big.write_u32(writer, 4)?;
        Endian::Big.write_u32(writer, AIFC_VERSION)?;
    }

    writer.write_all(CHUNK_COMM.as_bytes())?;
    Endian::Big.write_u32(writer, comm_len)?;
    Endian::Big.write_u16(writer, spec.num_channels as u16)?;
    Endian::Big.write_u32(writer, num_frames)?;
    Endian::Big.write_u16(writer, spec.sample_format.bits_per_sample() as u16)?;
    write_f80(writer, spec.sample_rate)?;
    if let Some((tag, name)) = compression {
        writer.write_all(tag)?;
        write_pstring(writer, name)?;
    }

    writer.write_all(CHUNK_SSND.as_bytes())?;
    Endian::Big.write_u32(writer, ssnd_len)?;
    Endian::Big.write_u32(writer, 0)?; // offset
    Endian::Big.write_u32(writer, 0)?; // block size

    Ok(Endian::Big)
}
