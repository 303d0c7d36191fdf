//! Chunked conversion between interleaved on-disk bytes and de-interleaved
//! 32-bit float channel buffers.
//!
//! One decoder and one encoder exist per [`SampleFormat`]; all share the same
//! chunking template: a staging byte buffer holding a whole number of frames
//! is filled from (or drained to) the transport, and samples are converted
//! between the interleaved byte layout and the caller's per-channel float
//! slices. The on-disk layout is channel-minor, frame-major: channel `ch` of
//! frame `j` sits at element `j * channels + ch`.

use crate::bytes::Endian;
use crate::error::{Error, Result};
use crate::sample::SampleFormat;
use crate::spec::AudioFileSpec;
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use std::io::{Read, Write};

/// Target size of the staging buffer in bytes. The actual capacity is a whole
/// number of frames, at least one.
const BUFFER_BYTES: usize = 65536;

fn staging_buffer(frame_size: usize) -> Vec<u8> {
    let frames = (BUFFER_BYTES / frame_size).max(1);
    vec![0u8; frames * frame_size]
}

fn check_channels(format: SampleFormat, channels: u32) -> Result<usize> {
    if !format.codec_available() {
        return Err(Error::NoCodec(format));
    }
    if channels == 0 {
        return Err(Error::InvalidParameter("channel count must be nonzero".into()));
    }
    Ok(channels as usize)
}

/// Decodes interleaved sample bytes from a transport into per-channel floats.
///
/// Owns the transport and a reusable staging buffer; one instance per open
/// stream.
pub struct FrameDecoder<R> {
    reader: R,
    format: SampleFormat,
    endian: Endian,
    channels: usize,
    buf: Vec<u8>,
}

impl<R: Read> FrameDecoder<R> {
    /// Create a decoder bound to a fixed format, byte order, and channel
    /// count.
    pub fn new(reader: R, format: SampleFormat, endian: Endian, channels: u32) -> Result<Self> {
        let channels = check_channels(format, channels)?;
        let buf = staging_buffer(format.bytes_per_sample() * channels);
        Ok(Self {
            reader,
            format,
            endian,
            channels,
            buf,
        })
    }

    /// Number of channels this decoder de-interleaves into.
    pub fn channels(&self) -> u32 {
        self.channels as u32
    }

    /// Consume the decoder, returning the transport.
    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Read `len` frames, de-interleaving into one destination slice per
    /// channel starting at `offset`.
    ///
    /// A `None` entry skips that channel: nothing is written for it, but its
    /// bytes are still consumed so the stream position stays frame-aligned.
    /// Each `Some` slice must hold at least `offset + len` samples.
    pub fn read_frames(
        &mut self,
        dest: &mut [Option<&mut [f32]>],
        offset: usize,
        len: usize,
    ) -> Result<()> {
        if dest.len() != self.channels {
            return Err(Error::InvalidParameter(format!(
                "expected {} channel buffers, got {}",
                self.channels,
                dest.len()
            )));
        }
        read_loop(
            &mut self.reader,
            &mut self.buf,
            self.format,
            self.endian,
            self.channels,
            dest,
            offset,
            len,
        )
    }
}

/// Encodes per-channel floats into interleaved sample bytes on a transport.
pub struct FrameEncoder<W> {
    writer: W,
    format: SampleFormat,
    endian: Endian,
    channels: usize,
    buf: Vec<u8>,
}

impl<W: Write> FrameEncoder<W> {
    /// Create an encoder bound to a fixed format, byte order, and channel
    /// count.
    pub fn new(writer: W, format: SampleFormat, endian: Endian, channels: u32) -> Result<Self> {
        let channels = check_channels(format, channels)?;
        let buf = staging_buffer(format.bytes_per_sample() * channels);
        Ok(Self {
            writer,
            format,
            endian,
            channels,
            buf,
        })
    }

    /// Number of channels this encoder interleaves from.
    pub fn channels(&self) -> u32 {
        self.channels as u32
    }

    /// Consume the encoder, returning the transport.
    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Write `len` frames, interleaving from one source slice per channel
    /// starting at `offset`. Every channel slice must be present and hold at
    /// least `offset + len` samples.
    pub fn write_frames(&mut self, src: &[&[f32]], offset: usize, len: usize) -> Result<()> {
        if src.len() != self.channels {
            return Err(Error::InvalidParameter(format!(
                "expected {} channel buffers, got {}",
                self.channels,
                src.len()
            )));
        }
        write_loop(
            &mut self.writer,
            &mut self.buf,
            self.format,
            self.endian,
            self.channels,
            src,
            offset,
            len,
        )
    }
}

/// Bidirectional codec for read-write transports, composing the decoder and
/// encoder behaviors over one staging buffer.
pub struct FrameCodec<T> {
    transport: T,
    format: SampleFormat,
    endian: Endian,
    channels: usize,
    buf: Vec<u8>,
}

impl<T: Read + Write> FrameCodec<T> {
    /// Create a bidirectional codec bound to a fixed format, byte order, and
    /// channel count.
    pub fn new(transport: T, format: SampleFormat, endian: Endian, channels: u32) -> Result<Self> {
        let channels = check_channels(format, channels)?;
        let buf = staging_buffer(format.bytes_per_sample() * channels);
        Ok(Self {
            transport,
            format,
            endian,
            channels,
            buf,
        })
    }

    /// Number of channels.
    pub fn channels(&self) -> u32 {
        self.channels as u32
    }

    /// Consume the codec, returning the transport.
    pub fn into_inner(self) -> T {
        self.transport
    }

    /// See [`FrameDecoder::read_frames`].
    pub fn read_frames(
        &mut self,
        dest: &mut [Option<&mut [f32]>],
        offset: usize,
        len: usize,
    ) -> Result<()> {
        if dest.len() != self.channels {
            return Err(Error::InvalidParameter(format!(
                "expected {} channel buffers, got {}",
                self.channels,
                dest.len()
            )));
        }
        read_loop(
            &mut self.transport,
            &mut self.buf,
            self.format,
            self.endian,
            self.channels,
            dest,
            offset,
            len,
        )
    }

    /// See [`FrameEncoder::write_frames`].
    pub fn write_frames(&mut self, src: &[&[f32]], offset: usize, len: usize) -> Result<()> {
        if src.len() != self.channels {
            return Err(Error::InvalidParameter(format!(
                "expected {} channel buffers, got {}",
                self.channels,
                src.len()
            )));
        }
        write_loop(
            &mut self.transport,
            &mut self.buf,
            self.format,
            self.endian,
            self.channels,
            src,
            offset,
            len,
        )
    }
}

/// Create a decoder bound to a parsed spec and the byte order its header
/// parser reported.
pub fn make_decoder<R: Read>(
    spec: &AudioFileSpec,
    endian: Endian,
    reader: R,
) -> Result<FrameDecoder<R>> {
    FrameDecoder::new(reader, spec.sample_format, endian, spec.num_channels)
}

/// Create an encoder bound to a spec and byte order.
pub fn make_encoder<W: Write>(
    spec: &AudioFileSpec,
    endian: Endian,
    writer: W,
) -> Result<FrameEncoder<W>> {
    FrameEncoder::new(writer, spec.sample_format, endian, spec.num_channels)
}

/// Create a bidirectional codec bound to a spec and byte order.
pub fn make_codec<T: Read + Write>(
    spec: &AudioFileSpec,
    endian: Endian,
    transport: T,
) -> Result<FrameCodec<T>> {
    FrameCodec::new(transport, spec.sample_format, endian, spec.num_channels)
}

#[allow(clippy::too_many_arguments)]
fn read_loop<R: Read + ?Sized>(
    reader: &mut R,
    buf: &mut [u8],
    format: SampleFormat,
    endian: Endian,
    channels: usize,
    dest: &mut [Option<&mut [f32]>],
    mut offset: usize,
    mut len: usize,
) -> Result<()> {
    let frame_size = format.bytes_per_sample() * channels;
    let capacity = buf.len() / frame_size;
    while len > 0 {
        let chunk = len.min(capacity);
        let bytes = chunk * frame_size;
        reader.read_exact(&mut buf[..bytes])?;
        match endian {
            Endian::Big => decode_frames::<BigEndian>(format, &buf[..bytes], dest, offset, chunk, channels),
            Endian::Little => {
                decode_frames::<LittleEndian>(format, &buf[..bytes], dest, offset, chunk, channels)
            }
        }
        offset += chunk;
        len -= chunk;
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn write_loop<W: Write + ?Sized>(
    writer: &mut W,
    buf: &mut [u8],
    format: SampleFormat,
    endian: Endian,
    channels: usize,
    src: &[&[f32]],
    mut offset: usize,
    mut len: usize,
) -> Result<()> {
    let frame_size = format.bytes_per_sample() * channels;
    let capacity = buf.len() / frame_size;
    while len > 0 {
        let chunk = len.min(capacity);
        let bytes = chunk * frame_size;
        match endian {
            Endian::Big => encode_frames::<BigEndian>(format, &mut buf[..bytes], src, offset, chunk, channels),
            Endian::Little => {
                encode_frames::<LittleEndian>(format, &mut buf[..bytes], src, offset, chunk, channels)
            }
        }
        writer.write_all(&buf[..bytes])?;
        offset += chunk;
        len -= chunk;
    }
    Ok(())
}

fn decode_frames<E: ByteOrder>(
    format: SampleFormat,
    src: &[u8],
    dest: &mut [Option<&mut [f32]>],
    offset: usize,
    frames: usize,
    channels: usize,
) {
    for (ch, slot) in dest.iter_mut().enumerate() {
        let out = match slot.as_deref_mut() {
            Some(out) => &mut out[offset..offset + frames],
            None => continue,
        };
        match format {
            SampleFormat::UInt8 => {
                for (j, sample) in out.iter_mut().enumerate() {
                    let byte = src[j * channels + ch];
                    *sample = (byte ^ 0x80) as i8 as f32 / 127.0;
                }
            }
            SampleFormat::Int8 => {
                for (j, sample) in out.iter_mut().enumerate() {
                    *sample = src[j * channels + ch] as i8 as f32 / 127.0;
                }
            }
            SampleFormat::Int16 => {
                for (j, sample) in out.iter_mut().enumerate() {
                    let i = (j * channels + ch) * 2;
                    *sample = E::read_i16(&src[i..i + 2]) as f32 / 32767.0;
                }
            }
            SampleFormat::Int24 => {
                for (j, sample) in out.iter_mut().enumerate() {
                    let i = (j * channels + ch) * 3;
                    *sample = E::read_i24(&src[i..i + 3]) as f32 / 8388607.0;
                }
            }
            SampleFormat::Int32 => {
                for (j, sample) in out.iter_mut().enumerate() {
                    let i = (j * channels + ch) * 4;
                    *sample = E::read_i32(&src[i..i + 4]) as f32 / 2147483647.0;
                }
            }
            SampleFormat::Float32 => {
                for (j, sample) in out.iter_mut().enumerate() {
                    let i = (j * channels + ch) * 4;
                    *sample = E::read_f32(&src[i..i + 4]);
                }
            }
            SampleFormat::Float64 => {
                for (j, sample) in out.iter_mut().enumerate() {
                    let i = (j * channels + ch) * 8;
                    *sample = E::read_f64(&src[i..i + 8]) as f32;
                }
            }
        }
    }
}

fn encode_frames<E: ByteOrder>(
    format: SampleFormat,
    dst: &mut [u8],
    src: &[&[f32]],
    offset: usize,
    frames: usize,
    channels: usize,
) {
    for (ch, input) in src.iter().enumerate() {
        let input = &input[offset..offset + frames];
        match format {
            SampleFormat::UInt8 => {
                for (j, &sample) in input.iter().enumerate() {
                    dst[j * channels + ch] = ((sample * 127.0) as i8 as u8) ^ 0x80;
                }
            }
            SampleFormat::Int8 => {
                for (j, &sample) in input.iter().enumerate() {
                    dst[j * channels + ch] = (sample * 127.0) as i8 as u8;
                }
            }
            SampleFormat::Int16 => {
                for (j, &sample) in input.iter().enumerate() {
                    let i = (j * channels + ch) * 2;
                    E::write_i16(&mut dst[i..i + 2], (sample * 32767.0) as i16);
                }
            }
            SampleFormat::Int24 => {
                for (j, &sample) in input.iter().enumerate() {
                    let i = (j * channels + ch) * 3;
                    E::write_i24(&mut dst[i..i + 3], (sample * 8388607.0) as i32);
                }
            }
            SampleFormat::Int32 => {
                for (j, &sample) in input.iter().enumerate() {
                    let i = (j * channels + ch) * 4;
                    E::write_i32(&mut dst[i..i + 4], (sample * 2147483647.0) as i32);
                }
            }
            SampleFormat::Float32 => {
                for (j, &sample) in input.iter().enumerate() {
                    let i = (j * channels + ch) * 4;
                    E::write_f32(&mut dst[i..i + 4], sample);
                }
            }
            SampleFormat::Float64 => {
                for (j, &sample) in input.iter().enumerate() {
                    let i = (j * channels + ch) * 8;
                    E::write_f64(&mut dst[i..i + 8], sample as f64);
                }
            }
        }
    }
}
