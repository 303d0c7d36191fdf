//! Core codec layer for uncompressed audio files.
//!
//! Three concerns, layered bottom-up:
//!
//! * **Identification** — a registry of container formats whose magic-byte
//!   probes run in order against a peeked stream prefix ([`identify`]).
//! * **Header parsing** — chunk-walking parsers for AIFF/AIFF-C, WAVE, NeXT,
//!   IRCAM, and Wave64 headers, each producing a canonical [`AudioFileSpec`]
//!   plus the byte order of the sample data.
//! * **Sample codecs** — [`FrameDecoder`] and [`FrameEncoder`] convert
//!   between interleaved on-disk bytes and de-interleaved `f32` channel
//!   buffers in fixed-size chunks, for every supported [`SampleFormat`].
//!
//! ```no_run
//! use audiofile_core::{make_decoder, read_header};
//! use std::fs::File;
//!
//! # fn main() -> audiofile_core::Result<()> {
//! let mut file = File::open("take.wav")?;
//! let (_format, spec, endian) = read_header(&mut file)?;
//!
//! let mut left = vec![0f32; spec.num_frames as usize];
//! let mut right = vec![0f32; spec.num_frames as usize];
//! let mut decoder = make_decoder(&spec, endian, file)?;
//! let mut dest = [Some(left.as_mut_slice()), Some(right.as_mut_slice())];
//! decoder.read_frames(&mut dest, 0, spec.num_frames as usize)?;
//! # Ok(())
//! # }
//! ```

pub mod bytes;
pub mod codec;
pub mod container;
pub mod error;
pub mod sample;
pub mod spec;

pub use bytes::Endian;
pub use codec::{make_codec, make_decoder, make_encoder, FrameCodec, FrameDecoder, FrameEncoder};
pub use container::{
    format_by_id, formats, identify, read_header, register_format, ContainerFormat, FormatRegistry,
    FourCC, ReadSeek,
};
pub use error::{Error, Result};
pub use sample::SampleFormat;
pub use spec::AudioFileSpec;
