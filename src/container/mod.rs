//! Container formats: identification, registry, and header parsing.
//!
//! Each container module owns one chunk-walking header parser producing a
//! canonical [`AudioFileSpec`] plus the byte order of the sample data. The
//! process-wide registry binds probes, parsers, and (where completed) header
//! writers together; identification walks it in insertion order and the first
//! probe match wins.

pub mod aiff;
pub mod ircam;
pub mod next;
pub mod wave;
pub mod wave64;

use crate::bytes::Endian;
use crate::error::{Error, Result};
use crate::spec::AudioFileSpec;
use parking_lot::RwLock;
use std::fmt;
use std::io::{Read, Seek, SeekFrom, Write};
use std::sync::OnceLock;
use tracing::{debug, info};

/// Transport capability required for header parsing: sequential reads plus
/// random seeks.
pub trait ReadSeek: Read + Seek {}
impl<T: Read + Seek> ReadSeek for T {}

/// Four-character chunk tag.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    /// Create from bytes.
    pub const fn new(bytes: [u8; 4]) -> Self {
        FourCC(bytes)
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCC(\"{}\")", String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

/// Probe predicate over a peeked stream prefix.
pub type ProbeFn = fn(&[u8]) -> bool;
/// Header parser entry point.
pub type HeaderReaderFn = fn(&mut dyn ReadSeek) -> Result<(AudioFileSpec, Endian)>;
/// Header writer entry point.
pub type HeaderWriterFn = fn(&mut dyn Write, &AudioFileSpec) -> Result<Endian>;

/// A container format: identity plus an optional reader/writer capability
/// pair. Either capability may be absent, meaning that direction is
/// unsupported for the format.
#[derive(Clone)]
pub struct ContainerFormat {
    id: String,
    extension: String,
    probe: ProbeFn,
    reader: Option<HeaderReaderFn>,
    writer: Option<HeaderWriterFn>,
}

impl ContainerFormat {
    /// Create a format with no reader or writer capability.
    pub fn new(id: impl Into<String>, extension: impl Into<String>, probe: ProbeFn) -> Self {
        Self {
            id: id.into(),
            extension: extension.into(),
            probe,
            reader: None,
            writer: None,
        }
    }

    /// Attach a header reader.
    pub fn with_reader(mut self, reader: HeaderReaderFn) -> Self {
        self.reader = Some(reader);
        self
    }

    /// Attach a header writer.
    pub fn with_writer(mut self, writer: HeaderWriterFn) -> Self {
        self.writer = Some(writer);
        self
    }

    /// Format identifier, unique within a registry.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Customary file extension, without the dot.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Check whether header reading is supported.
    pub fn can_read(&self) -> bool {
        self.reader.is_some()
    }

    /// Check whether header writing is supported.
    pub fn can_write(&self) -> bool {
        self.writer.is_some()
    }

    /// Run the magic probe against a peeked stream prefix. A prefix shorter
    /// than the magic sequence is not a match.
    pub fn probe(&self, prefix: &[u8]) -> bool {
        (self.probe)(prefix)
    }

    /// Parse the container header, leaving the transport positioned at the
    /// first byte of sample data.
    pub fn read_header<R: Read + Seek>(&self, reader: &mut R) -> Result<(AudioFileSpec, Endian)> {
        match self.reader {
            Some(f) => f(reader),
            None => Err(Error::unsupported(format!("{} header reading", self.id))),
        }
    }

    /// Write a complete container header for a freshly created file whose
    /// frame count is already known.
    pub fn write_header<W: Write>(&self, writer: &mut W, spec: &AudioFileSpec) -> Result<Endian> {
        match self.writer {
            Some(f) => f(writer, spec),
            None => Err(Error::unsupported(format!("{} header writing", self.id))),
        }
    }
}

impl fmt::Debug for ContainerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerFormat")
            .field("id", &self.id)
            .field("extension", &self.extension)
            .field("can_read", &self.can_read())
            .field("can_write", &self.can_write())
            .finish()
    }
}

/// Insertion-ordered, add-only set of container formats with unique
/// identifiers.
#[derive(Default)]
pub struct FormatRegistry {
    formats: Vec<ContainerFormat>,
}

impl FormatRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry seeded with the built-in formats. The seeding order
    /// is the probe order.
    pub fn builtin() -> Self {
        Self {
            formats: vec![
                aiff::format(),
                wave::format(),
                next::format(),
                ircam::format(),
                wave64::format(),
            ],
        }
    }

    /// Register a format. Identifiers must be unique; there is no removal.
    pub fn register(&mut self, format: ContainerFormat) -> Result<()> {
        if self.formats.iter().any(|f| f.id == format.id) {
            return Err(Error::AlreadyRegistered(format.id));
        }
        info!(id = %format.id, "container format registered");
        self.formats.push(format);
        Ok(())
    }

    /// Iterate formats in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ContainerFormat> {
        self.formats.iter()
    }

    /// Look up a format by identifier.
    pub fn get(&self, id: &str) -> Option<&ContainerFormat> {
        self.formats.iter().find(|f| f.id == id)
    }

    /// Number of registered formats.
    pub fn len(&self) -> usize {
        self.formats.len()
    }

    /// Check whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }
}

fn global() -> &'static RwLock<FormatRegistry> {
    static REGISTRY: OnceLock<RwLock<FormatRegistry>> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(FormatRegistry::builtin()))
}

/// Register a container format in the process-wide registry.
pub fn register_format(format: ContainerFormat) -> Result<()> {
    global().write().register(format)
}

/// Snapshot of the process-wide registry, in insertion order.
pub fn formats() -> Vec<ContainerFormat> {
    global().read().formats.clone()
}

/// Look up a format in the process-wide registry by identifier.
pub fn format_by_id(id: &str) -> Option<ContainerFormat> {
    global().read().get(id).cloned()
}

/// Longest magic prefix any built-in probe inspects.
const PROBE_LEN: usize = 16;

/// Identify the container format of a byte source.
///
/// Peeks up to [`PROBE_LEN`] bytes, rewinds the source to its starting
/// position, and returns the first registered format whose probe matches.
/// A source too short for any magic sequence is simply not recognized.
pub fn identify<R: Read + Seek>(reader: &mut R) -> Result<Option<ContainerFormat>> {
    let start = reader.stream_position()?;
    let mut prefix = [0u8; PROBE_LEN];
    let mut filled = 0;
    while filled < PROBE_LEN {
        let n = reader.read(&mut prefix[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    reader.seek(SeekFrom::Start(start))?;

    for format in formats() {
        if format.probe(&prefix[..filled]) {
            debug!(id = %format.id, "container format identified");
            return Ok(Some(format));
        }
    }
    Ok(None)
}

/// Identify and parse in one step: the common open path.
///
/// Fails with [`Error::UnknownFormat`] when no probe matches.
pub fn read_header<R: Read + Seek>(
    reader: &mut R,
) -> Result<(ContainerFormat, AudioFileSpec, Endian)> {
    let format = identify(reader)?.ok_or(Error::UnknownFormat)?;
    let (spec, endian) = format.read_header(reader)?;
    Ok((format, spec, endian))
}

/// Read one chunk header, distinguishing a clean end of chunks (`Ok(None)`)
/// from a genuine transport failure. End of input anywhere inside the 8-byte
/// header counts as a clean end; the caller's missing-essential check then
/// produces the precise error.
pub(crate) fn read_chunk_header<R: Read + ?Sized>(
    reader: &mut R,
    endian: Endian,
) -> Result<Option<(FourCC, u32)>> {
    let mut tag = [0u8; 4];
    if let Err(e) = reader.read_exact(&mut tag) {
        return if e.kind() == std::io::ErrorKind::UnexpectedEof {
            Ok(None)
        } else {
            Err(e.into())
        };
    }
    match endian.read_u32(reader) {
        Ok(len) => Ok(Some((FourCC(tag), len))),
        Err(e) if e.is_eof() => Ok(None),
        Err(e) => Err(e),
    }
}
