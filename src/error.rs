//! Error types for the audiofile-core library.

use crate::sample::SampleFormat;
use thiserror::Error;

/// Result type alias using our [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised during identification, header parsing, and sample transfer.
#[derive(Error, Debug)]
pub enum Error {
    /// No registered container format matched the stream prefix.
    #[error("Unknown container format")]
    UnknownFormat,

    /// A required chunk never appeared before the stream ended.
    #[error("Missing required chunk: {0}")]
    MissingChunk(&'static str),

    /// A recognized chunk carried values outside the supported set, or an
    /// internal consistency check failed.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// A spec resolved to a sample format with no registered buffer codec.
    #[error("No sample codec for format: {0}")]
    NoCodec(SampleFormat),

    /// The container format lacks the requested capability.
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// A container format with the same identifier is already registered.
    #[error("Container format already registered: {0}")]
    AlreadyRegistered(String),

    /// Invalid parameter provided by the caller.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Transport errors, propagated unchanged.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an encoding error.
    pub fn encoding(msg: impl Into<String>) -> Self {
        Error::Encoding(msg.into())
    }

    /// Create an unsupported-capability error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Error::Unsupported(msg.into())
    }

    /// Check whether this error wraps a premature end of stream.
    #[must_use]
    pub fn is_eof(&self) -> bool {
        matches!(self, Error::Io(e) if e.kind() == std::io::ErrorKind::UnexpectedEof)
    }
}
