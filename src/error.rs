//! Errors raised while reading DDF files
use thiserror::Error;

/// Shorthand for results carrying an [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Why a byte stream could not be obtained
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unavailable {
    /// The local path does not exist or is not a regular file
    NotFound,
    /// The server answered with a non-success status
    Status(u16),
    /// The server answered with an empty body
    EmptyBody,
    /// The request never completed
    Transport(String),
}

impl std::fmt::Display for Unavailable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Unavailable::NotFound => write!(f, "not found"),
            Unavailable::Status(code) => write!(f, "HTTP status {}", code),
            Unavailable::EmptyBody => write!(f, "empty response body"),
            Unavailable::Transport(msg) => write!(f, "{}", msg),
        }
    }
}

/// The error type for this crate
#[derive(Debug, Error)]
pub enum Error {
    /// The file or URL could not be opened or fetched
    #[error("could not get {location}: {reason}")]
    SourceUnavailable {
        /// The path or URL that was requested
        location: String,
        /// What went wrong
        reason: Unavailable,
    },

    /// The stream does not start with the `DDF` signature
    #[error("file is not a DDF file")]
    InvalidFormat,

    /// Only version 3 of the format can be read
    #[error("only DDF V3 files are supported, found version {0}")]
    UnsupportedVersion(u8),

    /// A frame record holds a value outside its valid range
    #[error("corrupt frame record {frame}: {reason}")]
    CorruptFrameRecord {
        /// Zero-based index of the offending frame
        frame: u32,
        /// Description of the broken field
        reason: String,
    },

    /// The header announces zero frames
    #[error("file contains no frames")]
    NoFrames,

    /// The stream is shorter than the header says it should be
    #[error("file is truncated: expected {expected} bytes, found {actual}")]
    Truncated {
        /// Size implied by the header
        expected: u64,
        /// Actual size of the stream
        actual: u64,
    },

    /// A binary structure could not be read
    #[error("read error: {0}")]
    Read(#[from] binrw::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The batch input description could not be resolved to files
    #[error("invalid input: {0}")]
    Input(String),

    /// Avro export failed
    #[error("Avro error: {0}")]
    Avro(#[from] apache_avro::Error),
}

impl Error {
    pub(crate) fn corrupt(frame: u32, reason: impl Into<String>) -> Self {
        Error::CorruptFrameRecord {
            frame,
            reason: reason.into(),
        }
    }

    pub(crate) fn unavailable(location: impl Into<String>, reason: Unavailable) -> Self {
        Error::SourceUnavailable {
            location: location.into(),
            reason,
        }
    }
}
