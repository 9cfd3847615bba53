//! Library-wide error and result types.

use std::fmt;
use std::io;

/// Result alias used throughout savehall.
pub type Result<T> = std::result::Result<T, Error>;

/// All errors the library can produce.
///
/// "Nothing there" outcomes are not errors: a snapshot without a preview
/// block decodes to `Ok(None)` and an unidentifiable path resolves to
/// [`crate::resolver::Resolution::Unresolved`].
#[derive(Debug)]
pub enum Error {
    /// The PSF signature was not found anywhere in the buffer. The input is
    /// simply not a metadata container.
    NoContainer,
    /// The snapshot text header is missing or malformed.
    InvalidHeader,
    /// A header or block declares more bytes than the buffer holds.
    Truncated,
    /// gzip decompression of a snapshot failed.
    Decompress(io::Error),
    /// An offset or size field would read outside the valid region.
    InvalidRange,
    /// A structural constraint was violated (message describes which one).
    Parse(&'static str),
    /// An underlying I/O operation failed.
    Io(io::Error),
    /// A JSON document (config or disc map) could not be read or written.
    Json(serde_json::Error),
    /// PNG encoding failed.
    #[cfg(feature = "png")]
    Image(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NoContainer => write!(f, "no PSF container signature found"),
            Error::InvalidHeader => write!(f, "invalid snapshot header"),
            Error::Truncated => write!(f, "data truncated"),
            Error::Decompress(e) => write!(f, "gzip decompression failed: {e}"),
            Error::InvalidRange => write!(f, "invalid offset or size"),
            Error::Parse(s) => write!(f, "parse error: {s}"),
            Error::Io(e) => write!(f, "I/O error: {e}"),
            Error::Json(e) => write!(f, "JSON error: {e}"),
            #[cfg(feature = "png")]
            Error::Image(s) => write!(f, "png encoding failed: {s}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) | Error::Decompress(e) => Some(e),
            Error::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}
