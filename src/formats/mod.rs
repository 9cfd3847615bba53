//! Parsers for emulator save file formats.
//!
//! Both parsers work on an in-memory byte slice and share a few
//! conventions:
//!
//! * **Bounds-checked** - every offset and length read from the input is
//!   validated against the buffer before use. Malformed input produces an
//!   [`Error`](crate::Error) or a skipped entry, never a panic.
//! * **Absence is not failure** - a snapshot without a preview decodes to
//!   `Ok(None)`; only unreadable structure is an error.
//! * **Compression is separate** - gzip is detected and undone by
//!   [`crate::compression::gzip`] before framing is parsed.
//!
//! ## Format overview
//!
//! | Module       | Format        | Description |
//! |--------------|---------------|-------------|
//! | [`psf`]      | PSF / SFO     | Key/value metadata in every PSP save folder (`PARAM.SFO`) |
//! | [`snapshot`] | Snes9x `.00N` | Block-framed emulator snapshot with an RGB preview block |

pub mod psf;
pub mod snapshot;
