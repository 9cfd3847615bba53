//! Decompression helpers.
//!
//! Snes9x writes save states either raw or wrapped in a single gzip member,
//! depending on its configuration. Parsers in [`crate::formats`] receive
//! already-decompressed bytes; [`gzip::maybe_decompress`] is the switch
//! they use to get there.
//!
//! ## Submodules
//!
//! | Module | Algorithm | Typical use in savehall |
//! |--------|-----------|-------------------------|
//! | [`gzip`] | gzip (DEFLATE) | Compressed Snes9x snapshots (`.000`-`.009`) |

pub mod gzip;
