//! gzip decompression.
//!
//! A gzip member starts with the two bytes `1F 8B`. Anything else is handed
//! back untouched so callers can pass raw and compressed inputs through the
//! same path.

use std::borrow::Cow;
use std::io::Read;

use flate2::read::GzDecoder;

use crate::{Error, Result};

/// Leading bytes of every gzip member.
pub const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// Whether `data` starts with the gzip magic.
#[inline]
pub fn is_gzip(data: &[u8]) -> bool {
    data.starts_with(&GZIP_MAGIC)
}

/// Decompress a complete gzip buffer.
///
/// Returns [`Error::Decompress`] on any decompression failure, including a
/// stream that ends before its trailer.
pub fn decompress_gzip(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    GzDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(Error::Decompress)?;
    Ok(out)
}

/// Decompress `data` if it is gzip, otherwise borrow it as is.
pub fn maybe_decompress(data: &[u8]) -> Result<Cow<'_, [u8]>> {
    if is_gzip(data) {
        let out = decompress_gzip(data)?;
        tracing::debug!(compressed = data.len(), decompressed = out.len(), "inflated gzip input");
        Ok(Cow::Owned(out))
    } else {
        Ok(Cow::Borrowed(data))
    }
}
