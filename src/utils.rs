//! Low-level byte primitives shared by all parsers.
//!
//! Slice accessors return [`None`] instead of panicking when the requested
//! range does not fit in the buffer, so callers decide whether an
//! out-of-bounds field is fatal or just skipped.

use std::io::{Read, Seek, SeekFrom};

use crate::{Error, Result};

/// Borrow `len` bytes starting at `offset`.
#[inline]
pub(crate) fn slice_at(buf: &[u8], offset: usize, len: usize) -> Option<&[u8]> {
    let end = offset.checked_add(len)?;
    buf.get(offset..end)
}

/// Borrow exactly `N` bytes starting at `offset` as an array.
#[inline]
pub(crate) fn bytesa_at<const N: usize>(buf: &[u8], offset: usize) -> Option<[u8; N]> {
    slice_at(buf, offset, N)?.try_into().ok()
}

/// Read a little-endian `u16` at `offset`.
#[inline]
pub(crate) fn le_u16_at(buf: &[u8], offset: usize) -> Option<u16> {
    bytesa_at(buf, offset).map(u16::from_le_bytes)
}

/// Read a little-endian `u32` at `offset`.
#[inline]
pub(crate) fn le_u32_at(buf: &[u8], offset: usize) -> Option<u32> {
    bytesa_at(buf, offset).map(u32::from_le_bytes)
}

/// Read a big-endian `u32` at `offset`.
#[inline]
pub(crate) fn be_u32_at(buf: &[u8], offset: usize) -> Option<u32> {
    bytesa_at(buf, offset).map(u32::from_be_bytes)
}

/// Position of the first occurrence of `needle` in `haystack`.
pub(crate) fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// The prefix of `bytes` before the first null byte (all of it if none).
#[inline]
pub(crate) fn until_nul(bytes: &[u8]) -> &[u8] {
    match bytes.iter().position(|&b| b == 0) {
        Some(end) => &bytes[..end],
        None => bytes,
    }
}

/// Extract a null-terminated string from a byte slice at `offset`.
///
/// Invalid UTF-8 is replaced, never rejected. Returns
/// [`Error::InvalidRange`] if `offset` is out of bounds, or
/// [`Error::Parse`] if no null byte is found.
pub(crate) fn null_string(buf: &[u8], offset: usize) -> Result<String> {
    let slice = buf.get(offset..).ok_or(Error::InvalidRange)?;
    let end = slice
        .iter()
        .position(|&b| b == 0)
        .ok_or(Error::Parse("unterminated string"))?;
    Ok(String::from_utf8_lossy(&slice[..end]).into_owned())
}

/// Read at most `len` bytes starting at absolute `offset`.
///
/// A stream that ends early yields a shorter buffer rather than an error;
/// seeking past the end yields an empty one.
pub(crate) fn read_bounded<R: Read + Seek>(r: &mut R, offset: u64, len: u64) -> Result<Vec<u8>> {
    r.seek(SeekFrom::Start(offset))?;
    let mut buf = Vec::with_capacity(len as usize);
    r.by_ref().take(len).read_to_end(&mut buf)?;
    Ok(buf)
}
