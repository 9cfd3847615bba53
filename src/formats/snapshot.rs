//! Snes9x snapshot (save state) - tagged block stream.
//!
//! Save states in slots `.000`-`.009` are a short text header followed by a
//! flat sequence of named blocks. The whole file may be gzip-compressed.
//! The only block decoded here is `SHO`, the screenshot Snes9x embeds for
//! its slot picker.
//!
//! ## Layout
//! ```text
//! [0x00] Header, 8 bytes: "SNES" ... "\n"
//! [0x08] Block*
//! ```
//!
//! ## Block
//! ```text
//! Name   ASCII, up to the next ':'
//! Size   ASCII decimal, up to the next ':'
//!        or the sentinel "------", an optional ':' and a u32 BE size
//! Body   Size bytes
//! ```
//!
//! ## SHO body
//! ```text
//! [0x00] Width                     (u16 LE)
//! [0x02] Height                    (u16 LE)
//! [0x04] Reserved                  (4 bytes)
//! [0x08] Pixels (Width × Height × 3 bytes, RGB888, row-major)
//! ```
//!
//! ## Notes
//! * The scan is strictly sequential; a block is skipped by its declared
//!   size, never searched for.
//! * Framing that cannot be read (no delimiter, non-ASCII name, unparsable
//!   size) ends the scan. A snapshot without a `SHO` block is normal and
//!   yields no preview rather than an error.

use std::borrow::Cow;
use std::io::Read;

use crate::compression::gzip::maybe_decompress;
use crate::image::RgbImage;
use crate::utils::{be_u32_at, le_u16_at, slice_at};
use crate::{Error, Result};

/// Leading tag of the snapshot header.
pub const SNAPSHOT_TAG: &[u8; 4] = b"SNES";
/// Length of the snapshot header.
pub const HEADER_SIZE: usize = 8;
/// Name of the screenshot block.
pub const PREVIEW_BLOCK: &str = "SHO";
/// Size field value announcing a binary u32 BE size.
pub const SIZE_SENTINEL: &[u8; 6] = b"------";

const PREVIEW_HEADER_SIZE: usize = 8;

/// One framed block inside a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotBlock {
    /// Block name, e.g. `CPU`, `SHO`.
    pub name: String,
    /// Offset of the block body within the decompressed snapshot.
    pub offset: usize,
    /// Declared body size. May exceed the bytes actually present.
    pub size: usize,
}

impl SnapshotBlock {
    /// Whether the declared body lies entirely inside a buffer of `len` bytes.
    pub fn fits(&self, len: usize) -> bool {
        self.offset
            .checked_add(self.size)
            .is_some_and(|end| end <= len)
    }
}

/// A snapshot with a validated header, ready to be scanned.
#[derive(Debug)]
pub struct Snapshot<'a> {
    data: Cow<'a, [u8]>,
}

impl<'a> Snapshot<'a> {
    /// Decompress `data` if it is gzip and validate the header.
    ///
    /// Returns [`Error::Decompress`] for a broken gzip stream and
    /// [`Error::InvalidHeader`] when the header is not a snapshot header.
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        let data = maybe_decompress(data)?;
        let header = data.get(..HEADER_SIZE).ok_or(Error::InvalidHeader)?;
        if !header.starts_with(SNAPSHOT_TAG) || header[HEADER_SIZE - 1] != b'\n' {
            return Err(Error::InvalidHeader);
        }
        Ok(Self { data })
    }

    /// Decompressed snapshot bytes, header included.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Iterate over the blocks in file order.
    pub fn blocks(&self) -> Blocks<'_> {
        Blocks {
            data: &self.data,
            pos: HEADER_SIZE,
        }
    }

    /// Body of `block`, or [`None`] if it is cut short.
    pub fn block_data(&self, block: &SnapshotBlock) -> Option<&[u8]> {
        slice_at(&self.data, block.offset, block.size)
    }

    /// Decode the first `SHO` block into an image.
    ///
    /// Returns `Ok(None)` when there is no such block and
    /// [`Error::Truncated`] when the block is shorter than its declared
    /// size or its pixel data.
    pub fn preview(&self) -> Result<Option<RgbImage>> {
        let Some(block) = self.blocks().find(|b| b.name == PREVIEW_BLOCK) else {
            tracing::debug!("snapshot has no preview block");
            return Ok(None);
        };
        let body = self.block_data(&block).ok_or(Error::Truncated)?;
        decode_preview(body).map(Some)
    }

    /// Shorthand for [`Snapshot::parse`] followed by [`Snapshot::preview`].
    pub fn extract_preview(data: &[u8]) -> Result<Option<RgbImage>> {
        Snapshot::parse(data)?.preview()
    }

    /// Read everything from `r` and extract the preview.
    pub fn read_preview<R: Read>(r: &mut R) -> Result<Option<RgbImage>> {
        let mut data = Vec::new();
        r.read_to_end(&mut data)?;
        Self::extract_preview(&data)
    }
}

/// Iterator over [`SnapshotBlock`]s; see [`Snapshot::blocks`].
#[derive(Debug, Clone)]
pub struct Blocks<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Blocks<'a> {
    fn field(&mut self) -> Option<&'a [u8]> {
        let data: &'a [u8] = self.data;
        let rest = data.get(self.pos..)?;
        let len = rest.iter().position(|&b| b == b':')?;
        self.pos += len + 1;
        Some(&rest[..len])
    }

    fn stop(&mut self, reason: &'static str) -> Option<SnapshotBlock> {
        tracing::debug!(offset = self.pos, reason, "snapshot block scan stopped");
        self.pos = self.data.len();
        None
    }
}

impl Iterator for Blocks<'_> {
    type Item = SnapshotBlock;

    fn next(&mut self) -> Option<SnapshotBlock> {
        if self.pos >= self.data.len() {
            return None;
        }

        let Some(name) = self.field() else {
            return self.stop("missing block name delimiter");
        };
        if !name.is_ascii() {
            return self.stop("non-ascii block name");
        }
        let name = String::from_utf8_lossy(name).into_owned();

        let size = if self.data[self.pos..].starts_with(SIZE_SENTINEL) {
            self.pos += SIZE_SENTINEL.len();
            if self.data.get(self.pos) == Some(&b':') {
                self.pos += 1;
            }
            let Some(size) = be_u32_at(self.data, self.pos) else {
                return self.stop("truncated binary block size");
            };
            self.pos += 4;
            size as usize
        } else {
            let Some(size_field) = self.field() else {
                return self.stop("missing block size delimiter");
            };
            match std::str::from_utf8(size_field)
                .ok()
                .and_then(|s| s.trim().parse::<usize>().ok())
            {
                Some(size) => size,
                None => return self.stop("unparsable block size"),
            }
        };

        let block = SnapshotBlock {
            name,
            offset: self.pos,
            size,
        };
        self.pos = self.pos.saturating_add(size);
        Some(block)
    }
}

fn decode_preview(body: &[u8]) -> Result<RgbImage> {
    let width = le_u16_at(body, 0).ok_or(Error::Truncated)?;
    let height = le_u16_at(body, 2).ok_or(Error::Truncated)?;
    let len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(3))
        .ok_or(Error::Truncated)?;
    let pixels = slice_at(body, PREVIEW_HEADER_SIZE, len).ok_or(Error::Truncated)?;

    tracing::debug!(width, height, "decoded snapshot preview");
    Ok(RgbImage {
        width: width.into(),
        height: height.into(),
        pixels: pixels.to_vec(),
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use quickcheck_macros::quickcheck;
    use rstest::rstest;

    use super::*;
    use crate::compression::gzip::tests::gzip;

    pub(crate) const HEADER: &[u8; 8] = b"SNES\n\n\n\n";

    pub(crate) fn block(name: &str, body: &[u8]) -> Vec<u8> {
        let mut out = format!("{name}:{:06}:", body.len()).into_bytes();
        out.extend_from_slice(body);
        out
    }

    pub(crate) fn binary_sized_block(name: &str, body: &[u8]) -> Vec<u8> {
        let mut out = format!("{name}:------:").into_bytes();
        out.extend_from_slice(&(body.len() as u32).to_be_bytes());
        out.extend_from_slice(body);
        out
    }

    pub(crate) fn preview_body(width: u16, height: u16, pixels: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(&width.to_le_bytes());
        body.extend_from_slice(&height.to_le_bytes());
        body.extend_from_slice(&[0; 4]);
        body.extend_from_slice(pixels);
        body
    }

    const PIXELS: [u8; 12] = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12];

    fn two_by_two() -> Vec<u8> {
        let mut data = HEADER.to_vec();
        data.extend(binary_sized_block("SHO", &preview_body(2, 2, &PIXELS)));
        data
    }

    #[test]
    fn extracts_2x2_preview() {
        let img = Snapshot::extract_preview(&two_by_two()).unwrap().unwrap();
        assert_eq!((img.width, img.height), (2, 2));
        assert_eq!(img.pixels, PIXELS);
        assert_eq!(img.pixel(1, 1), Some([10, 11, 12]));
    }

    #[test]
    fn sentinel_without_trailing_delimiter() {
        let mut data = HEADER.to_vec();
        data.extend_from_slice(b"SHO:------");
        let body = preview_body(2, 2, &PIXELS);
        data.extend_from_slice(&(body.len() as u32).to_be_bytes());
        data.extend(body);

        let img = Snapshot::extract_preview(&data).unwrap().unwrap();
        assert_eq!(img.pixels, PIXELS);
    }

    #[test]
    fn skips_other_blocks() {
        let mut data = HEADER.to_vec();
        data.extend(block("CPU", &[0xAA; 48]));
        data.extend(binary_sized_block("RAM", &[b':'; 300]));
        data.extend(block("SHO", &preview_body(1, 1, &[9, 8, 7])));
        data.extend(block("SHO", &preview_body(1, 1, &[0, 0, 0])));

        let img = Snapshot::extract_preview(&data).unwrap().unwrap();
        assert_eq!(img.pixels, [9, 8, 7]);
    }

    #[test]
    fn lists_blocks() {
        let mut data = HEADER.to_vec();
        data.extend(block("CPU", &[0; 4]));
        data.extend(binary_sized_block("SHO", &preview_body(1, 1, &[1, 2, 3])));

        let snap = Snapshot::parse(&data).unwrap();
        let blocks: Vec<_> = snap.blocks().collect();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].name, "CPU");
        assert_eq!(blocks[0].offset, 8 + "CPU:000004:".len());
        assert_eq!(blocks[0].size, 4);
        assert!(blocks[0].fits(snap.data().len()));
        assert_eq!(blocks[1].name, "SHO");
        assert_eq!(snap.block_data(&blocks[1]).unwrap().len(), 11);
    }

    #[test]
    fn gzip_input_is_transparent() {
        let packed = gzip(&two_by_two());
        let img = Snapshot::extract_preview(&packed).unwrap().unwrap();
        assert_eq!(img.pixels, PIXELS);
    }

    #[test]
    fn broken_gzip_is_not_a_header_error() {
        let mut packed = gzip(&two_by_two());
        packed.truncate(12);
        assert!(matches!(
            Snapshot::extract_preview(&packed),
            Err(Error::Decompress(_))
        ));
    }

    #[rstest]
    #[case(b"")]
    #[case(b"SNES\n")]
    #[case(b"SNES9X:0011\n")]
    #[case(b"#!s9xsnp:0011\n")]
    #[case(b"snes\n\n\n\n")]
    fn invalid_header(#[case] data: &[u8]) {
        assert!(matches!(
            Snapshot::extract_preview(data),
            Err(Error::InvalidHeader)
        ));
    }

    #[test]
    fn missing_preview_is_none() {
        let mut data = HEADER.to_vec();
        data.extend(block("CPU", &[0; 16]));
        assert_eq!(Snapshot::extract_preview(&data).unwrap(), None);
        assert_eq!(Snapshot::extract_preview(HEADER).unwrap(), None);
    }

    #[test]
    fn broken_framing_ends_scan() {
        let mut data = HEADER.to_vec();
        data.extend(block("CPU", &[0; 4]));
        data.extend_from_slice(b"SHO:12x4:");
        data.extend(preview_body(1, 1, &[1, 2, 3]));
        assert_eq!(Snapshot::extract_preview(&data).unwrap(), None);
    }

    #[test]
    fn oversized_skip_ends_scan() {
        let mut data = HEADER.to_vec();
        data.extend_from_slice(b"CPU:999999:");
        data.extend(block("SHO", &preview_body(1, 1, &[1, 2, 3])));
        assert_eq!(Snapshot::extract_preview(&data).unwrap(), None);
    }

    #[test]
    fn short_pixel_data_is_truncated() {
        let mut data = HEADER.to_vec();
        data.extend(block("SHO", &preview_body(4, 4, &[0; 10])));
        assert!(matches!(
            Snapshot::extract_preview(&data),
            Err(Error::Truncated)
        ));
    }

    #[test]
    fn block_past_end_of_buffer_is_truncated() {
        let mut data = HEADER.to_vec();
        let body = preview_body(1, 1, &[1, 2, 3]);
        data.extend(binary_sized_block("SHO", &body));
        let declared = data.len() - body.len() - 4;
        data[declared..declared + 4].copy_from_slice(&64u32.to_be_bytes());
        assert!(matches!(
            Snapshot::extract_preview(&data),
            Err(Error::Truncated)
        ));
    }

    #[test]
    fn maximum_dimensions_without_pixels_are_truncated() {
        let mut data = HEADER.to_vec();
        data.extend(binary_sized_block("SHO", &preview_body(u16::MAX, u16::MAX, &[0; 9])));
        assert!(matches!(
            Snapshot::extract_preview(&data),
            Err(Error::Truncated)
        ));
    }

    #[quickcheck]
    fn never_panics(data: Vec<u8>) -> bool {
        let _ = Snapshot::extract_preview(&data);
        true
    }

    #[quickcheck]
    fn never_panics_after_header(body: Vec<u8>) -> bool {
        let mut data = HEADER.to_vec();
        data.extend(body);
        let _ = Snapshot::extract_preview(&data);
        true
    }
}
