//! Plain RGB raster images produced by the snapshot decoder.
//!
//! Encoding to PNG needs the `png` feature:
//!
//! ```toml
//! [dependencies]
//! savehall = { version = "0.1", features = ["png"] }
//! ```

use std::path::{Path, PathBuf};

#[cfg(feature = "png")]
use crate::{Error, Result};

/// An 8-bit RGB image: row-major, three bytes per pixel, no padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `width * height * 3` bytes.
    pub pixels: Vec<u8>,
}

impl RgbImage {
    /// The pixel at `(x, y)`, or [`None`] outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let at = (y as usize * self.width as usize + x as usize) * 3;
        let px = self.pixels.get(at..at + 3)?;
        Some([px[0], px[1], px[2]])
    }

    /// Encode as a PNG file image.
    #[cfg(feature = "png")]
    pub fn to_png(&self) -> Result<Vec<u8>> {
        use image::ImageEncoder;
        use image::codecs::png::PngEncoder;

        let mut out = Vec::new();
        PngEncoder::new(&mut out)
            .write_image(
                &self.pixels,
                self.width,
                self.height,
                image::ExtendedColorType::Rgb8,
            )
            .map_err(|e| Error::Image(e.to_string()))?;
        Ok(out)
    }

    /// Encode as PNG and write it to `path`, creating parent directories.
    #[cfg(feature = "png")]
    pub fn save_png(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_png()?)?;
        Ok(())
    }
}

/// Where the preview of a save state is stored: next to the state, with
/// its extension replaced by `preview.png`.
///
/// `Game.000` becomes `Game.preview.png`.
pub fn preview_path(state: &Path) -> PathBuf {
    state.with_extension("preview.png")
}

/// Decode the preview embedded in the snapshot at `state` and write it to
/// [`preview_path`]. Returns the written path, or [`None`] when the
/// snapshot has no preview block.
#[cfg(feature = "png")]
pub fn write_preview(state: &Path) -> Result<Option<PathBuf>> {
    let data = std::fs::read(state)?;
    let Some(image) = crate::formats::snapshot::Snapshot::extract_preview(&data)? else {
        return Ok(None);
    };
    let out = preview_path(state);
    image.save_png(&out)?;
    tracing::info!(
        path = %out.display(),
        width = image.width,
        height = image.height,
        "wrote preview"
    );
    Ok(Some(out))
}
