//! Rendered page buffers and their canonical encoding.

use std::path::{Path, PathBuf};

use crate::config::{ColorMode, RasterError};
use crate::RASTER_VERSION;

/// Magic prefix of the canonical pixel encoding.
pub const CANONICAL_MAGIC: [u8; 4] = *b"PGRS";

/// One rendered page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageImage {
    /// Zero-based page position within its document.
    pub page_index: usize,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel format of `pixels`.
    pub color_mode: ColorMode,
    /// Row-major samples, [`ColorMode::bytes_per_pixel`] per pixel, no
    /// row padding.
    pub pixels: Vec<u8>,
}

impl PageImage {
    /// Fixed uncompressed encoding of this page for digesting.
    ///
    /// A small header (magic, format version, dimensions, color mode)
    /// followed by the raw rows. Rendering the same page twice under the
    /// same config yields byte-identical output, with no encoder
    /// incidentals such as compression levels or metadata in the way.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(CANONICAL_MAGIC.len() + 11 + self.pixels.len());
        out.extend_from_slice(&CANONICAL_MAGIC);
        out.extend_from_slice(&RASTER_VERSION.to_le_bytes());
        out.extend_from_slice(&self.width.to_le_bytes());
        out.extend_from_slice(&self.height.to_le_bytes());
        out.push(self.color_mode.canonical_tag());
        out.extend_from_slice(&self.pixels);
        out
    }

    /// Writes the page as a lossless PNG.
    pub fn save_png(&self, path: &Path) -> Result<(), RasterError> {
        let result = match self.color_mode {
            ColorMode::Grayscale => {
                image::GrayImage::from_raw(self.width, self.height, self.pixels.clone())
                    .map(|img| img.save_with_format(path, image::ImageFormat::Png))
            }
            ColorMode::Rgb => {
                image::RgbImage::from_raw(self.width, self.height, self.pixels.clone())
                    .map(|img| img.save_with_format(path, image::ImageFormat::Png))
            }
        };
        match result {
            Some(Ok(())) => Ok(()),
            Some(Err(e)) => Err(RasterError::PngWrite {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }),
            None => Err(RasterError::PngWrite {
                path: path.to_path_buf(),
                reason: "pixel buffer does not match declared dimensions".into(),
            }),
        }
    }
}

/// Everything rendered from one document.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    /// Source document path.
    pub path: PathBuf,
    /// Number of pages the document declares.
    pub page_count: usize,
    /// Successfully rendered pages, in page order.
    pub pages: Vec<PageImage>,
    /// Pages that could not be rendered.
    pub failures: Vec<PageFailure>,
}

/// A page that could not be rendered.
#[derive(Debug, Clone)]
pub struct PageFailure {
    /// Zero-based page position within its document.
    pub page_index: usize,
    /// Render engine failure message.
    pub reason: String,
}
