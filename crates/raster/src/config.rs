//! Configuration and error types for page rasterization.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lowest accepted render resolution.
pub const MIN_DPI: u32 = 36;

/// Highest accepted render resolution.
pub const MAX_DPI: u32 = 1200;

/// Pixel format for rendered pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    /// One byte per pixel.
    Grayscale,
    /// Three bytes per pixel.
    Rgb,
}

impl ColorMode {
    /// Bytes per pixel in this mode.
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            ColorMode::Grayscale => 1,
            ColorMode::Rgb => 3,
        }
    }

    /// Single-byte tag used in the canonical pixel encoding.
    pub(crate) fn canonical_tag(&self) -> u8 {
        match self {
            ColorMode::Grayscale => 0,
            ColorMode::Rgb => 1,
        }
    }
}

/// Configuration for the rasterization stage.
///
/// Pages are only comparable when rendered under identical settings, so
/// these values are fixed once per corpus run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RasterConfig {
    /// Configuration schema version.
    pub version: u32,

    /// Render resolution in dots per inch. Page pixel dimensions derive
    /// from the page's point size: `px = points * dpi / 72`, rounded.
    pub dpi: u32,

    /// Pixel format pages are converted to after rendering.
    pub color_mode: ColorMode,
}

impl RasterConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the render resolution.
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    /// Sets the pixel format.
    pub fn with_color_mode(mut self, color_mode: ColorMode) -> Self {
        self.color_mode = color_mode;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), RasterError> {
        if self.version == 0 {
            return Err(RasterError::InvalidConfigVersion {
                version: self.version,
            });
        }
        if self.dpi < MIN_DPI || self.dpi > MAX_DPI {
            return Err(RasterError::InvalidConfigDpi { dpi: self.dpi });
        }
        Ok(())
    }
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            version: 1,
            dpi: 150,
            color_mode: ColorMode::Grayscale,
        }
    }
}

/// Errors produced by the rasterization stage.
#[derive(Debug, Error)]
pub enum RasterError {
    /// The PDFium library could not be located or bound.
    #[error("PDF render engine unavailable: {reason}")]
    EngineUnavailable { reason: String },

    /// The document could not be opened or parsed at all.
    #[error("unreadable document {}: {reason}", path.display())]
    DocumentUnreadable { path: PathBuf, reason: String },

    /// A single page failed to render.
    #[error("page {page_index} of {} failed to render: {reason}", path.display())]
    PageRender {
        path: PathBuf,
        page_index: usize,
        reason: String,
    },

    /// A PNG could not be encoded or written.
    #[error("failed to write PNG {}: {reason}", path.display())]
    PngWrite { path: PathBuf, reason: String },

    /// The configuration version is not supported.
    #[error("invalid config version: {version} (expected >= 1)")]
    InvalidConfigVersion { version: u32 },

    /// The render resolution is out of range.
    #[error("invalid dpi: {dpi} (expected {MIN_DPI} to {MAX_DPI})")]
    InvalidConfigDpi { dpi: u32 },
}
