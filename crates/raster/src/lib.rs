//! # Pagedup Page Rasterizer
//!
//! Renders PDF pages into fixed-resolution pixel buffers so that downstream
//! digesting sees every page the same way, whether the PDF carries a text
//! layer, vector art, or a raw scan.
//!
//! ## Contract
//!
//! - Rendering is read-only. Source PDFs are never modified.
//! - DPI and color mode must stay fixed across a corpus run. Digests of
//!   pages rendered under different settings are not comparable, and no
//!   error will tell you so.
//! - An unreadable document fails by itself. A single failing page is
//!   recorded in [`RenderedDocument::failures`] and never aborts the rest
//!   of its document.
//!
//! ## Engine
//!
//! Rendering goes through the PDFium library, bound dynamically at runtime.
//! The loader looks next to the executable first, then under
//! `vendor/pdfium/lib/`, then in the system library paths. When no library
//! can be bound every document would fail identically, so that is surfaced
//! as [`RasterError::EngineUnavailable`] instead of per-document noise.
//!
//! ## Example
//!
//! ```no_run
//! use raster::{rasterize, RasterConfig};
//!
//! let config = RasterConfig::new();
//! let rendered = rasterize("corpus/report.pdf".as_ref(), &config)?;
//! for page in &rendered.pages {
//!     let bytes = page.canonical_bytes();
//!     println!("page {} encodes to {} bytes", page.page_index, bytes.len());
//! }
//! # Ok::<(), raster::RasterError>(())
//! ```

pub mod config;
pub mod page;
pub mod render;

pub use crate::config::{ColorMode, RasterConfig, RasterError, MAX_DPI, MIN_DPI};
pub use crate::page::{PageFailure, PageImage, RenderedDocument, CANONICAL_MAGIC};
pub use crate::render::{rasterize, render_page};

/// Version of the canonical pixel encoding emitted by
/// [`PageImage::canonical_bytes`].
pub const RASTER_VERSION: u16 = 1;

/// Human-readable identifier of the render engine.
pub const RASTER_ENGINE: &str = "pdfium";
