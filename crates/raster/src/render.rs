//! PDFium-backed rendering of documents and single pages.

use std::path::Path;

use pdfium_render::prelude::*;
use tracing::warn;

use crate::config::{ColorMode, RasterConfig, RasterError};
use crate::page::{PageFailure, PageImage, RenderedDocument};

/// Binds the PDFium library.
///
/// Search order: next to the executable, `vendor/pdfium/lib/`, then the
/// system library paths.
fn bind_engine() -> Result<Pdfium, RasterError> {
    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
                "./vendor/pdfium/lib/",
            ))
        })
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|e| RasterError::EngineUnavailable {
            reason: format!("{e:?}"),
        })?;
    Ok(Pdfium::new(bindings))
}

/// Renders every page of one document.
///
/// An unreadable document fails as a whole. A page that fails to render is
/// recorded in [`RenderedDocument::failures`] and the remaining pages are
/// still rendered.
pub fn rasterize(path: &Path, config: &RasterConfig) -> Result<RenderedDocument, RasterError> {
    config.validate()?;
    let pdfium = bind_engine()?;

    let document =
        pdfium
            .load_pdf_from_file(path, None)
            .map_err(|e| RasterError::DocumentUnreadable {
                path: path.to_path_buf(),
                reason: format!("{e:?}"),
            })?;

    let page_count = document.pages().len() as usize;
    let mut pages = Vec::with_capacity(page_count);
    let mut failures = Vec::new();

    for (page_index, page) in document.pages().iter().enumerate() {
        match render_one(&page, path, page_index, config) {
            Ok(image) => pages.push(image),
            Err(err) => {
                warn!(path = %path.display(), page_index, error = %err, "page render failed");
                failures.push(PageFailure {
                    page_index,
                    reason: err.to_string(),
                });
            }
        }
    }

    Ok(RenderedDocument {
        path: path.to_path_buf(),
        page_count,
        pages,
        failures,
    })
}

/// Re-renders a single page of a document.
pub fn render_page(
    path: &Path,
    page_index: usize,
    config: &RasterConfig,
) -> Result<PageImage, RasterError> {
    config.validate()?;
    let pdfium = bind_engine()?;

    let document =
        pdfium
            .load_pdf_from_file(path, None)
            .map_err(|e| RasterError::DocumentUnreadable {
                path: path.to_path_buf(),
                reason: format!("{e:?}"),
            })?;

    if page_index > usize::from(u16::MAX) {
        return Err(RasterError::PageRender {
            path: path.to_path_buf(),
            page_index,
            reason: "page index out of range".into(),
        });
    }
    let page = document
        .pages()
        .get(page_index as u16)
        .map_err(|e| RasterError::PageRender {
            path: path.to_path_buf(),
            page_index,
            reason: format!("{e:?}"),
        })?;

    render_one(&page, path, page_index, config)
}

/// Renders one already-loaded page to a pixel buffer.
fn render_one(
    page: &PdfPage,
    path: &Path,
    page_index: usize,
    config: &RasterConfig,
) -> Result<PageImage, RasterError> {
    let scale = config.dpi as f32 / 72.0;
    let pixel_width = (page.width().value * scale).round() as i32;
    let pixel_height = (page.height().value * scale).round() as i32;

    let bitmap = page
        .render_with_config(
            &PdfRenderConfig::new()
                .set_target_width(pixel_width)
                .set_target_height(pixel_height)
                .render_form_data(true)
                .render_annotations(true),
        )
        .map_err(|e| RasterError::PageRender {
            path: path.to_path_buf(),
            page_index,
            reason: format!("{e:?}"),
        })?;

    let rendered = bitmap.as_image();
    let (width, height, pixels) = match config.color_mode {
        ColorMode::Grayscale => {
            let gray = rendered.to_luma8();
            (gray.width(), gray.height(), gray.into_raw())
        }
        ColorMode::Rgb => {
            let rgb = rendered.to_rgb8();
            (rgb.width(), rgb.height(), rgb.into_raw())
        }
    };

    Ok(PageImage {
        page_index,
        width,
        height,
        color_mode: config.color_mode,
        pixels,
    })
}
