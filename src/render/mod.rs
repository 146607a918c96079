//! Page rendering.
//!
//! This module defines:
//!
//! - the `Surface` drawing primitives shared by every backend
//! - the scene painter that turns a `Page` into primitives
//! - the PDF sink (`lopdf`) and the SVG exporter (`plotters`)

pub mod pdf;
pub mod scene;
pub mod svg;

use std::path::{Path, PathBuf};

use crate::domain::{Align, Color, LineStyle, Style};
use crate::error::AppError;
use crate::report::options::CanvasSpec;
use crate::report::page::Page;

pub use pdf::*;
pub use scene::*;
pub use svg::*;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Font {
    /// Size in points.
    pub size: f64,
    pub color: Color,
    pub bold: bool,
    pub align: Align,
    /// Read bottom-to-top.
    pub vertical: bool,
}

/// Drawing primitives in page points, origin bottom-left.
pub trait Surface {
    fn stroke(&mut self, points: &[(f64, f64)], line: &LineStyle) -> Result<(), AppError>;
    fn fill(&mut self, points: &[(f64, f64)], color: Color) -> Result<(), AppError>;
    /// Draw `text` with its baseline at `at`, anchored per `font.align`.
    fn text(&mut self, text: &str, at: (f64, f64), font: &Font) -> Result<(), AppError>;
}

/// Write `page` as `dir/name.ext` for every known extension.
///
/// Unknown extensions are skipped with a warning. Returns the written paths.
pub fn export_page_images(
    page: &Page,
    style: &Style,
    canvas: &CanvasSpec,
    dir: &Path,
    name: &str,
    extensions: &[String],
) -> Result<Vec<PathBuf>, AppError> {
    let mut written = Vec::new();
    for ext in extensions {
        let path = dir.join(format!("{name}.{ext}"));
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => write_single_page_pdf(page, style, canvas, &path)?,
            "svg" => write_svg(page, style, canvas, &path)?,
            other => {
                log::warn!("Skipping unsupported image format '{other}' for {name}");
                continue;
            }
        }
        log::debug!("Saved {}", path.display());
        written.push(path);
    }
    Ok(written)
}

/// Characters the standard PDF fonts cannot show are replaced with `?`.
pub fn printable(text: &str) -> String {
    text.chars().map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '?' }).collect()
}

/// Approximate advance width of Helvetica text.
pub fn text_width(text: &str, size: f64) -> f64 {
    0.52 * size * text.chars().count() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn printable_replaces_non_ascii() {
        assert_eq!(printable("chi2 / NDF"), "chi2 / NDF");
        assert_eq!(printable("χ²"), "??");
    }
}
