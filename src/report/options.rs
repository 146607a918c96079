//! Report configuration.
//!
//! `ReportOptions` is deserialisable with every field defaulted, so a JSON
//! config file only needs the keys it changes. CLI flags are applied on top.

use std::fs::File;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::Style;
use crate::error::AppError;

/// Drawing surface description. Only the aspect ratio and the titles matter
/// for the PDF; the pixel size is used for image exports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasSpec {
    pub name: String,
    pub title: String,
    pub width_px: u32,
    pub height_px: u32,
}

impl Default for CanvasSpec {
    fn default() -> Self {
        Self {
            name: "c1_painter".to_string(),
            title: "New Canvas".to_string(),
            width_px: 1600,
            height_px: 1000,
        }
    }
}

impl CanvasSpec {
    /// Page size in PDF points: A4 landscape width, canvas aspect ratio.
    pub fn page_size(&self) -> (f64, f64) {
        let width = 842.0;
        let aspect = self.height_px.max(1) as f64 / self.width_px.max(1) as f64;
        (width, width * aspect)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportOptions {
    /// Panel columns per page.
    pub nx: usize,
    /// Panel rows per page.
    pub ny: usize,
    pub margin_left: f64,
    pub margin_right: f64,
    pub margin_top: f64,
    pub margin_bottom: f64,
    pub show_grid: bool,
    /// Export every flushed page as standalone images.
    pub print_all: bool,
    /// Image directory; defaults to the output file's directory.
    pub print_dir: Option<PathBuf>,
    pub print_ext: Vec<String>,
    /// Persist drawn artifacts to a JSON-lines side file.
    pub save_structured: bool,
    pub show_page_number: bool,
    /// Gaussian fit half-window as a multiple of the FWHM.
    pub gaus_fit_range: f64,
    pub canvas: CanvasSpec,
    pub style: Style,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            nx: 1,
            ny: 1,
            margin_left: 0.14,
            margin_right: 0.02,
            margin_top: 0.02,
            margin_bottom: 0.12,
            show_grid: false,
            print_all: false,
            print_dir: None,
            print_ext: vec!["pdf".to_string(), "svg".to_string()],
            save_structured: false,
            show_page_number: false,
            gaus_fit_range: 1.0,
            canvas: CanvasSpec::default(),
            style: Style::default(),
        }
    }
}

impl ReportOptions {
    pub fn panels_per_page(&self) -> usize {
        self.nx * self.ny
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.nx == 0 || self.ny == 0 {
            return Err(AppError::config(format!(
                "Panel grid must be at least 1x1 (got {}x{}).",
                self.nx, self.ny
            )));
        }
        let margins = [
            ("margin_left", self.margin_left),
            ("margin_right", self.margin_right),
            ("margin_top", self.margin_top),
            ("margin_bottom", self.margin_bottom),
        ];
        for (name, value) in margins {
            if !(value.is_finite() && (0.0..1.0).contains(&value)) {
                return Err(AppError::config(format!("{name} must be in [0, 1), got {value}.")));
            }
        }
        if self.margin_left + self.margin_right >= 1.0 || self.margin_top + self.margin_bottom >= 1.0 {
            return Err(AppError::config("Opposing margins leave no room for the frame."));
        }
        if !(self.gaus_fit_range.is_finite() && self.gaus_fit_range > 0.0) {
            return Err(AppError::config(format!(
                "gaus_fit_range must be positive, got {}.",
                self.gaus_fit_range
            )));
        }
        if self.canvas.width_px == 0 || self.canvas.height_px == 0 {
            return Err(AppError::config("Canvas size must be non-zero."));
        }
        Ok(())
    }

    /// Read options from a JSON file; missing keys keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, AppError> {
        let file = File::open(path)
            .map_err(|e| AppError::config(format!("Failed to open config '{}': {e}", path.display())))?;
        serde_json::from_reader(file)
            .map_err(|e| AppError::config(format!("Invalid config '{}': {e}", path.display())))
    }

    /// Directory for per-page image exports.
    pub fn resolve_print_dir(&self, output: &Path) -> PathBuf {
        if let Some(dir) = &self.print_dir {
            return dir.clone();
        }
        match output.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

/// Append `.pdf` unless the path already ends with it.
pub fn resolve_output_path(path: &Path) -> PathBuf {
    match path.extension() {
        Some(ext) if ext == "pdf" => path.to_path_buf(),
        _ => {
            let mut name = path.as_os_str().to_owned();
            name.push(".pdf");
            PathBuf::from(name)
        }
    }
}

/// Side file for structured persistence: the PDF path with a `.jsonl` extension.
pub fn structured_path(pdf: &Path) -> PathBuf {
    pdf.with_extension("jsonl")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_extension_appended_once() {
        assert_eq!(resolve_output_path(Path::new("out/report")), PathBuf::from("out/report.pdf"));
        assert_eq!(resolve_output_path(Path::new("report.pdf")), PathBuf::from("report.pdf"));
        assert_eq!(resolve_output_path(Path::new("run.v2")), PathBuf::from("run.v2.pdf"));
        assert_eq!(structured_path(Path::new("out/report.pdf")), PathBuf::from("out/report.jsonl"));
    }

    #[test]
    fn validation_rejects_bad_grid_and_margins() {
        let mut opts = ReportOptions::default();
        assert!(opts.validate().is_ok());
        opts.nx = 0;
        assert!(opts.validate().is_err());
        opts.nx = 2;
        opts.margin_left = 0.6;
        opts.margin_right = 0.5;
        let err = opts.validate().unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Configuration);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let opts: ReportOptions = serde_json::from_str(r#"{"nx": 2, "ny": 3, "show_grid": true}"#).unwrap();
        assert_eq!(opts.panels_per_page(), 6);
        assert!(opts.show_grid);
        assert_eq!(opts.margin_left, 0.14);
        assert_eq!(opts.canvas.width_px, 1600);
    }

    #[test]
    fn print_dir_defaults_to_output_dir() {
        let opts = ReportOptions::default();
        assert_eq!(opts.resolve_print_dir(Path::new("a/b.pdf")), PathBuf::from("a"));
        assert_eq!(opts.resolve_print_dir(Path::new("b.pdf")), PathBuf::from("."));
    }
}
