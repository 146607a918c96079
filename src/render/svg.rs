//! SVG export of a single page through `plotters`.

use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{FontStyle, FontTransform};

use crate::domain::{Align, Color as RgbColor, LineStyle, Style};
use crate::error::AppError;
use crate::render::scene::paint_page;
use crate::render::{Font, Surface};
use crate::report::options::CanvasSpec;
use crate::report::page::Page;

fn plot_color(c: RgbColor) -> RGBColor {
    RGBColor(c.0, c.1, c.2)
}

fn render_err(e: impl std::fmt::Display) -> AppError {
    AppError::render(format!("SVG backend error: {e}"))
}

/// Maps page points onto the pixel grid (y down).
pub struct SvgSurface<'a> {
    area: DrawingArea<SVGBackend<'a>, Shift>,
    scale: f64,
    height_pt: f64,
}

impl<'a> SvgSurface<'a> {
    fn px(&self, (x, y): (f64, f64)) -> (i32, i32) {
        ((x * self.scale).round() as i32, ((self.height_pt - y) * self.scale).round() as i32)
    }
}

impl Surface for SvgSurface<'_> {
    fn stroke(&mut self, points: &[(f64, f64)], line: &LineStyle) -> Result<(), AppError> {
        if points.len() < 2 {
            return Ok(());
        }
        let pts: Vec<(i32, i32)> = points.iter().map(|&p| self.px(p)).collect();
        let width = (line.width * self.scale).round().max(1.0) as u32;
        self.area
            .draw(&PathElement::new(pts, plot_color(line.color).stroke_width(width)))
            .map_err(render_err)
    }

    fn fill(&mut self, points: &[(f64, f64)], color: RgbColor) -> Result<(), AppError> {
        if points.len() < 3 {
            return Ok(());
        }
        let pts: Vec<(i32, i32)> = points.iter().map(|&p| self.px(p)).collect();
        self.area
            .draw(&Polygon::new(pts, plot_color(color).filled()))
            .map_err(render_err)
    }

    fn text(&mut self, text: &str, at: (f64, f64), font: &Font) -> Result<(), AppError> {
        if text.is_empty() || !(font.size > 0.0) {
            return Ok(());
        }
        let h_pos = match font.align {
            Align::Left => HPos::Left,
            Align::Center => HPos::Center,
            Align::Right => HPos::Right,
        };
        let weight = if font.bold { FontStyle::Bold } else { FontStyle::Normal };
        let color = plot_color(font.color);
        let mut style = ("sans-serif", font.size * self.scale, weight)
            .into_font()
            .color(&color)
            .pos(Pos::new(h_pos, VPos::Bottom));
        if font.vertical {
            style = style.transform(FontTransform::Rotate270);
        }
        self.area
            .draw(&Text::new(text.to_string(), self.px(at), style))
            .map_err(render_err)
    }
}

/// Render `page` to an SVG file sized by the canvas.
pub fn write_svg(page: &Page, style: &Style, canvas: &CanvasSpec, path: &Path) -> Result<(), AppError> {
    let size = canvas.page_size();
    let area = SVGBackend::new(path, (canvas.width_px, canvas.height_px)).into_drawing_area();
    let mut surface = SvgSurface {
        area,
        scale: canvas.width_px as f64 / size.0,
        height_pt: size.1,
    };
    paint_page(page, style, size, &mut surface)?;
    surface.area.present().map_err(render_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DrawMode, Histogram1D, NdcRect, TextAttrs, TextBox};
    use crate::report::options::ReportOptions;

    #[test]
    fn svg_contains_panel_text() {
        let dir = std::env::temp_dir().join("sipm_report_svg_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("page.svg");

        let mut page = Page::content(&ReportOptions::default());
        let mut h = Histogram1D::new("hImin", "Minimum current;I (uA);Channels", 10, 0.0, 1.0).unwrap();
        h.fill(0.25);
        let panel = page.panel_mut(1).unwrap();
        panel.push(h.into(), DrawMode::default());
        panel.push(
            TextBox::new(NdcRect::new(0.6, 0.6, 0.9, 0.9)).with_line("marker text", TextAttrs::default()).into(),
            DrawMode::default(),
        );

        write_svg(&page, &Style::default(), &CanvasSpec::default(), &path).unwrap();
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("marker text"));
        assert!(svg.contains("Minimum current"));
    }
}
