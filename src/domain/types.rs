//! Shared styling and placement types.
//!
//! Everything that used to be process-wide plotting state (palette, grid color,
//! text defaults) lives in `Style`, which is owned by each report builder.

use serde::{Deserialize, Serialize};

/// An RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color(pub u8, pub u8, pub u8);

impl Color {
    pub const BLACK: Color = Color(0, 0, 0);
    pub const WHITE: Color = Color(255, 255, 255);
    pub const GRAY: Color = Color(146, 146, 146);
    pub const RED: Color = Color(220, 38, 38);
    pub const BLUE: Color = Color(37, 99, 235);
    pub const GREEN: Color = Color(22, 163, 74);
    pub const ORANGE: Color = Color(234, 88, 12);
    pub const MAGENTA: Color = Color(192, 38, 211);
    pub const CYAN: Color = Color(8, 145, 178);

    /// Components scaled to `[0, 1]`, as PDF color operators expect.
    pub fn unit_rgb(self) -> (f32, f32, f32) {
        (
            self.0 as f32 / 255.0,
            self.1 as f32 / 255.0,
            self.2 as f32 / 255.0,
        )
    }

    /// Linear blend from `self` (t = 0) to `other` (t = 1).
    pub fn mix(self, other: Color, t: f64) -> Color {
        let t = t.clamp(0.0, 1.0);
        let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Color(lerp(self.0, other.0), lerp(self.1, other.1), lerp(self.2, other.2))
    }
}

/// Rectangle in normalised panel coordinates (`0..1` on both axes, origin bottom-left).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NdcRect {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl NdcRect {
    pub const fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }
}

/// Horizontal text alignment inside a text box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// Text attributes for one line of a text box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextAttrs {
    pub color: Color,
    /// Size as a fraction of the panel height.
    pub size: f64,
    pub bold: bool,
    pub align: Align,
}

impl Default for TextAttrs {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            size: 0.04,
            bold: false,
            align: Align::Left,
        }
    }
}

impl TextAttrs {
    /// Defaults for the heading line of a text box.
    pub fn heading() -> Self {
        Self {
            size: 0.05,
            bold: true,
            ..Self::default()
        }
    }

    /// Small gray right-aligned text used for footnotes and page numbers.
    pub fn footnote() -> Self {
        Self {
            color: Color::GRAY,
            size: 0.03,
            bold: false,
            align: Align::Right,
        }
    }
}

/// Stroke style of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dash {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineStyle {
    pub color: Color,
    pub width: f64,
    #[serde(default)]
    pub dash: Dash,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            width: 1.0,
            dash: Dash::Solid,
        }
    }
}

impl LineStyle {
    pub fn colored(color: Color) -> Self {
        Self {
            color,
            ..Self::default()
        }
    }
}

/// Marker shapes for graph points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Marker {
    #[default]
    Circle,
    Square,
    Triangle,
    Cross,
}

impl Marker {
    pub const ALL: [Marker; 4] = [Marker::Circle, Marker::Square, Marker::Triangle, Marker::Cross];
}

/// Report-wide style, passed explicitly to each builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Style {
    /// Series colors handed out in order by `series_color`.
    pub palette: Vec<Color>,
    pub grid_color: Color,
    pub hist_line: LineStyle,
    pub fit_line: LineStyle,
    pub band_color: Color,
    /// Axis title size as a fraction of panel height.
    pub axis_title_size: f64,
    /// Axis title size used when a page holds four or more panels.
    pub dense_axis_title_size: f64,
    pub label_size: f64,
    /// Low end of the `colz` color scale; the high end is `palette[0]`.
    pub z_low: Color,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            palette: vec![
                Color::BLUE,
                Color::RED,
                Color::GREEN,
                Color::ORANGE,
                Color::MAGENTA,
                Color::CYAN,
                Color::BLACK,
                Color::GRAY,
            ],
            grid_color: Color::GRAY,
            hist_line: LineStyle::colored(Color::BLUE),
            fit_line: LineStyle {
                color: Color::RED,
                width: 1.5,
                dash: Dash::Solid,
            },
            band_color: Color::GRAY,
            axis_title_size: 0.045,
            dense_axis_title_size: 0.08,
            label_size: 0.035,
            z_low: Color::WHITE,
        }
    }
}

impl Style {
    /// Color for the `index`-th series, cycling through the palette.
    pub fn series_color(&self, index: usize) -> Color {
        if self.palette.is_empty() {
            return Color::BLACK;
        }
        self.palette[index % self.palette.len()]
    }

    /// Marker for the `index`-th series; advances once per full palette cycle.
    pub fn series_marker(&self, index: usize) -> Marker {
        let cycle = index / self.palette.len().max(1);
        Marker::ALL[cycle % Marker::ALL.len()]
    }

    /// Map a value onto the `colz` scale.
    pub fn z_color(&self, value: f64, (lo, hi): (f64, f64)) -> Color {
        let t = if hi > lo { (value - lo) / (hi - lo) } else { 0.0 };
        self.z_low.mix(self.series_color(0), t)
    }
}

/// Draw-mode flags parsed from a draw option string such as `"same colz"` or `"lp"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DrawMode {
    pub same: bool,
    pub colz: bool,
    pub text: bool,
    pub line: bool,
    pub points: bool,
    pub fill: bool,
}

impl DrawMode {
    pub fn parse(option: &str) -> Self {
        let lower = option.to_ascii_lowercase();
        let mut mode = DrawMode {
            same: lower.contains("same"),
            colz: lower.contains("colz"),
            text: lower.contains("text"),
            ..DrawMode::default()
        };
        // Single-letter flags only count outside the named keywords.
        let rest = lower.replace("same", "").replace("colz", "").replace("text", "");
        mode.line = rest.contains('l');
        mode.points = rest.contains('p');
        mode.fill = rest.contains('f');
        mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draw_mode_parses_keywords_and_letters() {
        let m = DrawMode::parse("same colz");
        assert!(m.same && m.colz && !m.line && !m.points);
        let m = DrawMode::parse("LP");
        assert!(m.line && m.points && !m.same);
        let m = DrawMode::parse("text");
        assert!(m.text && !m.points);
    }

    #[test]
    fn series_style_cycles() {
        let style = Style::default();
        let n = style.palette.len();
        assert_eq!(style.series_color(0), style.series_color(n));
        assert_eq!(style.series_marker(0), Marker::Circle);
        assert_eq!(style.series_marker(n), Marker::Square);
    }

    #[test]
    fn z_color_spans_scale() {
        let style = Style::default();
        assert_eq!(style.z_color(0.0, (0.0, 1.0)), Color::WHITE);
        assert_eq!(style.z_color(1.0, (0.0, 1.0)), style.series_color(0));
    }
}
