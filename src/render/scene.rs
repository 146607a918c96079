//! Backend-neutral page painter.
//!
//! Pages are laid out in PDF points with the origin at the bottom-left corner.
//! Panels split the page into an `nx × ny` grid (row-major, first row on top);
//! each panel's frame is its area shrunk by the panel margins. Everything that
//! a panel holds is painted through the `Surface` primitives, so the PDF sink
//! and the image exporters produce the same picture.

use crate::domain::{
    Align, Artifact, Band, Color, Curve, Dash, DrawMode, Graph, Histogram1D, Histogram2D, Legend, LineStyle,
    Marker, NdcRect, Style, TextBox,
};
use crate::error::AppError;
use crate::render::{Font, Surface};
use crate::report::format::format_tick;
use crate::report::page::{Page, Panel};

const MAX_TICKS: usize = 50;

/// Rectangle in page points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Rect {
    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    /// Sub-rectangle given in NDC of `self`.
    pub fn sub(&self, ndc: &NdcRect) -> Rect {
        Rect {
            x0: self.x0 + ndc.x1 * self.width(),
            y0: self.y0 + ndc.y1 * self.height(),
            x1: self.x0 + ndc.x2 * self.width(),
            y1: self.y0 + ndc.y2 * self.height(),
        }
    }

    fn corners(&self) -> [(f64, f64); 4] {
        [(self.x0, self.y0), (self.x1, self.y0), (self.x1, self.y1), (self.x0, self.y1)]
    }

    fn outline(&self) -> [(f64, f64); 5] {
        [
            (self.x0, self.y0),
            (self.x1, self.y0),
            (self.x1, self.y1),
            (self.x0, self.y1),
            (self.x0, self.y0),
        ]
    }
}

/// Area of the 1-based panel `index` on a page of `size` points.
pub fn panel_area(page: &Page, index: usize, (w, h): (f64, f64)) -> Rect {
    let nx = page.nx.max(1);
    let ny = page.ny.max(1);
    let col = (index.saturating_sub(1)) % nx;
    let row = (index.saturating_sub(1)) / nx;
    let cw = w / nx as f64;
    let ch = h / ny as f64;
    Rect {
        x0: col as f64 * cw,
        y0: h - (row + 1) as f64 * ch,
        x1: (col + 1) as f64 * cw,
        y1: h - row as f64 * ch,
    }
}

/// Linear or log10 mapping from data to page coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisMap {
    pub lo: f64,
    pub hi: f64,
    pub log: bool,
    p0: f64,
    p1: f64,
}

impl AxisMap {
    /// A log request on a range that is not strictly positive falls back to linear.
    pub fn new(lo: f64, hi: f64, log: bool, p0: f64, p1: f64) -> Self {
        let (lo, hi) = widen(lo, hi);
        let log = log && lo > 0.0;
        Self { lo, hi, log, p0, p1 }
    }

    fn fraction(&self, v: f64) -> Option<f64> {
        if !v.is_finite() {
            return None;
        }
        if self.log {
            if v <= 0.0 {
                return None;
            }
            Some((v.log10() - self.lo.log10()) / (self.hi.log10() - self.lo.log10()))
        } else {
            Some((v - self.lo) / (self.hi - self.lo))
        }
    }

    pub fn map(&self, v: f64) -> Option<f64> {
        self.fraction(v).map(|t| self.p0 + t * (self.p1 - self.p0))
    }

    /// Map and clamp into the frame. Non-positive values on a log axis land on the low edge.
    pub fn map_clamped(&self, v: f64) -> f64 {
        let t = self.fraction(v).map_or(0.0, |t| t.clamp(0.0, 1.0));
        self.p0 + t * (self.p1 - self.p0)
    }

    pub fn contains(&self, v: f64) -> bool {
        matches!(self.fraction(v), Some(t) if (-1e-9..=1.0 + 1e-9).contains(&t))
    }

    /// Tick positions with the step used to format them.
    pub fn ticks(&self) -> Vec<(f64, f64)> {
        if self.log {
            let first = (self.lo.log10() - 1e-9).ceil() as i32;
            let last = (self.hi.log10() + 1e-9).floor() as i32;
            return (first..=last).map(|e| (10f64.powi(e), 10f64.powi(e))).collect();
        }
        let step = nice_step(self.hi - self.lo, 5);
        let first = (self.lo / step).ceil();
        let count = ((self.hi - first * step) / step + 1e-9).floor();
        if !(count.is_finite() && count >= 0.0) {
            return Vec::new();
        }
        let mut out: Vec<(f64, f64)> = Vec::new();
        // Counted, so ranges narrower than the float spacing still terminate.
        for k in 0..=(count as usize).min(MAX_TICKS) {
            let v = (first + k as f64) * step;
            let snapped = if v.abs() < step * 1e-9 { 0.0 } else { v };
            if out.last().is_some_and(|&(last, _)| last == snapped) {
                continue;
            }
            out.push((snapped, step));
        }
        out
    }
}

fn widen(lo: f64, hi: f64) -> (f64, f64) {
    if !(lo.is_finite() && hi.is_finite()) {
        return (0.0, 1.0);
    }
    if hi > lo {
        return (lo, hi);
    }
    let pad = if lo == 0.0 { 1.0 } else { 0.5 * lo.abs() };
    (lo - pad, hi + pad)
}

/// 1, 2 or 5 times a power of ten, giving roughly `target` intervals over `span`.
pub fn nice_step(span: f64, target: usize) -> f64 {
    if !(span.is_finite() && span > 0.0) {
        return 1.0;
    }
    let raw = span / target.max(1) as f64;
    let mag = 10f64.powf(raw.log10().floor());
    let norm = raw / mag;
    let factor = if norm < 1.5 {
        1.0
    } else if norm < 3.0 {
        2.0
    } else if norm < 7.0 {
        5.0
    } else {
        10.0
    };
    factor * mag
}

/// A panel's frame with its axis maps.
struct Frame {
    rect: Rect,
    x: AxisMap,
    y: AxisMap,
}

impl Frame {
    fn point(&self, (x, y): (f64, f64)) -> Option<(f64, f64)> {
        Some((self.x.map(x)?, self.y.map(y)?))
    }

    fn clamped(&self, (x, y): (f64, f64)) -> (f64, f64) {
        (self.x.map_clamped(x), self.y.map_clamped(y))
    }
}

/// Paint a whole page onto `surface`.
pub fn paint_page(page: &Page, style: &Style, size: (f64, f64), surface: &mut dyn Surface) -> Result<(), AppError> {
    let full = Rect {
        x0: 0.0,
        y0: 0.0,
        x1: size.0,
        y1: size.1,
    };
    surface.fill(&full.corners(), Color::WHITE)?;

    for panel in page.panels.iter().filter(|p| !p.is_empty()) {
        let area = panel_area(page, panel.index, size);
        paint_panel(panel, area, style, surface)?;
    }
    for decoration in &page.decorations {
        paint_text_box(decoration, full, surface)?;
    }
    Ok(())
}

fn paint_panel(panel: &Panel, area: Rect, style: &Style, surface: &mut dyn Surface) -> Result<(), AppError> {
    let frame = panel
        .frame_layer()
        .map(|layer| frame_for(&layer.artifact, panel, area.sub(&panel.margins.frame())));

    if let Some(frame) = &frame {
        if panel.grid {
            paint_grid(frame, style, surface)?;
        }
    }

    for (i, layer) in panel.layers.iter().enumerate() {
        match (&layer.artifact, &frame) {
            (Artifact::Hist1D(h), Some(f)) => paint_hist1d(h, layer.mode, i, f, style, surface)?,
            (Artifact::Hist2D(h), Some(f)) => paint_hist2d(h, layer.mode, panel.log_z, f, style, surface)?,
            (Artifact::Graph(g), Some(f)) => paint_graph(g, layer.mode, area, f, surface)?,
            (Artifact::MultiGraph(g), Some(f)) => {
                for graph in &g.graphs {
                    paint_graph(graph, layer.mode, area, f, surface)?;
                }
            }
            (Artifact::Curve(c), Some(f)) => paint_curve(c, f, surface)?,
            (Artifact::Band(b), Some(f)) => paint_band(b, f, surface)?,
            (Artifact::Text(t), _) => paint_text_box(t, area, surface)?,
            (Artifact::Legend(l), _) => paint_legend(l, area, surface)?,
            _ => {}
        }
    }

    if let Some(frame) = &frame {
        paint_axes(frame, panel, area, style, surface)?;
        if panel.show_stats {
            if let Some(Artifact::Hist1D(h)) = panel.primary() {
                paint_stats(h, area, surface)?;
            }
        }
    }

    let title = panel
        .title
        .as_deref()
        .or_else(|| panel.primary().map(|a| a.title()))
        .unwrap_or_default();
    if !title.is_empty() {
        let font = Font {
            size: 0.05 * area.height(),
            color: Color::BLACK,
            bold: false,
            align: Align::Center,
            vertical: false,
        };
        let y = area.y1 - 1.1 * font.size;
        surface.text(title, (0.5 * (area.x0 + area.x1), y), &font)?;
    }
    Ok(())
}

fn frame_for(artifact: &Artifact, panel: &Panel, rect: Rect) -> Frame {
    let (x0, x1, y0, y1) = match artifact {
        Artifact::Hist1D(h) => {
            let (x0, x1) = h.x.visible_range();
            let (y0, y1) = hist_y_range(h, panel.log_y);
            (x0, x1, y0, y1)
        }
        Artifact::Hist2D(h) => {
            let (x0, x1) = h.x.visible_range();
            let (y0, y1) = h.y.visible_range();
            (x0, x1, y0, y1)
        }
        Artifact::Graph(g) => padded(g.bounds(), g.y_range),
        Artifact::MultiGraph(g) => padded(g.bounds(), g.y_range),
        Artifact::Curve(c) => padded(curve_bounds(c), None),
        _ => (0.0, 1.0, 0.0, 1.0),
    };
    Frame {
        rect,
        x: AxisMap::new(x0, x1, panel.log_x, rect.x0, rect.x1),
        y: AxisMap::new(y0, y1, panel.log_y, rect.y0, rect.y1),
    }
}

fn hist_y_range(h: &Histogram1D, log: bool) -> (f64, f64) {
    let max = h.maximum();
    if !(max.is_finite() && max > 0.0) {
        return (0.0, 1.0);
    }
    if log {
        let (first, last) = h.x.visible_bins();
        let min_pos = (first..=last)
            .map(|b| h.bin_content(b))
            .filter(|v| *v > 0.0)
            .fold(f64::INFINITY, f64::min);
        return (0.5 * min_pos.min(max), 2.0 * max);
    }
    (h.minimum().min(0.0), 1.1 * max)
}

fn curve_bounds(c: &Curve) -> Option<(f64, f64, f64, f64)> {
    let mut out: Option<(f64, f64, f64, f64)> = None;
    for &(x, y) in &c.points {
        out = Some(match out {
            None => (x, x, y, y),
            Some((a, b, c, d)) => (a.min(x), b.max(x), c.min(y), d.max(y)),
        });
    }
    out
}

fn padded(bounds: Option<(f64, f64, f64, f64)>, y_range: Option<(f64, f64)>) -> (f64, f64, f64, f64) {
    let (x0, x1, y0, y1) = bounds.unwrap_or((0.0, 1.0, 0.0, 1.0));
    let (y0, y1) = match y_range {
        Some(range) => range,
        None => {
            let pad = 0.05 * (y1 - y0);
            (y0 - pad, y1 + pad)
        }
    };
    let pad = 0.02 * (x1 - x0);
    (x0 - pad, x1 + pad, y0, y1)
}

fn paint_grid(frame: &Frame, style: &Style, surface: &mut dyn Surface) -> Result<(), AppError> {
    let line = LineStyle {
        color: style.grid_color,
        width: 0.4,
        dash: Dash::Dotted,
    };
    let r = frame.rect;
    for (v, _) in frame.x.ticks() {
        if let Some(px) = frame.x.map(v) {
            surface.stroke(&[(px, r.y0), (px, r.y1)], &line)?;
        }
    }
    for (v, _) in frame.y.ticks() {
        if let Some(py) = frame.y.map(v) {
            surface.stroke(&[(r.x0, py), (r.x1, py)], &line)?;
        }
    }
    Ok(())
}

fn paint_axes(frame: &Frame, panel: &Panel, area: Rect, style: &Style, surface: &mut dyn Surface) -> Result<(), AppError> {
    let r = frame.rect;
    surface.stroke(&r.outline(), &LineStyle::default())?;

    let h = area.height();
    let tick = 0.015 * h;
    let label = Font {
        size: style.label_size * h,
        color: Color::BLACK,
        bold: false,
        align: Align::Center,
        vertical: false,
    };
    for (v, step) in frame.x.ticks() {
        let Some(px) = frame.x.map(v) else { continue };
        surface.stroke(&[(px, r.y0), (px, r.y0 + tick)], &LineStyle::default())?;
        surface.text(&format_tick(v, step), (px, r.y0 - 1.1 * label.size), &label)?;
    }
    let label = Font {
        align: Align::Right,
        ..label
    };
    for (v, step) in frame.y.ticks() {
        let Some(py) = frame.y.map(v) else { continue };
        surface.stroke(&[(r.x0, py), (r.x0 + tick, py)], &LineStyle::default())?;
        surface.text(&format_tick(v, step), (r.x0 - 0.5 * label.size, py - 0.35 * label.size), &label)?;
    }

    let (x_title, y_title) = axis_titles(panel);
    let title_size = if panel.dense {
        style.dense_axis_title_size
    } else {
        style.axis_title_size
    };
    let title = Font {
        size: title_size * h,
        color: Color::BLACK,
        bold: false,
        align: Align::Right,
        vertical: false,
    };
    if !x_title.is_empty() {
        surface.text(x_title, (r.x1, area.y0 + 0.25 * title.size), &title)?;
    }
    if !y_title.is_empty() {
        let vertical = Font { vertical: true, ..title };
        surface.text(y_title, (area.x0 + 1.0 * title.size, r.y1), &vertical)?;
    }
    Ok(())
}

fn axis_titles(panel: &Panel) -> (&str, &str) {
    match panel.frame_layer().map(|l| &l.artifact) {
        Some(Artifact::Hist1D(h)) => (&h.x.title, &h.y_title),
        Some(Artifact::Hist2D(h)) => (&h.x.title, &h.y.title),
        Some(Artifact::Graph(g)) => (&g.x_title, &g.y_title),
        Some(Artifact::MultiGraph(g)) => (&g.x_title, &g.y_title),
        _ => ("", ""),
    }
}

fn paint_hist1d(
    h: &Histogram1D,
    mode: DrawMode,
    layer: usize,
    frame: &Frame,
    style: &Style,
    surface: &mut dyn Surface,
) -> Result<(), AppError> {
    let line = if layer == 0 {
        style.hist_line
    } else {
        LineStyle::colored(style.series_color(layer))
    };
    let (first, last) = h.x.visible_bins();
    let base = frame.y.map_clamped(if frame.y.log { frame.y.lo } else { 0.0 });

    let mut step = Vec::with_capacity(2 * (last - first + 1) + 2);
    step.push((frame.x.map_clamped(h.x.low_edge(first)), base));
    for bin in first..=last {
        let y = frame.y.map_clamped(h.bin_content(bin));
        step.push((frame.x.map_clamped(h.x.low_edge(bin)), y));
        step.push((frame.x.map_clamped(h.x.low_edge(bin + 1)), y));
    }
    step.push((frame.x.map_clamped(h.x.low_edge(last + 1)), base));

    if mode.fill {
        surface.fill(&step, line.color.mix(Color::WHITE, 0.6))?;
    }
    if mode.points {
        for bin in first..=last {
            if let Some(p) = frame.point((h.bin_center(bin), h.bin_content(bin))) {
                paint_marker(Marker::Circle, p, 0.006 * frame.rect.height(), line.color, surface)?;
            }
        }
    } else {
        surface.stroke(&step, &line)?;
    }
    Ok(())
}

fn paint_hist2d(
    h: &Histogram2D,
    mode: DrawMode,
    log_z: bool,
    frame: &Frame,
    style: &Style,
    surface: &mut dyn Surface,
) -> Result<(), AppError> {
    let (z_lo, z_hi) = h.z_bounds();
    let scale = |v: f64| -> f64 {
        if log_z && z_hi > 0.0 {
            let floor = (z_hi * 1e-3).max(f64::MIN_POSITIVE);
            (v.max(floor).log10() - floor.log10()) / (z_hi.log10() - floor.log10())
        } else if z_hi > z_lo {
            (v - z_lo) / (z_hi - z_lo)
        } else {
            0.0
        }
    };

    let (fx, lx) = h.x.visible_bins();
    let (fy, ly) = h.y.visible_bins();
    for iy in fy..=ly {
        for ix in fx..=lx {
            let v = h.bin_content(ix, iy);
            if v <= z_lo && !mode.colz {
                continue;
            }
            if v == 0.0 {
                continue;
            }
            let cell = Rect {
                x0: frame.x.map_clamped(h.x.low_edge(ix)),
                y0: frame.y.map_clamped(h.y.low_edge(iy)),
                x1: frame.x.map_clamped(h.x.low_edge(ix + 1)),
                y1: frame.y.map_clamped(h.y.low_edge(iy + 1)),
            };
            if !mode.text || mode.colz {
                surface.fill(&cell.corners(), style.z_color(scale(v), (0.0, 1.0)))?;
            }
            if mode.text {
                let font = Font {
                    size: (0.45 * cell.height()).min(0.03 * frame.rect.height() * 2.0),
                    color: Color::BLACK,
                    bold: false,
                    align: Align::Center,
                    vertical: false,
                };
                let at = (0.5 * (cell.x0 + cell.x1), 0.5 * (cell.y0 + cell.y1) - 0.35 * font.size);
                surface.text(&format_cell(v), at, &font)?;
            }
        }
    }
    Ok(())
}

/// Text for one 2-D cell: integers without decimals, everything else with three.
pub fn format_cell(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e9 {
        format!("{v:.0}")
    } else {
        format!("{v:.3}")
    }
}

fn paint_graph(g: &Graph, mode: DrawMode, area: Rect, frame: &Frame, surface: &mut dyn Surface) -> Result<(), AppError> {
    let draw_line = mode.line || !mode.points;
    let draw_points = mode.points || !mode.line;
    if draw_line {
        let pts: Vec<(f64, f64)> = g.points.iter().map(|&p| frame.clamped(p)).collect();
        if pts.len() >= 2 {
            surface.stroke(&pts, &g.line)?;
        }
    }
    if draw_points {
        let size = (0.006 * area.height()).max(1.2);
        for &p in &g.points {
            if frame.x.contains(p.0) && frame.y.contains(p.1) {
                if let Some(at) = frame.point(p) {
                    paint_marker(g.marker, at, size, g.line.color, surface)?;
                }
            }
        }
    }
    Ok(())
}

fn paint_curve(c: &Curve, frame: &Frame, surface: &mut dyn Surface) -> Result<(), AppError> {
    let pts: Vec<(f64, f64)> = c
        .points
        .iter()
        .filter(|(x, _)| frame.x.contains(*x))
        .map(|&p| frame.clamped(p))
        .collect();
    if pts.len() >= 2 {
        surface.stroke(&pts, &c.line)?;
    }
    Ok(())
}

fn paint_band(b: &Band, frame: &Frame, surface: &mut dyn Surface) -> Result<(), AppError> {
    let rect = Rect {
        x0: frame.x.map_clamped(b.x_min),
        x1: frame.x.map_clamped(b.x_max),
        y0: b.y_min.map_or(frame.rect.y0, |v| frame.y.map_clamped(v)),
        y1: b.y_max.map_or(frame.rect.y1, |v| frame.y.map_clamped(v)),
    };
    surface.fill(&rect.corners(), b.color.mix(Color::WHITE, 0.6))
}

fn paint_marker(marker: Marker, (x, y): (f64, f64), r: f64, color: Color, surface: &mut dyn Surface) -> Result<(), AppError> {
    match marker {
        Marker::Circle => {
            let pts: Vec<(f64, f64)> = (0..8)
                .map(|k| {
                    let a = std::f64::consts::PI * k as f64 / 4.0;
                    (x + r * a.cos(), y + r * a.sin())
                })
                .collect();
            surface.fill(&pts, color)
        }
        Marker::Square => surface.fill(&[(x - r, y - r), (x + r, y - r), (x + r, y + r), (x - r, y + r)], color),
        Marker::Triangle => surface.fill(&[(x - r, y - r), (x + r, y - r), (x, y + r)], color),
        Marker::Cross => {
            let line = LineStyle::colored(color);
            surface.stroke(&[(x - r, y - r), (x + r, y + r)], &line)?;
            surface.stroke(&[(x - r, y + r), (x + r, y - r)], &line)
        }
    }
}

/// Paint a text box whose rect is in NDC of `area`.
pub fn paint_text_box(tb: &TextBox, area: Rect, surface: &mut dyn Surface) -> Result<(), AppError> {
    let rect = area.sub(&tb.rect);
    if let Some(fill) = tb.fill {
        surface.fill(&rect.corners(), fill)?;
    }
    if tb.border {
        surface.stroke(&rect.outline(), &LineStyle::default())?;
    }
    let pad = 0.01 * area.width();
    let mut y = rect.y1;
    for line in &tb.lines {
        let size = line.attrs.size * area.height();
        y -= 1.25 * size;
        let x = match line.attrs.align {
            Align::Left => rect.x0 + pad,
            Align::Center => 0.5 * (rect.x0 + rect.x1),
            Align::Right => rect.x1 - pad,
        };
        let font = Font {
            size,
            color: line.attrs.color,
            bold: line.attrs.bold,
            align: line.attrs.align,
            vertical: false,
        };
        surface.text(&line.text, (x, y), &font)?;
    }
    Ok(())
}

fn paint_legend(legend: &Legend, area: Rect, surface: &mut dyn Surface) -> Result<(), AppError> {
    let rect = area.sub(&legend.rect);
    surface.fill(&rect.corners(), Color::WHITE)?;
    surface.stroke(&rect.outline(), &LineStyle::default())?;
    if legend.entries.is_empty() {
        return Ok(());
    }

    let columns = legend.columns.max(1);
    let rows = legend.entries.len().div_ceil(columns);
    let row_h = rect.height() / rows as f64;
    let col_w = rect.width() / columns as f64;
    let size = (0.6 * row_h).min(0.04 * area.height());
    for (i, entry) in legend.entries.iter().enumerate() {
        let col = i % columns;
        let row = i / columns;
        let x = rect.x0 + col as f64 * col_w;
        let mid_y = rect.y1 - (row as f64 + 0.5) * row_h;
        let swatch = (x + 0.05 * col_w, x + 0.25 * col_w);
        surface.stroke(&[(swatch.0, mid_y), (swatch.1, mid_y)], &LineStyle::colored(entry.color))?;
        if let Some(marker) = entry.marker {
            paint_marker(marker, (0.5 * (swatch.0 + swatch.1), mid_y), 0.3 * size, entry.color, surface)?;
        }
        let font = Font {
            size,
            color: Color::BLACK,
            bold: false,
            align: Align::Left,
            vertical: false,
        };
        surface.text(&entry.label, (x + 0.3 * col_w, mid_y - 0.35 * size), &font)?;
    }
    Ok(())
}

fn paint_stats(h: &Histogram1D, area: Rect, surface: &mut dyn Surface) -> Result<(), AppError> {
    let attrs = crate::domain::TextAttrs {
        size: 0.035,
        ..Default::default()
    };
    let mut tb = TextBox::new(NdcRect::new(0.72, 0.78, 0.98, 0.98));
    tb.fill = Some(Color::WHITE);
    tb.border = true;
    tb.add_text(h.name.clone(), attrs);
    tb.add_text(format!("Entries = {}", h.entries), attrs);
    tb.add_text(format!("Mean = {:.4}", h.mean()), attrs);
    tb.add_text(format!("Std Dev = {:.4}", h.rms()), attrs);
    paint_text_box(&tb, area, surface)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::options::ReportOptions;

    #[derive(Default)]
    struct Recorder {
        strokes: usize,
        fills: usize,
        texts: Vec<String>,
    }

    impl Surface for Recorder {
        fn stroke(&mut self, _: &[(f64, f64)], _: &LineStyle) -> Result<(), AppError> {
            self.strokes += 1;
            Ok(())
        }

        fn fill(&mut self, _: &[(f64, f64)], _: Color) -> Result<(), AppError> {
            self.fills += 1;
            Ok(())
        }

        fn text(&mut self, text: &str, _: (f64, f64), _: &Font) -> Result<(), AppError> {
            self.texts.push(text.to_string());
            Ok(())
        }
    }

    #[test]
    fn panel_areas_tile_the_page_row_major() {
        let opts = ReportOptions {
            nx: 2,
            ny: 2,
            ..ReportOptions::default()
        };
        let page = Page::content(&opts);
        let first = panel_area(&page, 1, (100.0, 50.0));
        assert_eq!((first.x0, first.y0, first.x1, first.y1), (0.0, 25.0, 50.0, 50.0));
        let last = panel_area(&page, 4, (100.0, 50.0));
        assert_eq!((last.x0, last.y0, last.x1, last.y1), (50.0, 0.0, 100.0, 25.0));
    }

    #[test]
    fn nice_steps() {
        assert_eq!(nice_step(10.0, 5), 2.0);
        assert_eq!(nice_step(1.0, 5), 0.2);
        assert_eq!(nice_step(15.0, 5), 5.0);
        assert_eq!(nice_step(0.0, 5), 1.0);
    }

    #[test]
    fn linear_ticks_cover_the_range() {
        let axis = AxisMap::new(0.0, 10.0, false, 0.0, 100.0);
        let values: Vec<f64> = axis.ticks().iter().map(|&(v, _)| v).collect();
        assert_eq!(values, vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
    }

    #[test]
    fn ticks_terminate_on_ranges_below_float_spacing() {
        // Spacing of f64 around 1e20 is 16384, larger than twice the tick step.
        let axis = AxisMap::new(1e20, 1e20 + 32768.0, false, 0.0, 100.0);
        let ticks = axis.ticks();
        assert!(ticks.len() <= 8, "{ticks:?}");
        assert!(ticks.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn log_axis_falls_back_when_range_not_positive() {
        let axis = AxisMap::new(-1.0, 10.0, true, 0.0, 100.0);
        assert!(!axis.log);
        let axis = AxisMap::new(1.0, 1000.0, true, 0.0, 90.0);
        assert!(axis.log);
        assert!((axis.map(10.0).unwrap() - 30.0).abs() < 1e-9);
        assert_eq!(axis.ticks().len(), 4);
        assert_eq!(axis.map(0.0), None);
    }

    #[test]
    fn degenerate_range_is_widened() {
        let axis = AxisMap::new(5.0, 5.0, false, 0.0, 1.0);
        assert!(axis.hi > axis.lo);
        assert!(axis.contains(5.0));
    }

    #[test]
    fn histogram_panel_draws_titles_and_ticks() {
        let mut page = Page::content(&ReportOptions::default());
        let mut h = Histogram1D::new("hVop", "Operating voltage;V_{op} (V);Channels", 10, 50.0, 60.0).unwrap();
        h.fill(55.0);
        let panel = page.panel_mut(1).unwrap();
        panel.push(h.into(), DrawMode::default());
        panel.show_stats = true;

        let mut rec = Recorder::default();
        paint_page(&page, &Style::default(), (842.0, 526.0), &mut rec).unwrap();
        assert!(rec.texts.iter().any(|t| t == "Operating voltage"));
        assert!(rec.texts.iter().any(|t| t == "Channels"));
        assert!(rec.texts.iter().any(|t| t == "Entries = 1"));
        assert!(rec.strokes > 5);
    }

    #[test]
    fn blank_page_paints_only_background() {
        let page = Page::content(&ReportOptions::default());
        let mut rec = Recorder::default();
        paint_page(&page, &Style::default(), (842.0, 526.0), &mut rec).unwrap();
        assert_eq!(rec.fills, 1);
        assert_eq!(rec.strokes, 0);
        assert!(rec.texts.is_empty());
    }

    #[test]
    fn cell_format() {
        assert_eq!(format_cell(12.0), "12");
        assert_eq!(format_cell(0.5), "0.500");
    }
}
