//! Drawable artifacts.
//!
//! An `Artifact` is everything a panel can hold: the primary histogram or graph
//! and the overlays drawn on top of it (fit curves, text, legends, bands). The
//! report builder owns artifacts until the page that holds them is flushed.

use serde::{Deserialize, Serialize};

use crate::domain::hist::{Histogram1D, Histogram2D};
use crate::domain::types::{Color, LineStyle, Marker, NdcRect, TextAttrs};

/// A series of `(x, y)` points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub x_title: String,
    #[serde(default)]
    pub y_title: String,
    pub points: Vec<(f64, f64)>,
    #[serde(default)]
    pub line: LineStyle,
    #[serde(default)]
    pub marker: Marker,
    /// Fixed y display range; `None` uses the data bounds.
    #[serde(default)]
    pub y_range: Option<(f64, f64)>,
}

impl Graph {
    pub fn new(name: impl Into<String>, title: impl Into<String>) -> Self {
        let title = title.into();
        let mut parts = title.split(';');
        Self {
            name: name.into(),
            title: parts.next().unwrap_or_default().to_string(),
            x_title: parts.next().unwrap_or_default().to_string(),
            y_title: parts.next().unwrap_or_default().to_string(),
            points: Vec::new(),
            line: LineStyle::default(),
            marker: Marker::default(),
            y_range: None,
        }
    }

    pub fn from_points(name: impl Into<String>, title: impl Into<String>, points: Vec<(f64, f64)>) -> Self {
        let mut graph = Self::new(name, title);
        graph.points = points;
        graph
    }

    pub fn push(&mut self, x: f64, y: f64) {
        self.points.push((x, y));
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// `(x_min, x_max, y_min, y_max)` over finite points.
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        bounds_of(self.points.iter().copied())
    }
}

/// Several graphs drawn together with a shared frame (one board's channels).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiGraph {
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub x_title: String,
    #[serde(default)]
    pub y_title: String,
    pub graphs: Vec<Graph>,
    #[serde(default)]
    pub y_range: Option<(f64, f64)>,
}

impl MultiGraph {
    pub fn new(name: impl Into<String>, title: impl Into<String>) -> Self {
        let title = title.into();
        let mut parts = title.split(';');
        Self {
            name: name.into(),
            title: parts.next().unwrap_or_default().to_string(),
            x_title: parts.next().unwrap_or_default().to_string(),
            y_title: parts.next().unwrap_or_default().to_string(),
            graphs: Vec::new(),
            y_range: None,
        }
    }

    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        bounds_of(self.graphs.iter().flat_map(|g| g.points.iter().copied()))
    }
}

/// A sampled function, typically a fit result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    pub name: String,
    pub points: Vec<(f64, f64)>,
    pub line: LineStyle,
}

impl Curve {
    /// Sample `f` at `n` evenly spaced points over `[x0, x1]`.
    pub fn sample(name: impl Into<String>, x0: f64, x1: f64, n: usize, line: LineStyle, f: impl Fn(f64) -> f64) -> Self {
        let n = n.max(2);
        let points = (0..n)
            .map(|i| {
                let x = x0 + (x1 - x0) * i as f64 / (n - 1) as f64;
                (x, f(x))
            })
            .filter(|(_, y)| y.is_finite())
            .collect();
        Self {
            name: name.into(),
            points,
            line,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    pub text: String,
    pub attrs: TextAttrs,
}

/// A box of text lines placed in panel coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBox {
    pub rect: NdcRect,
    pub lines: Vec<TextLine>,
    #[serde(default)]
    pub fill: Option<Color>,
    #[serde(default)]
    pub border: bool,
}

impl TextBox {
    pub fn new(rect: NdcRect) -> Self {
        Self {
            rect,
            lines: Vec::new(),
            fill: None,
            border: false,
        }
    }

    pub fn add_text(&mut self, text: impl Into<String>, attrs: TextAttrs) -> &mut TextLine {
        self.lines.push(TextLine {
            text: text.into(),
            attrs,
        });
        let last = self.lines.len() - 1;
        &mut self.lines[last]
    }

    pub fn with_line(mut self, text: impl Into<String>, attrs: TextAttrs) -> Self {
        self.add_text(text, attrs);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub label: String,
    pub color: Color,
    #[serde(default)]
    pub marker: Option<Marker>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Legend {
    pub rect: NdcRect,
    pub entries: Vec<LegendEntry>,
    pub columns: usize,
}

impl Legend {
    pub fn new(rect: NdcRect) -> Self {
        Self {
            rect,
            entries: Vec::new(),
            columns: 1,
        }
    }

    pub fn add_entry(&mut self, label: impl Into<String>, color: Color, marker: Option<Marker>) {
        self.entries.push(LegendEntry {
            label: label.into(),
            color,
            marker,
        });
    }
}

/// A shaded x-range; a missing y bound spans the whole frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub x_min: f64,
    pub x_max: f64,
    #[serde(default)]
    pub y_min: Option<f64>,
    #[serde(default)]
    pub y_max: Option<f64>,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Artifact {
    Hist1D(Histogram1D),
    Hist2D(Histogram2D),
    Graph(Graph),
    MultiGraph(MultiGraph),
    Curve(Curve),
    Text(TextBox),
    Legend(Legend),
    Band(Band),
}

impl Artifact {
    pub fn name(&self) -> &str {
        match self {
            Artifact::Hist1D(h) => &h.name,
            Artifact::Hist2D(h) => &h.name,
            Artifact::Graph(g) => &g.name,
            Artifact::MultiGraph(g) => &g.name,
            Artifact::Curve(c) => &c.name,
            Artifact::Text(_) => "text",
            Artifact::Legend(_) => "legend",
            Artifact::Band(_) => "band",
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Artifact::Hist1D(h) => &h.title,
            Artifact::Hist2D(h) => &h.title,
            Artifact::Graph(g) => &g.title,
            Artifact::MultiGraph(g) => &g.title,
            _ => "",
        }
    }

    pub fn kind_label(&self) -> &'static str {
        match self {
            Artifact::Hist1D(_) => "hist1d",
            Artifact::Hist2D(_) => "hist2d",
            Artifact::Graph(_) => "graph",
            Artifact::MultiGraph(_) => "multi_graph",
            Artifact::Curve(_) => "curve",
            Artifact::Text(_) => "text",
            Artifact::Legend(_) => "legend",
            Artifact::Band(_) => "band",
        }
    }

    /// Whether this artifact defines axes (can serve as a panel's frame).
    pub fn has_frame(&self) -> bool {
        matches!(
            self,
            Artifact::Hist1D(_) | Artifact::Hist2D(_) | Artifact::Graph(_) | Artifact::MultiGraph(_) | Artifact::Curve(_)
        )
    }
}

impl From<Histogram1D> for Artifact {
    fn from(value: Histogram1D) -> Self {
        Artifact::Hist1D(value)
    }
}

impl From<Histogram2D> for Artifact {
    fn from(value: Histogram2D) -> Self {
        Artifact::Hist2D(value)
    }
}

impl From<Graph> for Artifact {
    fn from(value: Graph) -> Self {
        Artifact::Graph(value)
    }
}

impl From<MultiGraph> for Artifact {
    fn from(value: MultiGraph) -> Self {
        Artifact::MultiGraph(value)
    }
}

impl From<Curve> for Artifact {
    fn from(value: Curve) -> Self {
        Artifact::Curve(value)
    }
}

impl From<TextBox> for Artifact {
    fn from(value: TextBox) -> Self {
        Artifact::Text(value)
    }
}

impl From<Legend> for Artifact {
    fn from(value: Legend) -> Self {
        Artifact::Legend(value)
    }
}

impl From<Band> for Artifact {
    fn from(value: Band) -> Self {
        Artifact::Band(value)
    }
}

fn bounds_of(points: impl Iterator<Item = (f64, f64)>) -> Option<(f64, f64, f64, f64)> {
    let mut out: Option<(f64, f64, f64, f64)> = None;
    for (x, y) in points.filter(|(x, y)| x.is_finite() && y.is_finite()) {
        out = Some(match out {
            None => (x, x, y, y),
            Some((x0, x1, y0, y1)) => (x0.min(x), x1.max(x), y0.min(y), y1.max(y)),
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_title_split_and_bounds() {
        let mut g = Graph::new("ui", "UI curve;U (V);I (uA)");
        assert_eq!(g.x_title, "U (V)");
        assert_eq!(g.y_title, "I (uA)");
        assert!(g.bounds().is_none());
        g.push(1.0, 5.0);
        g.push(3.0, f64::NAN);
        g.push(2.0, -1.0);
        assert_eq!(g.bounds(), Some((1.0, 2.0, -1.0, 5.0)));
    }

    #[test]
    fn curve_sample_drops_non_finite() {
        let c = Curve::sample("inv", -1.0, 1.0, 3, LineStyle::default(), |x| 1.0 / x);
        assert_eq!(c.points.len(), 2);
    }

    #[test]
    fn artifact_serializes_with_kind_tag() {
        let art = Artifact::from(Band {
            x_min: 0.0,
            x_max: 1.0,
            y_min: None,
            y_max: None,
            color: Color::GRAY,
        });
        let json = serde_json::to_value(&art).unwrap();
        assert_eq!(json["kind"], "band");
    }
}
