//! Pages and panels as held by the report builder until they are flushed.

use serde::Serialize;

use crate::domain::{Artifact, DrawMode, NdcRect, TextAttrs, TextBox};
use crate::report::options::ReportOptions;

/// Frame margins as fractions of the panel size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Margins {
    pub fn from_options(opts: &ReportOptions) -> Self {
        Self {
            left: opts.margin_left,
            right: opts.margin_right,
            top: opts.margin_top,
            bottom: opts.margin_bottom,
        }
    }

    /// The frame area in panel NDC.
    pub fn frame(&self) -> NdcRect {
        NdcRect::new(self.left, self.bottom, 1.0 - self.right, 1.0 - self.top)
    }
}

/// One artifact placed on a panel.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub artifact: Artifact,
    pub mode: DrawMode,
}

/// One cell of the page grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    /// 1-based position on the page, row-major.
    pub index: usize,
    pub title: Option<String>,
    /// First layer is the panel's frame; the rest are overlays.
    pub layers: Vec<Layer>,
    pub margins: Margins,
    pub grid: bool,
    pub log_x: bool,
    pub log_y: bool,
    pub log_z: bool,
    /// Enlarged axis titles for crowded pages.
    pub dense: bool,
    pub show_stats: bool,
}

impl Panel {
    pub fn new(index: usize, margins: Margins, grid: bool) -> Self {
        Self {
            index,
            title: None,
            layers: Vec::new(),
            margins,
            grid,
            log_x: false,
            log_y: false,
            log_z: false,
            dense: false,
            show_stats: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn primary(&self) -> Option<&Artifact> {
        self.layers.first().map(|l| &l.artifact)
    }

    pub fn push(&mut self, artifact: Artifact, mut mode: DrawMode) {
        mode.same = !self.layers.is_empty();
        self.layers.push(Layer { artifact, mode });
    }

    /// The first layer that defines axes.
    pub fn frame_layer(&self) -> Option<&Layer> {
        self.layers.iter().find(|l| l.artifact.has_frame())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageKind {
    Cover,
    Content,
    BackCover,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub kind: PageKind,
    /// Printed page number; covers carry the count of content pages so far.
    pub number: usize,
    /// Outline label.
    pub title: String,
    pub nx: usize,
    pub ny: usize,
    pub panels: Vec<Panel>,
    /// Text placed in page NDC, outside any panel.
    pub decorations: Vec<TextBox>,
}

impl Page {
    pub fn content(opts: &ReportOptions) -> Self {
        let margins = Margins::from_options(opts);
        Self {
            kind: PageKind::Content,
            number: 0,
            title: String::new(),
            nx: opts.nx,
            ny: opts.ny,
            panels: (1..=opts.panels_per_page())
                .map(|i| Panel::new(i, margins, opts.show_grid))
                .collect(),
            decorations: Vec::new(),
        }
    }

    /// A cover or back cover: no panels, only decorations.
    pub fn title_page(kind: PageKind, number: usize, title: impl Into<String>) -> Self {
        Self {
            kind,
            number,
            title: title.into(),
            nx: 1,
            ny: 1,
            panels: Vec::new(),
            decorations: Vec::new(),
        }
    }

    pub fn panel(&self, index: usize) -> Option<&Panel> {
        index.checked_sub(1).and_then(|i| self.panels.get(i))
    }

    pub fn panel_mut(&mut self, index: usize) -> Option<&mut Panel> {
        index.checked_sub(1).and_then(move |i| self.panels.get_mut(i))
    }

    pub fn filled_panels(&self) -> usize {
        self.panels.iter().filter(|p| !p.is_empty()).count()
    }

    pub fn artifact_count(&self) -> usize {
        self.panels.iter().map(|p| p.layers.len()).sum()
    }

    /// Name of the first drawn artifact, used to label image exports.
    pub fn primary_name(&self) -> Option<&str> {
        self.panels.iter().find_map(|p| p.primary()).map(|a| a.name())
    }

    pub fn is_blank(&self) -> bool {
        self.filled_panels() == 0 && self.decorations.is_empty()
    }

    /// Add the page number in the bottom-right corner.
    pub fn stamp_number(&mut self) {
        let label = TextBox::new(NdcRect::new(0.90, 0.0, 0.99, 0.04)).with_line(
            self.number.to_string(),
            TextAttrs::footnote(),
        );
        self.decorations.push(label);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Histogram1D;

    #[test]
    fn content_page_has_grid_of_empty_panels() {
        let opts = ReportOptions {
            nx: 3,
            ny: 2,
            ..ReportOptions::default()
        };
        let page = Page::content(&opts);
        assert_eq!(page.panels.len(), 6);
        assert!(page.is_blank());
        assert!(page.panel(0).is_none());
        assert_eq!(page.panel(6).map(|p| p.index), Some(6));
        assert!(page.panel(7).is_none());
    }

    #[test]
    fn overlays_are_forced_to_same() {
        let mut page = Page::content(&ReportOptions::default());
        let panel = page.panel_mut(1).unwrap();
        let h = Histogram1D::new("h", "", 4, 0.0, 1.0).unwrap();
        panel.push(h.clone().into(), DrawMode::default());
        panel.push(h.into(), DrawMode::default());
        assert!(!panel.layers[0].mode.same);
        assert!(panel.layers[1].mode.same);
        assert_eq!(page.artifact_count(), 2);
        assert_eq!(page.primary_name(), Some("h"));
    }
}
