//! Paginated report builder.
//!
//! A report is a cover page, any number of content pages holding an `nx × ny`
//! grid of panels, and a back cover, written to one PDF. Drawing an artifact
//! takes the next free panel; a full page is flushed automatically.
//!
//! Lifecycle:
//!
//! ```text
//! Unopened --print_cover--> CoverPrinted --draw/next_pad--> PanelFilling
//!     PanelFilling <--draw--> PagePrinted (after a flush)
//!     any open state --print_back_cover--> BackCoverPrinted --close--> Closed
//! ```
//!
//! Out-of-order calls are `State` errors. `close` (or dropping the builder)
//! adds the missing cover or back cover, flushes the pending page and writes
//! the file, so a finished report always has exactly one of each.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::domain::{
    Align, Artifact, Band, DrawMode, Histogram1D, Histogram2D, Legend, NdcRect, Style, TextAttrs, TextBox,
};
use crate::error::AppError;
use crate::fit::peak::{PeakFitOptions, PeakFitOutcome};
use crate::io::store::ObjectStore;
use crate::render::{PdfSink, export_page_images};
use crate::report::options::{ReportOptions, resolve_output_path, structured_path};
use crate::report::page::{Page, PageKind, Panel};

pub const DEFAULT_BACK_COVER: &str = "Thanks for your attention!";
pub const DEFAULT_PAGE_LABEL: &str = "Start";

const COVER_TITLE_RECT: NdcRect = NdcRect::new(0.05, 0.40, 0.95, 0.60);
const COVER_FOOTNOTE_RECT: NdcRect = NdcRect::new(0.50, 0.02, 0.98, 0.16);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportState {
    Unopened,
    CoverPrinted,
    PanelFilling,
    PagePrinted,
    BackCoverPrinted,
    Closed,
}

/// Per-draw options.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawOptions {
    /// Panel title; the artifact title when unset.
    pub title: Option<String>,
    /// Draw option string, e.g. `"colz"`, `"text"`, `"lp"`.
    pub option: String,
    /// Overlay onto the current panel instead of taking the next one.
    pub same_pad: bool,
    pub opt_gaus: bool,
    pub opt_langau: bool,
    /// Normalise each x column of a 2-D histogram to its maximum.
    pub opt_norm_y: bool,
    pub log_x: bool,
    pub log_y: bool,
    pub log_z: bool,
    /// Multiplier for values printed in fit text boxes.
    pub scale: f64,
    pub show_stats: bool,
    pub fit_range: Option<(f64, f64)>,
    pub no_fit_text: bool,
}

impl Default for DrawOptions {
    fn default() -> Self {
        Self {
            title: None,
            option: String::new(),
            same_pad: false,
            opt_gaus: false,
            opt_langau: false,
            opt_norm_y: false,
            log_x: false,
            log_y: false,
            log_z: false,
            scale: 1.0,
            show_stats: false,
            fit_range: None,
            no_fit_text: false,
        }
    }
}

impl DrawOptions {
    pub fn with_option(option: impl Into<String>) -> Self {
        Self {
            option: option.into(),
            ..Self::default()
        }
    }

    pub fn gaus() -> Self {
        Self {
            opt_gaus: true,
            ..Self::default()
        }
    }

    pub fn langau() -> Self {
        Self {
            opt_langau: true,
            ..Self::default()
        }
    }

    pub fn same() -> Self {
        Self {
            same_pad: true,
            ..Self::default()
        }
    }

    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Where a draw landed and what its fits produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Drawn {
    /// Content page number (1-based).
    pub page: usize,
    /// Panel index on that page (1-based).
    pub panel: usize,
    pub fits: Vec<PeakFitOutcome>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportSummary {
    pub output: PathBuf,
    /// Every PDF page, covers included.
    pub pages: usize,
    pub content_pages: usize,
    pub covers: usize,
    pub back_covers: usize,
    pub artifacts_drawn: usize,
    pub saved_objects: usize,
    pub structured: Option<PathBuf>,
    pub images: Vec<PathBuf>,
}

pub struct ReportBuilder {
    options: ReportOptions,
    output: PathBuf,
    print_dir: PathBuf,
    sink: Option<PdfSink>,
    store: Option<ObjectStore>,
    structured: Option<PathBuf>,
    state: ReportState,
    page: Page,
    pad_index: usize,
    /// Outline title for the pending page when `next_page` gets none.
    page_label: String,
    content_pages: usize,
    pages_written: usize,
    covers: usize,
    back_covers: usize,
    artifacts_drawn: usize,
    saved_objects: usize,
    images: Vec<PathBuf>,
}

impl ReportBuilder {
    /// Open a report at `path` (`.pdf` is appended when missing).
    pub fn create(path: impl AsRef<Path>, options: ReportOptions) -> Result<Self, AppError> {
        options.validate()?;
        let output = resolve_output_path(path.as_ref());
        let sink = PdfSink::create(&output, &options.canvas, options.style.clone())?;

        let (store, structured) = if options.save_structured {
            let path = structured_path(&output);
            (Some(ObjectStore::create(&path)?), Some(path))
        } else {
            (None, None)
        };

        let print_dir = options.resolve_print_dir(&output);
        if options.print_all {
            fs::create_dir_all(&print_dir).map_err(|e| {
                AppError::config(format!("Cannot create image directory '{}': {e}", print_dir.display()))
            })?;
        }

        log::info!("Opened report {}", output.display());
        Ok(Self {
            page: Page::content(&options),
            options,
            output,
            print_dir,
            sink: Some(sink),
            store,
            structured,
            state: ReportState::Unopened,
            pad_index: 0,
            page_label: DEFAULT_PAGE_LABEL.to_string(),
            content_pages: 0,
            pages_written: 0,
            covers: 0,
            back_covers: 0,
            artifacts_drawn: 0,
            saved_objects: 0,
            images: Vec::new(),
        })
    }

    pub fn state(&self) -> ReportState {
        self.state
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn options(&self) -> &ReportOptions {
        &self.options
    }

    pub fn style(&self) -> &Style {
        &self.options.style
    }

    /// Current `(nx, ny)`.
    pub fn layout(&self) -> (usize, usize) {
        (self.options.nx, self.options.ny)
    }

    /// Index of the current panel on the pending page; 0 when none is allocated.
    pub fn current_panel(&self) -> usize {
        self.pad_index
    }

    /// Content pages flushed so far.
    pub fn content_pages(&self) -> usize {
        self.content_pages
    }

    /// Title the pending page gets when flushed without one.
    pub fn page_label(&self) -> &str {
        &self.page_label
    }

    pub fn pending_page(&self) -> &Page {
        &self.page
    }

    fn ensure_drawable(&self, action: &str) -> Result<(), AppError> {
        match self.state {
            ReportState::Unopened => Err(AppError::state(format!("Cannot {action} before the cover page."))),
            ReportState::BackCoverPrinted | ReportState::Closed => {
                Err(AppError::state(format!("Cannot {action} after the back cover.")))
            }
            _ => Ok(()),
        }
    }

    fn emit(&mut self, page: &Page) -> Result<(), AppError> {
        let sink = self
            .sink
            .as_mut()
            .ok_or_else(|| AppError::state("Report output is already closed."))?;
        sink.emit(page)?;
        self.pages_written += 1;
        Ok(())
    }

    /// Print the cover. An empty title uses the canvas title.
    pub fn print_cover(&mut self, title: &str) -> Result<(), AppError> {
        match self.state {
            ReportState::Unopened => {}
            ReportState::BackCoverPrinted | ReportState::Closed => {
                return Err(AppError::state("Cannot print a cover after the back cover."));
            }
            _ => return Err(AppError::state("Cover page already printed.")),
        }

        let title = if title.is_empty() {
            self.options.canvas.title.clone()
        } else {
            title.to_string()
        };
        let mut page = Page::title_page(PageKind::Cover, self.content_pages, "Cover");
        page.decorations.push(TextBox::new(COVER_TITLE_RECT).with_line(
            title,
            TextAttrs {
                size: 0.06,
                bold: true,
                align: Align::Center,
                ..TextAttrs::default()
            },
        ));
        page.stamp_number();

        let note = TextAttrs {
            size: 0.025,
            ..TextAttrs::footnote()
        };
        let mut footnote = TextBox::new(COVER_FOOTNOTE_RECT);
        footnote.add_text(format!("File : {}", self.output.display()), note);
        footnote.add_text(format!("Timestamp : {}", Local::now().format("%Y-%m-%d %H:%M:%S")), note);
        footnote.add_text(format!("Powered by sipm-report {}", env!("CARGO_PKG_VERSION")), note);
        page.decorations.push(footnote);

        self.emit(&page)?;
        self.covers += 1;
        self.state = ReportState::CoverPrinted;
        Ok(())
    }

    /// Flush the pending page if it holds anything, then print the back cover.
    pub fn print_back_cover(&mut self, title: &str) -> Result<(), AppError> {
        match self.state {
            ReportState::Unopened => {
                return Err(AppError::state("Cannot print a back cover before the cover page."));
            }
            ReportState::BackCoverPrinted | ReportState::Closed => {
                return Err(AppError::state("Back cover already printed."));
            }
            _ => {}
        }
        if !self.page.is_blank() {
            self.flush_page(None)?;
        }

        let text = if title.is_empty() { DEFAULT_BACK_COVER } else { title };
        let mut page = Page::title_page(PageKind::BackCover, self.content_pages, "End");
        page.decorations.push(TextBox::new(COVER_TITLE_RECT).with_line(
            text,
            TextAttrs {
                size: 0.06,
                bold: true,
                align: Align::Center,
                ..TextAttrs::default()
            },
        ));
        self.emit(&page)?;
        self.back_covers += 1;
        self.state = ReportState::BackCoverPrinted;
        Ok(())
    }

    /// Take the next panel, flushing the page first when it is full.
    pub fn next_pad(&mut self, title: Option<&str>) -> Result<usize, AppError> {
        self.ensure_drawable("allocate a panel")?;
        if self.pad_index >= self.options.panels_per_page() {
            self.flush_page(None)?;
        }
        self.pad_index += 1;
        if let Some(panel) = self.page.panel_mut(self.pad_index) {
            panel.title = title.filter(|t| !t.is_empty()).map(str::to_string);
        }
        if let Some(t) = title.filter(|t| !t.is_empty()) {
            self.page_label = t.to_string();
        }
        self.state = ReportState::PanelFilling;
        Ok(self.pad_index)
    }

    /// Flush the pending page even if some panels are empty.
    pub fn next_page(&mut self, title: Option<&str>) -> Result<(), AppError> {
        self.ensure_drawable("advance the page")?;
        self.flush_page(title)
    }

    /// Skip to the first panel of the next row.
    pub fn next_row(&mut self) -> Result<(), AppError> {
        self.ensure_drawable("advance the row")?;
        while self.pad_index % self.options.nx != 0 {
            self.next_pad(None)?;
        }
        Ok(())
    }

    /// Change the panel grid. A non-empty pending page is flushed first.
    pub fn set_layout(&mut self, nx: usize, ny: usize) -> Result<(), AppError> {
        if nx == 0 || ny == 0 {
            return Err(AppError::config(format!("Panel grid must be at least 1x1 (got {nx}x{ny}).")));
        }
        if matches!(self.state, ReportState::BackCoverPrinted | ReportState::Closed) {
            return Err(AppError::state("Cannot change the layout after the back cover."));
        }
        if !self.page.is_blank() {
            self.flush_page(None)?;
        }
        self.options.nx = nx;
        self.options.ny = ny;
        self.page = Page::content(&self.options);
        self.pad_index = 0;
        Ok(())
    }

    fn flush_page(&mut self, title: Option<&str>) -> Result<(), AppError> {
        let mut page = std::mem::replace(&mut self.page, Page::content(&self.options));
        page.number = self.content_pages + 1;
        page.title = match title {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => self.page_label.clone(),
        };
        if self.options.show_page_number {
            page.stamp_number();
        }

        self.emit(&page)?;
        self.content_pages = page.number;
        self.pad_index = 0;
        self.state = ReportState::PagePrinted;
        log::debug!(
            "Page {} '{}' flushed with {} of {} panels",
            page.number,
            page.title,
            page.filled_panels(),
            page.panels.len()
        );

        if self.options.print_all && page.filled_panels() > 0 {
            let name = match title {
                Some(t) if !t.is_empty() => file_stem_for(t),
                _ => format!(
                    "{}_{}",
                    file_stem_for(page.primary_name().unwrap_or(&page.title)),
                    self.artifacts_drawn
                ),
            };
            match export_page_images(
                &page,
                &self.options.style,
                &self.options.canvas,
                &self.print_dir,
                &name,
                &self.options.print_ext,
            ) {
                Ok(written) => self.images.extend(written),
                Err(err) => log::warn!("Could not save images of page {} '{}': {err}", page.number, page.title),
            }
        }
        Ok(())
    }

    fn active_panel(&mut self) -> Result<&mut Panel, AppError> {
        if self.pad_index == 0 {
            self.next_pad(None)?;
        }
        let index = self.pad_index;
        self.page
            .panel_mut(index)
            .ok_or_else(|| AppError::state(format!("Panel {index} is outside the page grid.")))
    }

    /// Draw an artifact on the next panel (or the current one with `same_pad`).
    ///
    /// Gaussian / Landau-Gaussian fits requested in `opts` run on 1-D
    /// histograms; their curves and text are overlaid and a failed fit leaves a
    /// red annotation instead. The artifact is also persisted when structured
    /// saving is enabled.
    pub fn draw(&mut self, artifact: impl Into<Artifact>, opts: &DrawOptions) -> Result<Drawn, AppError> {
        self.ensure_drawable("draw")?;
        let mut artifact = artifact.into();
        let title = opts.title.clone().unwrap_or_else(|| artifact.title().to_string());
        if !opts.same_pad || self.pad_index == 0 {
            self.next_pad(Some(&title))?;
        }
        let mode = DrawMode::parse(&opts.option);

        if let Artifact::Hist2D(h) = &mut artifact {
            if opts.opt_norm_y {
                h.normalise_profile_y();
            }
            if mode.colz {
                let max = h.maximum();
                if max.is_finite() && max > 0.0 {
                    h.z_range = Some((0.0, 1.1 * max));
                }
            }
        }

        let mut fits = Vec::new();
        if let Artifact::Hist1D(h) = &mut artifact {
            let fit_opts = PeakFitOptions {
                fit_range: opts.fit_range,
                range_ratio: self.options.gaus_fit_range,
                scale: opts.scale,
                line: None,
                no_text: opts.no_fit_text,
            };
            if opts.opt_gaus {
                fits.push(crate::fit::fit_gaussian_peak(h, &fit_opts, &self.options.style));
            }
            if opts.opt_langau {
                fits.push(crate::fit::fit_langaus_peak(h, &fit_opts, &self.options.style));
            }
            for zoom in fits.iter().filter_map(|f| f.fitted()).filter_map(|f| f.zoom) {
                h.x.set_range_user(zoom.0, zoom.1);
            }
        }

        self.save_obj(&artifact)?;
        log::debug!("Pad {} : {}", self.pad_index, artifact.name());

        let dense = self.options.panels_per_page() >= 4;
        let page = self.content_pages + 1;
        let panel = self.active_panel()?;
        if panel.is_empty() {
            panel.log_x = opts.log_x;
            panel.log_y = opts.log_y;
            panel.log_z = opts.log_z;
            panel.show_stats = opts.show_stats;
            panel.dense = dense && matches!(artifact, Artifact::Hist1D(_) | Artifact::Hist2D(_));
        }
        panel.push(artifact, mode);
        for outcome in &fits {
            push_fit_overlays(panel, outcome);
        }
        let index = panel.index;
        self.artifacts_drawn += 1;

        Ok(Drawn {
            page,
            panel: index,
            fits,
        })
    }

    /// Add an overlay to the current panel.
    fn overlay(&mut self, artifact: Artifact) -> Result<(), AppError> {
        self.ensure_drawable("draw an overlay")?;
        let panel = self.active_panel()?;
        panel.push(artifact, DrawMode::default());
        Ok(())
    }

    pub fn draw_text(&mut self, text: TextBox) -> Result<(), AppError> {
        self.overlay(text.into())
    }

    /// Shade `[x_min, x_max]` on the current panel; without `y` the band spans the frame.
    pub fn draw_band(&mut self, x_min: f64, x_max: f64, y: Option<(f64, f64)>) -> Result<(), AppError> {
        let band = Band {
            x_min: x_min.min(x_max),
            x_max: x_max.max(x_min),
            y_min: y.map(|r| r.0),
            y_max: y.map(|r| r.1),
            color: self.options.style.band_color,
        };
        self.overlay(band.into())
    }

    /// A legend at `rect` listing the series already drawn on the current panel.
    pub fn new_legend(&self, rect: NdcRect) -> Legend {
        let mut legend = Legend::new(rect);
        let Some(panel) = self.page.panel(self.pad_index) else {
            return legend;
        };
        for (i, layer) in panel.layers.iter().enumerate() {
            match &layer.artifact {
                Artifact::MultiGraph(mg) => {
                    for g in &mg.graphs {
                        legend.add_entry(label_or_name(&g.title, &g.name), g.line.color, Some(g.marker));
                    }
                }
                Artifact::Graph(g) => {
                    legend.add_entry(label_or_name(&g.title, &g.name), g.line.color, Some(g.marker));
                }
                Artifact::Hist1D(h) => {
                    let color = if i == 0 {
                        self.options.style.hist_line.color
                    } else {
                        self.options.style.series_color(i)
                    };
                    legend.add_entry(label_or_name(&h.title, &h.name), color, None);
                }
                _ => {}
            }
        }
        legend.columns = if legend.entries.len() > 8 { 2 } else { 1 };
        legend
    }

    pub fn draw_legend(&mut self, legend: Legend) -> Result<(), AppError> {
        self.overlay(legend.into())
    }

    /// Write each non-empty cell value of `hist` over the current panel.
    ///
    /// Returns the number of labels placed.
    pub fn draw_hist_text(&mut self, hist: &Histogram2D, decimals: usize) -> Result<usize, AppError> {
        self.ensure_drawable("draw histogram text")?;
        let panel = self.active_panel()?;
        let frame = panel.margins.frame();
        let (x0, x1) = hist.x.visible_range();
        let (y0, y1) = hist.y.visible_range();
        let (fx, lx) = hist.x.visible_bins();
        let (fy, ly) = hist.y.visible_bins();
        let rows = (ly - fy + 1) as f64;
        let cols = (lx - fx + 1) as f64;
        let size = (0.5 * frame.height() / rows).clamp(0.01, 0.04);
        let half_w = 0.5 * frame.width() / cols;

        let mut placed = 0;
        for iy in fy..=ly {
            for ix in fx..=lx {
                let v = hist.bin_content(ix, iy);
                if v == 0.0 {
                    continue;
                }
                let cx = frame.x1 + (hist.x.bin_center(ix) - x0) / (x1 - x0) * frame.width();
                let cy = frame.y1 + (hist.y.bin_center(iy) - y0) / (y1 - y0) * frame.height();
                let label = TextBox::new(NdcRect::new(cx - half_w, cy - 1.1 * size, cx + half_w, cy + 1.1 * size))
                    .with_line(
                        format!("{v:.decimals$}"),
                        TextAttrs {
                            size,
                            align: Align::Center,
                            ..TextAttrs::default()
                        },
                    );
                panel.push(label.into(), DrawMode::default());
                placed += 1;
            }
        }
        Ok(placed)
    }

    /// A new histogram from a `(bin_width, min, max)` triple.
    pub fn new_hist(&self, name: &str, title: &str, binning: (f64, f64, f64)) -> Result<Histogram1D, AppError> {
        Histogram1D::with_binning(name, title, binning)
    }

    /// Copy of `hist` re-binned to `(bin_width, min, max)`: every source bin's
    /// content is filled at its center.
    pub fn hist_rebin(&self, hist: &Histogram1D, binning: (f64, f64, f64)) -> Result<Histogram1D, AppError> {
        let mut out = Histogram1D::with_binning(format!("{}_rebin", hist.name), "", binning)?;
        out.title = hist.title.clone();
        out.x.title = hist.x.title.clone();
        out.y_title = hist.y_title.clone();
        for bin in 0..hist.nbins() {
            let v = hist.bin_content(bin);
            if v != 0.0 {
                out.fill_weighted(hist.bin_center(bin), v);
            }
        }
        out.entries = hist.entries;
        Ok(out)
    }

    /// Persist an artifact to the structured store. Returns `false` when disabled.
    pub fn save_obj(&mut self, artifact: &Artifact) -> Result<bool, AppError> {
        let Some(store) = self.store.as_mut() else {
            return Ok(false);
        };
        store.write(self.content_pages + 1, self.pad_index, artifact)?;
        self.saved_objects += 1;
        Ok(true)
    }

    /// Gaussian fit of `hist` with overlays on the current panel.
    pub fn fit_gaussian_peak(&mut self, hist: &Histogram1D, opts: &PeakFitOptions) -> Result<PeakFitOutcome, AppError> {
        self.ensure_drawable("fit")?;
        let outcome = crate::fit::fit_gaussian_peak(hist, opts, &self.options.style);
        self.apply_fit(&hist.name, &outcome)?;
        Ok(outcome)
    }

    /// Landau-Gaussian fit of `hist` with overlays on the current panel.
    pub fn fit_langaus_peak(&mut self, hist: &Histogram1D, opts: &PeakFitOptions) -> Result<PeakFitOutcome, AppError> {
        self.ensure_drawable("fit")?;
        let outcome = crate::fit::fit_langaus_peak(hist, opts, &self.options.style);
        self.apply_fit(&hist.name, &outcome)?;
        Ok(outcome)
    }

    fn apply_fit(&mut self, name: &str, outcome: &PeakFitOutcome) -> Result<(), AppError> {
        let panel = self.active_panel()?;
        if let Some(zoom) = outcome.fitted().and_then(|f| f.zoom) {
            for layer in &mut panel.layers {
                if let Artifact::Hist1D(h) = &mut layer.artifact {
                    if h.name == name {
                        h.x.set_range_user(zoom.0, zoom.1);
                    }
                }
            }
        }
        push_fit_overlays(panel, outcome);
        Ok(())
    }

    /// Finish the report and write the file.
    pub fn close(mut self) -> Result<ReportSummary, AppError> {
        self.finalize()
    }

    fn finalize(&mut self) -> Result<ReportSummary, AppError> {
        if self.state == ReportState::Closed {
            return Err(AppError::state("Report already closed."));
        }
        let result = self.finish_document();
        self.state = ReportState::Closed;
        result
    }

    fn finish_document(&mut self) -> Result<ReportSummary, AppError> {
        if self.covers == 0 {
            log::info!("No cover printed for {}; adding the default one", self.output.display());
            self.print_cover("")?;
        }
        if self.back_covers == 0 {
            self.print_back_cover("")?;
        }

        let pages = match self.sink.take() {
            Some(sink) => sink.finish()?,
            None => self.pages_written,
        };
        let saved_objects = match self.store.take() {
            Some(store) => {
                let path = store.path().display().to_string();
                let n = store.close()?;
                log::info!("{n} objects saved to {path}");
                n
            }
            None => self.saved_objects,
        };

        log::info!(
            "Report {} written: {} pages ({} content)",
            self.output.display(),
            pages,
            self.content_pages
        );
        Ok(ReportSummary {
            output: self.output.clone(),
            pages,
            content_pages: self.content_pages,
            covers: self.covers,
            back_covers: self.back_covers,
            artifacts_drawn: self.artifacts_drawn,
            saved_objects,
            structured: self.structured.clone(),
            images: std::mem::take(&mut self.images),
        })
    }
}

impl Drop for ReportBuilder {
    fn drop(&mut self) {
        if self.state == ReportState::Closed {
            return;
        }
        if let Err(e) = self.finalize() {
            log::error!("Failed to finish report {}: {e}", self.output.display());
        }
    }
}

fn push_fit_overlays(panel: &mut Panel, outcome: &PeakFitOutcome) {
    match outcome {
        PeakFitOutcome::Fitted(fit) => {
            panel.push(fit.curve.clone().into(), DrawMode::default());
            if let Some(text) = &fit.text {
                panel.push(text.clone().into(), DrawMode::default());
            }
        }
        PeakFitOutcome::Failed { annotation, .. } => {
            panel.push(annotation.clone().into(), DrawMode::default());
        }
    }
}

fn label_or_name<'a>(title: &'a str, name: &'a str) -> &'a str {
    if title.is_empty() { name } else { title }
}

/// File-system friendly version of a page label.
fn file_stem_for(label: &str) -> String {
    label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' { c } else { '_' })
        .collect()
}
