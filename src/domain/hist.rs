//! Binned histograms.
//!
//! Bins are addressed with 0-based indices; under/overflow are kept separately
//! and never take part in statistics. Statistics (`mean`, `rms`, `maximum`) are
//! computed from bin centers and contents inside the visible axis range, so
//! zooming an axis with `set_range_user` changes them the same way it changes
//! what is drawn.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// A uniformly binned axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    pub nbins: usize,
    pub min: f64,
    pub max: f64,
    #[serde(default)]
    pub title: String,
    /// Visible sub-range `(first_bin, last_bin)` inclusive, when zoomed.
    #[serde(default)]
    pub visible: Option<(usize, usize)>,
}

impl Axis {
    pub fn new(nbins: usize, min: f64, max: f64) -> Result<Self, AppError> {
        if nbins == 0 {
            return Err(AppError::config("Axis needs at least one bin."));
        }
        if !(min.is_finite() && max.is_finite()) || max <= min {
            return Err(AppError::config(format!("Invalid axis range [{min}, {max}].")));
        }
        Ok(Self {
            nbins,
            min,
            max,
            title: String::new(),
            visible: None,
        })
    }

    pub fn bin_width(&self) -> f64 {
        (self.max - self.min) / self.nbins as f64
    }

    pub fn low_edge(&self, bin: usize) -> f64 {
        self.min + bin as f64 * self.bin_width()
    }

    pub fn bin_center(&self, bin: usize) -> f64 {
        self.min + (bin as f64 + 0.5) * self.bin_width()
    }

    /// Bin index containing `x`, or `None` for under/overflow.
    pub fn find_bin(&self, x: f64) -> Option<usize> {
        if !x.is_finite() || x < self.min || x >= self.max {
            return None;
        }
        let bin = ((x - self.min) / self.bin_width()).floor() as usize;
        Some(bin.min(self.nbins - 1))
    }

    /// Inclusive range of bins that are currently visible.
    pub fn visible_bins(&self) -> (usize, usize) {
        self.visible.unwrap_or((0, self.nbins - 1))
    }

    /// Visible range in axis units.
    pub fn visible_range(&self) -> (f64, f64) {
        let (first, last) = self.visible_bins();
        (self.low_edge(first), self.low_edge(last + 1))
    }

    /// Zoom to the bins covering `[lo, hi]`, clamped to the axis.
    pub fn set_range_user(&mut self, lo: f64, hi: f64) {
        if !(lo.is_finite() && hi.is_finite()) || hi <= lo {
            return;
        }
        let first = self.find_bin(lo.max(self.min)).unwrap_or(0);
        let last = if hi >= self.max {
            self.nbins - 1
        } else {
            self.find_bin(hi).unwrap_or(self.nbins - 1)
        };
        self.visible = Some((first.min(last), last));
    }

    pub fn unzoom(&mut self) {
        self.visible = None;
    }
}

/// One-dimensional histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram1D {
    pub name: String,
    pub title: String,
    pub x: Axis,
    #[serde(default)]
    pub y_title: String,
    pub contents: Vec<f64>,
    #[serde(default)]
    pub underflow: f64,
    #[serde(default)]
    pub overflow: f64,
    #[serde(default)]
    pub entries: u64,
}

impl Histogram1D {
    pub fn new(
        name: impl Into<String>,
        title: impl Into<String>,
        nbins: usize,
        min: f64,
        max: f64,
    ) -> Result<Self, AppError> {
        let x = Axis::new(nbins, min, max)?;
        let mut hist = Self {
            name: name.into(),
            title: String::new(),
            x,
            y_title: String::new(),
            contents: vec![0.0; nbins],
            underflow: 0.0,
            overflow: 0.0,
            entries: 0,
        };
        hist.set_title(&title.into());
        Ok(hist)
    }

    /// Build from a `(width, min, max)` binning triple.
    pub fn with_binning(
        name: impl Into<String>,
        title: impl Into<String>,
        binning: (f64, f64, f64),
    ) -> Result<Self, AppError> {
        let (width, min, max) = binning;
        if !(width.is_finite() && width > 0.0) {
            return Err(AppError::config(format!("Invalid bin width {width}.")));
        }
        let nbins = ((max - min) / width + 1e-9).floor() as usize;
        Self::new(name, title, nbins, min, max)
    }

    /// Set the title, splitting `"title;x title;y title"` like the axis convention
    /// used by the input files.
    pub fn set_title(&mut self, full: &str) {
        let mut parts = full.split(';');
        self.title = parts.next().unwrap_or_default().to_string();
        if let Some(x_title) = parts.next() {
            self.x.title = x_title.to_string();
        }
        if let Some(y_title) = parts.next() {
            self.y_title = y_title.to_string();
        }
    }

    pub fn nbins(&self) -> usize {
        self.x.nbins
    }

    pub fn bin_width(&self) -> f64 {
        self.x.bin_width()
    }

    pub fn bin_center(&self, bin: usize) -> f64 {
        self.x.bin_center(bin)
    }

    pub fn bin_content(&self, bin: usize) -> f64 {
        self.contents.get(bin).copied().unwrap_or(0.0)
    }

    pub fn set_bin_content(&mut self, bin: usize, value: f64) {
        if let Some(slot) = self.contents.get_mut(bin) {
            *slot = value;
        }
    }

    pub fn fill(&mut self, x: f64) {
        self.fill_weighted(x, 1.0);
    }

    pub fn fill_weighted(&mut self, x: f64, w: f64) {
        self.entries += 1;
        match self.x.find_bin(x) {
            Some(bin) => self.contents[bin] += w,
            None if x < self.x.min => self.underflow += w,
            None => self.overflow += w,
        }
    }

    fn visible(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        let (first, last) = self.x.visible_bins();
        (first..=last).map(move |bin| (bin, self.contents[bin]))
    }

    /// Largest bin content in the visible range.
    pub fn maximum(&self) -> f64 {
        self.visible().map(|(_, c)| c).fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn minimum(&self) -> f64 {
        self.visible().map(|(_, c)| c).fold(f64::INFINITY, f64::min)
    }

    pub fn maximum_bin(&self) -> usize {
        let mut best = self.x.visible_bins().0;
        for (bin, c) in self.visible() {
            if c > self.contents[best] {
                best = bin;
            }
        }
        best
    }

    /// Sum of visible bin contents.
    pub fn integral(&self) -> f64 {
        self.visible().map(|(_, c)| c).sum()
    }

    /// Content-weighted mean of the bin centers.
    pub fn mean(&self) -> f64 {
        let (sw, swx) = self
            .visible()
            .fold((0.0, 0.0), |(sw, swx), (bin, c)| (sw + c, swx + c * self.bin_center(bin)));
        if sw == 0.0 { 0.0 } else { swx / sw }
    }

    /// Content-weighted standard deviation of the bin centers.
    pub fn rms(&self) -> f64 {
        let mean = self.mean();
        let (sw, swd) = self.visible().fold((0.0, 0.0), |(sw, swd), (bin, c)| {
            let d = self.bin_center(bin) - mean;
            (sw + c, swd + c * d * d)
        });
        if sw == 0.0 { 0.0 } else { (swd / sw).max(0.0).sqrt() }
    }

    pub fn find_first_bin_above(&self, threshold: f64) -> Option<usize> {
        self.visible().find(|&(_, c)| c > threshold).map(|(bin, _)| bin)
    }

    pub fn find_last_bin_above(&self, threshold: f64) -> Option<usize> {
        let (first, last) = self.x.visible_bins();
        (first..=last).rev().find(|&bin| self.contents[bin] > threshold)
    }

    pub fn scale(&mut self, factor: f64) {
        for c in &mut self.contents {
            *c *= factor;
        }
        self.underflow *= factor;
        self.overflow *= factor;
    }

    /// Merge groups of `ngroup` adjacent bins. Trailing bins that do not fill a
    /// whole group are folded into the overflow.
    pub fn rebin(&mut self, ngroup: usize) -> Result<(), AppError> {
        if ngroup <= 1 {
            return Ok(());
        }
        let nbins = self.nbins() / ngroup;
        if nbins == 0 {
            return Err(AppError::config(format!(
                "Cannot rebin '{}' ({} bins) by {ngroup}.",
                self.name,
                self.nbins()
            )));
        }
        let width = self.bin_width() * ngroup as f64;
        let mut contents = vec![0.0; nbins];
        for (bin, c) in self.contents.iter().enumerate() {
            match contents.get_mut(bin / ngroup) {
                Some(slot) => *slot += c,
                None => self.overflow += c,
            }
        }
        let title = std::mem::take(&mut self.x.title);
        self.x = Axis::new(nbins, self.x.min, self.x.min + width * nbins as f64)?;
        self.x.title = title;
        self.contents = contents;
        Ok(())
    }
}

/// Two-dimensional histogram, contents stored row-major (`iy * nx + ix`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram2D {
    pub name: String,
    pub title: String,
    pub x: Axis,
    pub y: Axis,
    #[serde(default)]
    pub z_title: String,
    /// Color scale range; `None` means `[min, max]` of the contents.
    #[serde(default)]
    pub z_range: Option<(f64, f64)>,
    pub contents: Vec<f64>,
    #[serde(default)]
    pub entries: u64,
}

impl Histogram2D {
    pub fn new(
        name: impl Into<String>,
        title: impl Into<String>,
        (nx, x_min, x_max): (usize, f64, f64),
        (ny, y_min, y_max): (usize, f64, f64),
    ) -> Result<Self, AppError> {
        let x = Axis::new(nx, x_min, x_max)?;
        let y = Axis::new(ny, y_min, y_max)?;
        let mut hist = Self {
            name: name.into(),
            title: String::new(),
            x,
            y,
            z_title: String::new(),
            z_range: None,
            contents: vec![0.0; nx * ny],
            entries: 0,
        };
        let title = title.into();
        let mut parts = title.split(';');
        hist.title = parts.next().unwrap_or_default().to_string();
        hist.x.title = parts.next().unwrap_or_default().to_string();
        hist.y.title = parts.next().unwrap_or_default().to_string();
        hist.z_title = parts.next().unwrap_or_default().to_string();
        Ok(hist)
    }

    fn index(&self, ix: usize, iy: usize) -> Option<usize> {
        (ix < self.x.nbins && iy < self.y.nbins).then(|| iy * self.x.nbins + ix)
    }

    pub fn bin_content(&self, ix: usize, iy: usize) -> f64 {
        self.index(ix, iy).map(|i| self.contents[i]).unwrap_or(0.0)
    }

    pub fn set_bin_content(&mut self, ix: usize, iy: usize, value: f64) {
        if let Some(i) = self.index(ix, iy) {
            self.contents[i] = value;
        }
    }

    pub fn fill(&mut self, x: f64, y: f64) {
        self.entries += 1;
        if let (Some(ix), Some(iy)) = (self.x.find_bin(x), self.y.find_bin(y)) {
            let i = iy * self.x.nbins + ix;
            self.contents[i] += 1.0;
        }
    }

    pub fn maximum(&self) -> f64 {
        self.contents.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn minimum(&self) -> f64 {
        self.contents.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Effective color scale range.
    pub fn z_bounds(&self) -> (f64, f64) {
        self.z_range.unwrap_or_else(|| (self.minimum().min(0.0), self.maximum()))
    }

    /// Normalise each x column by its maximum so every column peaks at 1.
    ///
    /// Columns whose maximum is below 1 are left untouched.
    pub fn normalise_profile_y(&mut self) {
        for ix in 0..self.x.nbins {
            let norm = (0..self.y.nbins)
                .map(|iy| self.bin_content(ix, iy))
                .fold(f64::NEG_INFINITY, f64::max);
            if norm < 1.0 {
                continue;
            }
            for iy in 0..self.y.nbins {
                let raw = self.bin_content(ix, iy);
                self.set_bin_content(ix, iy, raw / norm);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_and_statistics() {
        let mut h = Histogram1D::new("h", "test;x;counts", 10, 0.0, 10.0).unwrap();
        for x in [4.5, 5.5, 5.5, 6.5] {
            h.fill(x);
        }
        h.fill(-1.0);
        h.fill(12.0);
        assert_eq!(h.x.title, "x");
        assert_eq!(h.y_title, "counts");
        assert_eq!(h.entries, 6);
        assert_eq!(h.underflow, 1.0);
        assert_eq!(h.overflow, 1.0);
        assert_eq!(h.maximum(), 2.0);
        assert_eq!(h.maximum_bin(), 5);
        assert!((h.mean() - 5.5).abs() < 1e-12);
        assert!((h.rms() - (0.5f64).sqrt()).abs() < 1e-12);
        assert_eq!(h.find_first_bin_above(0.5), Some(4));
        assert_eq!(h.find_last_bin_above(0.5), Some(6));
    }

    #[test]
    fn binning_triple_and_rebin() {
        let mut h = Histogram1D::with_binning("h", "", (0.5, 50.0, 65.0)).unwrap();
        assert_eq!(h.nbins(), 30);
        for bin in 0..30 {
            h.set_bin_content(bin, 1.0);
        }
        h.rebin(4).unwrap();
        assert_eq!(h.nbins(), 7);
        assert!((h.bin_width() - 2.0).abs() < 1e-12);
        assert_eq!(h.bin_content(0), 4.0);
        assert_eq!(h.overflow, 2.0);
    }

    #[test]
    fn range_user_limits_statistics() {
        let mut h = Histogram1D::new("h", "", 10, 0.0, 10.0).unwrap();
        h.set_bin_content(1, 10.0);
        h.set_bin_content(8, 1.0);
        h.x.set_range_user(5.0, 10.0);
        assert_eq!(h.maximum(), 1.0);
        assert_eq!(h.x.visible_bins(), (5, 9));
        assert!((h.mean() - 8.5).abs() < 1e-12);
    }

    #[test]
    fn normalise_profile_y_skips_weak_columns() {
        let mut h = Histogram2D::new("h2", "", (2, 0.0, 2.0), (2, 0.0, 2.0)).unwrap();
        h.set_bin_content(0, 0, 4.0);
        h.set_bin_content(0, 1, 2.0);
        h.set_bin_content(1, 0, 0.5);
        h.normalise_profile_y();
        assert_eq!(h.bin_content(0, 0), 1.0);
        assert_eq!(h.bin_content(0, 1), 0.5);
        assert_eq!(h.bin_content(1, 0), 0.5);
    }
}
