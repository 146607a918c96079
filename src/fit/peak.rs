//! Adaptive peak fits for histograms.
//!
//! Both fits follow the same recipe:
//!
//! 1. estimate FWHM and center from the half-maximum bins
//! 2. derive a fit window and start values/limits from that estimate
//! 3. run the bounded least-squares fit on the non-empty bins in the window
//! 4. build the overlays (sampled curve, parameter text box)
//!
//! Failures are values (`PeakFitOutcome::Failed`) carrying the annotation the
//! report should show; they never abort a report.

use std::fmt;

use crate::domain::{Color, Curve, Histogram1D, LineStyle, NdcRect, Style, TextAttrs, TextBox};
use crate::fit::fitter::{FitData, FitFailure, FitOptions, ModelFit, ParamSpec, fit_model};
use crate::fit::fwhm::{PeakEstimate, estimate_fwhm};
use crate::models::PeakModel;

/// Number of samples used to draw a fitted curve.
const CURVE_SAMPLES: usize = 200;

const GAUS_TEXT_RECT: NdcRect = NdcRect::new(0.18, 0.55, 0.45, 0.85);
const LANGAUS_TEXT_RECT: NdcRect = NdcRect::new(0.58, 0.55, 0.85, 0.85);
const FAILED_TEXT_RECT: NdcRect = NdcRect::new(0.50, 0.55, 0.80, 0.85);

#[derive(Debug, Clone, PartialEq)]
pub struct PeakFitOptions {
    /// Explicit fit window. The Gaussian fit derives its own window when unset;
    /// the Landau-Gaussian fit defaults to `[0.3, 1.5] × mean`.
    pub fit_range: Option<(f64, f64)>,
    /// Gaussian half-window as a multiple of the FWHM (capped at 5 × RMS).
    pub range_ratio: f64,
    /// Multiplier applied to values shown in the text box.
    pub scale: f64,
    /// Curve style; the report style's fit line when unset.
    pub line: Option<LineStyle>,
    /// Skip the parameter text box.
    pub no_text: bool,
}

impl Default for PeakFitOptions {
    fn default() -> Self {
        Self {
            fit_range: None,
            range_ratio: 1.0,
            scale: 1.0,
            line: None,
            no_text: false,
        }
    }
}

/// A successful peak fit and its overlays.
#[derive(Debug, Clone, PartialEq)]
pub struct PeakFit {
    pub fit: ModelFit,
    pub estimate: PeakEstimate,
    pub fit_range: (f64, f64),
    pub curve: Curve,
    pub text: Option<TextBox>,
    /// X range the histogram should be zoomed to, if any.
    pub zoom: Option<(f64, f64)>,
}

impl PeakFit {
    /// Fitted peak position (Gaussian mean or Landau MP).
    pub fn position(&self) -> f64 {
        self.fit.params[1]
    }

    /// Fitted width (Gaussian sigma or Landau width).
    pub fn width(&self) -> f64 {
        match self.fit.model {
            PeakModel::Gaussian => self.fit.params[2].abs(),
            PeakModel::LandauGaussian => self.fit.params[0],
        }
    }
}

/// Non-fatal reasons a peak fit produced no parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum FitIssue {
    EmptyHistogram,
    /// FWHM narrower than two bins. Carries the `(rms, mean)` fallback.
    DegeneratePeak { fallback_width: f64, fallback_center: f64 },
    NotConverged { reason: FitFailure },
}

impl fmt::Display for FitIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitIssue::EmptyHistogram => write!(f, "histogram has no positive content"),
            FitIssue::DegeneratePeak {
                fallback_width,
                fallback_center,
            } => write!(
                f,
                "FWHM too narrow, fallback rms={fallback_width:.2e} mean={fallback_center:.2e}"
            ),
            FitIssue::NotConverged { reason } => write!(f, "fit failed: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PeakFitOutcome {
    Fitted(Box<PeakFit>),
    Failed { issue: FitIssue, annotation: TextBox },
}

impl PeakFitOutcome {
    pub fn fitted(&self) -> Option<&PeakFit> {
        match self {
            PeakFitOutcome::Fitted(fit) => Some(fit),
            PeakFitOutcome::Failed { .. } => None,
        }
    }

    pub fn issue(&self) -> Option<&FitIssue> {
        match self {
            PeakFitOutcome::Fitted(_) => None,
            PeakFitOutcome::Failed { issue, .. } => Some(issue),
        }
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted().is_some()
    }
}

fn failed(model: PeakModel, hist: &Histogram1D, issue: FitIssue) -> PeakFitOutcome {
    log::warn!("{} - {} fitting FAILED: {issue}", hist.name, model.display_name());
    let annotation = TextBox::new(FAILED_TEXT_RECT).with_line(
        format!("{} fitting FAILED", model.display_name()),
        TextAttrs {
            color: Color::RED,
            ..TextAttrs::heading()
        },
    );
    PeakFitOutcome::Failed { issue, annotation }
}

fn text_box(rect: NdcRect, heading: Option<&str>) -> TextBox {
    let mut pave = TextBox::new(rect);
    pave.fill = Some(Color::WHITE);
    if let Some(heading) = heading {
        pave.add_text(heading, TextAttrs::heading());
    }
    pave
}

/// Gaussian fit around the half-maximum center.
///
/// The window half-width is `min(5 × rms, range_ratio × fwhm)`. On success the
/// curve spans `mean ± 5σ` and the histogram zoom is
/// `center ± min(15 × rms, 10σ)`.
pub fn fit_gaussian_peak(hist: &Histogram1D, opts: &PeakFitOptions, style: &Style) -> PeakFitOutcome {
    let model = PeakModel::Gaussian;
    let Some(est) = estimate_fwhm(hist) else {
        return failed(model, hist, FitIssue::EmptyHistogram);
    };
    if est.degenerate {
        return failed(
            model,
            hist,
            FitIssue::DegeneratePeak {
                fallback_width: est.rms,
                fallback_center: est.mean,
            },
        );
    }

    let fit_range = opts.fit_range.unwrap_or_else(|| {
        let half = (5.0 * est.rms).min(opts.range_ratio * est.width);
        (est.center - half, est.center + half)
    });
    let data = FitData::from_histogram(hist, fit_range);
    let specs = [
        ParamSpec::free(est.peak),
        ParamSpec::free(est.center),
        ParamSpec::free(est.width / 2.355),
    ];
    let fit = match fit_model(model, &data, &specs, &FitOptions::default()) {
        Ok(fit) => fit,
        Err(reason) => return failed(model, hist, FitIssue::NotConverged { reason }),
    };

    let mean = fit.params[1];
    let sigma = fit.params[2].abs();
    let line = opts.line.unwrap_or(style.fit_line);
    let curve_fit = fit.clone();
    let curve = Curve::sample(
        format!("fit{}_{}", model.short_name(), hist.name),
        mean - 5.0 * sigma,
        mean + 5.0 * sigma,
        CURVE_SAMPLES,
        line,
        move |x| curve_fit.eval(x),
    );
    let draw_half = (15.0 * est.rms).min(10.0 * sigma);
    let zoom = (draw_half > 0.0).then_some((est.center - draw_half, est.center + draw_half));

    let text = (!opts.no_text).then(|| {
        let s = opts.scale;
        let mut pave = text_box(GAUS_TEXT_RECT, None);
        let attrs = TextAttrs::default();
        pave.add_text(format!("mean (mu) = {:.1}", mean * s), attrs);
        pave.add_text(format!("sigma = {:.1}", sigma * s), attrs);
        pave.add_text(format!("chi2 / NDF = {:.1} / {}", fit.chi2, fit.ndf), attrs);
        pave.add_text(format!("RMS = {:.1}", est.rms * s), attrs);
        pave.add_text(format!("FWHM = {:.1}", est.width * s), attrs);
        pave
    });

    log::debug!(
        "{} - Gaussian fit mean={mean:.3e} sigma={sigma:.3e} chi2/ndf={:.1}/{}",
        hist.name,
        fit.chi2,
        fit.ndf
    );
    PeakFitOutcome::Fitted(Box::new(PeakFit {
        fit,
        estimate: est,
        fit_range,
        curve,
        text,
        zoom,
    }))
}

/// Landau ⊗ Gaussian fit.
///
/// A degenerate FWHM is not fatal here: the `(rms, mean)` fallback seeds the
/// fit instead.
pub fn fit_langaus_peak(hist: &Histogram1D, opts: &PeakFitOptions, style: &Style) -> PeakFitOutcome {
    let model = PeakModel::LandauGaussian;
    let Some(est) = estimate_fwhm(hist) else {
        return failed(model, hist, FitIssue::EmptyHistogram);
    };
    if est.degenerate {
        log::warn!("{} - Landau-Gaussian seeded from rms/mean fallback", hist.name);
    }

    let (axis_lo, axis_hi) = hist.x.visible_range();
    let fit_range = match opts.fit_range {
        Some(range) => range,
        None if est.mean > 0.0 => (0.3 * est.mean, 1.5 * est.mean),
        None => (axis_lo, axis_hi),
    };

    let w = est.width;
    let c = est.center;
    let area = hist.integral() * hist.bin_width();
    let specs = [
        ParamSpec::bounded(0.1 * w, 0.01 * w, w),
        ParamSpec::bounded(c, 0.5 * c, 2.0 * c),
        ParamSpec::bounded(area, 0.2 * area, 5.0 * area),
        ParamSpec::bounded(0.1 * w, 0.01 * w, w),
    ];
    let data = FitData::from_histogram(hist, fit_range);
    let fit = match fit_model(model, &data, &specs, &FitOptions::default()) {
        Ok(fit) => fit,
        Err(reason) => return failed(model, hist, FitIssue::NotConverged { reason }),
    };

    let line = opts.line.unwrap_or(style.fit_line);
    let curve_fit = fit.clone();
    let curve = Curve::sample(
        format!("fit{}_{}", model.short_name(), hist.name),
        axis_lo,
        axis_hi,
        CURVE_SAMPLES,
        line,
        move |x| curve_fit.eval(x),
    );

    let text = (!opts.no_text).then(|| {
        let attrs = TextAttrs::default();
        let mut pave = text_box(LANGAUS_TEXT_RECT, Some(model.display_name()));
        pave.add_text(format!("chi2 / NDF = {:.1} / {}", fit.chi2, fit.ndf), attrs);
        pave.add_text(format!("Mean = {:.2e}", est.mean), attrs);
        for (name, value) in model.param_names().iter().zip(&fit.params) {
            pave.add_text(format!("{name} = {value:.2e}"), attrs);
        }
        pave
    });

    PeakFitOutcome::Fitted(Box::new(PeakFit {
        fit,
        estimate: est,
        fit_range,
        curve,
        text,
        zoom: None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{gaus, langaus};

    fn gaussian_hist() -> Histogram1D {
        let mut h = Histogram1D::new("hVop", "", 120, 50.0, 62.0).unwrap();
        for bin in 0..h.nbins() {
            let x = h.bin_center(bin);
            h.set_bin_content(bin, gaus(x, 400.0, 56.0, 0.9).round());
        }
        h
    }

    #[test]
    fn gaussian_peak_recovered() {
        let h = gaussian_hist();
        let outcome = fit_gaussian_peak(&h, &PeakFitOptions::default(), &Style::default());
        let fit = outcome.fitted().expect("fit should converge");
        assert!((fit.position() - 56.0).abs() < 0.02, "mean {}", fit.position());
        assert!((fit.width() - 0.9).abs() < 0.03, "sigma {}", fit.width());
        assert_eq!(fit.text.as_ref().map(|t| t.lines.len()), Some(5));
        let (lo, hi) = fit.zoom.unwrap();
        assert!(lo < 56.0 && hi > 56.0);
        assert!(!fit.curve.points.is_empty());
    }

    #[test]
    fn degenerate_peak_returns_fallback() {
        let mut h = Histogram1D::new("spike", "", 50, 0.0, 50.0).unwrap();
        h.set_bin_content(20, 100.0);
        h.set_bin_content(30, 10.0);
        let outcome = fit_gaussian_peak(&h, &PeakFitOptions::default(), &Style::default());
        match outcome {
            PeakFitOutcome::Failed {
                issue: FitIssue::DegeneratePeak {
                    fallback_width,
                    fallback_center,
                },
                annotation,
            } => {
                assert_eq!(fallback_width, h.rms());
                assert_eq!(fallback_center, h.mean());
                assert!(annotation.lines[0].text.contains("FAILED"));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn empty_histogram_fails_softly() {
        let h = Histogram1D::new("empty", "", 10, 0.0, 1.0).unwrap();
        let outcome = fit_langaus_peak(&h, &PeakFitOptions::default(), &Style::default());
        assert_eq!(outcome.issue(), Some(&FitIssue::EmptyHistogram));
    }

    #[test]
    fn langaus_peak_position() {
        let par = [2.0, 40.0, 20_000.0, 3.0];
        let mut h = Histogram1D::new("hQ", "", 100, 0.0, 200.0).unwrap();
        for bin in 0..h.nbins() {
            let x = h.bin_center(bin);
            h.set_bin_content(bin, (langaus(x, &par) * h.bin_width()).round());
        }
        let outcome = fit_langaus_peak(&h, &PeakFitOptions::default(), &Style::default());
        let fit = outcome.fitted().expect("langaus fit should converge");
        assert!((fit.position() - 40.0).abs() < 3.0, "MP {}", fit.position());
        let text = fit.text.as_ref().unwrap();
        assert_eq!(text.lines[0].text, "Landau-Gaussian");
        assert_eq!(text.lines.len(), 7);
    }
}
