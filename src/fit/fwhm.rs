//! Half-maximum peak width estimation.

use crate::domain::Histogram1D;

/// Width/center estimate used to seed and bound peak fits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakEstimate {
    /// FWHM, or the RMS when `degenerate`.
    pub width: f64,
    /// Half-maximum midpoint, or the mean when `degenerate`.
    pub center: f64,
    /// The half-maximum width was narrower than two bins.
    pub degenerate: bool,
    pub peak: f64,
    pub mean: f64,
    pub rms: f64,
}

/// Estimate FWHM and center of the visible part of `hist`.
///
/// The leftmost and rightmost bins above half the maximum define the width
/// (distance between their centers) and the center (their midpoint). A width
/// below two bin widths is degenerate and falls back to `(rms, mean)`.
///
/// Returns `None` for histograms without positive content.
pub fn estimate_fwhm(hist: &Histogram1D) -> Option<PeakEstimate> {
    let peak = hist.maximum();
    if !(peak.is_finite() && peak > 0.0) {
        return None;
    }
    let mean = hist.mean();
    let rms = hist.rms();

    let left = hist.find_first_bin_above(peak / 2.0)?;
    let right = hist.find_last_bin_above(peak / 2.0)?;
    let (c_left, c_right) = (hist.bin_center(left), hist.bin_center(right));
    let width = c_right - c_left;
    let center = 0.5 * (c_left + c_right);

    if width < 2.0 * hist.bin_width() {
        log::warn!(
            "Histogram {} - FWHM too narrow center={center:.2e}, fwhm={width:.2e}, rms={rms:.2e}, peak={peak:.2e}",
            hist.name
        );
        return Some(PeakEstimate {
            width: rms,
            center: mean,
            degenerate: true,
            peak,
            mean,
            rms,
        });
    }

    Some(PeakEstimate {
        width,
        center,
        degenerate: false,
        peak,
        mean,
        rms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::gaus;

    fn peaked(scale: f64) -> Histogram1D {
        let mut h = Histogram1D::new("peak", "", 100, 0.0, 10.0).unwrap();
        for bin in 0..100 {
            let x = h.bin_center(bin);
            h.set_bin_content(bin, scale * gaus(x, 100.0, 4.0, 0.8));
        }
        h
    }

    #[test]
    fn gaussian_fwhm_close_to_analytic() {
        let est = estimate_fwhm(&peaked(1.0)).unwrap();
        assert!(!est.degenerate);
        // 2.355 sigma, quantised to the 0.1 bin grid.
        assert!((est.width - 2.355 * 0.8).abs() < 0.2, "width {}", est.width);
        assert!((est.center - 4.0).abs() < 0.06, "center {}", est.center);
    }

    #[test]
    fn scale_invariant() {
        let base = estimate_fwhm(&peaked(1.0)).unwrap();
        for scale in [1e-3, 0.5, 7.0, 1e6] {
            let est = estimate_fwhm(&peaked(scale)).unwrap();
            assert_eq!(est.width, base.width);
            assert_eq!(est.center, base.center);
        }
    }

    #[test]
    fn single_bin_peak_falls_back_to_rms_mean() {
        let mut h = Histogram1D::new("spike", "", 20, 0.0, 20.0).unwrap();
        h.set_bin_content(10, 50.0);
        h.set_bin_content(5, 1.0);
        let est = estimate_fwhm(&h).unwrap();
        assert!(est.degenerate);
        assert_eq!(est.width, h.rms());
        assert_eq!(est.center, h.mean());
    }

    #[test]
    fn empty_histogram_has_no_estimate() {
        let h = Histogram1D::new("empty", "", 10, 0.0, 1.0).unwrap();
        assert!(estimate_fwhm(&h).is_none());
    }
}
