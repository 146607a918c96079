//! Binomial efficiency with Clopper–Pearson bounds.

use serde::Serialize;
use statrs::distribution::{Beta, ContinuousCDF};

/// One-sigma central confidence level.
pub const ONE_SIGMA: f64 = 0.683;

/// Clopper–Pearson bound for `passed` successes out of `total` trials.
///
/// Returns the upper bound when `upper` is set, otherwise the lower bound. The
/// bounds are the Beta quantiles at `(1 ± level) / 2`, clamped to `[0, 1]` at the
/// edges where the Beta distribution degenerates.
pub fn clopper_pearson(total: u64, passed: u64, level: f64, upper: bool) -> f64 {
    let passed = passed.min(total);
    let alpha = (1.0 - level) / 2.0;
    let (k, n) = (passed as f64, total as f64);

    if upper {
        if passed == total {
            return 1.0;
        }
        beta_quantile(k + 1.0, n - k, 1.0 - alpha).unwrap_or(1.0)
    } else {
        if passed == 0 {
            return 0.0;
        }
        beta_quantile(k, n - k + 1.0, alpha).unwrap_or(0.0)
    }
}

fn beta_quantile(a: f64, b: f64, p: f64) -> Option<f64> {
    let beta = Beta::new(a, b).ok()?;
    let q = beta.inverse_cdf(p);
    q.is_finite().then_some(q.clamp(0.0, 1.0))
}

/// An efficiency with asymmetric one-sigma uncertainties.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Efficiency {
    pub value: f64,
    /// Average of the lower and upper errors.
    pub error: f64,
    pub lower: f64,
    pub upper: f64,
}

impl Efficiency {
    /// `"{eff}^{+up}_{-lo} %"`, all in percent with one decimal.
    pub fn display(&self) -> String {
        format!(
            "{:.1}^{{+{:.1}}}_{{-{:.1}}} %",
            self.value * 100.0,
            self.upper * 100.0,
            self.lower * 100.0
        )
    }
}

/// Efficiency `n_sel / n_all`; all fields are zero when `n_all < 1`.
pub fn efficiency(n_sel: u64, n_all: u64) -> Efficiency {
    if n_all < 1 {
        return Efficiency {
            value: 0.0,
            error: 0.0,
            lower: 0.0,
            upper: 0.0,
        };
    }
    let value = n_sel.min(n_all) as f64 / n_all as f64;
    let lower = value - clopper_pearson(n_all, n_sel, ONE_SIGMA, false);
    let upper = clopper_pearson(n_all, n_sel, ONE_SIGMA, true) - value;
    Efficiency {
        value,
        error: (upper + lower) / 2.0,
        lower,
        upper,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_bracket_estimate() {
        let eff = efficiency(45, 100);
        assert!((eff.value - 0.45).abs() < 1e-12);
        assert!(eff.lower > 0.0 && eff.upper > 0.0);
        // Roughly the binomial sigma sqrt(p(1-p)/n) ~ 0.05.
        assert!(eff.lower > 0.03 && eff.lower < 0.07, "lower {}", eff.lower);
        assert!(eff.upper > 0.03 && eff.upper < 0.07, "upper {}", eff.upper);
    }

    #[test]
    fn edges_are_clamped() {
        let full = efficiency(10, 10);
        assert_eq!(full.value, 1.0);
        assert_eq!(full.upper, 0.0);
        assert!(full.lower > 0.0);

        let none = efficiency(0, 10);
        assert_eq!(none.value, 0.0);
        assert_eq!(none.lower, 0.0);
        assert!(none.upper > 0.0);
    }

    #[test]
    fn empty_sample_is_zero() {
        let eff = efficiency(0, 0);
        assert_eq!(eff.value, 0.0);
        assert_eq!(eff.error, 0.0);
    }

    #[test]
    fn display_format() {
        let eff = Efficiency {
            value: 0.5,
            error: 0.05,
            lower: 0.04,
            upper: 0.06,
        };
        assert_eq!(eff.display(), "50.0^{+6.0}_{-4.0} %");
    }
}
