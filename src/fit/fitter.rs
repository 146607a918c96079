//! Bounded non-linear least squares (Levenberg–Marquardt).
//!
//! Given:
//! - points `(x_i, y_i)` with uncertainties `σ_i`
//! - a peak model and a start value plus optional bounds per parameter
//!
//! we iterate damped Gauss–Newton steps on the weighted residuals
//! `r_i = (y_i - f(x_i; p)) / σ_i`, clamping every trial parameter vector into
//! its bounds. Parameters resting on a bound are held fixed while the step
//! would push them further out. The Jacobian is built by finite differences.

use std::fmt;

use nalgebra::{DMatrix, DVector};

use crate::domain::Histogram1D;
use crate::math::{covariance, damped_step};
use crate::models::{PeakModel, evaluate};

/// Largest damping factor before the fitter gives up improving.
const LAMBDA_MAX: f64 = 1e12;

/// Start value and optional limits for one parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    pub start: f64,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

impl ParamSpec {
    pub fn free(start: f64) -> Self {
        Self {
            start,
            lower: None,
            upper: None,
        }
    }

    pub fn bounded(start: f64, lower: f64, upper: f64) -> Self {
        Self {
            start,
            lower: Some(lower.min(upper)),
            upper: Some(upper.max(lower)),
        }
    }

    pub fn clamp(&self, v: f64) -> f64 {
        let v = match self.lower {
            Some(lo) if v < lo => lo,
            _ => v,
        };
        match self.upper {
            Some(hi) if v > hi => hi,
            _ => v,
        }
    }
}

/// Points entering the fit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FitData {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub sigma: Vec<f64>,
}

impl FitData {
    /// Bins whose center lies in `[lo, hi]`. Empty bins are skipped and each bin
    /// gets the Poisson uncertainty `sqrt(content)`.
    pub fn from_histogram(hist: &Histogram1D, (lo, hi): (f64, f64)) -> Self {
        let mut data = FitData::default();
        for bin in 0..hist.nbins() {
            let x = hist.bin_center(bin);
            let y = hist.bin_content(bin);
            if x < lo || x > hi || y <= 0.0 {
                continue;
            }
            data.x.push(x);
            data.y.push(y);
            data.sigma.push(y.sqrt());
        }
        data
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct FitOptions {
    pub max_iterations: usize,
    /// Relative chi-square improvement below which the fit is converged.
    pub tolerance: f64,
    pub initial_lambda: f64,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            max_iterations: 300,
            tolerance: 1e-9,
            initial_lambda: 1e-3,
        }
    }
}

/// Converged fit.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelFit {
    pub model: PeakModel,
    pub params: Vec<f64>,
    pub errors: Vec<f64>,
    pub chi2: f64,
    pub ndf: usize,
    pub iterations: usize,
}

impl ModelFit {
    pub fn eval(&self, x: f64) -> f64 {
        evaluate(self.model, x, &self.params)
    }
}

/// Why a fit did not produce parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum FitFailure {
    TooFewPoints { points: usize, params: usize },
    NonFinite,
    Singular,
    MaxIterations { iterations: usize },
}

impl fmt::Display for FitFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitFailure::TooFewPoints { points, params } => {
                write!(f, "{points} points cannot constrain {params} parameters")
            }
            FitFailure::NonFinite => write!(f, "model evaluation produced non-finite values"),
            FitFailure::Singular => write!(f, "linearised system is singular"),
            FitFailure::MaxIterations { iterations } => {
                write!(f, "no convergence after {iterations} iterations")
            }
        }
    }
}

/// Fit `model` to `data`.
pub fn fit_model(
    model: PeakModel,
    data: &FitData,
    specs: &[ParamSpec],
    opts: &FitOptions,
) -> Result<ModelFit, FitFailure> {
    let p = specs.len();
    let n = data.len();
    if p != model.param_count() || n <= p {
        return Err(FitFailure::TooFewPoints { points: n, params: p });
    }
    if data.sigma.iter().any(|s| !(s.is_finite() && *s > 0.0)) {
        return Err(FitFailure::NonFinite);
    }

    let mut params: Vec<f64> = specs.iter().map(|s| s.clamp(s.start)).collect();
    let mut r = residuals(model, data, &params).ok_or(FitFailure::NonFinite)?;
    let mut chi2 = r.norm_squared();
    let mut lambda = opts.initial_lambda;

    for iteration in 1..=opts.max_iterations {
        let jac = jacobian(model, data, specs, &params).ok_or(FitFailure::NonFinite)?;

        let Some(delta) = bounded_step(&jac, &r, lambda, specs, &params) else {
            lambda *= 10.0;
            if lambda > LAMBDA_MAX {
                return Err(FitFailure::Singular);
            }
            continue;
        };

        let trial: Vec<f64> = specs
            .iter()
            .zip(params.iter().zip(delta.iter()))
            .map(|(spec, (&v, &d))| spec.clamp(v + d))
            .collect();

        match residuals(model, data, &trial) {
            Some(r_trial) if r_trial.norm_squared() < chi2 => {
                let chi2_trial = r_trial.norm_squared();
                let improvement = chi2 - chi2_trial;
                params = trial;
                r = r_trial;
                chi2 = chi2_trial;
                lambda = (lambda / 10.0).max(1e-12);
                if improvement <= opts.tolerance * (chi2 + opts.tolerance) {
                    return Ok(finish(model, data, specs, params, chi2, iteration));
                }
            }
            _ => {
                lambda *= 10.0;
                if lambda > LAMBDA_MAX {
                    // No downhill step left: the current point is a minimum.
                    return Ok(finish(model, data, specs, params, chi2, iteration));
                }
            }
        }
    }

    Err(FitFailure::MaxIterations {
        iterations: opts.max_iterations,
    })
}

/// Damped step with parameters pinned at a limit held fixed.
///
/// A parameter sitting on one of its bounds whose proposed step points
/// outward is removed from the system and the rest is solved again, until
/// the active set stops growing.
fn bounded_step(
    jac: &DMatrix<f64>,
    r: &DVector<f64>,
    lambda: f64,
    specs: &[ParamSpec],
    params: &[f64],
) -> Option<DVector<f64>> {
    let p = params.len();
    let mut pinned = vec![false; p];
    let mut delta = damped_step(jac, r, lambda)?;

    loop {
        let mut grew = false;
        for j in 0..p {
            if !pinned[j] && pushes_outward(&specs[j], params[j], delta[j]) {
                pinned[j] = true;
                grew = true;
            }
        }
        if !grew {
            return Some(delta);
        }

        let free: Vec<usize> = (0..p).filter(|&j| !pinned[j]).collect();
        delta = DVector::zeros(p);
        if free.is_empty() {
            return Some(delta);
        }
        let reduced = jac.select_columns(free.iter());
        let step = damped_step(&reduced, r, lambda)?;
        for (k, &j) in free.iter().enumerate() {
            delta[j] = step[k];
        }
    }
}

fn pushes_outward(spec: &ParamSpec, value: f64, step: f64) -> bool {
    let at_lower = spec.lower.is_some_and(|lo| value <= lo);
    let at_upper = spec.upper.is_some_and(|hi| value >= hi);
    (at_lower && step < 0.0) || (at_upper && step > 0.0)
}

fn finish(
    model: PeakModel,
    data: &FitData,
    specs: &[ParamSpec],
    params: Vec<f64>,
    chi2: f64,
    iterations: usize,
) -> ModelFit {
    let errors = jacobian(model, data, specs, &params)
        .and_then(|jac| covariance(&jac))
        .map(|cov| (0..params.len()).map(|j| cov[(j, j)].max(0.0).sqrt()).collect())
        .unwrap_or_else(|| vec![f64::NAN; params.len()]);
    ModelFit {
        model,
        ndf: data.len() - params.len(),
        params,
        errors,
        chi2,
        iterations,
    }
}

fn residuals(model: PeakModel, data: &FitData, params: &[f64]) -> Option<DVector<f64>> {
    let r = DVector::from_iterator(
        data.len(),
        (0..data.len()).map(|i| (data.y[i] - evaluate(model, data.x[i], params)) / data.sigma[i]),
    );
    r.iter().all(|v| v.is_finite()).then_some(r)
}

/// Jacobian of the model (not the residuals) scaled by `1 / σ_i`.
fn jacobian(model: PeakModel, data: &FitData, specs: &[ParamSpec], params: &[f64]) -> Option<DMatrix<f64>> {
    let n = data.len();
    let p = params.len();
    let mut jac = DMatrix::<f64>::zeros(n, p);
    let mut shifted = params.to_vec();
    let base: Vec<f64> = data.x.iter().map(|&x| evaluate(model, x, params)).collect();

    for j in 0..p {
        let h = 1e-6 * params[j].abs() + 1e-9;
        // Step away from an active upper bound.
        let forward = specs[j].clamp(params[j] + h) > params[j];
        let step = if forward { h } else { -h };
        shifted[j] = params[j] + step;
        for i in 0..n {
            let f1 = evaluate(model, data.x[i], &shifted);
            jac[(i, j)] = (f1 - base[i]) / step / data.sigma[i];
        }
        shifted[j] = params[j];
    }

    jac.iter().all(|v| v.is_finite()).then_some(jac)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::gaus;

    fn gaussian_data(amplitude: f64, mean: f64, sigma: f64) -> FitData {
        let mut data = FitData::default();
        for i in 0..60 {
            let x = mean - 3.0 * sigma + i as f64 * sigma * 0.1;
            let y = gaus(x, amplitude, mean, sigma);
            data.x.push(x);
            data.y.push(y);
            data.sigma.push(y.sqrt().max(1.0));
        }
        data
    }

    #[test]
    fn recovers_gaussian_parameters() {
        let data = gaussian_data(500.0, 3.0, 0.4);
        let specs = [ParamSpec::free(400.0), ParamSpec::free(2.8), ParamSpec::free(0.6)];
        let fit = fit_model(PeakModel::Gaussian, &data, &specs, &FitOptions::default()).unwrap();
        assert!((fit.params[0] - 500.0).abs() < 1e-3, "{:?}", fit.params);
        assert!((fit.params[1] - 3.0).abs() < 1e-6);
        assert!((fit.params[2].abs() - 0.4).abs() < 1e-6);
        assert!(fit.chi2 < 1e-6);
        assert_eq!(fit.ndf, 57);
        assert!(fit.errors.iter().all(|e| e.is_finite()));
    }

    #[test]
    fn respects_bounds() {
        let data = gaussian_data(500.0, 3.0, 0.4);
        let specs = [
            ParamSpec::free(500.0),
            ParamSpec::bounded(2.5, 2.0, 2.8),
            ParamSpec::free(0.4),
        ];
        let fit = fit_model(PeakModel::Gaussian, &data, &specs, &FitOptions::default()).unwrap();
        assert!((fit.params[1] - 2.8).abs() < 1e-12, "{:?}", fit.params);
        assert!(fit.iterations < 100, "took {} iterations", fit.iterations);
        assert!(fit.params[0] > 0.0 && fit.params[2].abs() > 0.0);
    }

    #[test]
    fn converges_against_a_lower_bound() {
        let data = gaussian_data(500.0, 3.0, 0.4);
        let specs = [
            ParamSpec::free(500.0),
            ParamSpec::bounded(3.5, 3.2, 4.0),
            ParamSpec::free(0.4),
        ];
        let fit = fit_model(PeakModel::Gaussian, &data, &specs, &FitOptions::default()).unwrap();
        assert!((fit.params[1] - 3.2).abs() < 1e-12, "{:?}", fit.params);
        assert!(fit.iterations < 100);
    }

    #[test]
    fn pinned_parameter_only_moves_inward() {
        let spec = ParamSpec::bounded(1.0, 0.0, 2.0);
        assert!(pushes_outward(&spec, 2.0, 0.1));
        assert!(!pushes_outward(&spec, 2.0, -0.1));
        assert!(pushes_outward(&spec, 0.0, -0.1));
        assert!(!pushes_outward(&spec, 1.0, 5.0));
        assert!(!pushes_outward(&ParamSpec::free(1.0), 1.0, 5.0));
    }

    #[test]
    fn too_few_points_is_reported() {
        let data = FitData {
            x: vec![1.0, 2.0],
            y: vec![1.0, 2.0],
            sigma: vec![1.0, 1.0],
        };
        let specs = [ParamSpec::free(1.0), ParamSpec::free(1.0), ParamSpec::free(1.0)];
        let err = fit_model(PeakModel::Gaussian, &data, &specs, &FitOptions::default()).unwrap_err();
        assert_eq!(err, FitFailure::TooFewPoints { points: 2, params: 3 });
    }

    #[test]
    fn histogram_data_skips_empty_bins() {
        let mut h = Histogram1D::new("h", "", 4, 0.0, 4.0).unwrap();
        h.set_bin_content(1, 4.0);
        h.set_bin_content(2, 9.0);
        let data = FitData::from_histogram(&h, (0.0, 3.0));
        assert_eq!(data.x, vec![1.5, 2.5]);
        assert_eq!(data.sigma, vec![2.0, 3.0]);
    }
}
