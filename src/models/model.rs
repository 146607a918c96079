//! Peak model evaluation.
//!
//! The fitter only needs to evaluate `y(x)` for a parameter vector; each model
//! kind maps onto one of the functions in `math::functions`.

use serde::{Deserialize, Serialize};

use crate::math::{gaus, langaus};

/// Concrete fitted model kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeakModel {
    /// Parameters: `Constant, Mean, Sigma`.
    Gaussian,
    /// Parameters: `Width, MP, Area, GSigma`.
    LandauGaussian,
}

impl PeakModel {
    /// Human-readable label for text boxes and logs.
    pub fn display_name(self) -> &'static str {
        match self {
            PeakModel::Gaussian => "Gaussian",
            PeakModel::LandauGaussian => "Landau-Gaussian",
        }
    }

    /// Short label used in object names (`fitGaus_h1_3`).
    pub fn short_name(self) -> &'static str {
        match self {
            PeakModel::Gaussian => "Gaus",
            PeakModel::LandauGaussian => "Langaus",
        }
    }

    pub fn param_names(self) -> &'static [&'static str] {
        match self {
            PeakModel::Gaussian => &["Constant", "Mean", "Sigma"],
            PeakModel::LandauGaussian => &["Width", "MP", "Area", "GSigma"],
        }
    }

    pub fn param_count(self) -> usize {
        self.param_names().len()
    }
}

/// Evaluate `y(x)` for the given model kind.
pub fn evaluate(model: PeakModel, x: f64, params: &[f64]) -> f64 {
    match model {
        PeakModel::Gaussian => gaus(x, params[0], params[1], params[2]),
        PeakModel::LandauGaussian => langaus(x, params),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluate_gaussian_smoke() {
        let y = evaluate(PeakModel::Gaussian, 1.0, &[10.0, 1.0, 0.5]);
        assert_eq!(y, 10.0);
        assert_eq!(PeakModel::LandauGaussian.param_count(), 4);
    }
}
