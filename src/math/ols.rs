//! Linear least-squares step for the non-linear fitter.
//!
//! Each Levenberg–Marquardt iteration solves the damped, linearised problem
//!
//! ```text
//! minimize ‖J δ - r‖² + λ Σ d_j δ_j²
//! ```
//!
//! which is an ordinary least-squares problem on the augmented system
//! `[J; sqrt(λ D)] δ = [r; 0]`. The system is tall (more rows than columns), so
//! it is solved with SVD rather than QR.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Progressively looser tolerances; peak fits mix parameters of very
    // different magnitude (areas vs widths), so the first one may reject.
    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(delta) = svd.solve(y, tol) {
            if delta.iter().all(|v| v.is_finite()) {
                return Some(delta);
            }
        }
    }

    None
}

/// Solve the damped normal step `[J; sqrt(λ D)] δ = [r; 0]`.
///
/// `D` is the diagonal of `JᵀJ` (Marquardt scaling), floored so that
/// parameters with a vanishing gradient still get damped.
pub fn damped_step(jacobian: &DMatrix<f64>, residuals: &DVector<f64>, lambda: f64) -> Option<DVector<f64>> {
    let (n, p) = jacobian.shape();
    let mut augmented = DMatrix::<f64>::zeros(n + p, p);
    augmented.view_mut((0, 0), (n, p)).copy_from(jacobian);

    for j in 0..p {
        let d = jacobian.column(j).norm_squared().max(1e-12);
        augmented[(n + j, j)] = (lambda * d).sqrt();
    }

    let mut rhs = DVector::<f64>::zeros(n + p);
    rhs.rows_mut(0, n).copy_from(residuals);

    solve_least_squares(&augmented, &rhs)
}

/// Covariance `(JᵀJ)⁻¹` via pseudo-inverse; `None` when it cannot be formed.
pub fn covariance(jacobian: &DMatrix<f64>) -> Option<DMatrix<f64>> {
    let jtj = jacobian.transpose() * jacobian;
    let cov = jtj.pseudo_inverse(1e-14).ok()?;
    cov.iter().all(|v| v.is_finite()).then_some(cov)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn damping_shrinks_step() {
        let j = DMatrix::from_row_slice(3, 1, &[1.0, 1.0, 1.0]);
        let r = DVector::from_row_slice(&[3.0, 3.0, 3.0]);
        let free = damped_step(&j, &r, 0.0).unwrap();
        let damped = damped_step(&j, &r, 1.0).unwrap();
        assert!((free[0] - 3.0).abs() < 1e-10);
        // (JᵀJ + λD) δ = Jᵀr  ->  (3 + 3) δ = 9
        assert!((damped[0] - 1.5).abs() < 1e-10);
    }

    #[test]
    fn covariance_of_line_fit() {
        let j = DMatrix::from_row_slice(2, 1, &[1.0, 1.0]);
        let cov = covariance(&j).unwrap();
        assert!((cov[(0, 0)] - 0.5).abs() < 1e-12);
    }
}
