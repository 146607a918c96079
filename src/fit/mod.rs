//! Peak fitting.
//!
//! Responsibilities:
//!
//! - estimate the half-maximum width and center of a peak (`fwhm`)
//! - fit a peak model with bounded Levenberg–Marquardt (`fitter`)
//! - build Gaussian / Landau-Gaussian fits and their overlays (`peak`)

pub mod fitter;
pub mod fwhm;
pub mod peak;

pub use fitter::*;
pub use fwhm::*;
pub use peak::*;
