//! Mathematical utilities: model functions, least-squares steps, binomial statistics.

pub mod functions;
pub mod ols;
pub mod stats;

pub use functions::*;
pub use ols::*;
pub use stats::*;
