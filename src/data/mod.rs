//! Seeded synthetic data (demo histograms, I-V datasets).

pub mod synthetic;

pub use synthetic::*;
