//! Domain types used throughout the crate.
//!
//! This module defines:
//!
//! - binned histograms (`Histogram1D`, `Histogram2D`)
//! - drawable artifacts (graphs, curves, text boxes, legends, bands)
//! - explicit styling (`Style`, `Color`, `DrawMode`)

pub mod artifact;
pub mod hist;
pub mod types;

pub use artifact::*;
pub use hist::*;
pub use types::*;
