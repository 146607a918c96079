//! SiPM I-V scans.
//!
//! - per-channel curve ingest (`curve`)
//! - operating point finder (`operating_point`)
//! - parallel board scan + summary histograms (`scan`)
//! - report pages for a scan (`report`)

pub mod curve;
pub mod operating_point;
pub mod report;
pub mod scan;

pub use curve::*;
pub use operating_point::*;
pub use report::*;
pub use scan::*;
