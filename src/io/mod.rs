//! Input/output helpers.
//!
//! - operating point CSV export (`export`)
//! - JSON-lines artifact store (`store`)
//!
//! I-V curve ingest lives with the scan in `iv::curve`.

pub mod export;
pub mod store;

pub use export::*;
pub use store::*;
