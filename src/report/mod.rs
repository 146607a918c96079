//! Paginated PDF reports.
//!
//! - report options and output paths (`options`)
//! - page / panel model (`page`)
//! - the report builder state machine (`builder`)
//! - terminal and label formatting (`format`)

pub mod builder;
pub mod format;
pub mod options;
pub mod page;

pub use builder::*;
pub use format::*;
pub use options::*;
pub use page::*;
