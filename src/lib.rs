//! `sipm-report` library crate.
//!
//! The binary (`sipm`) is a thin wrapper around this library so that:
//!
//! - the report builder and the scan are testable without spawning processes
//! - analysis scripts can drive a `ReportBuilder` directly
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod iv;
pub mod math;
pub mod models;
pub mod render;
pub mod report;
