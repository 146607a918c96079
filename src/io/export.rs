//! Export operating points to CSV.
//!
//! The table is meant to be easy to consume in spreadsheets or downstream scripts.

use std::path::Path;

use serde::Serialize;

use crate::error::AppError;
use crate::iv::scan::ScanResult;

#[derive(Debug, Serialize)]
struct OperatingPointRow {
    board: usize,
    channel: usize,
    i_start: f64,
    i_op: f64,
    v_min: f64,
    v_op: f64,
    v_avg: f64,
    v_max: f64,
}

/// Write one row per analysed channel. Returns the number of rows.
pub fn write_operating_points_csv(path: &Path, result: &ScanResult) -> Result<usize, AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::io(format!("Failed to create export CSV '{}': {e}", path.display())))?;

    for ch in &result.channels {
        let op = &ch.operating_point;
        writer
            .serialize(OperatingPointRow {
                board: ch.board(),
                channel: ch.channel(),
                i_start: op.i_start,
                i_op: op.i_op,
                v_min: op.v_min,
                v_op: op.v_op,
                v_avg: op.v_avg(),
                v_max: op.v_max,
            })
            .map_err(|e| AppError::io(format!("Failed to write export CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::io(format!("Failed to write export CSV '{}': {e}", path.display())))?;

    log::info!("Wrote {} operating points to {}", result.channels.len(), path.display());
    Ok(result.channels.len())
}
