//! I-V curve CSV ingest.
//!
//! Each channel file holds one measured curve with `voltage` and `current`
//! columns (µA). Rows that do not parse are skipped and counted; a file with
//! no usable rows is an error for that channel only.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use csv::StringRecord;
use serde::{Deserialize, Serialize};

use crate::domain::{Color, Graph, LineStyle, Marker};
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IvPoint {
    pub voltage: f64,
    pub current: f64,
}

/// One channel's measured curve, ordered by voltage.
#[derive(Debug, Clone, PartialEq)]
pub struct IvCurve {
    pub board: usize,
    pub channel: usize,
    pub points: Vec<IvPoint>,
    /// Data rows that failed to parse.
    pub skipped_rows: usize,
}

impl IvCurve {
    pub fn new(board: usize, channel: usize, mut points: Vec<IvPoint>) -> Self {
        points.sort_by(|a, b| a.voltage.total_cmp(&b.voltage));
        Self {
            board,
            channel,
            points,
            skipped_rows: 0,
        }
    }

    /// `B{board}C{channel}`, the name used in legends and the structured store.
    pub fn label(&self) -> String {
        format!("B{}C{}", self.board, self.channel)
    }

    pub fn voltages(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.voltage).collect()
    }

    pub fn currents(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.current).collect()
    }

    /// The curve as a line-and-marker graph.
    pub fn to_graph(&self, color: Color, marker: Marker) -> Graph {
        let mut graph = Graph::from_points(
            self.label(),
            self.label(),
            self.points.iter().map(|p| (p.voltage, p.current)).collect(),
        );
        graph.line = LineStyle::colored(color);
        graph.marker = marker;
        graph
    }
}

/// Read one channel file.
pub fn read_iv_csv(path: &Path, board: usize, channel: usize) -> Result<IvCurve, AppError> {
    let file = File::open(path).map_err(|e| AppError::io(format!("Failed to open '{}': {e}", path.display())))?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::io(format!("Failed to read CSV headers of '{}': {e}", path.display())))?
        .clone();
    let header_map = build_header_map(&headers);
    let v_idx = column(&header_map, &["voltage", "v", "u"])
        .ok_or_else(|| AppError::io(format!("'{}' has no `voltage` column", path.display())))?;
    let i_idx = column(&header_map, &["current", "i"])
        .ok_or_else(|| AppError::io(format!("'{}' has no `current` column", path.display())))?;

    let mut points = Vec::new();
    let mut skipped = 0usize;
    for result in reader.records() {
        let Ok(record) = result else {
            skipped += 1;
            continue;
        };
        match (parse_f64(&record, v_idx), parse_f64(&record, i_idx)) {
            (Some(voltage), Some(current)) => points.push(IvPoint { voltage, current }),
            _ => skipped += 1,
        }
    }

    if points.is_empty() {
        return Err(AppError::io(format!("'{}' contains no valid I-V rows", path.display())));
    }
    if skipped > 0 {
        log::debug!("{}: skipped {skipped} unparsable rows", path.display());
    }

    let mut curve = IvCurve::new(board, channel, points);
    curve.skipped_rows = skipped;
    Ok(curve)
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (name.trim().trim_start_matches('\u{feff}').to_ascii_lowercase(), idx))
        .collect()
}

fn column(header_map: &HashMap<String, usize>, names: &[&str]) -> Option<usize> {
    names.iter().find_map(|n| header_map.get(*n).copied())
}

fn parse_f64(record: &StringRecord, idx: usize) -> Option<f64> {
    let v = record.get(idx)?.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_sorted_points_and_skips_bad_rows() {
        let dir = std::env::temp_dir().join("sipm_report_iv_curve_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("SiPM3.csv");
        std::fs::write(&path, "\u{feff}Voltage, Current\n51.0,0.02\n50.0,0.02\nbad,row\n52.0,0.05\n").unwrap();

        let curve = read_iv_csv(&path, 7, 3).unwrap();
        assert_eq!(curve.label(), "B7C3");
        assert_eq!(curve.voltages(), vec![50.0, 51.0, 52.0]);
        assert_eq!(curve.currents(), vec![0.02, 0.02, 0.05]);
        assert_eq!(curve.skipped_rows, 1);
    }

    #[test]
    fn missing_column_is_an_io_error() {
        let dir = std::env::temp_dir().join("sipm_report_iv_curve_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("no_current.csv");
        std::fs::write(&path, "voltage,temp\n50.0,20.1\n").unwrap();

        let err = read_iv_csv(&path, 1, 0).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Io);
    }

    #[test]
    fn graph_keeps_label_and_style() {
        let curve = IvCurve::new(
            2,
            5,
            vec![
                IvPoint { voltage: 50.0, current: 0.0 },
                IvPoint { voltage: 50.5, current: 0.1 },
            ],
        );
        let g = curve.to_graph(Color::RED, Marker::Square);
        assert_eq!(g.name, "B2C5");
        assert_eq!(g.points.len(), 2);
        assert_eq!(g.line.color, Color::RED);
        assert_eq!(g.marker, Marker::Square);
    }
}
