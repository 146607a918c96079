//! Operating point of one I-V curve.
//!
//! The current sits on a baseline `I[0]` until the breakdown jump at index `j`,
//! then on a second plateau `I[j]` until the next rise at index `k`:
//!
//! ```text
//! i_start = I[0]
//! i_op    = I[j]                (first I > i_start)
//! v_min   = V[j-1]
//! v_op    = (V[j-1] + V[j]) / 2
//! v_max   = V[k-1]              (first I > i_op after j), else V[last]
//! ```

use serde::Serialize;

use crate::iv::curve::IvPoint;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OperatingPoint {
    pub i_start: f64,
    pub i_op: f64,
    pub v_min: f64,
    pub v_max: f64,
    pub v_op: f64,
}

impl OperatingPoint {
    /// Center of the second plateau.
    pub fn v_avg(&self) -> f64 {
        0.5 * (self.v_min + self.v_max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatingPointError {
    /// Fewer than two points.
    TooFewPoints,
    /// The current never rises above its first value.
    NoJump,
}

impl std::fmt::Display for OperatingPointError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperatingPointError::TooFewPoints => write!(f, "fewer than two points"),
            OperatingPointError::NoJump => write!(f, "no current jump above baseline"),
        }
    }
}

/// Locate the operating point of a curve ordered by voltage.
pub fn find_operating_point(points: &[IvPoint]) -> Result<OperatingPoint, OperatingPointError> {
    if points.len() < 2 {
        return Err(OperatingPointError::TooFewPoints);
    }
    let i_start = points[0].current;
    let j = points
        .iter()
        .position(|p| p.current > i_start)
        .ok_or(OperatingPointError::NoJump)?;
    // j >= 1 because I[0] is never above itself.
    let before = points[j - 1];
    let at = points[j];
    let i_op = at.current;

    let v_max = points[j + 1..]
        .iter()
        .position(|p| p.current > i_op)
        .map(|offset| points[j + offset].voltage)
        .unwrap_or(points[points.len() - 1].voltage);

    Ok(OperatingPoint {
        i_start,
        i_op,
        v_min: before.voltage,
        v_max,
        v_op: 0.5 * (before.voltage + at.voltage),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curve(values: &[(f64, f64)]) -> Vec<IvPoint> {
        values
            .iter()
            .map(|&(voltage, current)| IvPoint { voltage, current })
            .collect()
    }

    #[test]
    fn plateau_jump_and_second_rise() {
        let pts = curve(&[
            (50.0, 0.02),
            (50.5, 0.02),
            (51.0, 0.02),
            (51.5, 0.03),
            (52.0, 0.03),
            (52.5, 0.03),
            (53.0, 0.08),
        ]);
        let op = find_operating_point(&pts).unwrap();
        assert_eq!(op.i_start, 0.02);
        assert_eq!(op.i_op, 0.03);
        assert_eq!(op.v_min, 51.0);
        assert_eq!(op.v_max, 52.5);
        assert!((op.v_op - 51.25).abs() < 1e-12);
        assert!((op.v_avg() - 51.75).abs() < 1e-12);
    }

    #[test]
    fn without_second_rise_v_max_is_last_voltage() {
        let pts = curve(&[(50.0, 0.0), (51.0, 0.0), (52.0, 0.04), (53.0, 0.04)]);
        let op = find_operating_point(&pts).unwrap();
        assert_eq!(op.v_min, 51.0);
        assert_eq!(op.v_max, 53.0);
    }

    #[test]
    fn jump_at_second_point() {
        let pts = curve(&[(50.0, 0.0), (50.5, 0.01)]);
        let op = find_operating_point(&pts).unwrap();
        assert_eq!(op.v_min, 50.0);
        assert_eq!(op.v_max, 50.5);
        assert!((op.v_op - 50.25).abs() < 1e-12);
    }

    #[test]
    fn flat_or_falling_curve_has_no_jump() {
        let pts = curve(&[(50.0, 0.05), (51.0, 0.05), (52.0, 0.01)]);
        assert_eq!(find_operating_point(&pts), Err(OperatingPointError::NoJump));
        assert_eq!(
            find_operating_point(&pts[..1]),
            Err(OperatingPointError::TooFewPoints)
        );
    }
}
