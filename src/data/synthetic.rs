//! Synthetic calibration data for demos and tests.
//!
//! Peaks are drawn from seeded generators so a given seed always produces the
//! same report. Landau-like peaks use the Moyal distribution: if `Z ~ N(0, 1)`
//! then `mu - sigma * ln(Z^2)` is Moyal distributed.

use std::path::Path;

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{Histogram1D, Histogram2D};
use crate::error::AppError;
use crate::iv::curve::{IvCurve, IvPoint};
use crate::iv::scan::channel_path;

/// Shape of a synthetic single-photon-like peak.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PeakShape {
    Gaussian { mean: f64, sigma: f64 },
    /// Moyal core smeared by a Gaussian of width `smear`.
    Landau { mpv: f64, width: f64, smear: f64 },
}

fn normal(mean: f64, sigma: f64) -> Result<Normal<f64>, AppError> {
    Normal::new(mean, sigma).map_err(|e| AppError::config(format!("Invalid noise distribution: {e}")))
}

/// Fill a histogram with `entries` samples of `shape`.
pub fn peak_histogram(
    name: &str,
    title: &str,
    binning: (f64, f64, f64),
    shape: PeakShape,
    entries: usize,
    rng: &mut StdRng,
) -> Result<Histogram1D, AppError> {
    let mut hist = Histogram1D::with_binning(name, title, binning)?;
    let unit = normal(0.0, 1.0)?;
    for _ in 0..entries {
        let x = match shape {
            PeakShape::Gaussian { mean, sigma } => mean + sigma * unit.sample(rng),
            PeakShape::Landau { mpv, width, smear } => {
                let z: f64 = unit.sample(rng);
                let core = mpv - width * (z * z).max(f64::MIN_POSITIVE).ln();
                core + smear * unit.sample(rng)
            }
        };
        hist.fill(x);
    }
    Ok(hist)
}

/// A 2-D histogram whose y peak drifts linearly with x.
pub fn drifting_peak_map(name: &str, title: &str, entries: usize, rng: &mut StdRng) -> Result<Histogram2D, AppError> {
    let mut hist = Histogram2D::new(name, title, (10, 0.0, 10.0), (20, 0.0, 20.0))?;
    let unit = normal(0.0, 1.0)?;
    for _ in 0..entries {
        let x: f64 = rng.gen_range(0.0..10.0);
        let y = 5.0 + x + 1.5 * unit.sample(rng);
        hist.fill(x, y);
    }
    Ok(hist)
}

/// Parameters of a synthetic I-V sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IvSweep {
    pub v_start: f64,
    pub v_step: f64,
    pub steps: usize,
    pub baseline: f64,
    pub plateau: f64,
    /// Width of the second plateau in steps.
    pub plateau_steps: usize,
}

impl Default for IvSweep {
    fn default() -> Self {
        Self {
            v_start: 50.0,
            v_step: 0.5,
            steps: 30,
            baseline: 0.02,
            plateau: 0.04,
            plateau_steps: 4,
        }
    }
}

/// A monotone curve: baseline up to `jump - 1`, a plateau from `jump`, then a
/// steady rise.
pub fn iv_curve(board: usize, channel: usize, sweep: &IvSweep, jump: usize) -> IvCurve {
    let jump = jump.clamp(1, sweep.steps.saturating_sub(1).max(1));
    let points = (0..sweep.steps)
        .map(|k| {
            let voltage = sweep.v_start + sweep.v_step * k as f64;
            let current = if k < jump {
                sweep.baseline
            } else if k < jump + sweep.plateau_steps {
                sweep.plateau
            } else {
                sweep.plateau + 0.05 * (k + 1 - jump - sweep.plateau_steps) as f64
            };
            IvPoint { voltage, current }
        })
        .collect();
    IvCurve::new(board, channel, points)
}

/// Write `{dir}/Board{b}/SiPM{c}.csv` for every board and channel, with the
/// jump position drawn around the middle of the sweep. Returns the file count.
pub fn write_iv_dataset(dir: &Path, boards: usize, channels: usize, seed: u64) -> Result<usize, AppError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let sweep = IvSweep::default();
    let jitter = normal(0.0, 2.0)?;
    let mut written = 0;
    for board in 1..=boards {
        for channel in 0..channels {
            let center = (sweep.steps / 3) as f64 + jitter.sample(&mut rng);
            let curve = iv_curve(board, channel, &sweep, center.round().max(1.0) as usize);
            let path = channel_path(dir, board, channel);
            write_curve_csv(&path, &curve)?;
            written += 1;
        }
    }
    log::debug!("Wrote {written} synthetic I-V curves under {}", dir.display());
    Ok(written)
}

fn write_curve_csv(path: &Path, curve: &IvCurve) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| AppError::io(format!("Failed to create '{}': {e}", parent.display())))?;
    }
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::io(format!("Failed to create '{}': {e}", path.display())))?;
    for p in &curve.points {
        writer
            .serialize(p)
            .map_err(|e| AppError::io(format!("Failed to write '{}': {e}", path.display())))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::io(format!("Failed to write '{}': {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iv::curve::read_iv_csv;
    use crate::iv::operating_point::find_operating_point;

    #[test]
    fn gaussian_peak_is_centered() {
        let mut rng = StdRng::seed_from_u64(7);
        let shape = PeakShape::Gaussian { mean: 10.0, sigma: 1.0 };
        let h = peak_histogram("h", "peak", (0.2, 0.0, 20.0), shape, 5000, &mut rng).unwrap();
        assert_eq!(h.entries, 5000);
        assert!((h.mean() - 10.0).abs() < 0.1);
        assert!((h.rms() - 1.0).abs() < 0.1);
    }

    #[test]
    fn landau_peak_has_a_right_tail() {
        let mut rng = StdRng::seed_from_u64(11);
        let shape = PeakShape::Landau { mpv: 5.0, width: 0.5, smear: 0.2 };
        let h = peak_histogram("h", "peak", (0.1, 0.0, 20.0), shape, 5000, &mut rng).unwrap();
        let peak = h.bin_center(h.maximum_bin());
        assert!((peak - 5.0).abs() < 0.6, "peak at {peak}");
        assert!(h.mean() > peak);
    }

    #[test]
    fn same_seed_same_histogram() {
        let shape = PeakShape::Gaussian { mean: 0.0, sigma: 1.0 };
        let a = peak_histogram("h", "", (0.5, -5.0, 5.0), shape, 100, &mut StdRng::seed_from_u64(3)).unwrap();
        let b = peak_histogram("h", "", (0.5, -5.0, 5.0), shape, 100, &mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn curve_jump_is_where_requested() {
        let sweep = IvSweep::default();
        let curve = iv_curve(1, 0, &sweep, 8);
        let op = find_operating_point(&curve.points).unwrap();
        assert_eq!(op.v_min, 53.5);
        assert!((op.v_op - 53.75).abs() < 1e-12);
        assert_eq!(op.v_max, 55.5);
    }

    #[test]
    fn dataset_round_trips_through_the_reader() {
        let dir = std::env::temp_dir().join("sipm_report_synthetic_iv_test");
        let _ = std::fs::remove_dir_all(&dir);
        assert_eq!(write_iv_dataset(&dir, 2, 3, 5).unwrap(), 6);
        let curve = read_iv_csv(&channel_path(&dir, 2, 2), 2, 2).unwrap();
        assert_eq!(curve.points.len(), IvSweep::default().steps);
        assert!(find_operating_point(&curve.points).is_ok());
    }
}
