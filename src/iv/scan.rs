//! Board scan: read every channel curve, find its operating point and fill the
//! summary histograms.
//!
//! Curves are read and analysed in parallel; results are then merged in
//! board/channel order so the report and the logs do not depend on scheduling.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::domain::Histogram1D;
use crate::error::AppError;
use crate::iv::curve::{IvCurve, read_iv_csv};
use crate::iv::operating_point::{OperatingPoint, OperatingPointError, find_operating_point};

pub const DEFAULT_BOARDS: usize = 60;
pub const DEFAULT_CHANNELS: usize = 16;

#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    pub data_dir: PathBuf,
    /// Boards are numbered `1..=boards`.
    pub boards: usize,
    /// Channels are numbered `0..channels`.
    pub channels: usize,
}

impl ScanConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            boards: DEFAULT_BOARDS,
            channels: DEFAULT_CHANNELS,
        }
    }
}

/// Non-fatal per-channel problems.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanIssue {
    MissingInput {
        board: usize,
        channel: usize,
        reason: String,
    },
    NoJump {
        board: usize,
        channel: usize,
    },
}

impl std::fmt::Display for ScanIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanIssue::MissingInput { board, channel, .. } => write!(f, "Missing Board {board} SiPM {channel}"),
            ScanIssue::NoJump { board, channel } => write!(f, "No current jump on Board {board} SiPM {channel}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelResult {
    pub curve: IvCurve,
    pub operating_point: OperatingPoint,
}

impl ChannelResult {
    pub fn board(&self) -> usize {
        self.curve.board
    }

    pub fn channel(&self) -> usize {
        self.curve.channel
    }
}

/// Distributions of the operating point quantities over all channels.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanHistograms {
    pub i_min: Histogram1D,
    pub i_op: Histogram1D,
    pub v_min: Histogram1D,
    pub v_avg: Histogram1D,
    pub v_max: Histogram1D,
    pub v_op: Histogram1D,
}

impl ScanHistograms {
    pub fn new() -> Result<Self, AppError> {
        Ok(Self {
            i_min: Histogram1D::new("hImin", "Minimum/Baseline current;I_start (uA);N_SiPM", 10, -0.005, 0.095)?,
            i_op: Histogram1D::new("hIop", "2nd Minimum/Working current;I_op (uA);N_SiPM", 10, -0.005, 0.095)?,
            v_min: Histogram1D::new("hVmin", "Minimum voltage with value of Iop;U_min (V);N_SiPM", 30, 50.0, 65.0)?,
            v_avg: Histogram1D::new("hVavg", "Average voltage with value of Iop;U_avg (V);N_SiPM", 30, 50.0, 65.0)?,
            v_max: Histogram1D::new("hVmax", "Maximum voltage with value of Iop;U_max (V);N_SiPM", 30, 50.0, 65.0)?,
            v_op: Histogram1D::new("hVop", "Operating voltage at the jump;U_op (V);N_SiPM", 30, 50.0, 65.0)?,
        })
    }

    pub fn fill(&mut self, op: &OperatingPoint) {
        self.i_min.fill(op.i_start);
        self.i_op.fill(op.i_op);
        self.v_min.fill(op.v_min);
        self.v_avg.fill(op.v_avg());
        self.v_max.fill(op.v_max);
        self.v_op.fill(op.v_op);
    }

    /// Current histograms first, then the voltage histograms.
    pub fn all(&self) -> [&Histogram1D; 6] {
        [&self.i_min, &self.i_op, &self.v_min, &self.v_avg, &self.v_max, &self.v_op]
    }

    pub fn voltages(&self) -> [&Histogram1D; 4] {
        [&self.v_min, &self.v_avg, &self.v_max, &self.v_op]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanResult {
    /// Analysed channels in board/channel order.
    pub channels: Vec<ChannelResult>,
    pub issues: Vec<ScanIssue>,
    pub histograms: ScanHistograms,
}

impl ScanResult {
    /// Channels grouped per board, in board order.
    pub fn by_board(&self) -> BTreeMap<usize, Vec<&ChannelResult>> {
        let mut boards: BTreeMap<usize, Vec<&ChannelResult>> = BTreeMap::new();
        for ch in &self.channels {
            boards.entry(ch.board()).or_default().push(ch);
        }
        boards
    }

    pub fn missing(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| matches!(i, ScanIssue::MissingInput { .. }))
            .count()
    }
}

/// `{data_dir}/Board{b}/SiPM{c}.csv`
pub fn channel_path(data_dir: &Path, board: usize, channel: usize) -> PathBuf {
    data_dir.join(format!("Board{board}")).join(format!("SiPM{channel}.csv"))
}

/// Scan every board/channel file under `config.data_dir`.
pub fn scan_boards(config: &ScanConfig) -> Result<ScanResult, AppError> {
    if !config.data_dir.is_dir() {
        return Err(AppError::config(format!(
            "Data directory '{}' does not exist.",
            config.data_dir.display()
        )));
    }
    if config.boards == 0 || config.channels == 0 {
        return Err(AppError::config("Board and channel counts must be > 0."));
    }

    let slots: Vec<(usize, usize)> = (1..=config.boards)
        .flat_map(|b| (0..config.channels).map(move |c| (b, c)))
        .collect();

    let outcomes: Vec<Result<ChannelResult, ScanIssue>> = slots
        .par_iter()
        .map(|&(board, channel)| {
            let path = channel_path(&config.data_dir, board, channel);
            let curve = read_iv_csv(&path, board, channel).map_err(|e| ScanIssue::MissingInput {
                board,
                channel,
                reason: e.message().to_string(),
            })?;
            analyse(curve)
        })
        .collect();

    merge(outcomes)
}

/// Analyse curves already in memory.
pub fn scan_curves(curves: Vec<IvCurve>) -> Result<ScanResult, AppError> {
    let outcomes = curves.into_par_iter().map(analyse).collect();
    merge(outcomes)
}

fn analyse(curve: IvCurve) -> Result<ChannelResult, ScanIssue> {
    let (board, channel) = (curve.board, curve.channel);
    match find_operating_point(&curve.points) {
        Ok(operating_point) => Ok(ChannelResult { curve, operating_point }),
        Err(OperatingPointError::NoJump) => Err(ScanIssue::NoJump { board, channel }),
        Err(e @ OperatingPointError::TooFewPoints) => Err(ScanIssue::MissingInput {
            board,
            channel,
            reason: e.to_string(),
        }),
    }
}

fn merge(outcomes: Vec<Result<ChannelResult, ScanIssue>>) -> Result<ScanResult, AppError> {
    let mut histograms = ScanHistograms::new()?;
    let mut channels = Vec::new();
    let mut issues = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(ch) => {
                histograms.fill(&ch.operating_point);
                channels.push(ch);
            }
            Err(issue) => {
                match &issue {
                    ScanIssue::MissingInput { reason, .. } => log::warn!("{issue}: {reason}"),
                    ScanIssue::NoJump { .. } => log::warn!("{issue}"),
                }
                issues.push(issue);
            }
        }
    }
    log::info!("Scanned {} channels, {} skipped", channels.len(), issues.len());
    Ok(ScanResult {
        channels,
        issues,
        histograms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iv::curve::IvPoint;

    fn write_curve(dir: &Path, board: usize, channel: usize, rows: &[(f64, f64)]) {
        let path = channel_path(dir, board, channel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut text = String::from("voltage,current\n");
        for (v, i) in rows {
            text.push_str(&format!("{v},{i}\n"));
        }
        std::fs::write(path, text).unwrap();
    }

    #[test]
    fn channel_path_layout() {
        let p = channel_path(Path::new("/data"), 12, 3);
        assert_eq!(p, PathBuf::from("/data/Board12/SiPM3.csv"));
    }

    #[test]
    fn missing_files_are_skipped_in_order() {
        let dir = std::env::temp_dir().join("sipm_report_scan_test");
        let _ = std::fs::remove_dir_all(&dir);
        let rows = [(52.0, 0.02), (52.5, 0.02), (53.0, 0.04), (53.5, 0.04), (54.0, 0.09)];
        write_curve(&dir, 1, 0, &rows);
        write_curve(&dir, 2, 1, &rows);
        write_curve(&dir, 2, 0, &[(52.0, 0.02), (53.0, 0.02)]);

        let config = ScanConfig {
            data_dir: dir.clone(),
            boards: 2,
            channels: 2,
        };
        let result = scan_boards(&config).unwrap();

        let found: Vec<(usize, usize)> = result.channels.iter().map(|c| (c.board(), c.channel())).collect();
        assert_eq!(found, vec![(1, 0), (2, 1)]);
        assert_eq!(result.missing(), 1);
        assert_eq!(result.issues[0].to_string(), "Missing Board 1 SiPM 1");
        assert_eq!(result.issues[1], ScanIssue::NoJump { board: 2, channel: 0 });
        assert_eq!(result.histograms.v_min.entries, 2);
        assert_eq!(result.by_board().len(), 2);
    }

    #[test]
    fn missing_data_dir_is_a_configuration_error() {
        let config = ScanConfig::new(std::env::temp_dir().join("sipm_report_no_such_dir"));
        let err = scan_boards(&config).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Configuration);
    }

    #[test]
    fn curves_fill_every_summary_histogram() {
        let points = vec![
            IvPoint { voltage: 55.0, current: 0.01 },
            IvPoint { voltage: 55.5, current: 0.03 },
            IvPoint { voltage: 56.0, current: 0.05 },
        ];
        let result = scan_curves(vec![IvCurve::new(1, 0, points)]).unwrap();
        for h in result.histograms.all() {
            assert_eq!(h.entries, 1, "{}", h.name);
        }
        let op = result.channels[0].operating_point;
        assert_eq!((op.v_min, op.v_max), (55.0, 55.5));
    }
}
