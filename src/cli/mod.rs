//! Command-line parsing for the SiPM calibration report tool.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! scan, fitting and rendering code. Flags only override `ReportOptions`; the
//! options themselves live in `report::options`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::error::AppError;
use crate::iv::scan::{DEFAULT_BOARDS, DEFAULT_CHANNELS};
use crate::report::options::ReportOptions;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "sipm", version, about = "SiPM calibration post-processing and PDF reports")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scan I-V curves under a data directory and report operating points.
    Iv(IvArgs),
    /// Build a report from synthetic Gaussian / Landau peaks with fits.
    Demo(DemoArgs),
    /// Print a selection efficiency with Clopper-Pearson errors.
    Eff(EffArgs),
}

/// Report options shared by every report-producing command.
#[derive(Debug, Args, Clone, Default)]
pub struct ReportArgs {
    /// JSON file with report options; flags below override it.
    #[arg(long, value_name = "JSON")]
    pub config: Option<PathBuf>,

    /// Panels per row.
    #[arg(long)]
    pub nx: Option<usize>,

    /// Panel rows per page.
    #[arg(long)]
    pub ny: Option<usize>,

    /// Also export every page as a standalone image.
    #[arg(long)]
    pub print_all: bool,

    /// Directory for page images (default: next to the report).
    #[arg(long, value_name = "DIR")]
    pub print_dir: Option<PathBuf>,

    /// Image formats for `--print-all` (pdf, svg).
    #[arg(long, value_delimiter = ',')]
    pub print_ext: Option<Vec<String>>,

    /// Save every drawn object to a JSON-lines file next to the report.
    #[arg(long)]
    pub save: bool,

    /// Stamp page numbers.
    #[arg(long)]
    pub page_numbers: bool,

    /// Draw grid lines on every panel.
    #[arg(long)]
    pub grid: bool,
}

impl ReportArgs {
    /// Options from `--config` (or defaults) with the flags applied.
    pub fn resolve(&self, default_grid: (usize, usize)) -> Result<ReportOptions, AppError> {
        let mut options = match &self.config {
            Some(path) => ReportOptions::from_json_file(path)?,
            None => ReportOptions {
                nx: default_grid.0,
                ny: default_grid.1,
                ..ReportOptions::default()
            },
        };
        if let Some(nx) = self.nx {
            options.nx = nx;
        }
        if let Some(ny) = self.ny {
            options.ny = ny;
        }
        options.print_all |= self.print_all;
        if let Some(dir) = &self.print_dir {
            options.print_dir = Some(dir.clone());
        }
        if let Some(exts) = &self.print_ext {
            options.print_ext = exts.clone();
        }
        options.save_structured |= self.save;
        options.show_page_number |= self.page_numbers;
        options.show_grid |= self.grid;
        options.validate()?;
        Ok(options)
    }
}

#[derive(Debug, Args)]
pub struct IvArgs {
    /// Directory holding `Board{b}/SiPM{c}.csv`.
    #[arg(value_name = "DATA_DIR")]
    pub data_dir: PathBuf,

    /// Output report.
    #[arg(short = 'o', long, default_value = "iv_report.pdf")]
    pub output: PathBuf,

    /// Number of boards (numbered from 1).
    #[arg(long, default_value_t = DEFAULT_BOARDS)]
    pub boards: usize,

    /// Channels per board (numbered from 0).
    #[arg(long, default_value_t = DEFAULT_CHANNELS)]
    pub channels: usize,

    /// One page per board with all channel curves overlaid.
    #[arg(long)]
    pub draw_boards: bool,

    /// Write the operating points as CSV.
    #[arg(long, value_name = "CSV")]
    pub table: Option<PathBuf>,

    /// Print one line per channel.
    #[arg(long)]
    pub print_table: bool,

    #[command(flatten)]
    pub report: ReportArgs,
}

#[derive(Debug, Args)]
pub struct DemoArgs {
    /// Output report.
    #[arg(short = 'o', long, default_value = "demo.pdf")]
    pub output: PathBuf,

    /// Number of synthetic peak histograms.
    #[arg(long, default_value_t = 5)]
    pub count: usize,

    /// Entries per histogram.
    #[arg(long, default_value_t = 5000)]
    pub entries: usize,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    #[command(flatten)]
    pub report: ReportArgs,
}

#[derive(Debug, Args)]
pub struct EffArgs {
    /// Selected events.
    pub n_sel: u64,
    /// All events.
    pub n_all: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iv_flags_parse() {
        let cli = Cli::parse_from([
            "sipm",
            "iv",
            "/data",
            "-o",
            "out.pdf",
            "--boards",
            "2",
            "--draw-boards",
            "--nx",
            "2",
            "--print-ext",
            "svg,pdf",
        ]);
        let Command::Iv(args) = cli.command else {
            panic!("expected iv");
        };
        assert_eq!(args.boards, 2);
        assert_eq!(args.channels, DEFAULT_CHANNELS);
        assert!(args.draw_boards);
        let opts = args.report.resolve((1, 1)).unwrap();
        assert_eq!((opts.nx, opts.ny), (2, 1));
        assert_eq!(opts.print_ext, vec!["svg".to_string(), "pdf".to_string()]);
    }

    #[test]
    fn demo_defaults_to_a_two_by_two_grid() {
        let cli = Cli::parse_from(["sipm", "demo", "--save"]);
        let Command::Demo(args) = cli.command else {
            panic!("expected demo");
        };
        let opts = args.report.resolve((2, 2)).unwrap();
        assert_eq!(opts.panels_per_page(), 4);
        assert!(opts.save_structured);
        assert_eq!(args.count, 5);
    }

    #[test]
    fn zero_grid_is_rejected() {
        let args = ReportArgs {
            nx: Some(0),
            ..ReportArgs::default()
        };
        let err = args.resolve((1, 1)).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Configuration);
    }
}
