//! Shared report pipelines used by the CLI handlers and the integration tests.
//!
//! Keeping them here avoids duplicating the workflows:
//! - I-V: scan -> operating points -> report (+ optional CSV table)
//! - demo: synthetic peaks -> fits -> report

use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::data::{PeakShape, drifting_peak_map, peak_histogram};
use crate::domain::NdcRect;
use crate::error::AppError;
use crate::fit::PeakFitOutcome;
use crate::io::export::write_operating_points_csv;
use crate::iv::report::write_scan_report;
use crate::iv::scan::{ScanConfig, ScanResult, scan_boards};
use crate::report::builder::{DEFAULT_BACK_COVER, DrawOptions, ReportBuilder, ReportSummary};
use crate::report::options::ReportOptions;

/// Everything produced by `sipm iv`.
#[derive(Debug, Clone)]
pub struct IvRun {
    pub scan: ScanResult,
    pub summary: ReportSummary,
    pub table: Option<PathBuf>,
}

/// Scan `config.data_dir` and write the report to `output`.
pub fn run_scan_report(
    config: &ScanConfig,
    output: &Path,
    options: ReportOptions,
    draw_boards: bool,
    table: Option<&Path>,
) -> Result<IvRun, AppError> {
    let scan = scan_boards(config)?;

    let mut builder = ReportBuilder::create(output, options)?;
    builder.print_cover(&format!("SiPM I-V scan: {}", config.data_dir.display()))?;
    write_scan_report(&mut builder, &scan, draw_boards)?;
    builder.print_back_cover(DEFAULT_BACK_COVER)?;
    let summary = builder.close()?;

    if let Some(path) = table {
        write_operating_points_csv(path, &scan)?;
    }

    Ok(IvRun {
        scan,
        summary,
        table: table.map(Path::to_path_buf),
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DemoConfig {
    pub count: usize,
    pub entries: usize,
    pub seed: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            count: 5,
            entries: 5000,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DemoRun {
    pub summary: ReportSummary,
    pub fits: Vec<PeakFitOutcome>,
}

const DEMO_BINNING: (f64, f64, f64) = (0.5, 0.0, 100.0);

/// Synthetic peaks with alternating Gaussian and Landau-Gaussian fits, then a
/// page of overlays (2-D map, same-panel comparison with legend and band).
pub fn run_demo(output: &Path, options: ReportOptions, config: &DemoConfig) -> Result<DemoRun, AppError> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut builder = ReportBuilder::create(output, options)?;
    builder.print_cover("SiPM calibration demo")?;

    let mut fits = Vec::new();
    for i in 0..config.count {
        let center = 20.0 + 10.0 * (i % 6) as f64;
        let (shape, opts, label) = if i % 2 == 0 {
            (
                PeakShape::Gaussian { mean: center, sigma: 2.0 },
                DrawOptions::gaus(),
                "Gaussian",
            )
        } else {
            (
                PeakShape::Landau { mpv: center, width: 1.5, smear: 1.0 },
                DrawOptions::langau(),
                "Landau",
            )
        };
        let hist = peak_histogram(
            &format!("hPeak{i}"),
            &format!("{label} peak {i};Charge (pC);Counts"),
            DEMO_BINNING,
            shape,
            config.entries,
            &mut rng,
        )?;
        let drawn = builder.draw(hist, &opts)?;
        fits.extend(drawn.fits);
    }

    if config.count > 0 {
        builder.next_page(Some("Peaks"))?;
    }

    let map = drifting_peak_map("hDrift", "Peak drift;Channel;Charge (pC);Counts", config.entries, &mut rng)?;
    builder.draw(
        map,
        &DrawOptions {
            opt_norm_y: true,
            ..DrawOptions::with_option("colz")
        },
    )?;

    let first = peak_histogram(
        "hRun1",
        "Run 1;Charge (pC);Counts",
        DEMO_BINNING,
        PeakShape::Gaussian { mean: 40.0, sigma: 3.0 },
        config.entries,
        &mut rng,
    )?;
    let second = peak_histogram(
        "hRun2",
        "Run 2;Charge (pC);Counts",
        DEMO_BINNING,
        PeakShape::Gaussian { mean: 45.0, sigma: 3.0 },
        config.entries,
        &mut rng,
    )?;
    builder.draw(first, &DrawOptions::default().titled("Run comparison"))?;
    builder.draw(
        second,
        &DrawOptions {
            same_pad: true,
            ..DrawOptions::with_option("same")
        },
    )?;
    builder.draw_band(37.0, 43.0, None)?;
    let legend = builder.new_legend(NdcRect::new(0.65, 0.75, 0.95, 0.95));
    builder.draw_legend(legend)?;

    builder.print_back_cover(DEFAULT_BACK_COVER)?;
    let summary = builder.close()?;
    Ok(DemoRun { summary, fits })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_report_pages() {
        let dir = std::env::temp_dir().join("sipm_report_demo_test");
        std::fs::create_dir_all(&dir).unwrap();
        let options = ReportOptions {
            nx: 2,
            ny: 2,
            save_structured: true,
            ..ReportOptions::default()
        };
        let config = DemoConfig {
            count: 3,
            entries: 2000,
            seed: 1,
        };
        let run = run_demo(&dir.join("demo"), options, &config).unwrap();
        assert_eq!(run.fits.len(), 3);
        // Peaks page, then the overlay page.
        assert_eq!(run.summary.content_pages, 2);
        assert_eq!(run.summary.pages, 4);
        assert_eq!(run.summary.saved_objects, 6);
        assert!(run.summary.output.ends_with("demo.pdf"));
    }
}
