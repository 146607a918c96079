//! Scan results drawn through a `ReportBuilder`.

use crate::domain::{MultiGraph, NdcRect};
use crate::error::AppError;
use crate::iv::scan::{ChannelResult, ScanResult};
use crate::report::builder::{DrawOptions, ReportBuilder};

/// Display range of the board overlays (µA).
const BOARD_Y_RANGE: (f64, f64) = (0.0, 0.5);
const BOARD_LEGEND: NdcRect = NdcRect::new(0.2, 0.6, 0.6, 0.9);

/// Draw the scan: optional per-board overlays, then the summary histograms.
///
/// Voltage distributions get a Gaussian fit; the current distributions are
/// drawn as they are. Returns the number of primary artifacts drawn.
pub fn write_scan_report(builder: &mut ReportBuilder, result: &ScanResult, draw_boards: bool) -> Result<usize, AppError> {
    let mut drawn = 0;
    if draw_boards {
        for (board, channels) in result.by_board() {
            draw_board(builder, board, &channels)?;
            drawn += 1;
        }
    }

    let hists = &result.histograms;
    for h in [&hists.i_min, &hists.i_op] {
        builder.draw(h.clone(), &DrawOptions::default())?;
        drawn += 1;
    }
    for h in hists.voltages() {
        let outcome = builder.draw(h.clone(), &DrawOptions::gaus())?;
        if let Some(fit) = outcome.fits.iter().find_map(|f| f.fitted()) {
            log::info!("{}: mean {:.2} V, sigma {:.2} V", h.name, fit.position(), fit.width());
        }
        drawn += 1;
    }
    Ok(drawn)
}

fn draw_board(builder: &mut ReportBuilder, board: usize, channels: &[&ChannelResult]) -> Result<(), AppError> {
    let mut mg = MultiGraph::new(
        format!("UI_Board{board}"),
        format!("UI curve measured by FEE board {board};U_op (V);I (uA)"),
    );
    mg.y_range = Some(BOARD_Y_RANGE);
    let style = builder.style();
    for (i, ch) in channels.iter().enumerate() {
        mg.graphs
            .push(ch.curve.to_graph(style.series_color(i), style.series_marker(i)));
    }

    builder.draw(mg, &DrawOptions::with_option("lp").titled(format!("Board {board}")))?;
    let mut legend = builder.new_legend(BOARD_LEGEND);
    legend.columns = 4;
    builder.draw_legend(legend)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iv::curve::{IvCurve, IvPoint};
    use crate::iv::scan::scan_curves;
    use crate::report::options::ReportOptions;

    fn curve(board: usize, channel: usize, jump: f64) -> IvCurve {
        let points = (0..20)
            .map(|k| {
                let voltage = 50.0 + 0.5 * k as f64;
                let current = if voltage < jump { 0.02 } else { 0.04 };
                IvPoint { voltage, current }
            })
            .collect();
        IvCurve::new(board, channel, points)
    }

    #[test]
    fn boards_then_summary_histograms() {
        let dir = std::env::temp_dir().join("sipm_report_iv_report_test");
        std::fs::create_dir_all(&dir).unwrap();
        let result = scan_curves(vec![curve(1, 0, 55.0), curve(1, 1, 56.0), curve(2, 0, 55.5)]).unwrap();

        let mut builder = ReportBuilder::create(dir.join("scan.pdf"), ReportOptions::default()).unwrap();
        builder.print_cover("I-V scan").unwrap();
        let drawn = write_scan_report(&mut builder, &result, true).unwrap();
        assert_eq!(drawn, 2 + 6);
        let summary = builder.close().unwrap();
        assert_eq!(summary.content_pages, 8);
        assert_eq!(summary.pages, 10);
    }
}
