//! Terminal and label formatting.
//!
//! Formatting lives in one place so the scan, fit and report code only produce
//! values, and output changes stay local.

use crate::iv::scan::{ScanIssue, ScanResult};
use crate::math::Efficiency;
use crate::report::builder::ReportSummary;

/// Axis tick label for `v` on an axis stepped by `step`.
///
/// Uses just enough decimals to tell neighbouring ticks apart; very large or
/// very small magnitudes switch to scientific notation.
pub fn format_tick(v: f64, step: f64) -> String {
    if !v.is_finite() {
        return String::new();
    }
    if step > 0.0 && v.abs() < 1e-9 * step {
        return "0".to_string();
    }
    let abs = v.abs();
    if abs >= 1e5 || (abs < 1e-4 && abs > 0.0) {
        return format!("{v:.1e}");
    }
    let decimals = if step > 0.0 && step.is_finite() {
        (-step.log10().floor()).clamp(0.0, 6.0) as usize
    } else {
        2
    };
    format!("{v:.decimals$}")
}

/// One row per analysed channel: `Istart Iop Vmin Vavg Vmax`.
pub fn format_operating_points(result: &ScanResult) -> String {
    let mut out = String::new();
    out.push_str("board\tch\tIstart\tIop\tVmin\tVavg\tVmax\n");
    for ch in &result.channels {
        let op = &ch.operating_point;
        out.push_str(&format!(
            "{}\t{}\t{:.2}\t{:.2}\t{:.1}\t{:.1}\t{:.1}\n",
            ch.board(),
            ch.channel(),
            op.i_start,
            op.i_op,
            op.v_min,
            op.v_avg(),
            op.v_max
        ));
    }
    out
}

/// Scan totals plus the list of skipped channels.
pub fn format_scan_summary(result: &ScanResult) -> String {
    let no_jump = result.issues.len() - result.missing();
    let mut out = String::new();
    out.push_str("=== sipm - I-V scan ===\n");
    out.push_str(&format!(
        "Channels: analysed={} | missing={} | no jump={}\n",
        result.channels.len(),
        result.missing(),
        no_jump
    ));
    for h in result.histograms.voltages() {
        out.push_str(&format!(
            "{:<6} mean={:.2} V rms={:.2} V entries={}\n",
            h.name,
            h.mean(),
            h.rms(),
            h.entries
        ));
    }
    if !result.issues.is_empty() {
        out.push_str("\nSkipped:\n");
        for issue in &result.issues {
            let line = match issue {
                ScanIssue::MissingInput { reason, .. } => format!("{issue} ({})", truncate(reason, 60)),
                ScanIssue::NoJump { .. } => issue.to_string(),
            };
            out.push_str(&format!("- {line}\n"));
        }
    }
    out
}

/// What a finished report wrote.
pub fn format_report_summary(summary: &ReportSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Report: {} ({} pages, {} content)\n",
        summary.output.display(),
        summary.pages,
        summary.content_pages
    ));
    out.push_str(&format!("Artifacts drawn: {}\n", summary.artifacts_drawn));
    if let Some(path) = &summary.structured {
        out.push_str(&format!("Saved {} objects to {}\n", summary.saved_objects, path.display()));
    }
    if !summary.images.is_empty() {
        out.push_str(&format!("Images: {}\n", summary.images.len()));
    }
    out
}

pub fn format_efficiency(n_sel: u64, n_all: u64, eff: &Efficiency) -> String {
    format!(
        "{n_sel} / {n_all}: {}\n68.3% interval: [{:.4}, {:.4}]",
        eff.display(),
        eff.lower,
        eff.upper
    )
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iv::curve::{IvCurve, IvPoint};
    use crate::iv::scan::scan_curves;

    #[test]
    fn tick_decimals_follow_step() {
        assert_eq!(format_tick(52.5, 0.5), "52.5");
        assert_eq!(format_tick(50.0, 5.0), "50");
        assert_eq!(format_tick(0.02, 0.01), "0.02");
        assert_eq!(format_tick(1e-12, 0.1), "0");
        assert_eq!(format_tick(250000.0, 50000.0), "2.5e5");
    }

    #[test]
    fn operating_point_rows() {
        let points = vec![
            IvPoint { voltage: 55.0, current: 0.02 },
            IvPoint { voltage: 56.0, current: 0.04 },
        ];
        let result = scan_curves(vec![IvCurve::new(3, 7, points)]).unwrap();
        let table = format_operating_points(&result);
        let row = table.lines().nth(1).unwrap();
        assert_eq!(row, "3\t7\t0.02\t0.04\t55.0\t55.5\t56.0");
    }

    #[test]
    fn truncate_marks_cut() {
        assert_eq!(truncate("abcdef", 4), "abc.");
        assert_eq!(truncate("abc", 4), "abc");
    }
}
