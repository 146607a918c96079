use std::path::{Path, PathBuf};

use lopdf::Document;
use sipm_report::app::pipeline::run_scan_report;
use sipm_report::data::{IvSweep, iv_curve, write_iv_dataset};
use sipm_report::iv::{ScanConfig, ScanIssue, channel_path, scan_boards, scan_curves};
use sipm_report::report::options::ReportOptions;

fn fresh_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_csv(path: &Path, rows: &[(f64, f64)]) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut text = String::from("voltage,current\n");
    for (v, i) in rows {
        text.push_str(&format!("{v},{i}\n"));
    }
    std::fs::write(path, text).unwrap();
}

#[test]
fn sixteen_channels_operating_point_is_the_jump_midpoint() {
    let dir = fresh_dir("sipm_report_it_iv_sixteen");
    let mut expected = Vec::new();
    for channel in 0..16 {
        let jump = 4 + channel;
        let rows: Vec<(f64, f64)> = (0..30)
            .map(|k| {
                let v = 50.0 + 0.25 * k as f64;
                let i = if k < jump { 0.02 } else { 0.05 };
                (v, i)
            })
            .collect();
        write_csv(&channel_path(&dir, 1, channel), &rows);
        expected.push((rows[jump - 1].0 + rows[jump].0) / 2.0);
    }

    let config = ScanConfig {
        data_dir: dir,
        boards: 1,
        channels: 16,
    };
    let result = scan_boards(&config).unwrap();
    assert!(result.issues.is_empty());
    assert_eq!(result.channels.len(), 16);
    for (ch, v_op) in result.channels.iter().zip(expected) {
        let op = ch.operating_point;
        assert!((op.v_op - v_op).abs() < 1e-12, "channel {}", ch.channel());
        assert_eq!(op.i_start, 0.02);
        assert_eq!(op.i_op, 0.05);
        // Single plateau to the end of the sweep.
        assert_eq!(op.v_max, 50.0 + 0.25 * 29.0);
    }
    assert_eq!(result.histograms.v_op.entries, 16);
}

#[test]
fn scan_is_ordered_regardless_of_input_order() {
    let sweep = IvSweep::default();
    let curves = vec![iv_curve(2, 1, &sweep, 9), iv_curve(1, 0, &sweep, 7), iv_curve(2, 0, &sweep, 8)];
    let result = scan_curves(curves).unwrap();
    // scan_curves keeps input order; scan_boards walks boards and channels in order.
    let labels: Vec<String> = result.channels.iter().map(|c| c.curve.label()).collect();
    assert_eq!(labels, vec!["B2C1", "B1C0", "B2C0"]);
    assert_eq!(result.by_board().keys().copied().collect::<Vec<_>>(), vec![1, 2]);
}

#[test]
fn scan_report_with_missing_channels_and_table() {
    let dir = fresh_dir("sipm_report_it_iv_report");
    let data = dir.join("data");
    assert_eq!(write_iv_dataset(&data, 2, 4, 9).unwrap(), 8);
    std::fs::remove_file(channel_path(&data, 2, 3)).unwrap();

    let config = ScanConfig {
        data_dir: data,
        boards: 2,
        channels: 4,
    };
    let options = ReportOptions {
        nx: 2,
        ny: 2,
        ..ReportOptions::default()
    };
    let table = dir.join("ops.csv");
    let run = run_scan_report(&config, &dir.join("iv_report"), options, true, Some(&table)).unwrap();

    assert_eq!(run.scan.channels.len(), 7);
    assert!(matches!(
        run.scan.issues.as_slice(),
        [ScanIssue::MissingInput { board: 2, channel: 3, .. }]
    ));
    assert_eq!(run.scan.issues[0].to_string(), "Missing Board 2 SiPM 3");

    // 2 board pages + 6 summary histograms on a 2x2 grid.
    assert_eq!(run.summary.content_pages, 2);
    assert_eq!(run.summary.pages, 4);
    assert!(run.summary.output.ends_with("iv_report.pdf"));
    assert_eq!(Document::load(&run.summary.output).unwrap().get_pages().len(), 4);

    let text = std::fs::read_to_string(&table).unwrap();
    assert_eq!(text.lines().count(), 1 + 7);
    assert!(text.starts_with("board,channel,"));
}

#[test]
fn missing_data_dir_fails_before_opening_the_report() {
    let dir = fresh_dir("sipm_report_it_iv_nodata");
    let config = ScanConfig::new(dir.join("absent"));
    let output = dir.join("never.pdf");
    let err = run_scan_report(&config, &output, ReportOptions::default(), false, None).unwrap_err();
    assert_eq!(err.exit_code(), 2);
    assert!(!output.exists());
}
