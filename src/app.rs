//! Top-level application orchestration.
//!
//! `src/main.rs` only sets up logging and maps errors to exit codes; this
//! module is the "real main" that:
//! - parses CLI arguments
//! - resolves report options (config file + flags)
//! - runs the requested pipeline
//! - prints summaries

use clap::Parser;

use crate::cli::{Command, DemoArgs, EffArgs, IvArgs};
use crate::error::AppError;
use crate::iv::scan::ScanConfig;

pub mod pipeline;

/// Entry point for the `sipm` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Iv(args) => handle_iv(args),
        Command::Demo(args) => handle_demo(args),
        Command::Eff(args) => handle_eff(args),
    }
}

fn handle_iv(args: IvArgs) -> Result<(), AppError> {
    let options = args.report.resolve((1, 1))?;
    let config = ScanConfig {
        data_dir: args.data_dir.clone(),
        boards: args.boards,
        channels: args.channels,
    };
    let run = pipeline::run_scan_report(&config, &args.output, options, args.draw_boards, args.table.as_deref())?;

    if args.print_table {
        print!("{}", crate::report::format_operating_points(&run.scan));
    }
    println!("{}", crate::report::format_scan_summary(&run.scan));
    print!("{}", crate::report::format_report_summary(&run.summary));
    if let Some(path) = &run.table {
        println!("Table: {}", path.display());
    }
    Ok(())
}

fn handle_demo(args: DemoArgs) -> Result<(), AppError> {
    let options = args.report.resolve((2, 2))?;
    let config = pipeline::DemoConfig {
        count: args.count,
        entries: args.entries,
        seed: args.seed,
    };
    let run = pipeline::run_demo(&args.output, options, &config)?;

    let failed = run.fits.iter().filter(|f| !f.is_fitted()).count();
    if failed > 0 {
        log::warn!("{failed} of {} peak fits failed", run.fits.len());
    }
    print!("{}", crate::report::format_report_summary(&run.summary));
    Ok(())
}

fn handle_eff(args: EffArgs) -> Result<(), AppError> {
    if args.n_sel > args.n_all {
        return Err(AppError::config(format!(
            "Selected count {} exceeds total {}.",
            args.n_sel, args.n_all
        )));
    }
    let eff = crate::math::efficiency(args.n_sel, args.n_all);
    println!("{}", crate::report::format_efficiency(args.n_sel, args.n_all, &eff));
    Ok(())
}
