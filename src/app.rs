//! Top-level application orchestration.
//!
//! `src/main.rs` stays tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - resolves the search config (flags > env > defaults)
//! - loads step CSVs and runs the plateau pipeline
//! - prints reports and writes optional exports

use std::io::Write;

use clap::Parser;
use log::info;

use crate::cli::{Command, FindArgs, SynthArgs};
use crate::config::{ConfigOverrides, resolve_config};
use crate::data::{SynthConfig, generate_spectrum};
use crate::error::AppError;
use crate::io::export::{ResultsFile, write_results_json, write_steps_csv};
use crate::io::ingest::load_step_csv;

pub mod pipeline;

/// Entry point for the `plateau` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Find(args) => handle_find(args),
        Command::Synth(args) => handle_synth(args),
    }
}

fn handle_find(args: FindArgs) -> Result<(), AppError> {
    let config = resolve_config(overrides_from_args(&args))?;
    let mut data = load_step_csv(&args.csv)?;

    info!(
        "read {} rows into {} groups ({} row errors)",
        data.rows_read,
        data.groups.len(),
        data.row_errors.len()
    );

    pipeline::apply_extra_exclusions(&mut data.groups, &args.exclude);
    let outcomes = pipeline::process_groups(&data.groups, &config)?;

    println!("{}", crate::report::format_run_header(&config, outcomes.len()).trim_end());
    for (outcome, group) in outcomes.iter().zip(&data.groups) {
        if args.brief {
            println!("{}: {}", outcome.group, crate::report::format_plateau_line(outcome));
        } else {
            print!("{}", crate::report::format_group(outcome, &group.series));
        }
    }

    if let Some(path) = &args.export {
        write_results_json(path, &ResultsFile::new(config, outcomes))?;
        info!("wrote {}", path.display());
    }

    Ok(())
}

fn handle_synth(args: SynthArgs) -> Result<(), AppError> {
    let group = generate_spectrum(&synth_config_from_args(&args))?;

    match &args.out {
        Some(path) => {
            let file = std::fs::File::create(path)
                .map_err(|e| AppError::new(2, format!("Failed to create CSV '{}': {e}", path.display())))?;
            write_steps_csv(file, &group)?;
            info!("wrote {} steps to {}", group.series.len(), path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            write_steps_csv(&mut lock, &group)?;
            lock.flush()
                .map_err(|e| AppError::new(2, format!("Failed to flush stdout: {e}")))?;
        }
    }
    Ok(())
}

pub fn overrides_from_args(args: &FindArgs) -> ConfigOverrides {
    ConfigOverrides {
        nsteps: args.nsteps,
        overlap_sigma: args.overlap_sigma,
        min_fraction_released: args.min_fraction,
    }
}

pub fn synth_config_from_args(args: &SynthArgs) -> SynthConfig {
    SynthConfig {
        steps: args.steps,
        seed: args.seed,
        plateau_age: args.plateau_age,
        rel_error: args.rel_error,
        disturbed_steps: args.disturbed,
        scatter: args.scatter,
    }
}
