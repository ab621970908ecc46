//! Command-line parsing for the plateau tool.
//!
//! Argument parsing and command dispatch stay separate from the search code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "plateau", version, about = "Ar/Ar step-heating plateau finder")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Find plateaus in a step CSV, print a summary per group and optionally export JSON.
    Find(FindArgs),
    /// Write a synthetic step-heating spectrum as CSV.
    Synth(SynthArgs),
}

/// Options for the plateau search.
///
/// Unset search options fall back to `PLATEAU_*` environment variables, then
/// to built-in defaults.
#[derive(Debug, Parser, Clone)]
pub struct FindArgs {
    /// Step CSV (columns: age, error, signal; optional step, group, excluded).
    #[arg(long, value_name = "CSV")]
    pub csv: PathBuf,

    /// Minimum plateau span (end - start) in steps [default: 3].
    #[arg(long)]
    pub nsteps: Option<usize>,

    /// Error multiplier for the overlap test [default: 2].
    #[arg(long)]
    pub overlap_sigma: Option<f64>,

    /// Minimum fraction of total signal released by the plateau [default: 0.5].
    #[arg(long)]
    pub min_fraction: Option<f64>,

    /// Extra step indices (0-based) to exclude in every group, e.g. `0,7`.
    #[arg(long, value_delimiter = ',')]
    pub exclude: Vec<usize>,

    /// Export results to JSON.
    #[arg(long, value_name = "JSON")]
    pub export: Option<PathBuf>,

    /// Skip the per-step tables and print only the plateau lines.
    #[arg(long)]
    pub brief: bool,
}

/// Options for synthetic spectrum generation.
#[derive(Debug, Parser, Clone)]
pub struct SynthArgs {
    /// Number of heating steps.
    #[arg(short = 'n', long, default_value_t = 12)]
    pub steps: usize,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Age of the plateau steps.
    #[arg(long, default_value_t = 28.2)]
    pub plateau_age: f64,

    /// Relative 1-sigma error of an average-signal step.
    #[arg(long, default_value_t = 0.005)]
    pub rel_error: f64,

    /// Leading steps with elevated ages.
    #[arg(long, default_value_t = 2)]
    pub disturbed: usize,

    /// Plateau age scatter in units of step error.
    #[arg(long, default_value_t = 1.0)]
    pub scatter: f64,

    /// Output CSV (stdout when omitted).
    #[arg(long, value_name = "CSV")]
    pub out: Option<PathBuf>,
}
