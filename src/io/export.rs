//! Result exports.
//!
//! - plateau results as JSON (one entry per analysis group)
//! - step series as CSV in the same schema `ingest` reads

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{GroupOutcome, PlateauConfig};
use crate::error::AppError;
use crate::io::ingest::AnalysisGroup;

/// A saved results file (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultsFile {
    pub tool: String,
    pub version: String,
    pub config: PlateauConfig,
    pub groups: Vec<GroupOutcome>,
}

impl ResultsFile {
    pub fn new(config: PlateauConfig, groups: Vec<GroupOutcome>) -> Self {
        Self {
            tool: "plateau".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            config,
            groups,
        }
    }
}

/// Write plateau results to a JSON file.
pub fn write_results_json(path: &Path, results: &ResultsFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create results JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, results)
        .map_err(|e| AppError::new(2, format!("Failed to write results JSON: {e}")))?;
    Ok(())
}

/// Read a results JSON file.
pub fn read_results_json(path: &Path) -> Result<ResultsFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open results JSON '{}': {e}", path.display())))?;
    serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid results JSON: {e}")))
}

/// Write one group's steps as CSV (`group,step,age,error,signal,excluded`).
pub fn write_steps_csv<W: Write>(out: W, group: &AnalysisGroup) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_writer(out);
    let io_err = |e: csv::Error| AppError::new(2, format!("Failed to write step CSV: {e}"));

    writer
        .write_record(["group", "step", "age", "error", "signal", "excluded"])
        .map_err(io_err)?;
    for (i, step) in group.series.steps.iter().enumerate() {
        let excluded = if group.exclude.contains(i) { "1" } else { "0" };
        let age = step.age.to_string();
        let error = step.error.to_string();
        let signal = step.signal.to_string();
        writer
            .write_record([
                group.name.as_str(),
                group.labels[i].as_str(),
                age.as_str(),
                error.as_str(),
                signal.as_str(),
                excluded,
            ])
            .map_err(io_err)?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush step CSV: {e}")))?;
    Ok(())
}
