//! CSV ingest of heating-step series.
//!
//! Schema (header names are case-insensitive):
//!
//! | column                | required | meaning                                   |
//! |-----------------------|----------|-------------------------------------------|
//! | `age`                 | yes      | step age                                  |
//! | `error`               | yes      | 1-sigma age error                         |
//! | `signal`              | yes      | released gas signal                       |
//! | `step`                | no       | step label (defaults to A, B, ...)        |
//! | `group` / `sample`    | no       | analysis group; one search per group      |
//! | `excluded` / `omit`   | no       | `1`, `true`, `yes`, `x` mark the step out |
//!
//! Rows keep file order within their group, and groups keep first-appearance
//! order. A row with a bad value drops its whole group (reported, not
//! fatal): skipping just the row would make the steps on either side look
//! adjacent in heating order. Records the CSV reader cannot decode at all carry
//! no usable group and are skipped on their own.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use log::warn;

use crate::domain::{ExcludedSet, Step, StepSeries, step_letter};
use crate::error::AppError;

/// Group name used when the CSV has no group column.
pub const DEFAULT_GROUP: &str = "default";

/// One analysis group: a step series and its excluded steps.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisGroup {
    pub name: String,
    pub labels: Vec<String>,
    pub series: StepSeries,
    pub exclude: ExcludedSet,
}

impl AnalysisGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            labels: Vec::new(),
            series: StepSeries::default(),
            exclude: ExcludedSet::new(),
        }
    }

    fn push(&mut self, label: Option<String>, step: Step, excluded: bool) {
        let index = self.series.len();
        self.labels.push(label.unwrap_or_else(|| step_letter(index)));
        self.series.steps.push(step);
        if excluded {
            self.exclude.insert(index);
        }
    }
}

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: groups + row errors.
#[derive(Debug, Clone)]
pub struct IngestedSteps {
    pub groups: Vec<AnalysisGroup>,
    pub row_errors: Vec<RowError>,
    /// Groups left out because one of their rows was bad.
    pub dropped_groups: Vec<String>,
    pub rows_read: usize,
}

/// Load step series from a CSV file.
pub fn load_step_csv(path: &Path) -> Result<IngestedSteps, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    read_step_csv(file)
}

/// Read step series from any CSV reader.
pub fn read_step_csv<R: Read>(input: R) -> Result<IngestedSteps, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    for name in ["age", "error", "signal"] {
        if !header_map.contains_key(name) {
            return Err(AppError::new(2, format!("Missing required column: `{name}`")));
        }
    }

    let mut groups: Vec<AnalysisGroup> = Vec::new();
    let mut group_index: HashMap<String, usize> = HashMap::new();
    let mut row_errors = Vec::new();
    let mut dropped_groups: Vec<String> = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!("line {line}: CSV parse error: {e}");
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        let (group_name, label, step, excluded) = match parse_row(&record, &header_map) {
            Ok(row) => row,
            Err(message) => {
                let group_name = group_of(&record, &header_map);
                warn!("line {line} (group {group_name}): {message}");
                row_errors.push(RowError { line, message });
                if !dropped_groups.contains(&group_name) {
                    dropped_groups.push(group_name);
                }
                continue;
            }
        };

        let slot = *group_index.entry(group_name.clone()).or_insert_with(|| {
            groups.push(AnalysisGroup::new(group_name));
            groups.len() - 1
        });
        groups[slot].push(label, step, excluded);
    }

    for name in &dropped_groups {
        warn!("group {name} dropped: it has rows with bad values");
    }
    groups.retain(|g| !dropped_groups.contains(&g.name));

    if groups.is_empty() {
        return Err(AppError::new(3, "No valid step rows found in CSV."));
    }

    Ok(IngestedSteps {
        groups,
        row_errors,
        dropped_groups,
        rows_read,
    })
}

type ParsedRow = (String, Option<String>, Step, bool);

fn parse_row(record: &StringRecord, header_map: &HashMap<String, usize>) -> Result<ParsedRow, String> {
    let age = parse_f64(get_required(record, header_map, "age")?, "age")?;
    let error = parse_f64(get_required(record, header_map, "error")?, "error")?;
    let signal = parse_f64(get_required(record, header_map, "signal")?, "signal")?;

    if error < 0.0 {
        return Err(format!("Negative `error` value: {error}"));
    }
    if signal < 0.0 {
        return Err(format!("Negative `signal` value: {signal}"));
    }

    let group = group_of(record, header_map);
    let label = get_optional(record, header_map, "step").map(str::to_string);
    let excluded = get_optional(record, header_map, "excluded")
        .or_else(|| get_optional(record, header_map, "omit"))
        .map(parse_flag)
        .unwrap_or(false);

    Ok((group, label, Step { age, error, signal }, excluded))
}

fn group_of(record: &StringRecord, header_map: &HashMap<String, usize>) -> String {
    get_optional(record, header_map, "group")
        .or_else(|| get_optional(record, header_map, "sample"))
        .unwrap_or(DEFAULT_GROUP)
        .to_string()
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports may prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    let idx = header_map
        .get(name)
        .ok_or_else(|| format!("Missing required column: `{name}`"))?;
    record
        .get(*idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn get_optional<'a>(record: &'a StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
}

fn parse_f64(s: &str, name: &str) -> Result<f64, String> {
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(format!("Invalid `{name}` value: '{s}'")),
    }
}

fn parse_flag(s: &str) -> bool {
    matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "y" | "x")
}
