//! Shared domain types.
//!
//! These types are kept lightweight and serializable so they can be:
//!
//! - used in-memory during the plateau search
//! - exported to JSON
//! - rebuilt from CSV rows

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::PlateauError;

/// Default minimum span (`end - start`) for a plateau candidate.
pub const DEFAULT_NSTEPS: usize = 3;

/// Default error-bar multiplier for the overlap test.
pub const DEFAULT_OVERLAP_SIGMA: f64 = 2.0;

/// Default minimum fraction of total signal a plateau must release.
pub const DEFAULT_MIN_FRACTION_RELEASED: f64 = 0.5;

/// One heating step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Step age (e.g. Ma).
    pub age: f64,
    /// 1-sigma age error, same units as `age`.
    pub error: f64,
    /// Released gas signal (e.g. fA or moles).
    pub signal: f64,
}

impl Step {
    pub fn new(age: f64, error: f64, signal: f64) -> Self {
        Self { age, error, signal }
    }
}

/// An ordered heating-step series.
///
/// The index order is the heating order and is never re-sorted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepSeries {
    pub steps: Vec<Step>,
}

impl StepSeries {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    /// Build a series from parallel columns.
    pub fn from_columns(ages: &[f64], errors: &[f64], signals: &[f64]) -> Result<Self, PlateauError> {
        check_lengths(ages, errors, signals)?;
        let steps = ages
            .iter()
            .zip(errors)
            .zip(signals)
            .map(|((&age, &error), &signal)| Step { age, error, signal })
            .collect();
        Ok(Self { steps })
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn ages(&self) -> Vec<f64> {
        self.steps.iter().map(|s| s.age).collect()
    }

    pub fn errors(&self) -> Vec<f64> {
        self.steps.iter().map(|s| s.error).collect()
    }

    pub fn signals(&self) -> Vec<f64> {
        self.steps.iter().map(|s| s.signal).collect()
    }
}

/// Reject parallel columns of different lengths.
pub fn check_lengths(ages: &[f64], errors: &[f64], signals: &[f64]) -> Result<(), PlateauError> {
    if ages.len() != errors.len() || ages.len() != signals.len() {
        return Err(PlateauError::invalid(format!(
            "length mismatch: ages={}, errors={}, signals={}",
            ages.len(),
            errors.len(),
            signals.len()
        )));
    }
    Ok(())
}

/// Step indices excluded from the search.
///
/// Indices past the end of the series are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExcludedSet(BTreeSet<usize>);

impl ExcludedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, index: usize) -> bool {
        self.0.insert(index)
    }

    pub fn contains(&self, index: usize) -> bool {
        self.0.contains(&index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<usize> for ExcludedSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[usize; N]> for ExcludedSet {
    fn from(value: [usize; N]) -> Self {
        value.into_iter().collect()
    }
}

/// Plateau search parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlateauConfig {
    /// Minimum `end - start` of a candidate span.
    pub nsteps: usize,
    /// Multiplier applied to each step error in the overlap test.
    pub overlap_sigma: f64,
    /// Minimum fraction of total signal released inside the span (inclusive).
    pub min_fraction_released: f64,
}

impl Default for PlateauConfig {
    fn default() -> Self {
        Self {
            nsteps: DEFAULT_NSTEPS,
            overlap_sigma: DEFAULT_OVERLAP_SIGMA,
            min_fraction_released: DEFAULT_MIN_FRACTION_RELEASED,
        }
    }
}

impl PlateauConfig {
    pub fn with_nsteps(mut self, nsteps: usize) -> Self {
        self.nsteps = nsteps;
        self
    }

    pub fn with_overlap_sigma(mut self, overlap_sigma: f64) -> Self {
        self.overlap_sigma = overlap_sigma;
        self
    }

    pub fn validate(&self) -> Result<(), PlateauError> {
        if !(self.overlap_sigma.is_finite() && self.overlap_sigma >= 0.0) {
            return Err(PlateauError::invalid(format!(
                "overlap_sigma must be finite and >= 0 (got {})",
                self.overlap_sigma
            )));
        }
        if !(self.min_fraction_released.is_finite()
            && self.min_fraction_released > 0.0
            && self.min_fraction_released <= 1.0)
        {
            return Err(PlateauError::invalid(format!(
                "min_fraction_released must be in (0, 1] (got {})",
                self.min_fraction_released
            )));
        }
        Ok(())
    }
}

/// Inclusive step range selected as the plateau.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlateauSpan {
    pub start: usize,
    pub end: usize,
}

impl PlateauSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// `end - start`, the quantity candidates are ranked by.
    pub fn width(&self) -> usize {
        self.end - self.start
    }

    pub fn contains(&self, index: usize) -> bool {
        (self.start..=self.end).contains(&index)
    }

    /// Non-excluded indices inside the span, in heating order.
    pub fn included_steps<'a>(&self, exclude: &'a ExcludedSet) -> impl Iterator<Item = usize> + 'a {
        (self.start..=self.end).filter(move |i| !exclude.contains(*i))
    }
}

/// Weighted-mean plateau age over the selected steps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlateauAge {
    /// Inverse-variance weighted mean age.
    pub age: f64,
    /// Weighted error `1/sqrt(Σw)`.
    pub weighted_error: f64,
    /// Weighted error scaled by `sqrt(MSWD)` when MSWD > 1.
    pub error: f64,
    pub mswd: f64,
    /// Number of non-excluded steps used.
    pub n: usize,
    /// Percent of the total signal released by the used steps.
    pub percent_released: f64,
}

/// Status of one step relative to a plateau result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    /// Inside the plateau and used in the age.
    Plateau,
    /// Excluded by the caller.
    Excluded,
    /// Valid step outside the plateau (or no plateau found).
    Outside,
}

/// Plateau outcome for one analysis group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupOutcome {
    pub group: String,
    pub labels: Vec<String>,
    pub span: Option<PlateauSpan>,
    pub statuses: Vec<StepStatus>,
    pub age: Option<PlateauAge>,
}

impl GroupOutcome {
    pub fn n_steps(&self) -> usize {
        self.labels.len()
    }

    /// Span rendered with step labels, e.g. `"A-F"`.
    pub fn span_label(&self) -> Option<String> {
        let span = self.span?;
        let first = self.labels.get(span.start)?;
        let last = self.labels.get(span.end)?;
        Some(format!("{first}-{last}"))
    }
}

/// Spreadsheet-style step letter: `0 -> A`, `25 -> Z`, `26 -> AA`.
pub fn step_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut out = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        out.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}
