//! Inverse-variance weighted plateau age.
//!
//! Over the non-excluded steps of a span:
//!
//! ```text
//! w_i   = 1 / err_i^2
//! mean  = Σ w_i age_i / Σ w_i
//! se    = 1 / sqrt(Σ w_i)                      (Taylor, 1982)
//! mswd  = Σ w_i (age_i - mean)^2 / (n - 1)
//! error = se * sqrt(mswd)   if mswd > 1, else se
//! ```

use crate::domain::{ExcludedSet, PlateauAge, PlateauSpan, StepSeries, StepStatus};
use crate::error::PlateauError;

/// Compute the plateau age for `span` over `series`.
pub fn plateau_age(
    series: &StepSeries,
    span: PlateauSpan,
    exclude: &ExcludedSet,
) -> Result<PlateauAge, PlateauError> {
    if span.start > span.end || span.end >= series.len() {
        return Err(PlateauError::invalid(format!(
            "span {}..={} out of range for {} steps",
            span.start,
            span.end,
            series.len()
        )));
    }

    let steps: Vec<_> = span.included_steps(exclude).map(|i| series.steps[i]).collect();
    if steps.is_empty() {
        return Err(PlateauError::invalid("span contains no included steps"));
    }

    let mut sum_w = 0.0;
    let mut sum_wx = 0.0;
    for step in &steps {
        if !(step.error.is_finite() && step.error > 0.0) {
            return Err(PlateauError::Numeric(format!(
                "step error must be finite and > 0 for weighting (got {})",
                step.error
            )));
        }
        let w = 1.0 / (step.error * step.error);
        sum_w += w;
        sum_wx += w * step.age;
    }

    let mean = sum_wx / sum_w;
    let weighted_error = 1.0 / sum_w.sqrt();

    let n = steps.len();
    let mswd = if n > 1 {
        let chi2: f64 = steps
            .iter()
            .map(|s| (s.age - mean).powi(2) / (s.error * s.error))
            .sum();
        chi2 / (n as f64 - 1.0)
    } else {
        0.0
    };

    let error = if mswd > 1.0 {
        weighted_error * mswd.sqrt()
    } else {
        weighted_error
    };

    let total: f64 = series
        .steps
        .iter()
        .enumerate()
        .filter(|(i, _)| !exclude.contains(*i))
        .map(|(_, s)| s.signal)
        .sum();
    let released: f64 = steps.iter().map(|s| s.signal).sum();
    let percent_released = if total > 0.0 { 100.0 * released / total } else { 0.0 };

    if !(mean.is_finite() && error.is_finite()) {
        return Err(PlateauError::Numeric("non-finite plateau age".to_string()));
    }

    Ok(PlateauAge {
        age: mean,
        weighted_error,
        error,
        mswd,
        n,
        percent_released,
    })
}

/// Classify every step against an optional plateau span.
pub fn step_statuses(n: usize, span: Option<PlateauSpan>, exclude: &ExcludedSet) -> Vec<StepStatus> {
    (0..n)
        .map(|i| {
            if exclude.contains(i) {
                StepStatus::Excluded
            } else if span.is_some_and(|s| s.contains(i)) {
                StepStatus::Plateau
            } else {
                StepStatus::Outside
            }
        })
        .collect()
}
