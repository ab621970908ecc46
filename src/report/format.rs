//! Formatted terminal output.
//!
//! Formatting lives here so the search code stays free of presentation and
//! output changes stay localized.

use crate::domain::{GroupOutcome, PlateauConfig, StepSeries, StepStatus};

/// Format the run header (active search parameters).
pub fn format_run_header(config: &PlateauConfig, n_groups: usize) -> String {
    let mut out = String::new();
    out.push_str("=== plateau - Ar/Ar plateau search ===\n");
    out.push_str(&format!(
        "nsteps >= {} | overlap {:.2} sigma | released >= {:.1}%\n",
        config.nsteps,
        config.overlap_sigma,
        100.0 * config.min_fraction_released
    ));
    out.push_str(&format!("Groups: {n_groups}\n"));
    out
}

/// Format one group: step table followed by the plateau summary.
pub fn format_group(outcome: &GroupOutcome, series: &StepSeries) -> String {
    let mut out = String::new();
    out.push_str(&format!("\n[{}] {} steps\n", outcome.group, outcome.n_steps()));
    out.push_str(&format_step_table(outcome, series));
    out.push_str(&format_plateau_line(outcome));
    out.push('\n');
    out
}

/// One-line plateau summary, e.g. `Plateau ±1σ  steps C-L  28.201 ± 0.012 ...`.
pub fn format_plateau_line(outcome: &GroupOutcome) -> String {
    let Some(label) = outcome.span_label() else {
        return "No plateau found".to_string();
    };
    match &outcome.age {
        Some(age) => format!(
            "Plateau \u{00b1}1\u{03c3}  steps {label}  {:.4} \u{00b1} {:.4}  MSWD={:.2}  n={}  {:.1}% released",
            age.age, age.error, age.mswd, age.n, age.percent_released
        ),
        None => format!("Plateau steps {label} (age unavailable)"),
    }
}

fn format_step_table(outcome: &GroupOutcome, series: &StepSeries) -> String {
    let total: f64 = series
        .steps
        .iter()
        .zip(&outcome.statuses)
        .filter(|(_, status)| **status != StepStatus::Excluded)
        .map(|(s, _)| s.signal)
        .sum();

    let mut out = String::new();
    out.push_str(
        format!(
            "  {:<6} {:>12} {:>10} {:>12} {:>8}\n",
            "step", "age", "error", "signal", "%"
        )
        .as_str(),
    );
    out.push_str(format!("  {:-<6} {:-<12} {:-<10} {:-<12} {:-<8}\n", "", "", "", "", "").as_str());

    for (i, step) in series.steps.iter().enumerate() {
        let status = outcome.statuses.get(i).copied().unwrap_or(StepStatus::Outside);
        let label = outcome.labels.get(i).map(String::as_str).unwrap_or("?");
        let pct = if total > 0.0 && status != StepStatus::Excluded {
            format!("{:.1}", 100.0 * step.signal / total)
        } else {
            "-".to_string()
        };
        out.push_str(&format!(
            "{} {:<6} {:>12.4} {:>10.4} {:>12.4} {:>8}\n",
            status_marker(status),
            truncate(label, 6),
            step.age,
            step.error,
            step.signal,
            pct
        ));
    }
    out
}

/// `X` marks excluded steps, `*` plateau steps.
fn status_marker(status: StepStatus) -> char {
    match status {
        StepStatus::Plateau => '*',
        StepStatus::Excluded => 'X',
        StepStatus::Outside => ' ',
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}
