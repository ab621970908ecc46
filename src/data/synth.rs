//! Synthetic step-heating spectrum generation.
//!
//! The generated spectrum has:
//! - a Gaussian-shaped gas release over the heating sequence
//! - `disturbed_steps` leading low-temperature steps with a descending
//!   staircase of elevated ages (excess-argon style)
//! - remaining steps scattered around `plateau_age` by `scatter` x their error
//!
//! Errors shrink with released signal: `err = age * rel_error * sqrt(mean / signal)`.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::StandardNormal;

use crate::domain::{Step, StepSeries};
use crate::error::AppError;
use crate::io::ingest::AnalysisGroup;

/// Fractional age increment per disturbed step (counted back from the plateau).
const DISTURBED_AGE_STEP: f64 = 0.25;

/// Smallest released signal relative to the peak step.
const SIGNAL_FLOOR: f64 = 0.05;

#[derive(Debug, Clone)]
pub struct SynthConfig {
    pub steps: usize,
    pub seed: u64,
    pub plateau_age: f64,
    pub rel_error: f64,
    pub disturbed_steps: usize,
    /// Age scatter of plateau steps in units of their own error.
    pub scatter: f64,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            steps: 12,
            seed: 42,
            plateau_age: 28.2,
            rel_error: 0.005,
            disturbed_steps: 2,
            scatter: 1.0,
        }
    }
}

pub fn generate_spectrum(config: &SynthConfig) -> Result<AnalysisGroup, AppError> {
    if config.steps == 0 {
        return Err(AppError::new(2, "Step count must be > 0."));
    }
    if config.disturbed_steps >= config.steps {
        return Err(AppError::new(2, "Disturbed steps must leave at least one plateau step."));
    }
    if !(config.plateau_age.is_finite() && config.plateau_age > 0.0) {
        return Err(AppError::new(2, "Plateau age must be finite and > 0."));
    }
    if !(config.rel_error.is_finite() && config.rel_error > 0.0) {
        return Err(AppError::new(2, "Relative error must be finite and > 0."));
    }
    if !(config.scatter.is_finite() && config.scatter >= 0.0) {
        return Err(AppError::new(2, "Scatter must be finite and >= 0."));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let n = config.steps;

    let center = 0.55 * (n as f64 - 1.0);
    let width = (n as f64 / 4.0).max(1.0);
    let signals: Vec<f64> = (0..n)
        .map(|i| {
            let z = (i as f64 - center) / width;
            let profile = (-0.5 * z * z).exp().max(SIGNAL_FLOOR);
            100.0 * profile * rng.gen_range(0.8..1.2)
        })
        .collect();
    let mean_signal = signals.iter().sum::<f64>() / n as f64;

    let mut steps = Vec::with_capacity(n);
    for (i, &signal) in signals.iter().enumerate() {
        let precision = (mean_signal / signal).sqrt();
        let step = if i < config.disturbed_steps {
            let lift = DISTURBED_AGE_STEP * (config.disturbed_steps - i) as f64;
            let age = config.plateau_age * (1.0 + lift);
            Step::new(age, age * config.rel_error * precision, signal)
        } else {
            let error = config.plateau_age * config.rel_error * precision;
            let z: f64 = rng.sample(StandardNormal);
            Step::new(config.plateau_age + z * error * config.scatter, error, signal)
        };
        steps.push(step);
    }

    let mut group = AnalysisGroup::new(format!("SYN-{}", config.seed));
    group.labels = (0..n).map(crate::domain::step_letter).collect();
    group.series = StepSeries::new(steps);
    Ok(group)
}
