//! Layered resolution of [`PlateauConfig`].
//!
//! Precedence (highest first):
//! 1. CLI flags
//! 2. environment (`.env` is loaded first when present)
//! 3. built-in defaults

use crate::domain::PlateauConfig;
use crate::error::AppError;

pub const ENV_NSTEPS: &str = "PLATEAU_NSTEPS";
pub const ENV_OVERLAP_SIGMA: &str = "PLATEAU_OVERLAP_SIGMA";
pub const ENV_MIN_FRACTION: &str = "PLATEAU_MIN_FRACTION";

/// Explicit overrides, usually from CLI flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigOverrides {
    pub nsteps: Option<usize>,
    pub overlap_sigma: Option<f64>,
    pub min_fraction_released: Option<f64>,
}

/// Resolve the config from `.env`, the process environment and `overrides`.
pub fn resolve_config(overrides: ConfigOverrides) -> Result<PlateauConfig, AppError> {
    dotenvy::dotenv().ok();
    resolve_with(overrides, |key| std::env::var(key).ok())
}

/// Resolve using an arbitrary variable lookup.
pub fn resolve_with<F>(overrides: ConfigOverrides, lookup: F) -> Result<PlateauConfig, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = PlateauConfig::default();

    if let Some(v) = lookup(ENV_NSTEPS) {
        config.nsteps = parse_var(ENV_NSTEPS, &v)?;
    }
    if let Some(v) = lookup(ENV_OVERLAP_SIGMA) {
        config.overlap_sigma = parse_var(ENV_OVERLAP_SIGMA, &v)?;
    }
    if let Some(v) = lookup(ENV_MIN_FRACTION) {
        config.min_fraction_released = parse_var(ENV_MIN_FRACTION, &v)?;
    }

    if let Some(n) = overrides.nsteps {
        config.nsteps = n;
    }
    if let Some(s) = overrides.overlap_sigma {
        config.overlap_sigma = s;
    }
    if let Some(f) = overrides.min_fraction_released {
        config.min_fraction_released = f;
    }

    config.validate()?;
    Ok(config)
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, AppError> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| AppError::new(2, format!("Invalid value for {key}: '{value}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_env_or_flags() {
        let config = resolve_with(ConfigOverrides::default(), lookup(&[])).unwrap();
        assert_eq!(config, PlateauConfig::default());
    }

    #[test]
    fn env_overrides_defaults() {
        let config = resolve_with(
            ConfigOverrides::default(),
            lookup(&[(ENV_NSTEPS, "5"), (ENV_OVERLAP_SIGMA, " 1.5 ")]),
        )
        .unwrap();
        assert_eq!(config.nsteps, 5);
        assert_eq!(config.overlap_sigma, 1.5);
        assert_eq!(config.min_fraction_released, 0.5);
    }

    #[test]
    fn flags_override_env() {
        let overrides = ConfigOverrides {
            nsteps: Some(2),
            ..Default::default()
        };
        let config = resolve_with(overrides, lookup(&[(ENV_NSTEPS, "5")])).unwrap();
        assert_eq!(config.nsteps, 2);
    }

    #[test]
    fn bad_env_value_is_a_usage_error() {
        let err = resolve_with(ConfigOverrides::default(), lookup(&[(ENV_NSTEPS, "-1")])).unwrap_err();
        assert_eq!(err.exit_code(), 2);

        let err =
            resolve_with(ConfigOverrides::default(), lookup(&[(ENV_MIN_FRACTION, "1.5")])).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
