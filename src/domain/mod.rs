//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - heating steps and step series (`Step`, `StepSeries`)
//! - the excluded-step set (`ExcludedSet`)
//! - search parameters (`PlateauConfig`)
//! - search outputs (`PlateauSpan`, `PlateauAge`)

pub mod types;

pub use types::*;
