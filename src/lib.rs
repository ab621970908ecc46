//! `arar-plateau` library crate.
//!
//! The binary (`plateau`) is a thin wrapper around this library so that:
//!
//! - the plateau search is testable without spawning processes
//! - callers (report writers, notebooks, other front-ends) can use the search directly
//!
//! The core entry point is [`plateau::find_plateau`].

pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod plateau;
pub mod report;

pub use domain::{ExcludedSet, PlateauConfig, PlateauSpan, Step, StepSeries};
pub use error::{AppError, PlateauError};
pub use plateau::{PlateauFinder, find_plateau};
