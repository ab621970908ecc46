//! Input/output helpers.
//!
//! - step CSV ingest + validation (`ingest`)
//! - plateau result export (JSON) and synthetic CSV output (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
