//! Plateau search and the statistics derived from a selected plateau.
//!
//! Responsibilities:
//!
//! - select the plateau span (`finder`)
//! - compute the weighted-mean plateau age over that span (`age`)

pub mod age;
pub mod finder;

pub use age::*;
pub use finder::*;
