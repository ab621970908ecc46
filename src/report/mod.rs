//! Terminal reporting for plateau results.

pub mod format;

pub use format::*;
