//! CLI command implementations.

pub mod progress;
pub mod serve;
pub mod sweep;
