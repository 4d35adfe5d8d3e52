//! Domain layer for the progress engine
//!
//! This module contains the progress record model, the calendar rules that
//! decide day boundaries, and the ports the engine depends on.

pub mod calendar;
pub mod errors;
pub mod models;
pub mod ports;

pub use calendar::Calendar;
pub use errors::{DomainError, DomainResult};
