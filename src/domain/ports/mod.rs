//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines the interfaces the progress engine depends on:
//! - ProgressRepository: durable storage of one record per user
//! - Clock: the source of "now" for day-boundary decisions
//!
//! Adapters in `crate::adapters` implement these so the domain stays
//! independent of any particular database or time source.

pub mod clock;
pub mod progress_repository;

pub use clock::{Clock, ManualClock, SystemClock};
pub use progress_repository::ProgressRepository;
