//! In-process adapters with no external storage.

pub mod progress_repository;

pub use progress_repository::InMemoryProgressRepository;
