//! Application Layer - cycle orchestration

pub mod scheduler;

pub use scheduler::{CycleOutcome, UpdateScheduler};
