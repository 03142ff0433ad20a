//! Application layer module
//!
//! Use cases that wire configuration, infrastructure and the harvesting
//! pipeline into the two runnable workflows.

pub mod use_cases;

pub use use_cases::{HarvestUseCase, PatchGameDataUseCase};
