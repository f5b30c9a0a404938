// tapir/src/pipeline/mod.rs

//! Drives the five-phase lifecycle of a run.

pub mod execution;
pub mod phases;
pub mod task;

pub use execution::{Runner, RunnerBuilder};
pub use task::TaskRunner;
