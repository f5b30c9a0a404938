// tapir/src/core/mod.rs

pub mod config;
pub mod merge;
pub mod phase;
pub mod start_data;
pub mod task;

// Re-export the data model for other tapir modules (and lib.rs)
pub use config::{Config, ConfigBuilder};
pub use phase::{Phase, PhaseSet};
pub use start_data::{StartData, StartPatch};
pub use task::{ResultType, Task, TaskPatch, TaskReturn};
