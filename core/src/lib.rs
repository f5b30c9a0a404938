// src/lib.rs

//! Tapir: a declarative API testing engine.
//!
//! Test cases are plain data: each task declares, in plugin-namespaced sections,
//! the HTTP call to make and the rules its response must follow. The engine runs
//! them against a live API and reports pass/fail per task.
//!
//! The execution core is made of:
//!  - A plugin pipeline with five fixed phases: `load` and `start` once, `run` and
//!    `complete` per task (tasks run concurrently), then `end`.
//!  - A data template evaluator resolving `$$name` references inside arbitrary
//!    nested data, including asynchronous helpers, with cycle detection.
//!  - An ordered buffered reporter releasing task reports in declaration order
//!    even though tasks finish in any order.
//!  - An error aggregator turning every failure of a run into one classified error.
//!
//! Specification parsing, JSON-schema validation, the HTTP transport and report
//! formats are collaborators injected through the traits of [`collab`] and
//! [`report::Reporter`].

pub mod aggregate;
pub mod collab;
pub mod core;
pub mod error;
pub mod pipeline;
pub mod plugin;
pub mod plugins;
pub mod report;
pub mod template;

// --- Re-exports for the Public API ---

pub use crate::core::{Config, ConfigBuilder, Phase, PhaseSet, ResultType, StartData, StartPatch, Task, TaskPatch, TaskReturn};

pub use crate::plugin::{ConfigSchema, Context, Plugin, PluginRegistry, PluginSet, ReportProps, ReturnPolicy, RunContext};

pub use crate::pipeline::{Runner, RunnerBuilder};

pub use crate::template::{evaluate, TemplateFunction, TemplateValue, TemplateVars};

pub use crate::report::{MemoryReporter, ReportEntry, ReportSummary, Reporter};

pub use crate::collab::{JsonSchemaValidator, Request, Response, SchemaValidator, SchemaViolation, SpecLoader, Transport};

pub use crate::error::{ErrorKind, ErrorRecord, RunError, TapirError, TapirResult};
