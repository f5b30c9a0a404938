// tapir/src/plugin/mod.rs

//! The plugin contract.
//!
//! A plugin is a named bundle of lifecycle handlers implementing one feature, e.g.
//! sending HTTP calls or validating responses. Which handlers a plugin has is declared
//! once through [`Plugin::phases`]; the registry turns that into a fixed dispatch
//! table, so a handler outside the declared set is never called.

pub mod context;
pub mod registry;
pub mod returns;
pub mod verify;

pub use context::{Context, RunContext};
pub use registry::{PluginRegistry, PluginSet};
pub use returns::{task_return, ReturnPolicy};

use crate::core::phase::PhaseSet;
use crate::core::start_data::{StartData, StartPatch};
use crate::core::task::{Task, TaskPatch, TaskReturn};
use crate::error::TapirResult;
use crate::template::TemplateVars;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// JSON schemas a plugin declares for its configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigSchema {
  /// Schema of `config.<plugin>`. Checked when plugins are loaded.
  pub general: Option<Value>,
  /// Schema of `task.<plugin>`. Checked by the `verify` plugin on each task.
  pub task: Option<Value>,
}

/// A plugin's contribution to the report of one task.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportProps {
  pub title: Option<String>,
  pub props: Map<String, Value>,
}

impl ReportProps {
  pub fn title(title: impl Into<String>) -> Self {
    Self {
      title: Some(title.into()),
      props: Map::new(),
    }
  }

  pub fn with_prop(mut self, name: impl Into<String>, value: Value) -> Self {
    self.props.insert(name.into(), value);
    self
  }
}

/// A behavior plugin.
///
/// Handlers receive their inputs by reference and describe changes through their
/// return value, which the scheduler merges. Every handler has a no-op default.
#[async_trait]
pub trait Plugin: Send + Sync + 'static {
  fn name(&self) -> &str;

  /// Phases this plugin has handlers for.
  fn phases(&self) -> PhaseSet;

  fn config_schema(&self) -> ConfigSchema {
    ConfigSchema::default()
  }

  /// How the plugin's namespaced task data appears in the final result.
  fn return_policy(&self) -> ReturnPolicy {
    ReturnPolicy::default()
  }

  /// May replace the whole task set. `None` keeps it.
  async fn load(&self, _tasks: &[Task], _ctx: &Context) -> TapirResult<Option<Vec<Task>>> {
    Ok(None)
  }

  async fn start(&self, _start_data: &StartData, _ctx: &Context) -> TapirResult<StartPatch> {
    Ok(StartPatch::new())
  }

  async fn run(&self, _task: &Task, _ctx: &RunContext) -> TapirResult<TaskPatch> {
    Ok(TaskPatch::new())
  }

  /// Side effects only, e.g. reporting.
  async fn complete(&self, _task: &Task, _ctx: &Context) -> TapirResult<()> {
    Ok(())
  }

  async fn end(&self, _tasks: &[Task], _returns: &[TaskReturn], _ctx: &Context) -> TapirResult<()> {
    Ok(())
  }

  /// Reporting-only projection of the task. Never affects execution.
  fn report(&self, _task: &Task, _ctx: &Context) -> Option<ReportProps> {
    None
  }

  /// Named values added to the variable mapping templates resolve against.
  fn template(&self, _task: &Task, _ctx: &RunContext) -> TemplateVars {
    TemplateVars::new()
  }
}
