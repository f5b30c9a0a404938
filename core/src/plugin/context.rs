// tapir/src/plugin/context.rs

//! What handlers see of the run besides their own arguments.

use crate::core::config::Config;
use crate::core::start_data::StartData;
use crate::core::task::Task;
use crate::error::TapirResult;
use crate::pipeline::task::TaskRunner;
use crate::plugin::registry::PluginSet;
use std::ops::Deref;
use std::sync::Arc;

/// Shared, read-only view of the run. Cheap to clone.
#[derive(Clone)]
pub struct Context {
  config: Arc<Config>,
  start_data: Arc<StartData>,
  plugins: Arc<PluginSet>,
  task_keys: Arc<[String]>,
}

impl Context {
  pub(crate) fn new(config: Arc<Config>, plugins: Arc<PluginSet>) -> Self {
    Self {
      config,
      start_data: Arc::new(StartData::new()),
      plugins,
      task_keys: Arc::from(Vec::new()),
    }
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  pub fn start_data(&self) -> &StartData {
    &self.start_data
  }

  pub fn plugins(&self) -> &PluginSet {
    &self.plugins
  }

  /// Keys of the tasks after `load`, in declaration order. Empty during `load`.
  pub fn task_keys(&self) -> &[String] {
    &self.task_keys
  }

  pub(crate) fn with_task_keys(self, task_keys: Vec<String>) -> Self {
    Self {
      task_keys: Arc::from(task_keys),
      ..self
    }
  }

  pub(crate) fn with_start(self, config: Config, start_data: StartData) -> Self {
    Self {
      config: Arc::new(config),
      start_data: Arc::new(start_data),
      ..self
    }
  }
}

/// Context of a `run` handler: the run view plus the task's position in a chain of
/// recursive sub-task runs.
#[derive(Clone)]
pub struct RunContext {
  runner: Arc<TaskRunner>,
  nested_path: Arc<[String]>,
}

impl RunContext {
  pub(crate) fn new(runner: Arc<TaskRunner>, nested_path: Vec<String>) -> Self {
    Self {
      runner,
      nested_path: Arc::from(nested_path),
    }
  }

  /// Keys of the in-flight tasks, outermost first. The last one is the current task.
  pub fn nested_path(&self) -> &[String] {
    &self.nested_path
  }

  pub fn is_nested(&self) -> bool {
    self.nested_path.len() > 1
  }

  /// Every task after `load`, as declared (before `run`).
  pub fn tasks(&self) -> &[Task] {
    self.runner.tasks()
  }

  /// Runs another task inline, through `run` then `complete`, and returns it.
  ///
  /// The task is tagged as nested. Running a task already in the chain of in-flight
  /// tasks is a `config` error. If the sub-task fails, the returned error wraps it
  /// as its nested task.
  pub async fn run_task(&self, key: &str) -> TapirResult<Task> {
    self.runner.run_nested(key, &self.nested_path).await
  }
}

impl Deref for RunContext {
  type Target = Context;

  fn deref(&self) -> &Context {
    self.runner.context()
  }
}
