// tapir/src/pipeline/phases.rs

//! The run-wide phases: `load`, `start` and `end`.
//!
//! Each is sequential across plugins, in registration order, and any error aborts
//! the whole run.

use crate::core::phase::Phase;
use crate::core::start_data::StartData;
use crate::core::task::{Task, TaskReturn};
use crate::error::{TapirError, TapirResult};
use crate::plugin::{Context, Plugin};
use std::collections::HashSet;
use std::mem;
use std::sync::Arc;
use tracing::{event, instrument, Level};

/// Lets every `load` handler replace the task set, then checks keys are unique.
#[instrument(name = "Scheduler::load", skip_all, fields(num_tasks = tasks.len()), err(Display))]
pub(crate) async fn load(tasks: Vec<Task>, ctx: &Context) -> TapirResult<Vec<Task>> {
  let mut tasks = tasks;
  for plugin in ctx.plugins().handlers(Phase::Load) {
    event!(Level::DEBUG, plugin = plugin.name(), "Firing 'load' handler.");
    let loaded = plugin
      .load(&tasks, ctx)
      .await
      .map_err(|err| err.with_plugin(plugin.name()))?;
    if let Some(next) = loaded {
      event!(Level::TRACE, plugin = plugin.name(), num_tasks = next.len(), "Task set replaced.");
      tasks = next;
    }
  }

  let mut keys = HashSet::new();
  for task in &tasks {
    if !keys.insert(task.key.as_str()) {
      return Err(
        TapirError::config(format!("Task '{}' is declared several times", task.key))
          .with_property("property", format!("tasks.{}", task.key)),
      );
    }
  }
  Ok(tasks)
}

/// Builds the shared `StartData`. Each handler sees the config and start data
/// produced by the handlers before it.
#[instrument(name = "Scheduler::start", skip_all, err(Display))]
pub(crate) async fn start(ctx: Context) -> TapirResult<Context> {
  let handlers: Vec<Arc<dyn Plugin>> = ctx.plugins().handlers(Phase::Start).cloned().collect();
  let mut config = ctx.config().clone();
  let mut start_data = StartData::new();
  let mut ctx = ctx;

  for plugin in handlers {
    event!(Level::DEBUG, plugin = plugin.name(), "Firing 'start' handler.");
    let mut patch = plugin
      .start(&start_data, &ctx)
      .await
      .map_err(|err| err.with_plugin(plugin.name()))?;
    if patch.is_empty() {
      continue;
    }

    let config_patch = mem::take(&mut patch.config);
    if !config_patch.is_empty() {
      config = config.merged(config_patch);
    }
    start_data = start_data.merged(patch);
    ctx = ctx.with_start(config.clone(), start_data.clone());
  }

  Ok(ctx.with_start(config, start_data))
}

/// Fired once every task reached `complete`.
#[instrument(name = "Scheduler::end", skip_all, fields(num_tasks = tasks.len()), err(Display))]
pub(crate) async fn end(tasks: &[Task], returns: &[TaskReturn], ctx: &Context) -> TapirResult<()> {
  for plugin in ctx.plugins().handlers(Phase::End) {
    event!(Level::DEBUG, plugin = plugin.name(), "Firing 'end' handler.");
    plugin
      .end(tasks, returns, ctx)
      .await
      .map_err(|err| err.with_plugin(plugin.name()))?;
  }
  Ok(())
}
