// tapir/src/plugins/glob.rs

use crate::core::merge::deep_merge;
use crate::core::phase::{Phase, PhaseSet};
use crate::core::task::Task;
use crate::error::{TapirError, TapirResult};
use crate::plugin::{Context, Plugin};
use crate::plugins::select::{compile, is_glob};
use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use tracing::{event, Level};

/// A task whose key is a glob pattern, e.g. `get*`, is not run. It is deep-merged
/// under every other task whose key it matches, earlier patterns first. Task values
/// win.
#[derive(Debug, Default)]
pub struct GlobPlugin;

#[async_trait]
impl Plugin for GlobPlugin {
  fn name(&self) -> &str {
    "glob"
  }

  fn phases(&self) -> PhaseSet {
    PhaseSet::NONE.with(Phase::Load)
  }

  async fn load(&self, tasks: &[Task], _ctx: &Context) -> TapirResult<Option<Vec<Task>>> {
    let globs = tasks
      .iter()
      .filter(|task| is_glob(&task.key))
      .map(|task| {
        let pattern = compile(&task.key).map_err(|err| {
          TapirError::config(format!("Task key '{}' is not a valid pattern: {}", task.key, err))
            .with_property("property", format!("tasks.{}", task.key))
        })?;
        Ok((pattern, Value::Object(task.data.clone())))
      })
      .collect::<TapirResult<Vec<(Regex, Value)>>>()?;
    if globs.is_empty() {
      return Ok(None);
    }

    let merged: Vec<Task> = tasks
      .iter()
      .filter(|task| !is_glob(&task.key))
      .map(|task| {
        let defaults = globs
          .iter()
          .filter(|(pattern, _)| pattern.is_match(&task.key))
          .fold(None, |merged: Option<Value>, (_, data)| match merged {
            None => Some(data.clone()),
            Some(merged) => Some(deep_merge(&merged, data)),
          });
        let Some(defaults) = defaults else {
          return task.clone();
        };
        let data = match deep_merge(&defaults, &Value::Object(task.data.clone())) {
          Value::Object(data) => data,
          _ => task.data.clone(),
        };
        Task { data, ..task.clone() }
      })
      .collect();
    event!(Level::DEBUG, patterns = globs.len(), num_tasks = merged.len(), "Glob tasks merged.");
    Ok(Some(merged))
  }
}
