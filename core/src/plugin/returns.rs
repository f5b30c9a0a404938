// tapir/src/plugin/returns.rs

//! Shape of the final, externally visible result of each task.

use crate::core::task::{Task, TaskReturn};
use crate::plugin::registry::PluginSet;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

type ReturnFn = dyn Fn(Option<&Value>, Option<&Value>) -> Option<Value> + Send + Sync;

/// Whether and how a plugin surfaces its namespaced data in a [`TaskReturn`].
#[derive(Clone, Default)]
pub enum ReturnPolicy {
  /// Never returned.
  Never,
  /// What `run` produced, when present.
  Current,
  /// The value before `run`, when present.
  #[default]
  Original,
  /// `f(after run, before run)`. `None` omits the plugin.
  Custom(Arc<ReturnFn>),
}

impl ReturnPolicy {
  pub fn custom<F>(f: F) -> Self
  where
    F: Fn(Option<&Value>, Option<&Value>) -> Option<Value> + Send + Sync + 'static,
  {
    ReturnPolicy::Custom(Arc::new(f))
  }

  pub fn apply(&self, current: Option<&Value>, original: Option<&Value>) -> Option<Value> {
    match self {
      ReturnPolicy::Never => None,
      ReturnPolicy::Current => current.cloned(),
      ReturnPolicy::Original => original.cloned(),
      ReturnPolicy::Custom(f) => f(current, original),
    }
  }
}

impl fmt::Debug for ReturnPolicy {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ReturnPolicy::Never => f.write_str("Never"),
      ReturnPolicy::Current => f.write_str("Current"),
      ReturnPolicy::Original => f.write_str("Original"),
      ReturnPolicy::Custom(_) => f.write_str("Custom(..)"),
    }
  }
}

/// Builds `{key, ...}` by asking every plugin, in order, for its namespace.
pub fn task_return(task: &Task, original: &Task, plugins: &PluginSet) -> TaskReturn {
  let mut data = Map::new();
  for plugin in plugins.iter() {
    let name = plugin.name();
    let policy = plugin.return_policy();
    if let Some(value) = policy.apply(task.get(name), original.get(name)) {
      data.insert(name.to_string(), value);
    }
  }
  TaskReturn {
    key: task.key.clone(),
    data,
  }
}
