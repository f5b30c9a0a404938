// tapir/src/plugin/registry.rs

//! Plugin registry: resolves requested plugin names into the ordered [`PluginSet`]
//! of one run.

use crate::collab::{JsonSchemaValidator, SchemaValidator};
use crate::core::config::Config;
use crate::core::phase::Phase;
use crate::error::{TapirError, TapirResult};
use crate::plugin::verify::verify_plugin_config;
use crate::plugin::Plugin;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::{event, instrument, Level};

/// Plugins always loaded, first, whether requested or not.
pub const CORE_PLUGINS: &[&str] = &[
  "each", "glob", "only", "skip", "repeat", "alias", "template", "verify", "report",
];

/// Plugins loaded after the core ones unless the registry is built with other tiers.
pub const DEFAULT_PLUGINS: &[&str] = &["spec", "call", "validate"];

/// Available plugins by name, plus the two fixed tiers.
///
/// Registration is synchronized, so plugins may be added from anywhere before a
/// run. Loading is read-only.
pub struct PluginRegistry {
  available: RwLock<HashMap<String, Arc<dyn Plugin>>>,
  core: Vec<String>,
  defaults: Vec<String>,
  validator: Arc<dyn SchemaValidator>,
}

impl PluginRegistry {
  /// An empty registry with the standard tiers.
  pub fn new() -> Self {
    Self::with_tiers(
      CORE_PLUGINS.iter().map(|name| name.to_string()).collect(),
      DEFAULT_PLUGINS.iter().map(|name| name.to_string()).collect(),
    )
  }

  pub fn with_tiers(core: Vec<String>, defaults: Vec<String>) -> Self {
    Self {
      available: RwLock::new(HashMap::new()),
      core,
      defaults,
      validator: Arc::new(JsonSchemaValidator),
    }
  }

  pub fn with_validator(mut self, validator: Arc<dyn SchemaValidator>) -> Self {
    self.validator = validator;
    self
  }

  /// Makes a plugin available under its name, replacing any previous one.
  pub fn register(&self, plugin: Arc<dyn Plugin>) {
    let name = plugin.name().to_string();
    event!(Level::DEBUG, plugin = %name, "Registering plugin.");
    self.available.write().insert(name, plugin);
  }

  pub fn contains(&self, name: &str) -> bool {
    self.available.read().contains_key(name)
  }

  /// Core tier, then default tier, then requested names. First occurrence wins, so
  /// naming a built-in is a no-op.
  pub fn normalize(&self, requested: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    self
      .core
      .iter()
      .chain(self.defaults.iter())
      .chain(requested.iter())
      .filter(|name| seen.insert(name.as_str()))
      .cloned()
      .collect()
  }

  /// Resolves `requested` into the ordered plugins of a run and validates each
  /// plugin's general configuration.
  #[instrument(name = "PluginRegistry::load", skip_all, fields(num_requested = requested.len()), err(Display))]
  pub fn load(&self, requested: &[String], config: &Config) -> TapirResult<PluginSet> {
    let names = self.normalize(requested);
    let available = self.available.read();

    let mut plugins = Vec::with_capacity(names.len());
    for name in &names {
      let plugin = available.get(name).cloned().ok_or_else(|| {
        TapirError::config(format!("Plugin '{}' does not exist", name))
          .with_property("property", "config.plugins")
          .with_property("actual", name.as_str())
      })?;
      verify_plugin_config(plugin.as_ref(), config, self.validator.as_ref())?;
      plugins.push(plugin);
    }

    event!(Level::DEBUG, plugins = ?names, "Plugins loaded.");
    Ok(PluginSet::new(plugins))
  }
}

impl Default for PluginRegistry {
  fn default() -> Self {
    Self::new()
  }
}

impl fmt::Debug for PluginRegistry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut available: Vec<String> = self.available.read().keys().cloned().collect();
    available.sort();
    f.debug_struct("PluginRegistry")
      .field("available", &available)
      .field("core", &self.core)
      .field("defaults", &self.defaults)
      .finish()
  }
}

/// The ordered plugins of one run with their per-phase dispatch table.
#[derive(Clone, Default)]
pub struct PluginSet {
  plugins: Vec<Arc<dyn Plugin>>,
  dispatch: [Vec<usize>; 5],
}

impl PluginSet {
  pub fn new(plugins: Vec<Arc<dyn Plugin>>) -> Self {
    let mut dispatch: [Vec<usize>; 5] = Default::default();
    for (position, plugin) in plugins.iter().enumerate() {
      let phases = plugin.phases();
      for phase in Phase::ALL {
        if phases.contains(phase) {
          dispatch[phase.index()].push(position);
        }
      }
    }
    Self { plugins, dispatch }
  }

  /// Plugins with a handler for `phase`, in registration order.
  pub fn handlers(&self, phase: Phase) -> impl Iterator<Item = &Arc<dyn Plugin>> + '_ {
    self.dispatch[phase.index()].iter().map(move |position| &self.plugins[*position])
  }

  pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Plugin>> + '_ {
    self.plugins.iter()
  }

  pub fn get(&self, name: &str) -> Option<&Arc<dyn Plugin>> {
    self.plugins.iter().find(|plugin| plugin.name() == name)
  }

  pub fn names(&self) -> Vec<String> {
    self.plugins.iter().map(|plugin| plugin.name().to_string()).collect()
  }

  pub fn len(&self) -> usize {
    self.plugins.len()
  }

  pub fn is_empty(&self) -> bool {
    self.plugins.is_empty()
  }
}

impl fmt::Debug for PluginSet {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_list().entries(self.names()).finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::phase::PhaseSet;

  struct Named(&'static str, PhaseSet);

  impl Plugin for Named {
    fn name(&self) -> &str {
      self.0
    }

    fn phases(&self) -> PhaseSet {
      self.1
    }
  }

  fn names(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
  }

  #[test]
  fn built_ins_come_first_and_duplicates_are_dropped() {
    let registry = PluginRegistry::with_tiers(names(&["report"]), Vec::new());
    let normalized = registry.normalize(&names(&["spec", "spec", "call", "report"]));
    assert_eq!(normalized, names(&["report", "spec", "call"]));
  }

  #[test]
  fn unknown_plugin_is_a_config_error() {
    let registry = PluginRegistry::with_tiers(Vec::new(), Vec::new());
    let err = registry.load(&names(&["nope"]), &Config::new()).unwrap_err();
    assert_eq!(err.kind, crate::error::ErrorKind::Config);
  }

  #[test]
  fn dispatch_table_follows_declared_phases() {
    let registry = PluginRegistry::with_tiers(names(&["a"]), names(&["b"]));
    registry.register(Arc::new(Named("a", PhaseSet::of(&[Phase::Run]))));
    registry.register(Arc::new(Named("b", PhaseSet::of(&[Phase::Start, Phase::Run]))));
    registry.register(Arc::new(Named("c", PhaseSet::of(&[Phase::End]))));

    let set = registry.load(&names(&["c"]), &Config::new()).unwrap();
    let run: Vec<&str> = set.handlers(Phase::Run).map(|p| p.name()).collect();
    let start: Vec<&str> = set.handlers(Phase::Start).map(|p| p.name()).collect();
    assert_eq!(set.names(), names(&["a", "b", "c"]));
    assert_eq!(run, vec!["a", "b"]);
    assert_eq!(start, vec!["b"]);
    assert_eq!(set.handlers(Phase::Load).count(), 0);
  }
}
