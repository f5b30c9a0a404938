// tapir/src/pipeline/execution.rs

//! Contains [`Runner`], the entry point of a run: it loads plugins, then drives
//! `load`, `start`, every task's `run` and `complete`, and `end`.

use crate::aggregate::aggregate;
use crate::collab::{JsonSchemaValidator, SchemaValidator, SpecLoader, Transport};
use crate::core::config::Config;
use crate::core::task::{Task, TaskReturn};
use crate::error::{RunError, TapirError};
use crate::pipeline::phases;
use crate::pipeline::task::TaskRunner;
use crate::plugin::{Context, Plugin, PluginRegistry};
use crate::plugins::{
  AliasPlugin, CallPlugin, EachPlugin, GlobPlugin, OnlyPlugin, RepeatPlugin, ReportPlugin, SkipPlugin, SpecPlugin,
  TemplatePlugin, ValidatePlugin, VerifyPlugin,
};
use crate::report::Reporter;
use std::sync::Arc;
use tracing::{event, instrument, Level};

/// Runs configurations against a registry of plugins.
///
/// A `Runner` holds no per-run state and can execute several configurations,
/// including concurrently.
#[derive(Debug)]
pub struct Runner {
  registry: PluginRegistry,
}

impl Runner {
  pub fn builder() -> RunnerBuilder {
    RunnerBuilder::default()
  }

  /// Uses `registry` as is. No built-in plugin is registered.
  pub fn from_registry(registry: PluginRegistry) -> Self {
    Self { registry }
  }

  pub fn registry(&self) -> &PluginRegistry {
    &self.registry
  }

  /// Executes `config` and returns the result of each task in declaration order.
  ///
  /// Fails with a single [`RunError`] when a run-wide phase fails or when any task
  /// failed. In the latter case every task still ran and was reported.
  #[instrument(name = "Runner::run", skip_all, err(Display))]
  pub async fn run(&self, config: Config) -> Result<Vec<TaskReturn>, RunError> {
    let requested = config.plugin_names().map_err(|err| RunError::fatal(err, &[]))?;
    let plugins = self
      .registry
      .load(&requested, &config)
      .map_err(|err| RunError::fatal(err, &self.registry.normalize(&requested)))?;
    let plugin_names = plugins.names();
    let fatal = |err: TapirError| {
      event!(Level::ERROR, error = %err, "Run aborted.");
      RunError::fatal(err, &plugin_names)
    };

    let ctx = Context::new(Arc::new(config), Arc::new(plugins));
    let tasks = ctx.config().tasks().map_err(&fatal)?;
    let tasks = phases::load(tasks, &ctx).await.map_err(&fatal)?;

    let task_keys = tasks.iter().map(|task| task.key.clone()).collect();
    let ctx = phases::start(ctx.with_task_keys(task_keys)).await.map_err(&fatal)?;

    let runner = Arc::new(TaskRunner::new(ctx.clone(), tasks));
    let outcomes = runner.run_all().await.map_err(&fatal)?;
    let (tasks, returns): (Vec<Task>, Vec<TaskReturn>) = outcomes.into_iter().unzip();

    phases::end(&tasks, &returns, &ctx).await.map_err(&fatal)?;

    match aggregate(&tasks, &plugin_names) {
      Some(err) => {
        event!(Level::INFO, failures = err.errors.len(), "Run finished with failures.");
        Err(err)
      }
      None => {
        event!(Level::INFO, num_tasks = returns.len(), "Run finished.");
        Ok(returns)
      }
    }
  }
}

/// Assembles a [`Runner`] with the built-in plugins and their collaborators.
#[derive(Default)]
pub struct RunnerBuilder {
  reporters: Vec<Arc<dyn Reporter>>,
  transport: Option<Arc<dyn Transport>>,
  spec_loader: Option<Arc<dyn SpecLoader>>,
  validator: Option<Arc<dyn SchemaValidator>>,
  plugins: Vec<Arc<dyn Plugin>>,
}

impl RunnerBuilder {
  pub fn reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
    self.reporters.push(reporter);
    self
  }

  pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
    self.transport = Some(transport);
    self
  }

  pub fn spec_loader(mut self, spec_loader: Arc<dyn SpecLoader>) -> Self {
    self.spec_loader = Some(spec_loader);
    self
  }

  /// Replaces the default `jsonschema`-backed validator.
  pub fn validator(mut self, validator: Arc<dyn SchemaValidator>) -> Self {
    self.validator = Some(validator);
    self
  }

  /// Registers a user plugin. It runs only when named in `config.plugins`, unless
  /// it replaces a built-in of the same name.
  pub fn plugin(mut self, plugin: Arc<dyn Plugin>) -> Self {
    self.plugins.push(plugin);
    self
  }

  pub fn build(self) -> Runner {
    let validator = self.validator.unwrap_or_else(|| Arc::new(JsonSchemaValidator));
    let registry = PluginRegistry::new().with_validator(Arc::clone(&validator));

    registry.register(Arc::new(EachPlugin));
    registry.register(Arc::new(GlobPlugin));
    registry.register(Arc::new(OnlyPlugin));
    registry.register(Arc::new(SkipPlugin));
    registry.register(Arc::new(RepeatPlugin));
    registry.register(Arc::new(AliasPlugin));
    registry.register(Arc::new(TemplatePlugin));
    registry.register(Arc::new(VerifyPlugin::new(Arc::clone(&validator))));
    registry.register(Arc::new(ReportPlugin::new(self.reporters)));
    registry.register(Arc::new(SpecPlugin::new(self.spec_loader)));
    registry.register(Arc::new(CallPlugin::new(self.transport)));
    registry.register(Arc::new(ValidatePlugin::new(validator)));

    for plugin in self.plugins {
      registry.register(plugin);
    }
    Runner { registry }
  }
}
