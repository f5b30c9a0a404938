// tapir/src/plugins/verify.rs

use crate::collab::SchemaValidator;
use crate::core::phase::{Phase, PhaseSet};
use crate::core::task::{Task, TaskPatch};
use crate::error::TapirResult;
use crate::plugin::verify::verify_task_config;
use crate::plugin::{Plugin, RunContext};
use async_trait::async_trait;
use std::sync::Arc;

/// Validates each `task.<plugin>` section against that plugin's task schema.
///
/// Runs after `template`, so it checks evaluated data.
pub struct VerifyPlugin {
  validator: Arc<dyn SchemaValidator>,
}

impl VerifyPlugin {
  pub fn new(validator: Arc<dyn SchemaValidator>) -> Self {
    Self { validator }
  }
}

#[async_trait]
impl Plugin for VerifyPlugin {
  fn name(&self) -> &str {
    "verify"
  }

  fn phases(&self) -> PhaseSet {
    PhaseSet::NONE.with(Phase::Run)
  }

  async fn run(&self, task: &Task, ctx: &RunContext) -> TapirResult<TaskPatch> {
    for plugin in ctx.plugins().iter() {
      verify_task_config(plugin.as_ref(), task, self.validator.as_ref())?;
    }
    Ok(TaskPatch::new())
  }
}
