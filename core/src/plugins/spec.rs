// tapir/src/plugins/spec.rs

use crate::collab::SpecLoader;
use crate::core::phase::{Phase, PhaseSet};
use crate::core::start_data::{StartData, StartPatch};
use crate::error::{TapirError, TapirResult};
use crate::plugin::{ConfigSchema, Context, Plugin, ReturnPolicy};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{event, Level};

/// Loads the API specification named by `config.spec` into `StartData["spec"]`.
pub struct SpecPlugin {
  loader: Option<Arc<dyn SpecLoader>>,
}

impl SpecPlugin {
  pub fn new(loader: Option<Arc<dyn SpecLoader>>) -> Self {
    Self { loader }
  }
}

#[async_trait]
impl Plugin for SpecPlugin {
  fn name(&self) -> &str {
    "spec"
  }

  fn phases(&self) -> PhaseSet {
    PhaseSet::NONE.with(Phase::Start)
  }

  fn config_schema(&self) -> ConfigSchema {
    ConfigSchema {
      general: Some(json!({ "type": ["string", "object"] })),
      task: None,
    }
  }

  fn return_policy(&self) -> ReturnPolicy {
    ReturnPolicy::Never
  }

  async fn start(&self, _start_data: &StartData, ctx: &Context) -> TapirResult<StartPatch> {
    let definition = match ctx.config().get("spec") {
      None | Some(Value::Null) => return Ok(StartPatch::new()),
      Some(definition) => definition,
    };
    let loader = self.loader.as_ref().ok_or_else(|| {
      TapirError::config("'config.spec' is set but no specification loader is configured")
        .with_property("property", "config.spec")
    })?;

    let spec = loader.load(definition).await.map_err(|err| {
      TapirError::specification(format!("OpenAPI specification could not be loaded: {:#}", err))
        .with_property("property", "config.spec")
    })?;
    event!(Level::DEBUG, "API specification loaded.");
    Ok(StartPatch::new().value("spec", spec))
  }
}
