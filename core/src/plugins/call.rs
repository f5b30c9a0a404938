// tapir/src/plugins/call.rs

use crate::collab::{Request, Transport};
use crate::core::phase::{Phase, PhaseSet};
use crate::core::task::{Task, TaskPatch};
use crate::error::{TapirError, TapirResult};
use crate::plugin::{ConfigSchema, Context, Plugin, ReportProps, ReturnPolicy, RunContext};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{event, Level};

/// Sends `task.call` through the injected [`Transport`] and stores the response at
/// `task.call.response`.
pub struct CallPlugin {
  transport: Option<Arc<dyn Transport>>,
}

impl CallPlugin {
  pub fn new(transport: Option<Arc<dyn Transport>>) -> Self {
    Self { transport }
  }
}

#[async_trait]
impl Plugin for CallPlugin {
  fn name(&self) -> &str {
    "call"
  }

  fn phases(&self) -> PhaseSet {
    PhaseSet::NONE.with(Phase::Run)
  }

  fn config_schema(&self) -> ConfigSchema {
    ConfigSchema {
      general: None,
      task: Some(json!({
        "type": "object",
        "required": ["url"],
        "properties": {
          "method": { "type": "string" },
          "url": { "type": "string" },
          "headers": { "type": "object" },
          "query": { "type": "object" },
        },
      })),
    }
  }

  fn return_policy(&self) -> ReturnPolicy {
    ReturnPolicy::Current
  }

  async fn run(&self, task: &Task, _ctx: &RunContext) -> TapirResult<TaskPatch> {
    let Some(call) = task.get("call") else {
      return Ok(TaskPatch::new());
    };
    let transport = self.transport.as_ref().ok_or_else(|| {
      TapirError::config("Task has a 'call' section but no transport is configured")
        .with_property("property", "task.call")
    })?;

    let mut definition = call.clone();
    if let Value::Object(map) = &mut definition {
      map.remove("response");
    }
    let request: Request = serde_json::from_value(definition).map_err(|err| {
      TapirError::config(format!("'task.call' is not a valid request: {}", err)).with_property("property", "task.call")
    })?;

    event!(Level::DEBUG, task = %task.key, method = %request.method, url = %request.url, "Sending request.");
    let response = transport.send(&request).await.map_err(|err| {
      TapirError::connect(format!(
        "Could not send {} {}: {:#}",
        request.method.to_uppercase(),
        request.url,
        err
      ))
      .with_property("property", "task.call")
      .with_property("url", request.url.clone())
    })?;

    let mut section = serde_json::to_value(&request)
      .map_err(|err| TapirError::bug(format!("Request could not be serialized: {}", err)))?;
    let response = serde_json::to_value(&response)
      .map_err(|err| TapirError::bug(format!("Response could not be serialized: {}", err)))?;
    if let Value::Object(map) = &mut section {
      map.insert("response".to_string(), response);
    }
    Ok(TaskPatch::new().set("call", section))
  }

  fn report(&self, task: &Task, _ctx: &Context) -> Option<ReportProps> {
    let call = task.get("call")?;
    let mut parts = Vec::new();

    if let Some(url) = call.get("url").and_then(Value::as_str) {
      let method = call.get("method").and_then(Value::as_str).unwrap_or("GET");
      let url = url.split('?').next().unwrap_or(url);
      parts.push(format!("{} {}", method.to_uppercase(), url));
    }
    if let Some(status) = call.get("response").and_then(|response| response.get("status")) {
      parts.push(format!("({})", status));
    }
    if parts.is_empty() {
      return None;
    }
    Some(ReportProps::title(parts.join(" ")))
  }
}
