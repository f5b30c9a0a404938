// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use anyhow::anyhow;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tapir::{
  Context, ErrorKind, Phase, PhaseSet, Plugin, PluginRegistry, Request, Response, ReturnPolicy, RunContext,
  Runner, SpecLoader, StartData, StartPatch, TapirError, TapirResult, Task, TaskPatch, TaskReturn, Transport,
};
use tracing::Level;

// --- Helper for Tracing Setup (call once per test run if needed) ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer() // Important for tests to capture output
    .try_init()
    .ok(); // Allow multiple initializations in tests (ok if fails)
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

pub type Log = Arc<Mutex<Vec<String>>>;

pub fn new_log() -> Log {
  Arc::new(Mutex::new(Vec::new()))
}

pub fn names(values: &[&str]) -> Vec<String> {
  values.iter().map(|value| value.to_string()).collect()
}

/// A registry with no tier, holding only `plugins`.
pub fn bare_runner(plugins: Vec<Arc<dyn Plugin>>) -> Runner {
  let registry = PluginRegistry::with_tiers(Vec::new(), Vec::new());
  for plugin in plugins {
    registry.register(plugin);
  }
  Runner::from_registry(registry)
}

pub fn kind_from_str(kind: &str) -> ErrorKind {
  match kind {
    "config" => ErrorKind::Config,
    "specification" => ErrorKind::Specification,
    "test" => ErrorKind::Test,
    "connect" => ErrorKind::Connect,
    "response" => ErrorKind::Response,
    _ => ErrorKind::Bug,
  }
}

// --- Common Test Plugins ---

/// Logs every handler call as `name:phase[:task]`.
pub struct Recorder {
  pub name: &'static str,
  pub log: Log,
}

impl Recorder {
  pub fn new(name: &'static str, log: &Log) -> Arc<dyn Plugin> {
    Arc::new(Self { name, log: log.clone() })
  }
}

#[async_trait]
impl Plugin for Recorder {
  fn name(&self) -> &str {
    self.name
  }

  fn phases(&self) -> PhaseSet {
    PhaseSet::of(&Phase::ALL)
  }

  async fn load(&self, _tasks: &[Task], _ctx: &Context) -> TapirResult<Option<Vec<Task>>> {
    self.log.lock().push(format!("{}:load", self.name));
    Ok(None)
  }

  async fn start(&self, _start_data: &StartData, _ctx: &Context) -> TapirResult<StartPatch> {
    self.log.lock().push(format!("{}:start", self.name));
    Ok(StartPatch::new())
  }

  async fn run(&self, task: &Task, _ctx: &RunContext) -> TapirResult<TaskPatch> {
    self.log.lock().push(format!("{}:run:{}", self.name, task.key));
    Ok(TaskPatch::new())
  }

  async fn complete(&self, task: &Task, _ctx: &Context) -> TapirResult<()> {
    self.log.lock().push(format!("{}:complete:{}", self.name, task.key));
    Ok(())
  }

  async fn end(&self, _tasks: &[Task], _returns: &[TaskReturn], _ctx: &Context) -> TapirResult<()> {
    self.log.lock().push(format!("{}:end", self.name));
    Ok(())
  }
}

/// Reads `task.script`: sleeps `delay` milliseconds, then fails with `fail` (an error
/// kind) if set, or panics if `panic` is true. Otherwise stores `{ done: true }`.
pub struct Scripted;

#[async_trait]
impl Plugin for Scripted {
  fn name(&self) -> &str {
    "script"
  }

  fn phases(&self) -> PhaseSet {
    PhaseSet::of(&[Phase::Run])
  }

  fn return_policy(&self) -> ReturnPolicy {
    ReturnPolicy::Current
  }

  async fn run(&self, task: &Task, _ctx: &RunContext) -> TapirResult<TaskPatch> {
    let Some(script) = task.get("script") else {
      return Ok(TaskPatch::new());
    };
    if let Some(delay) = script.get("delay").and_then(Value::as_u64) {
      tokio::time::sleep(Duration::from_millis(delay)).await;
    }
    if script.get("panic") == Some(&Value::Bool(true)) {
      panic!("script exploded");
    }
    if let Some(kind) = script.get("fail").and_then(Value::as_str) {
      return Err(TapirError::new(kind_from_str(kind), format!("script failed on '{}'", task.key)));
    }
    Ok(TaskPatch::new().set("script", json!({ "done": true })))
  }
}

// --- Collaborators ---

/// Transport answering from a fixed route table. Unknown URLs get a 404, URLs
/// containing `unreachable` fail to connect.
#[derive(Default)]
pub struct MockTransport {
  routes: HashMap<String, (u16, Value, u64)>,
  pub requests: Mutex<Vec<Request>>,
}

impl MockTransport {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn route(mut self, url: &str, status: u16, body: Value) -> Self {
    self.routes.insert(url.to_string(), (status, body, 0));
    self
  }

  pub fn slow_route(mut self, url: &str, status: u16, body: Value, delay_ms: u64) -> Self {
    self.routes.insert(url.to_string(), (status, body, delay_ms));
    self
  }

  pub fn sent(&self) -> Vec<Request> {
    self.requests.lock().clone()
  }
}

#[async_trait]
impl Transport for MockTransport {
  async fn send(&self, request: &Request) -> anyhow::Result<Response> {
    self.requests.lock().push(request.clone());
    if request.url.contains("unreachable") {
      return Err(anyhow!("connection refused"));
    }
    let path = request.url.split('?').next().unwrap_or(&request.url);
    let (status, body, delay) = self.routes.get(path).cloned().unwrap_or((404, Value::Null, 0));
    if delay > 0 {
      tokio::time::sleep(Duration::from_millis(delay)).await;
    }
    let mut headers = serde_json::Map::new();
    headers.insert("Content-Type".to_string(), json!("application/json"));
    Ok(Response { status, headers, body })
  }
}

pub struct StaticSpecLoader(pub Option<Value>);

#[async_trait]
impl SpecLoader for StaticSpecLoader {
  async fn load(&self, _definition: &Value) -> anyhow::Result<Value> {
    self.0.clone().ok_or_else(|| anyhow!("file not found"))
  }
}
