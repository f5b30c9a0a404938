// tests/reporter_tests.rs
mod common;

use async_trait::async_trait;
use common::*;
use serde_json::json;
use serial_test::serial;
use std::sync::Arc;
use tapir::report::ReportEvent;
use tapir::{
  Config, Context, ErrorKind, MemoryReporter, Phase, PhaseSet, Plugin, ReportEntry, Reporter, ResultType, Runner,
  TapirError, TapirResult, Task,
};

fn runner_with(reporter: &Arc<MemoryReporter>, transport: MockTransport) -> Runner {
  Runner::builder()
    .reporter(reporter.clone())
    .transport(Arc::new(transport))
    .build()
}

#[tokio::test]
#[serial]
async fn reports_follow_declaration_order_whatever_the_finish_order() {
  setup_tracing();
  let reporter = Arc::new(MemoryReporter::new());
  let transport = MockTransport::new()
    .slow_route("/slow", 200, json!({}), 60)
    .slow_route("/medium", 200, json!({}), 30)
    .route("/fast", 200, json!({}));
  let config = Config::builder()
    .task("slow", json!({ "call": { "url": "/slow" } }))
    .task("medium", json!({ "call": { "url": "/medium" } }))
    .task("fast", json!({ "call": { "url": "/fast" } }))
    .build();

  runner_with(&reporter, transport).run(config).await.unwrap();

  let completed: Vec<String> = reporter.completed().into_iter().map(|entry| entry.key).collect();
  assert_eq!(completed, names(&["slow", "medium", "fast"]));
  assert_eq!(reporter.ticks(), names(&["fast", "medium", "slow"]));

  let events = reporter.events();
  assert_eq!(events.first(), Some(&ReportEvent::Start(names(&["slow", "medium", "fast"]))));
  assert!(matches!(events.last(), Some(ReportEvent::End(summary)) if summary.total == 3 && summary.pass == 3));

  // Nothing is released before the first declared task finished.
  let first_complete = events
    .iter()
    .position(|event| matches!(event, ReportEvent::Complete(_)))
    .unwrap();
  assert_eq!(events[first_complete - 1], ReportEvent::Tick("slow".to_string()));
}

#[tokio::test]
#[serial]
async fn titles_come_from_plugin_report_hooks() {
  setup_tracing();
  let reporter = Arc::new(MemoryReporter::new());
  let transport = MockTransport::new().route("/pets", 200, json!([]));
  let config = Config::builder()
    .task("getPets", json!({ "call": { "method": "get", "url": "/pets?limit=2" } }))
    .build();

  runner_with(&reporter, transport).run(config).await.unwrap();

  let entry = &reporter.completed()[0];
  assert_eq!(entry.title, "GET /pets (200)");
  assert_eq!(entry.result, ResultType::Pass);
  assert!(!entry.nested);
}

#[tokio::test]
#[serial]
async fn failed_sub_task_is_reported_after_its_parent() {
  setup_tracing();
  let reporter = Arc::new(MemoryReporter::new());
  let transport = MockTransport::new().route("/profile", 200, json!({}));
  let config = Config::builder()
    .task("login", json!({ "alias": "login", "call": { "url": "http://unreachable/login" } }))
    .task(
      "profile",
      json!({
        "call": {
          "url": "/profile",
          "headers": { "authorization": "Bearer $$login.call.response.body.token" },
        },
      }),
    )
    .build();

  let err = runner_with(&reporter, transport).run(config).await.unwrap_err();
  assert_eq!(err.kind, ErrorKind::Connect);

  let entries = reporter.completed();
  let keys: Vec<(&str, bool)> = entries.iter().map(|entry| (entry.key.as_str(), entry.nested)).collect();
  assert_eq!(keys, vec![("login", false), ("profile", false), ("login", true)]);
  assert!(entries.iter().all(|entry| entry.result == ResultType::Fail));

  let profile_error = entries[1].error.as_ref().unwrap();
  assert!(profile_error.message.starts_with("Task 'login' failed: "));

  let summary = reporter.summary().unwrap();
  assert_eq!((summary.total, summary.fail), (2, 2));
}

#[tokio::test]
#[serial]
async fn skipped_tasks_are_reported_as_skipped() {
  setup_tracing();
  let reporter = Arc::new(MemoryReporter::new());
  let transport = MockTransport::new().route("/a", 200, json!({}));
  let config = Config::builder()
    .set("skip", json!("b*"))
    .task("a", json!({ "call": { "url": "/a" } }))
    .task("b1", json!({ "call": { "url": "/b1" } }))
    .task("c", json!({ "skip": true, "call": { "url": "/c" } }))
    .build();

  let runner = Runner::builder().reporter(reporter.clone()).transport(Arc::new(transport)).build();
  runner.run(config).await.unwrap();

  let results: Vec<ResultType> = reporter.completed().into_iter().map(|entry| entry.result).collect();
  assert_eq!(results, vec![ResultType::Pass, ResultType::Skip, ResultType::Skip]);
  let summary = reporter.summary().unwrap();
  assert_eq!((summary.pass, summary.skip, summary.fail), (1, 2, 0));
  assert!(summary.is_success());
}

/// Reporter failing on one task key, either in `tick` or in `complete`.
struct FailingReporter {
  key: &'static str,
  on_tick: bool,
}

#[async_trait]
impl Reporter for FailingReporter {
  fn name(&self) -> &str {
    "failing"
  }

  async fn tick(&self, entry: &ReportEntry) -> TapirResult<()> {
    if self.on_tick && entry.key == self.key {
      return Err(TapirError::bug(format!("tick crashed on '{}'", entry.key)));
    }
    Ok(())
  }

  async fn complete(&self, entry: &ReportEntry) -> TapirResult<()> {
    if !self.on_tick && entry.key == self.key {
      return Err(TapirError::bug(format!("complete crashed on '{}'", entry.key)));
    }
    Ok(())
  }
}

fn slow_first_config() -> Config {
  Config::builder()
    .plugin("script")
    .task("a", json!({ "script": { "delay": 80 } }))
    .task("b", json!({ "script": {} }))
    .task("c", json!({ "script": {} }))
    .build()
}

fn failing_runner(failing: FailingReporter, memory: &Arc<MemoryReporter>) -> Runner {
  Runner::builder()
    .reporter(Arc::new(failing))
    .reporter(memory.clone())
    .plugin(Arc::new(Scripted))
    .build()
}

fn completed_keys(memory: &MemoryReporter) -> Vec<String> {
  memory.completed().into_iter().map(|entry| entry.key).collect()
}

#[tokio::test]
#[serial]
async fn reporter_complete_failure_does_not_drop_buffered_siblings() {
  setup_tracing();
  let memory = Arc::new(MemoryReporter::new());
  let runner = failing_runner(FailingReporter { key: "a", on_tick: false }, &memory);

  let err = runner.run(slow_first_config()).await.unwrap_err();

  assert_eq!(completed_keys(&memory), names(&["a", "b", "c"]));
  assert_eq!(err.kind, ErrorKind::Bug);
  assert_eq!(err.errors.len(), 1);
  assert_eq!(err.errors[0].task.as_deref(), Some("a"));
  assert_eq!(err.errors[0].plugin.as_deref(), Some("report"));
  assert_eq!(memory.summary().map(|summary| summary.total), Some(3));
}

#[tokio::test]
#[serial]
async fn reporter_tick_failure_keeps_every_task_reported() {
  setup_tracing();
  let memory = Arc::new(MemoryReporter::new());
  let runner = failing_runner(FailingReporter { key: "b", on_tick: true }, &memory);

  let err = runner.run(slow_first_config()).await.unwrap_err();

  assert_eq!(memory.ticks().len(), 3);
  assert_eq!(completed_keys(&memory), names(&["a", "b", "c"]));
  assert_eq!(err.errors.len(), 1);
  assert_eq!(err.errors[0].task.as_deref(), Some("b"));
  assert!(err.message.contains("tick crashed on 'b'"));
}

/// Fails the `complete` phase of the tasks it is configured for.
struct BrokenCompletion;

#[async_trait]
impl Plugin for BrokenCompletion {
  fn name(&self) -> &str {
    "broken"
  }

  fn phases(&self) -> PhaseSet {
    PhaseSet::of(&[Phase::Complete])
  }

  async fn complete(&self, task: &Task, _ctx: &Context) -> TapirResult<()> {
    if task.get("broken").is_some() {
      return Err(TapirError::bug(format!("cannot complete '{}'", task.key)));
    }
    Ok(())
  }
}

#[tokio::test]
#[serial]
async fn complete_handler_failure_on_the_first_task_keeps_siblings_reported() {
  setup_tracing();
  let memory = Arc::new(MemoryReporter::new());
  let runner = Runner::builder()
    .reporter(memory.clone())
    .plugin(Arc::new(Scripted))
    .plugin(Arc::new(BrokenCompletion))
    .build();
  let config = Config::builder()
    .plugin("script")
    .plugin("broken")
    .task("a", json!({ "script": { "delay": 80 }, "broken": true }))
    .task("b", json!({ "script": {} }))
    .task("c", json!({ "script": {} }))
    .build();

  let err = runner.run(config).await.unwrap_err();

  assert_eq!(completed_keys(&memory), names(&["a", "b", "c"]));
  assert_eq!(err.errors.len(), 1);
  assert_eq!(err.errors[0].task.as_deref(), Some("a"));
  assert_eq!(err.errors[0].plugin.as_deref(), Some("broken"));
}
