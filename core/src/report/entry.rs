// tapir/src/report/entry.rs

//! What reporters receive about a task.

use crate::core::task::{ResultType, Task};
use crate::error::ErrorRecord;
use crate::plugin::Context;
use serde::Serialize;
use serde_json::{Map, Value};

/// Report of one task, or of one sub-task reached through `error.nested`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
  pub key: String,
  /// Non-empty plugin titles joined with a space, e.g. `GET /pets (200)`.
  pub title: String,
  pub result: ResultType,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<ErrorRecord>,
  /// Report properties per plugin name.
  pub props: Map<String, Value>,
  pub nested: bool,
}

impl ReportEntry {
  pub fn from_task(task: &Task, ctx: &Context, nested: bool) -> Self {
    let mut titles = Vec::new();
    let mut props = Map::new();
    for plugin in ctx.plugins().iter() {
      let Some(report) = plugin.report(task, ctx) else {
        continue;
      };
      if let Some(title) = report.title.filter(|title| !title.is_empty()) {
        titles.push(title);
      }
      if !report.props.is_empty() {
        props.insert(plugin.name().to_string(), Value::Object(report.props));
      }
    }

    Self {
      key: task.key.clone(),
      title: titles.join(" "),
      result: task.result_type(),
      error: task.error.as_ref().map(|err| {
        let mut record = err.to_record();
        record.task.get_or_insert_with(|| task.key.clone());
        record.nested = nested;
        record
      }),
      props,
      nested,
    }
  }
}

/// The entry of `task` followed by one entry per link of its `error.nested` chain.
pub fn entries(task: &Task, ctx: &Context) -> Vec<ReportEntry> {
  let mut entries = vec![ReportEntry::from_task(task, ctx, false)];
  let mut current = task.error.as_ref().and_then(|err| err.nested.as_deref());
  while let Some(nested) = current {
    entries.push(ReportEntry::from_task(nested, ctx, true));
    current = nested.error.as_ref().and_then(|err| err.nested.as_deref());
  }
  entries
}

/// Counts sent to reporters at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
  pub total: usize,
  pub pass: usize,
  pub fail: usize,
  pub skip: usize,
}

impl ReportSummary {
  pub fn from_tasks(tasks: &[Task]) -> Self {
    tasks.iter().fold(ReportSummary::default(), |mut summary, task| {
      summary.total += 1;
      match task.result_type() {
        ResultType::Pass => summary.pass += 1,
        ResultType::Fail => summary.fail += 1,
        ResultType::Skip => summary.skip += 1,
      }
      summary
    })
  }

  pub fn is_success(&self) -> bool {
    self.fail == 0
  }
}
