// tapir/src/aggregate.rs

//! Error aggregation: turns the failed tasks of a run into one [`RunError`].

use crate::core::task::Task;
use crate::error::{ErrorKind, ErrorRecord, RunError};

/// Every failure of `tasks`, in declaration order, each task's `error.nested`
/// chain walked link by link.
pub fn collect_errors(tasks: &[Task]) -> Vec<ErrorRecord> {
  let mut records = Vec::new();
  for task in tasks {
    let mut current = Some(task);
    let mut nested = false;
    while let Some(link) = current {
      let Some(err) = &link.error else {
        break;
      };
      let mut record = err.to_record();
      if record.task.is_none() {
        record.task = Some(link.key.clone());
      }
      record.nested = nested;
      records.push(record);

      current = err.nested.as_deref();
      nested = true;
    }
  }
  records
}

/// `None` when no task failed. Otherwise the aggregate takes its kind and message
/// from the first failure of the highest-priority kind present, and lists every
/// failure.
pub fn aggregate(tasks: &[Task], plugins: &[String]) -> Option<RunError> {
  let errors = collect_errors(tasks);
  let first = errors.first()?;

  let top = ErrorKind::PRIORITY
    .iter()
    .find_map(|kind| errors.iter().find(|record| record.kind == *kind));
  let (kind, message) = match top {
    Some(record) => (record.kind, record.message.clone()),
    None => (ErrorKind::Bug, first.message.clone()),
  };

  Some(RunError {
    kind,
    message,
    errors,
    plugins: plugins.to_vec(),
  })
}
