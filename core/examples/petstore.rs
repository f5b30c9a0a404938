// tapir/examples/petstore.rs

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tapir::{Config, ReportEntry, ReportSummary, Reporter, Request, Response, Runner, TapirResult, Transport};
use tracing::info;

// 1. An in-process API standing in for a real HTTP transport.
struct PetStore;

#[async_trait]
impl Transport for PetStore {
  async fn send(&self, request: &Request) -> anyhow::Result<Response> {
    let (status, body) = match (request.method.to_uppercase().as_str(), request.url.as_str()) {
      ("POST", "/login") => (200, json!({ "token": "s3cr3t" })),
      ("GET", "/pets") => {
        let authorized = request.headers.get("authorization") == Some(&json!("Bearer s3cr3t"));
        if authorized {
          (200, json!([{ "id": 1, "name": "rex" }]))
        } else {
          (401, Value::Null)
        }
      }
      _ => (404, Value::Null),
    };
    Ok(Response {
      status,
      headers: serde_json::Map::new(),
      body,
    })
  }
}

// 2. A reporter printing one line per task, in declaration order.
struct ConsoleReporter;

#[async_trait]
impl Reporter for ConsoleReporter {
  fn name(&self) -> &str {
    "console"
  }

  async fn complete(&self, entry: &ReportEntry) -> TapirResult<()> {
    let indent = if entry.nested { "    " } else { "" };
    match &entry.error {
      None => info!("{}{:?} {} {}", indent, entry.result, entry.key, entry.title),
      Some(err) => info!("{}{:?} {} {}: {}", indent, entry.result, entry.key, entry.title, err.message),
    }
    Ok(())
  }

  async fn end(&self, summary: &ReportSummary) -> TapirResult<()> {
    info!("{} tasks: {} passed, {} failed, {} skipped", summary.total, summary.pass, summary.fail, summary.skip);
    Ok(())
  }
}

#[tokio::main]
async fn main() {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  info!("--- Petstore Example ---");

  // 3. Tasks are data. `login` is aliased so `listPets` can reuse its token.
  let config = Config::builder()
    .set("each", json!({ "validate": { "status": 200 } }))
    .task("login", json!({ "alias": "login", "call": { "method": "post", "url": "/login" } }))
    .task(
      "listPets",
      json!({
        "call": {
          "url": "/pets",
          "headers": { "authorization": "Bearer $$login.call.response.body.token" },
        },
        "validate": { "body": { "type": "array", "minItems": 1 } },
      }),
    )
    .task("missing", json!({ "call": { "url": "/owners" } }))
    .build();

  // 4. Run it.
  let runner = Runner::builder()
    .transport(Arc::new(PetStore))
    .reporter(Arc::new(ConsoleReporter))
    .build();

  match runner.run(config).await {
    Ok(returns) => info!("All {} tasks passed.", returns.len()),
    Err(err) => {
      info!("Run failed ({}): {}", err.kind, err.message);
      for record in &err.errors {
        info!("  - [{}] {:?}: {}", record.kind, record.task, record.message);
      }
    }
  }
}
