use async_trait::async_trait;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::{json, Value};
use std::sync::Arc;
use tapir::report::OrderedBuffer;
use tapir::{evaluate, Config, Request, Response, Runner, TemplateVars, Transport};
use tokio::runtime::Runtime; // To run async code within Criterion

// --- Helper: Transport answering every request immediately ---
struct EchoTransport;

#[async_trait]
impl Transport for EchoTransport {
  async fn send(&self, request: &Request) -> anyhow::Result<Response> {
    Ok(Response {
      status: 200,
      headers: serde_json::Map::new(),
      body: json!({ "url": request.url }),
    })
  }
}

// Nested data with `width` templated leaves per level.
fn templated_document(width: usize) -> Value {
  let leaves: serde_json::Map<String, Value> = (0..width)
    .map(|i| (format!("field_{}", i), json!(format!("$$base/items/$$user.ids[{}]", i % 4))))
    .collect();
  json!({ "call": { "url": "$$base/users", "body": leaves.clone() }, "nested": [leaves.clone(), leaves] })
}

fn bench_template_evaluation(c: &mut Criterion) {
  let mut group = c.benchmark_group("TemplateEvaluation");
  let rt = Runtime::new().unwrap();
  let vars = TemplateVars::new()
    .with("base", json!("http://localhost"))
    .with("user", json!({ "ids": [1, 2, 3, 4] }));

  for width in [1, 10, 100].iter() {
    let document = templated_document(*width);
    group.throughput(Throughput::Elements(*width as u64 * 3));
    group.bench_with_input(BenchmarkId::from_parameter(width), &document, |b, document| {
      b.to_async(&rt).iter(|| async { evaluate(document, &vars).await.unwrap() });
    });
  }
  group.finish();
}

fn bench_full_run(c: &mut Criterion) {
  let mut group = c.benchmark_group("FullRun");
  let rt = Runtime::new().unwrap();
  let runner = Arc::new(Runner::builder().transport(Arc::new(EchoTransport)).build());

  for num_tasks in [1, 10, 100].iter() {
    let mut builder = Config::builder().set("template", json!({ "base": "http://localhost" }));
    for i in 0..*num_tasks {
      builder = builder.task(
        format!("task_{}", i),
        json!({
          "call": { "url": format!("$$base/pets/{}", i) },
          "validate": { "status": 200, "body": { "type": "object", "required": ["url"] } },
        }),
      );
    }
    let config = builder.build();

    group.throughput(Throughput::Elements(*num_tasks as u64));
    group.bench_with_input(BenchmarkId::from_parameter(num_tasks), &config, |b, config| {
      b.to_async(&rt).iter_batched(
        || config.clone(),
        |config| {
          let runner = runner.clone();
          async move { runner.run(config).await.unwrap() }
        },
        criterion::BatchSize::SmallInput,
      );
    });
  }
  group.finish();
}

fn bench_ordered_buffer(c: &mut Criterion) {
  let mut group = c.benchmark_group("OrderedBuffer");

  for num_keys in [10, 1000].iter() {
    let keys: Vec<String> = (0..*num_keys).map(|i| format!("task_{}", i)).collect();
    group.throughput(Throughput::Elements(*num_keys as u64));
    group.bench_with_input(BenchmarkId::new("reverse_order", num_keys), &keys, |b, keys| {
      b.iter(|| {
        let mut buffer = OrderedBuffer::new(keys.clone());
        let mut released = 0;
        for (position, key) in keys.iter().enumerate().rev() {
          released += buffer.record(key, position).unwrap().len();
        }
        criterion::black_box(released);
      })
    });
  }
  group.finish();
}

criterion_group!(benches, bench_template_evaluation, bench_full_run, bench_ordered_buffer);
criterion_main!(benches);
