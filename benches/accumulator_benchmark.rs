//! Performance benchmarks for part accumulation and SSE parsing
//!
//! Measures folding long event runs into parts and parsing the framed
//! stream they arrive in.
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::json;
use threadline::accumulator::{accumulate, PartAccumulator};
use threadline::events::{RunEventKind, ToolCallPayload, ToolResultPayload};
use threadline::sse::SseParser;

/// Generate a reply of `deltas` text fragments with a tool call every 50
fn generate_events(deltas: usize) -> Vec<RunEventKind> {
    let mut events = Vec::with_capacity(deltas + deltas / 25);
    for i in 0..deltas {
        if i > 0 && i % 50 == 0 {
            let id = format!("tc{}", i);
            events.push(RunEventKind::ToolCall {
                message_id: "m1".to_string(),
                tool_call: ToolCallPayload {
                    id: id.clone(),
                    name: "get_holdings".to_string(),
                    arguments: json!({"account": "main"}),
                },
            });
            events.push(RunEventKind::ToolResult {
                message_id: "m1".to_string(),
                tool_result: ToolResultPayload {
                    tool_call_id: id,
                    success: true,
                    data: Some(json!({"holdings": [{"ticker": "AAPL", "shares": 10}]})),
                    error: None,
                    meta: None,
                },
            });
        }
        events.push(RunEventKind::TextDelta {
            message_id: "m1".to_string(),
            delta: format!("token{} ", i),
        });
    }
    events
}

/// Frame events the way the backend sends them
fn generate_sse_body(deltas: usize) -> String {
    (0..deltas)
        .map(|i| {
            format!(
                "event: text_delta\ndata: {{\"thread_id\":\"t1\",\"run_id\":\"r1\",\"message_id\":\"m1\",\"delta\":\"token{} \"}}\n\n",
                i
            )
        })
        .collect()
}

/// Benchmark folding a whole event run into parts
fn bench_accumulate(c: &mut Criterion) {
    let mut group = c.benchmark_group("accumulate");

    for size in [100, 1_000, 10_000].iter() {
        let events = generate_events(*size);
        group.throughput(Throughput::Elements(events.len() as u64));

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_deltas", size)),
            &events,
            |b, events| {
                b.iter(|| {
                    let parts = accumulate(black_box(events.iter()));
                    black_box(parts)
                });
            },
        );
    }

    group.finish();
}

/// Benchmark applying events one by one into a live part list
fn bench_apply_incremental(c: &mut Criterion) {
    let events = generate_events(1_000);

    c.bench_function("apply_incremental_1000", |b| {
        b.iter(|| {
            let mut parts = Vec::new();
            let mut accumulator = PartAccumulator::new();
            for event in &events {
                black_box(accumulator.apply(&mut parts, event));
            }
            black_box(parts)
        });
    });
}

/// Benchmark SSE line parsing into run events
fn bench_sse_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("sse_parse");

    for size in [100, 1_000].iter() {
        let body = generate_sse_body(*size);
        group.throughput(Throughput::Bytes(body.len() as u64));

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_events", size)),
            &body,
            |b, body| {
                b.iter(|| {
                    let mut parser = SseParser::new();
                    let mut count = 0usize;
                    for line in body.lines() {
                        if let Ok(Some(_event)) = parser.feed_line(line) {
                            count += 1;
                        }
                    }
                    black_box(count)
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_accumulate,
    bench_apply_incremental,
    bench_sse_parse
);
criterion_main!(benches);
