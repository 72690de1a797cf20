/// Stream aggregation benchmarks using Criterion
///
/// Run with: cargo bench --bench aggregate_benchmark
///
/// Benchmarks cover:
/// - Argument fragments for a single tool call
/// - Interleaved fragments across several indices
/// - SSE decoding feeding the aggregator
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use fncall_core::llm::{
    aggregate_stream, decode_chunk_stream, ChatCompletionChunk, ToolCallAccumulator,
};
use fncall_core::FncallError;
use futures_util::stream;
use serde_json::json;

fn fragment(index: u32, first: bool, args: &str) -> ChatCompletionChunk {
    let call = if first {
        json!({"index": index, "id": format!("call_{index}"), "type": "function",
               "function": {"name": "get_weather", "arguments": args}})
    } else {
        json!({"index": index, "function": {"arguments": args}})
    };
    serde_json::from_value(json!({"choices": [{"index": 0, "delta": {"tool_calls": [call]}}]}))
        .unwrap()
}

fn finish() -> ChatCompletionChunk {
    serde_json::from_value(json!({
        "choices": [{"index": 0, "delta": {}, "finish_reason": "tool_calls"}]
    }))
    .unwrap()
}

fn synthetic(calls: u32, fragments_per_call: u32) -> Vec<ChatCompletionChunk> {
    let mut out = Vec::new();
    for i in 0..fragments_per_call {
        for idx in 0..calls {
            out.push(fragment(idx, i == 0, "{\"k\":1}"));
        }
    }
    out.push(finish());
    out
}

/// Accumulator alone, no stream machinery
fn bench_accumulator(c: &mut Criterion) {
    let mut group = c.benchmark_group("accumulator_single_call");

    for fragments in [16u32, 256, 4_096].iter() {
        let chunks = synthetic(1, *fragments);
        group.throughput(Throughput::Elements(chunks.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(fragments), &chunks, |b, chunks| {
            b.iter(|| {
                let mut acc = ToolCallAccumulator::new();
                for chunk in chunks {
                    black_box(acc.apply(chunk));
                }
                black_box(acc.into_records())
            });
        });
    }
    group.finish();
}

/// aggregate_stream over interleaved indices
fn bench_interleaved(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate_interleaved");
    let rt = tokio::runtime::Runtime::new().unwrap();

    for calls in [2u32, 4, 8].iter() {
        let chunks = synthetic(*calls, 128);
        group.throughput(Throughput::Elements(chunks.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x128", calls)),
            &chunks,
            |b, chunks| {
                b.iter(|| {
                    rt.block_on(async {
                        let live = stream::iter(chunks.iter().cloned().map(Ok));
                        let outcome = aggregate_stream(live).await.unwrap();
                        black_box(outcome.tool_calls().map(|m| m.len()))
                    })
                });
            },
        );
    }
    group.finish();
}

/// Raw SSE bytes, decoded and aggregated
fn bench_sse_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("sse_decode_aggregate");
    let rt = tokio::runtime::Runtime::new().unwrap();

    let mut body = String::new();
    for chunk in 0..512 {
        let call = if chunk == 0 {
            json!({"index": 0, "id": "call_0", "type": "function",
                   "function": {"name": "get_weather", "arguments": ""}})
        } else {
            json!({"index": 0, "function": {"arguments": "ab"}})
        };
        let ev = json!({"choices": [{"index": 0, "delta": {"tool_calls": [call]}}]});
        body.push_str(&format!("data: {}\n\n", ev));
    }
    let finish = json!({"choices": [{"index": 0, "delta": {}, "finish_reason": "tool_calls"}]});
    body.push_str(&format!("data: {}\n\n", finish));
    body.push_str("data: [DONE]\n\n");
    let bytes = body.into_bytes();

    for read_size in [64usize, 1_024, 16_384].iter() {
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(read_size), read_size, |b, &size| {
            b.iter(|| {
                rt.block_on(async {
                    let reads: Vec<Result<Vec<u8>, FncallError>> =
                        bytes.chunks(size).map(|c| Ok(c.to_vec())).collect();
                    let chunks = decode_chunk_stream(stream::iter(reads));
                    let outcome = aggregate_stream(chunks).await.unwrap();
                    black_box(outcome.tool_calls().map(|m| m[&0].function.arguments.len()))
                })
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_accumulator, bench_interleaved, bench_sse_pipeline);
criterion_main!(benches);
