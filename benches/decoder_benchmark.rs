//! Performance benchmarks for SSE decoding
//!
//! Measures decoder throughput for different chunk sizes, plus the cost of
//! routing decoded frames into a session.
//! Run with: cargo bench

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tarot_stream::reading::Session;
use tarot_stream::sse::SseDecoder;

/// Generate a reading stream with `events` interpretation chunks
fn generate_stream(events: usize) -> Vec<u8> {
    let mut stream = String::from("event: connected\ndata: {}\n\nevent: interpretation_start\ndata: \n\n");
    for i in 0..events {
        stream.push_str(&format!(
            "id: {}\nevent: interpretation_chunk\ndata: {{\"content\":\"The tower falls and the ground clears, {} \"}}\n\n",
            i, i
        ));
        if i % 50 == 0 {
            stream.push_str(": keepalive\n\n");
        }
    }
    stream.push_str("event: complete\ndata: {}\n\n");
    stream.into_bytes()
}

/// Benchmark decoding with different network chunk sizes
fn bench_decode_chunked(c: &mut Criterion) {
    let stream = generate_stream(1_000);
    let mut group = c.benchmark_group("sse_decode");
    group.throughput(Throughput::Bytes(stream.len() as u64));

    for chunk_size in [16usize, 256, 4096, 65536].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(chunk_size),
            chunk_size,
            |b, &chunk_size| {
                b.iter(|| {
                    let mut decoder = SseDecoder::new();
                    let mut count = 0;
                    for chunk in stream.chunks(chunk_size) {
                        count += decoder.feed(black_box(chunk)).map(|f| f.len()).unwrap_or(0);
                    }
                    black_box(count)
                });
            },
        );
    }

    group.finish();
}

/// Benchmark decoding plus routing into session channels
fn bench_decode_and_route(c: &mut Criterion) {
    let stream = generate_stream(1_000);

    c.bench_function("sse_decode_and_route", |b| {
        b.iter(|| {
            let mut decoder = SseDecoder::new();
            let mut session = Session::new(Duration::from_secs(1));
            for chunk in stream.chunks(1024) {
                if let Ok(frames) = decoder.feed(chunk) {
                    for frame in &frames {
                        black_box(session.apply(frame));
                    }
                }
            }
            black_box(session.snapshot())
        });
    });
}

criterion_group!(benches, bench_decode_chunked, bench_decode_and_route);
criterion_main!(benches);
