use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use parley::core::message::{ChatMessage, Transcript};
use parley::core::normalize::{normalize, NormalizationStrategy};
use parley::core::stream_decoder::StreamDecoder;
use parley::ui::markdown::{build_transcript_lines, RenderConfig};
use parley::ui::theme::Theme;

fn make_reply(sections: usize) -> String {
    let mut reply = String::from("## Summary\n\n\n");
    for i in 1..=sections {
        reply.push_str(&format!(
            "{i}. **Region {i}**:\n\nThe cheapest item costs $1.{i:02}\n-\nChips are cheaper here\n\n\n\n"
        ));
    }
    reply
}

fn make_wire(reply: &str) -> Vec<u8> {
    let mut wire = Vec::new();
    for line in reply.split('\n') {
        for word in line.split_inclusive(' ') {
            wire.extend_from_slice(format!("data: {word}\n\n").as_bytes());
        }
        wire.extend_from_slice(b"data: \n\n");
    }
    wire.extend_from_slice(b"data: [DONE]\n\n");
    wire
}

fn bench_normalize(c: &mut Criterion) {
    for &sections in &[10usize, 100usize] {
        let reply = make_reply(sections);
        let mut group = c.benchmark_group(format!("normalize_sections{sections}"));
        group.throughput(Throughput::Bytes(reply.len() as u64));

        for strategy in [NormalizationStrategy::Compact, NormalizationStrategy::Flatten] {
            group.bench_function(BenchmarkId::new("normalize", strategy), |b| {
                b.iter(|| normalize(&reply, strategy))
            });
        }
        group.finish();
    }
}

fn bench_decode_and_render(c: &mut Criterion) {
    let reply = make_reply(50);
    let wire = make_wire(&reply);
    let theme = Theme::dark_default();

    let mut group = c.benchmark_group("stream");
    group.throughput(Throughput::Bytes(wire.len() as u64));

    // Small reads exercise the carry-over path.
    for &chunk_size in &[7usize, 512usize] {
        group.bench_function(BenchmarkId::new("decode", chunk_size), |b| {
            b.iter(|| {
                let mut decoder = StreamDecoder::new();
                let mut tokens = 0usize;
                for chunk in wire.chunks(chunk_size) {
                    if let Ok(events) = decoder.ingest(chunk) {
                        tokens += events.len();
                    }
                }
                tokens
            })
        });
    }

    let transcript = Transcript::from(vec![
        ChatMessage::user("cheapest region?"),
        ChatMessage::assistant(reply.clone()),
    ]);
    for strategy in [NormalizationStrategy::Compact, NormalizationStrategy::Flatten] {
        group.bench_function(BenchmarkId::new("render", strategy), |b| {
            b.iter(|| build_transcript_lines(&transcript, &theme, RenderConfig::markdown(strategy)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_normalize, bench_decode_and_render);
criterion_main!(benches);
