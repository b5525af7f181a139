//! Benchmarks for recording citations and rendering reference lists.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use cite_core::{Attributes, Cite, CiteOptions, MarkerKind, Parser};

/// Host that never finds markers in re-parsed text.
struct PassThrough;

impl Parser for PassThrough {
    fn reparse(&mut self, text: &str, _cite: &mut Cite) -> String {
        text.to_owned()
    }

    fn page_id(&self) -> &str {
        "bench"
    }

    fn literal(&self, _kind: MarkerKind, content: Option<&str>, _attrs: &Attributes) -> String {
        content.unwrap_or_default().to_owned()
    }

    fn contains_marker_opening(&self, text: &str) -> bool {
        text.contains(":ref[")
    }
}

fn named(key: &str) -> Attributes {
    Attributes::from([("name".to_owned(), key.to_owned())])
}

/// Record `entries` citations, each used `reuse` times, then render.
fn render_document(entries: usize, reuse: usize) -> String {
    let mut parser = PassThrough;
    let mut cite = Cite::new(CiteOptions::default());
    let mut out = String::new();

    for round in 0..reuse {
        for i in 0..entries {
            let text = format!("Author {i}, Title of work {i}, page {round}.");
            let link = cite
                .cite(Some(&text), &named(&format!("source-{i}")), &mut parser)
                .unwrap();
            out.push_str(&link);
        }
    }
    out.push_str(&cite.references(None, &Attributes::new(), &mut parser));
    out
}

fn bench_single_use(c: &mut Criterion) {
    c.bench_function("render_100_single_use", |b| {
        b.iter(|| render_document(100, 1));
    });
}

fn bench_by_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_by_size");

    for (entries, reuse) in [(10, 1), (100, 3), (500, 5)] {
        group.throughput(Throughput::Elements((entries * reuse) as u64));
        group.bench_with_input(
            BenchmarkId::new("citations", format!("{entries}e_{reuse}r")),
            &(entries, reuse),
            |b, &(entries, reuse)| b.iter(|| render_document(entries, reuse)),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_single_use, bench_by_size);
criterion_main!(benches);
