use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::{json, Value};

use standoff::*;

/// A session with `regions` regions of ten lines each
fn make_session(regions: usize) -> Value {
    let regions: Vec<Value> = (0..regions)
        .map(|r| {
            let lines: Vec<Value> = (0..10)
                .map(|l| json!({"id": format!("l{}-{}", r, l), "text": format!("line {} of region {}", l, r)}))
                .collect();
            json!({"id": format!("r{}", r), "metadata": {"scan_id": format!("scan{}", r / 4), "page_id": format!("page{}", r / 2)}, "lines": lines})
        })
        .collect();
    json!({"id": "s", "regions": regions})
}

fn session_types() -> TraversalConfig {
    TraversalConfig::new()
        .with_type("session", NodeTypeConfig::container("regions", "text_region"))
        .with_type(
            "text_region",
            NodeTypeConfig::container("lines", "line").with_hook(Box::new(ScanPageHook::new())),
        )
        .with_type("line", NodeTypeConfig::leaf())
}

pub fn bench_traversal(c: &mut Criterion) {
    let types = session_types();
    let config = Config::default().with_warnings(false);
    let mut group = c.benchmark_group("traversal");
    for regions in [10, 100, 1000] {
        let session = make_session(regions);
        group.bench_with_input(BenchmarkId::from_parameter(regions), &session, |b, session| {
            b.iter(|| {
                let (text, _) = Traversal::new(&types, &config, "corpus")
                    .run(black_box(session), "session")
                    .unwrap();
                assert_eq!(text.len(), regions * 10);
            })
        });
    }
    group.finish();
}

pub fn bench_overlapping(c: &mut Criterion) {
    let mut builder = CorpusBuilder::new("corpus", session_types(), "session")
        .with_config(Config::default().with_warnings(false));
    builder.add_document(&make_session(1000), None).unwrap();
    let corpus = builder.finish().unwrap();
    let annotations = corpus.annotations();
    let (begin, end) = (AnchorRef::Index(5000), AnchorRef::Index(5020));

    c.bench_function("overlapping", |b| {
        b.iter(|| {
            let count = annotations
                .overlapping(black_box(&begin), black_box(&end), "corpus")
                .count();
            assert!(count > 0);
        })
    });

    c.bench_function("of_type_overlapping", |b| {
        b.iter(|| {
            let count = annotations
                .of_type_overlapping(&AnnotationKind::Line, black_box(&begin), black_box(&end), "corpus")
                .count();
            assert_eq!(count, 21);
        })
    });
}

pub fn bench_split(c: &mut Criterion) {
    let segments: Vec<String> = (0..10000).map(|i| format!("segment number {}", i)).collect();
    let text = AnchoredSegmentedText::new("r").with_segments(segments);
    let middle = text.anchor(5000).unwrap().clone();

    c.bench_function("split_middle", |b| {
        b.iter(|| {
            let mut text = text.clone();
            text.split(black_box(&middle), 7).unwrap();
        })
    });

    c.bench_function("element_at_anchor", |b| {
        b.iter(|| {
            text.element_at(black_box(&middle)).unwrap();
        })
    });
}

criterion_group!(benches, bench_traversal, bench_overlapping, bench_split);
criterion_main!(benches);
