//! Conversion pipeline benchmarks.

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};

use wikivert::{ConvertOptions, Oracles, Registry, TYPE_HTML, TYPE_MARKDOWN};

fn sample_document() -> String {
    let mut doc = String::new();
    for section in 0..50 {
        doc.push_str(&format!("## Section {section}\n\n"));
        doc.push_str(
            "A paragraph with **bold**, _italics_, `code`, a [link](http://example.org/) \
             and a [[WikiLink]].\n\n",
        );
        doc.push_str("* first item\n* second item\n    * nested item\n\n");
        doc.push_str("col a | col b\n----- | -----\n1 | 2\n\n");
    }
    doc
}

fn bench_markdown_to_html(c: &mut Criterion) {
    let registry = Registry::default();
    let options = ConvertOptions::default();
    let oracles = Oracles::none();
    let doc = sample_document();

    c.bench_function("markdown_to_html", |b| {
        b.iter(|| {
            registry
                .convert(
                    black_box(&doc),
                    TYPE_MARKDOWN,
                    TYPE_HTML,
                    &options,
                    &oracles,
                )
                .unwrap()
        })
    });
}

fn bench_markdown_roundtrip(c: &mut Criterion) {
    let registry = Registry::default();
    let options = ConvertOptions::default();
    let oracles = Oracles::none();
    let doc = sample_document();

    c.bench_function("markdown_roundtrip", |b| {
        b.iter(|| {
            registry
                .convert(
                    black_box(&doc),
                    TYPE_MARKDOWN,
                    TYPE_MARKDOWN,
                    &options,
                    &oracles,
                )
                .unwrap()
        })
    });
}

fn bench_html_to_markdown(c: &mut Criterion) {
    let registry = Registry::default();
    let options = ConvertOptions::default();
    let oracles = Oracles::none();
    let html = registry
        .convert(
            &sample_document(),
            TYPE_MARKDOWN,
            TYPE_HTML,
            &options,
            &oracles,
        )
        .unwrap();

    c.bench_function("html_to_markdown", |b| {
        b.iter(|| {
            registry
                .convert(black_box(&html), TYPE_HTML, TYPE_MARKDOWN, &options, &oracles)
                .unwrap()
        })
    });
}

criterion_group!(
    benches,
    bench_markdown_to_html,
    bench_markdown_roundtrip,
    bench_html_to_markdown
);
criterion_main!(benches);
