use criterion::{criterion_group, criterion_main, Criterion};
use std::path::Path;

fn fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    std::fs::read_to_string(path).unwrap()
}

fn bench_parse_multipart(c: &mut Criterion) {
    let raw = fixture("multipart.eml");

    c.bench_function("parse_multipart_eml", |b| {
        b.iter(|| emlview::parser::eml::parse_message(&raw))
    });
}

fn bench_parse_nested(c: &mut Criterion) {
    let raw = fixture("nested.eml");

    c.bench_function("parse_nested_eml", |b| {
        b.iter(|| emlview::parser::eml::parse_message(&raw))
    });
}

criterion_group!(benches, bench_parse_multipart, bench_parse_nested);
criterion_main!(benches);
