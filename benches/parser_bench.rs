use criterion::{black_box, criterion_group, criterion_main, Criterion};
use token_signal::api::SAMPLE_TOKEN_TEXT;
use token_signal::parser::parse_token_data;

fn bench_parse_sample(c: &mut Criterion) {
    c.bench_function("parse_token_data/sample", |b| {
        b.iter(|| parse_token_data(black_box(SAMPLE_TOKEN_TEXT)))
    });
}

fn bench_parse_unrecognized(c: &mut Criterion) {
    let text = "nothing useful in here\n".repeat(40);
    c.bench_function("parse_token_data/defaults_only", |b| {
        b.iter(|| parse_token_data(black_box(&text)))
    });
}

criterion_group!(benches, bench_parse_sample, bench_parse_unrecognized);
criterion_main!(benches);
