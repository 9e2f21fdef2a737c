use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use lazyparse_core::{any, letter, spaces, Parser, TextStream};
use lazyparse_pipeline::{tokenize, tokenize_with};
use lazyparse_stream::{Stream, StreamOptions};

fn words() -> Parser<TextStream, String> {
    letter::<TextStream>().many1().collect_string().skip(&spaces())
}

fn bench_tokenize(c: &mut Criterion) {
    let input = "lorem ipsum dolor sit amet ".repeat(20_000);
    let lexer = words();
    let count = any::<Stream<String>>().skip_many();

    let mut group = c.benchmark_group("tokenize");
    group.throughput(Throughput::Bytes(input.len() as u64));
    group.sample_size(10);

    group.bench_function("chunk_1", |b| {
        b.iter(|| {
            let tokens = tokenize(TextStream::from_text(black_box(&input)), &lexer).unwrap();
            black_box(count.parse(tokens).unwrap())
        })
    });

    let options = StreamOptions::default();
    group.bench_function("chunk_default", |b| {
        b.iter(|| {
            let tokens = tokenize_with(TextStream::from_text(black_box(&input)), &lexer, &options).unwrap();
            black_box(count.parse(tokens).unwrap())
        })
    });

    group.finish();
}

criterion_group!(benches, bench_tokenize);
criterion_main!(benches);
