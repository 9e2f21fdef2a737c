use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use lazyparse_core::{any, chain_left1, digit, integer, token, Stream, TextStream};

const TOKENS: usize = 1_000_000;

fn bench_skip_many(c: &mut Criterion) {
    let mut group = c.benchmark_group("repetition");
    group.throughput(Throughput::Elements(TOKENS as u64));
    group.sample_size(10);

    let parser = any::<Stream<u32>>().skip_many();
    group.bench_function("skip_many_iterator_1m", |b| {
        b.iter(|| {
            let stream: Stream<u32> = Stream::from_iterator(0..TOKENS as u32).unwrap();
            black_box(parser.parse(stream).unwrap())
        })
    });

    let input = "7".repeat(TOKENS);
    let parser = digit::<TextStream>().many();
    group.bench_function("many_text_1m", |b| {
        b.iter(|| black_box(parser.parse_text(black_box(&input)).unwrap()))
    });

    group.finish();
}

fn bench_chain(c: &mut Criterion) {
    let mut input = String::from("1");
    for _ in 0..TOKENS / 2 {
        input.push_str("+1");
    }
    let plus = token::<TextStream>('+').map(|_| |a: i64, b: i64| a + b);
    let parser = chain_left1(&integer::<TextStream, i64>(), &plus);

    let mut group = c.benchmark_group("chain");
    group.throughput(Throughput::Bytes(input.len() as u64));
    group.sample_size(10);
    group.bench_function("chain_left1_1m", |b| {
        b.iter(|| black_box(parser.parse_text(black_box(&input)).unwrap()))
    });
    group.finish();
}

criterion_group!(benches, bench_skip_many, bench_chain);
criterion_main!(benches);
