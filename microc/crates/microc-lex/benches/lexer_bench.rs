//! Lexer benchmarks.
//!
//! Run with `cargo bench --package microc-lex`.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use microc_lex::Lexer;
use microc_util::{FileId, Handler};

fn lexer_token_count(source: &str) -> usize {
    let handler = Handler::new();
    Lexer::new(source, FileId(0)).tokenize(&handler).len()
}

fn bench_lexer_keywords(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer");

    let source = "int x; int main() { int y; y = x + 1; return y; }";
    group.throughput(Throughput::Bytes(source.len() as u64));

    group.bench_function("simple_decl", |b| {
        b.iter(|| lexer_token_count(black_box("int x = 42;")))
    });

    group.bench_function("function_with_body", |b| {
        b.iter(|| lexer_token_count(black_box(source)))
    });

    group.finish();
}

fn bench_lexer_complex(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer_complex");

    let source = r#"
        struct Point {
            int x;
            int y;
        }

        int distance(struct Point *a, struct Point *b) {
            int dx = a->x - b->x;
            int dy = a->y - b->y;
            return dx * dx + dy * dy;
        }

        int main() {
            struct Point origin;
            origin.x = 0;
            origin.y = 0;
            if (distance(&origin, &origin) == 0) {
                return 0;
            }
            for (int i = 0; i < 10; i = i + 1) {
                if (i == 5) {
                    break;
                }
            }
            return 1;
        }
    "#;

    group.throughput(Throughput::Bytes(source.len() as u64));

    group.bench_function("complex_source", |b| {
        b.iter(|| lexer_token_count(black_box(source)))
    });

    group.finish();
}

fn bench_lexer_numbers(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer_numbers");

    group.bench_function("small_integer", |b| {
        b.iter(|| lexer_token_count(black_box("int x = 42;")))
    });

    group.bench_function("large_integer", |b| {
        b.iter(|| lexer_token_count(black_box("int x = 123456789;")))
    });

    group.finish();
}

fn bench_lexer_identifiers(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer_identifiers");

    group.bench_function("short_ident", |b| {
        b.iter(|| lexer_token_count(black_box("int x = 42;")))
    });

    group.bench_function("long_ident", |b| {
        b.iter(|| lexer_token_count(black_box("int very_long_variable_name = 42;")))
    });

    group.bench_function("many_idents", |b| {
        b.iter(|| {
            lexer_token_count(black_box(
                "int a = 1; int b = 2; int c = 3; int d = 4; int e = 5;",
            ))
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_lexer_keywords,
    bench_lexer_complex,
    bench_lexer_numbers,
    bench_lexer_identifiers
);
criterion_main!(benches);
