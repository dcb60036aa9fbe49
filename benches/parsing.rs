//! Benchmarks comparing the shunting-yard driver with the reference
//! window reducer on the fixture grammars.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mixfix::{lexer::tokenize, reference, shunting_yard, testset};

fn bench_basic(c: &mut Criterion) {
    let grammar = testset::basic_grammar();
    let tokens =
        tokenize("1 + 2 * a ! + - 3 - f . g . h * 4 + b [ 0 + 1 ] $").expect("bench input lexes");

    c.bench_function("shunting_yard/basic", |b| {
        b.iter(|| shunting_yard::parse(black_box(&grammar), black_box(&tokens)))
    });
    c.bench_function("reference/basic", |b| {
        b.iter(|| reference::parse(black_box(&grammar), black_box(&tokens)))
    });
}

fn bench_cpp(c: &mut Criterion) {
    let grammar = testset::cpp_grammar();
    let tokens =
        tokenize("a = b ? c + d : e * f ( g , h ++ , <. int .> i ) -> j [ k ]").expect("bench input lexes");

    c.bench_function("shunting_yard/cpp", |b| {
        b.iter(|| shunting_yard::parse(black_box(&grammar), black_box(&tokens)))
    });
    c.bench_function("reference/cpp", |b| {
        b.iter(|| reference::parse(black_box(&grammar), black_box(&tokens)))
    });
}

fn bench_flat_chain(c: &mut Criterion) {
    let grammar = testset::basic_grammar();
    let input = vec!["1"; 64].join(" + ");
    let tokens = tokenize(&input).expect("bench input lexes");

    c.bench_function("shunting_yard/flat-chain", |b| {
        b.iter(|| shunting_yard::parse(black_box(&grammar), black_box(&tokens)))
    });
    c.bench_function("reference/flat-chain", |b| {
        b.iter(|| reference::parse(black_box(&grammar), black_box(&tokens)))
    });
}

criterion_group!(benches, bench_basic, bench_cpp, bench_flat_chain);
criterion_main!(benches);
