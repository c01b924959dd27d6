use criterion::{black_box, criterion_group, criterion_main, Criterion};
use vrex::{builder, compile, Template};

fn bench_compile_simple(c: &mut Criterion) {
    c.bench_function("compile_simple", |b| {
        b.iter(|| black_box(compile(black_box("optional [+-] at-least-1 digit"))))
    });
}

fn bench_compile_groups(c: &mut Criterion) {
    let source = r#"
        begin-of-text
        user: at-least-1 [a-zA-Z0-9._%+-]
        "@"
        domain: (at-least-1 [a-zA-Z0-9.-] "." least-2 [a-zA-Z])
        end-of-text
    "#;

    c.bench_function("compile_groups", |b| {
        b.iter(|| black_box(compile(black_box(source))))
    });
}

fn bench_compile_interpolation(c: &mut Criterion) {
    let digits = compile("at-least-1 digit").unwrap();

    c.bench_function("compile_interpolation", |b| {
        b.iter(|| {
            let template = Template::new("")
                .interpolate(&digits)
                .text(" \".\" ")
                .interpolate(&digits)
                .text(" optional ")
                .interpolate("\"-\" word-char");
            black_box(compile(template))
        })
    });
}

fn bench_compile_cached(c: &mut Criterion) {
    let cached = builder().cache();
    let source = "begin-of-line 3-to-5 word-char or not digit end-of-line";

    c.bench_function("compile_cached", |b| {
        b.iter(|| black_box(cached.compile(black_box(source))))
    });
}

fn bench_find_all(c: &mut Criterion) {
    let pattern = compile("at-least-1 digit").unwrap();
    let input = "abc 123 def 456 ghi 789 jkl 012 mno 345 pqr 678 stu 901";

    c.bench_function("find_all_numbers", |b| {
        b.iter(|| black_box(pattern.find_all(black_box(input))))
    });
}

fn bench_backreference(c: &mut Criterion) {
    let pattern = compile("name: at-least-1 word-char \" is \" match<name>").unwrap();
    let input = "John is John and Jane is Jane";

    c.bench_function("backref_match", |b| {
        b.iter(|| black_box(pattern.find(black_box(input))))
    });
}

criterion_group!(
    benches,
    bench_compile_simple,
    bench_compile_groups,
    bench_compile_interpolation,
    bench_compile_cached,
    bench_find_all,
    bench_backreference,
);

criterion_main!(benches);
