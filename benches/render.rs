use criterion::{black_box, criterion_group, criterion_main, Criterion};

use julia::{RenderConfig, Renderer};

fn bench_render(c: &mut Criterion) {
    let renderer = Renderer::new(RenderConfig::default()).unwrap();
    c.bench_function("render 320x240", |b| {
        b.iter(|| renderer.render(black_box(320), black_box(240), -0.756, -0.245))
    });

    let single = Renderer::new(RenderConfig {
        workers: 1,
        ..RenderConfig::default()
    })
    .unwrap();
    c.bench_function("render 320x240 single worker", |b| {
        b.iter(|| single.render(black_box(320), black_box(240), -0.756, -0.245))
    });
}

criterion_group!(benches, bench_render);
criterion_main!(benches);
