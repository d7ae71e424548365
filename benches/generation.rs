use criterion::{black_box, criterion_group, criterion_main, Criterion};

use night_city::procgen::layout::{generate_layout, GridConfig};
use night_city::procgen::random::random_stream;
use night_city::render::facade_textures::{synthesize, FacadeConfig};

fn layout(c: &mut Criterion) {
    let config = GridConfig {
        seed: 42,
        ..GridConfig::default()
    };
    c.bench_function("layout 15x15 blocks", |b| {
        b.iter(|| generate_layout(black_box(&config), &mut random_stream(config.seed)))
    });
}

fn facade(c: &mut Criterion) {
    let small = FacadeConfig {
        seed: 7,
        ..FacadeConfig::default()
    };
    let large = FacadeConfig {
        texture_width: 1024,
        texture_height: 1024,
        window_size: 8,
        window_spacing: 4,
        seed: 7,
        ..FacadeConfig::default()
    };
    c.bench_function("facade 128x256", |b| {
        b.iter(|| synthesize(black_box(&small), &mut random_stream(small.seed)))
    });
    c.bench_function("facade 1024x1024 dense", |b| {
        b.iter(|| synthesize(black_box(&large), &mut random_stream(large.seed)))
    });
}

criterion_group!(benches, layout, facade);
criterion_main!(benches);
