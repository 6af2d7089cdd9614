use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glam::Vec2;
use spriteseer_core::SimState;
use spriteseer_render::{quad_indices, GeometryBatcher, HostGeometry};
use spriteseer_world::{Player, Rectangle, World};

fn tiled_world(state: &SimState, tiles: usize) -> World {
    let mut world = World::new(Player::new(Vec2::ZERO, Vec2::new(0.02, 0.1), 0, state));
    for i in 0..tiles {
        #[allow(clippy::cast_precision_loss)]
        let x = (i % 40) as f32 * 0.05 - 1.0;
        #[allow(clippy::cast_precision_loss)]
        let y = (i / 40) as f32 * 0.05 - 1.0;
        world.push_static(Rectangle::new(
            format!("tile{i}"),
            false,
            Vec2::new(x, y),
            Vec2::splat(0.025),
            1,
            state,
        ));
    }
    world
}

fn bench_remap(c: &mut Criterion) {
    let base = SimState::default();
    let world = tiled_world(&base, 2000);
    let mut geometry = HostGeometry::default();
    let mut batcher = GeometryBatcher::new();

    let mut group = c.benchmark_group("Geometry remap");

    group.bench_function("Dirty remap (2001 quads)", |b| {
        b.iter(|| {
            let mut state = base.clone();
            black_box(batcher.remap(&world, &mut state, &mut geometry).ok());
        });
    });

    group.bench_function("Clean remap (skipped)", |b| {
        let mut state = base.clone();
        state.needs_triangle_remap = false;
        state.needs_line_remap = false;
        b.iter(|| {
            black_box(batcher.remap(&world, &mut state, &mut geometry).ok());
        });
    });

    group.bench_function("Quad indices (2048 quads)", |b| {
        b.iter(|| black_box(quad_indices(black_box(2048 * 4)).ok()));
    });

    group.finish();
}

criterion_group!(benches, bench_remap);
criterion_main!(benches);
