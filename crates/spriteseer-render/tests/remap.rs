//! Batcher and world working together against in-memory geometry.

use approx::assert_relative_eq;
use glam::Vec2;
use spriteseer_core::constants::{MAX_LINES, MAX_QUADS};
use spriteseer_core::{GeometryKind, Keys, SimState};
use spriteseer_render::{GeometryBatcher, GeometryTarget, HostGeometry, RemapOutcome, RenderError};
use spriteseer_world::{level, Player, Rectangle, World};

fn demo_world(state: &SimState) -> World {
    level::generate(state, |name| match name {
        level::SKY_TEXTURE => Ok::<i32, ()>(0),
        level::FLOOR_TEXTURE => Ok(1),
        _ => Ok(2),
    })
    .unwrap()
}

#[test]
fn first_remap_writes_everything_in_world_order() {
    let mut state = SimState::default();
    let world = demo_world(&state);
    let mut geometry = HostGeometry::default();
    let mut batcher = GeometryBatcher::new();

    let outcome = batcher.remap(&world, &mut state, &mut geometry).unwrap();

    assert_eq!(
        outcome,
        RemapOutcome::Remapped {
            quad_vertices: Some(12),
            line_vertices: Some(8),
        }
    );
    let tex: Vec<i32> = geometry
        .quad_vertices()
        .chunks_exact(4)
        .map(|quad| quad[0].tex_index)
        .collect();
    assert_eq!(tex, [0, 1, 2]);
    assert_eq!(geometry.indices().len(), 18);
    assert_eq!(&geometry.indices()[12..], &[8, 9, 10, 10, 9, 11]);
    assert!(!state.needs_remap());
}

#[test]
fn clean_state_does_not_touch_geometry() {
    let mut state = SimState::default();
    let world = demo_world(&state);
    let mut geometry = HostGeometry::default();
    let mut batcher = GeometryBatcher::new();

    batcher.remap(&world, &mut state, &mut geometry).unwrap();
    let writes = geometry.writes();
    let counts = geometry.counts();

    let outcome = batcher.remap(&world, &mut state, &mut geometry).unwrap();

    assert_eq!(outcome, RemapOutcome::Skipped);
    assert_eq!(geometry.writes(), writes);
    assert_eq!(geometry.counts(), counts);
    assert_eq!(batcher.remap_count(), 1);
}

#[test]
fn flags_are_honoured_independently() {
    let mut state = SimState::default();
    let world = demo_world(&state);
    let mut geometry = HostGeometry::default();
    let mut batcher = GeometryBatcher::new();
    batcher.remap(&world, &mut state, &mut geometry).unwrap();

    state.toggle_debug_lines();
    let outcome = batcher.remap(&world, &mut state, &mut geometry).unwrap();

    assert_eq!(
        outcome,
        RemapOutcome::Remapped {
            quad_vertices: None,
            line_vertices: Some(0),
        }
    );
    assert_eq!(geometry.quad_vertices().len(), 12);
    assert!(geometry.line_vertices().is_empty());
}

#[test]
fn walking_right_moves_the_trailing_quad() {
    let mut state = SimState::new(spriteseer_core::Extent::new(1600, 800));
    let mut world = demo_world(&state);
    let mut geometry = HostGeometry::default();
    let mut batcher = GeometryBatcher::new();
    batcher.remap(&world, &mut state, &mut geometry).unwrap();
    let sky_before = geometry.quad_vertices()[..8].to_vec();

    state.keys = Keys::D;
    world.on_input(state.keys, &mut state);
    state.advance(0.1);
    world.update(state.delta, &mut state);

    let player = world.player();
    assert_relative_eq!(player.velocity().x, 0.1);
    assert_relative_eq!(player.position().x, 0.01);
    assert!(player.position().x >= -1.0);
    assert!(player.position().x <= 1.0 - player.size().x);
    assert!(state.needs_triangle_remap);

    batcher.remap(&world, &mut state, &mut geometry).unwrap();

    let vertices = geometry.quad_vertices();
    assert_eq!(vertices.len(), 12);
    assert_eq!(&vertices[..8], sky_before.as_slice());
    assert_relative_eq!(vertices[8].pos.x, 0.01);
    assert_eq!(vertices[8].tex_index, 2);
}

#[test]
fn rescale_at_same_scale_reproduces_geometry() {
    let mut state = SimState::default();
    let mut world = demo_world(&state);
    let mut geometry = HostGeometry::default();
    let mut batcher = GeometryBatcher::new();
    batcher.remap(&world, &mut state, &mut geometry).unwrap();
    let before = geometry.quad_vertices().to_vec();

    world.rescale(&mut state);
    assert!(state.needs_triangle_remap && state.needs_line_remap);
    batcher.remap(&world, &mut state, &mut geometry).unwrap();

    assert_eq!(geometry.quad_vertices(), before.as_slice());
}

#[test]
fn overflow_is_reported_and_flags_stay_set() {
    let mut state = SimState::default();
    let world = demo_world(&state);
    let mut geometry = HostGeometry::with_capacity(2, MAX_LINES);
    let mut batcher = GeometryBatcher::new();

    let err = batcher.remap(&world, &mut state, &mut geometry).unwrap_err();

    assert!(matches!(
        err,
        RenderError::CapacityExceeded {
            kind: GeometryKind::Quads,
            requested: 12,
            capacity: 8
        }
    ));
    assert!(state.needs_triangle_remap);
    assert_eq!(geometry.counts().quad_vertices, 0);
}

#[test]
fn full_capacity_fits_exactly() {
    let mut state = SimState::default();
    let mut world = World::new(Player::new(Vec2::ZERO, Vec2::splat(0.01), 0, &state));
    for i in 0..MAX_QUADS - 1 {
        world.push_static(Rectangle::new(
            format!("tile{i}"),
            false,
            Vec2::ZERO,
            Vec2::splat(0.01),
            0,
            &state,
        ));
    }
    let mut geometry = HostGeometry::default();

    GeometryBatcher::new()
        .remap(&world, &mut state, &mut geometry)
        .unwrap();

    assert_eq!(geometry.quad_vertices().len(), MAX_QUADS * 4);
    assert_eq!(geometry.indices().len(), MAX_QUADS * 6);
}
