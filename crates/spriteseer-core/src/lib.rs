//! Core types and shared state for the Sprite Seer engine.
//!
//! This crate provides the foundational types used throughout the engine:
//! - The GPU vertex layout shared by quads and debug lines
//! - The bounds-checked vertex writer entities emit geometry through
//! - The per-frame simulation/render state record
//! - Keyboard snapshot flags and 2D rectangle math

pub mod error;
pub mod geometry;
pub mod keys;
pub mod math;
pub mod state;
pub mod types;

pub use error::{Error, Result};
pub use geometry::{quad_vertices, GeometryKind, VertexWriter};
pub use keys::Keys;
pub use math::Rect;
pub use state::{Extent, PolygonMode, SimState};
pub use types::Vertex;

/// Engine-wide constants
pub mod constants {
    /// Default window width in pixels
    pub const WIDTH: u32 = 1600;
    /// Default window height in pixels
    pub const HEIGHT: u32 = 800;
    /// Number of frames the CPU may record ahead of the GPU
    pub const MAX_FRAMES_IN_FLIGHT: usize = 2;
    /// Capacity of the quad vertex buffer, in quads
    pub const MAX_QUADS: usize = 2048;
    /// Capacity of the line vertex buffer, in line segments
    pub const MAX_LINES: usize = 256;
    /// Vertices per quad
    pub const VERTICES_PER_QUAD: usize = 4;
    /// Indices per quad (two triangles)
    pub const INDICES_PER_QUAD: usize = 6;
    /// Vertices per line segment
    pub const VERTICES_PER_LINE: usize = 2;

    /// Horizontal acceleration applied while a direction key is held (NDC/s^2)
    pub const PLAYER_ACCELERATION: f32 = 1.0;
    /// Horizontal deceleration applied when no direction key is held (NDC/s^2)
    pub const PLAYER_DECELERATION: f32 = 3.0;
    /// Downward acceleration while airborne (NDC/s^2)
    pub const PLAYER_GRAVITY: f32 = 50.0;
    /// Upward velocity set by a jump (NDC/s)
    pub const PLAYER_JUMP_VELOCITY: f32 = 3.0;
    /// Per-axis velocity limit (NDC/s)
    pub const MAX_PLAYER_VELOCITY: f32 = 3.0;

    /// Interval between frame-rate log lines, in milliseconds
    pub const FPS_MEASURE_INTERVAL_MS: u64 = 500;
}
