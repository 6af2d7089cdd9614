//! Batched sprite rendering for the Sprite Seer engine.
//!
//! This crate provides:
//! - Geometry batching into fixed-capacity quad, index and line buffers
//! - The host-visible GPU buffers that back them
//! - Quad and debug-line pipelines sharing one texture array
//! - Per-frame command recording

pub mod batcher;
pub mod error;
pub mod geometry;
pub mod recorder;
pub mod sprite_pipeline;

pub use batcher::{
    collect, quad_indices, write_quad_indices, GeometryBatcher, GeometryCounts, GeometryRegions,
    GeometryTarget, HostGeometry, RemapOutcome,
};
pub use error::{RenderError, Result};
pub use geometry::GeometryBuffers;
pub use recorder::{record_frame, DrawPlan, FrameRecording};
pub use sprite_pipeline::SpritePipelines;
pub use spriteseer_core::{quad_vertices, VertexWriter};
