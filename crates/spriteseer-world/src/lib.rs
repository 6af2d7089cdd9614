//! Sprite entities for the Sprite Seer engine.
//!
//! Every on-screen object implements [`Entity`]. The [`World`] keeps static
//! rectangles in creation order followed by the player, and that order is the
//! order geometry lands in the vertex buffers.

pub mod entity;
pub mod level;
pub mod player;
pub mod rectangle;
pub mod world;

pub use entity::{ndc_size, Entity};
pub use player::Player;
pub use rectangle::Rectangle;
pub use world::World;
