//! Asset provider for the Sprite Seer engine.
//!
//! The resource directory is scanned once at startup. Images become GPU
//! textures whose indices are the order of their resource-relative names;
//! sound files are only catalogued here and handed to the audio player.

mod catalog;
mod error;
mod provider;
mod texture;

pub use catalog::{AssetCatalog, AssetEntry, AssetKind};
pub use error::{AssetError, Result};
pub use provider::AssetProvider;
pub use texture::{Texture, TEXTURE_FORMAT};
