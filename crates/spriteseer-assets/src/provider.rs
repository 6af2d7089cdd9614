//! The engine-facing asset provider.

use std::path::PathBuf;

use ash::vk;
use spriteseer_gpu::{CommandPool, GpuContext};

use crate::catalog::{AssetCatalog, AssetEntry};
use crate::error::Result;
use crate::texture::Texture;

/// Catalogued resources plus one uploaded texture per catalogued image.
///
/// `textures[i]` is the texture named `catalog.textures()[i]`, so the catalog
/// index is the shader's texture array index.
pub struct AssetProvider {
    catalog: AssetCatalog,
    textures: Vec<Texture>,
}

impl AssetProvider {
    /// Scan `res_dir` and upload every image found.
    pub fn load(gpu: &GpuContext, pool: &CommandPool, res_dir: impl Into<PathBuf>) -> Result<Self> {
        let catalog = AssetCatalog::scan(res_dir)?;
        let textures = catalog
            .textures()
            .iter()
            .map(|entry| Texture::load(gpu, pool, &entry.name, &entry.path))
            .collect::<Result<Vec<_>>>()?;

        tracing::info!("Loaded {} textures", textures.len());
        Ok(Self { catalog, textures })
    }

    pub const fn catalog(&self) -> &AssetCatalog {
        &self.catalog
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// View and sampler of texture `index`.
    pub fn texture_handle(&self, index: usize) -> Option<(vk::ImageView, vk::Sampler)> {
        self.textures.get(index).map(|t| (t.view(), t.sampler()))
    }

    /// Every texture's view and sampler, in index order.
    pub fn texture_handles(&self) -> Vec<(vk::ImageView, vk::Sampler)> {
        self.textures
            .iter()
            .map(|t| (t.view(), t.sampler()))
            .collect()
    }

    pub fn texture_index_of(&self, name: &str) -> Result<i32> {
        self.catalog.texture_index_of(name)
    }

    pub fn sounds(&self) -> &[AssetEntry] {
        self.catalog.sounds()
    }
}
