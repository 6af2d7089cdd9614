//! Resource directory enumeration.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AssetError, Result};

/// What a resource file is used for, decided by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Texture,
    Sound,
}

impl AssetKind {
    /// Classify a file; unknown extensions are skipped by the scan.
    #[must_use]
    pub fn of(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "png" | "jpg" | "jpeg" => Some(Self::Texture),
            "wav" | "ogg" => Some(Self::Sound),
            _ => None,
        }
    }
}

/// One resource file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetEntry {
    /// Path relative to the resource root with `/` separators,
    /// e.g. `img/png/player.png`.
    pub name: String,
    pub path: PathBuf,
}

/// Every texture and sound under a resource root, each list sorted by name.
#[derive(Debug, Clone, Default)]
pub struct AssetCatalog {
    root: PathBuf,
    textures: Vec<AssetEntry>,
    sounds: Vec<AssetEntry>,
}

impl AssetCatalog {
    /// Walk `root` recursively.
    pub fn scan(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(AssetError::MissingResourceDir(root));
        }

        let mut catalog = Self {
            root,
            ..Self::default()
        };
        let mut pending = vec![catalog.root.clone()];
        while let Some(dir) = pending.pop() {
            let entries = fs::read_dir(&dir).map_err(|source| AssetError::Io {
                path: dir.clone(),
                source,
            })?;
            for entry in entries {
                let path = entry
                    .map_err(|source| AssetError::Io {
                        path: dir.clone(),
                        source,
                    })?
                    .path();
                if path.is_dir() {
                    pending.push(path);
                    continue;
                }
                let Some(kind) = AssetKind::of(&path) else {
                    continue;
                };
                let entry = AssetEntry {
                    name: relative_name(&catalog.root, &path),
                    path,
                };
                tracing::debug!("Found {kind:?} {}", entry.name);
                match kind {
                    AssetKind::Texture => catalog.textures.push(entry),
                    AssetKind::Sound => catalog.sounds.push(entry),
                }
            }
        }

        catalog.textures.sort_by(|a, b| a.name.cmp(&b.name));
        catalog.sounds.sort_by(|a, b| a.name.cmp(&b.name));
        tracing::info!(
            "Scanned {}: {} textures, {} sounds",
            catalog.root.display(),
            catalog.textures.len(),
            catalog.sounds.len()
        );
        Ok(catalog)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn textures(&self) -> &[AssetEntry] {
        &self.textures
    }

    pub fn sounds(&self) -> &[AssetEntry] {
        &self.sounds
    }

    /// Index of the texture called `name`; this is the value vertices carry
    /// in `tex_index`.
    pub fn texture_index_of(&self, name: &str) -> Result<i32> {
        let index = self
            .textures
            .iter()
            .position(|entry| entry.name == name)
            .ok_or_else(|| AssetError::TextureNotFound(name.to_string()))?;
        i32::try_from(index).map_err(|_| AssetError::TooManyTextures(index))
    }

    pub fn sound(&self, name: &str) -> Result<&AssetEntry> {
        self.sounds
            .iter()
            .find(|entry| entry.name == name)
            .ok_or_else(|| AssetError::SoundNotFound(name.to_string()))
    }
}

fn relative_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
