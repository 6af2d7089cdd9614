//! Settings fixed before the window opens.

use std::path::PathBuf;

use spriteseer_core::constants::{HEIGHT, WIDTH};
use spriteseer_platform::PlatformConfig;

/// Window, presentation and resource settings for [`run_app`](crate::run_app).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub title: String,
    /// Initial window width in pixels.
    pub width: u32,
    /// Initial window height in pixels.
    pub height: u32,
    /// Frame-rate cap; `None` runs uncapped.
    pub target_fps: Option<u32>,
    /// Present with FIFO instead of the lowest-latency mode available.
    pub vsync: bool,
    /// Load the Khronos validation layer. On by default in debug builds.
    pub validation: bool,
    /// Root of the textures, sounds and window icon.
    pub res_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Sprite Seer".to_string(),
            width: WIDTH,
            height: HEIGHT,
            target_fps: None,
            vsync: false,
            validation: cfg!(debug_assertions),
            res_dir: PathBuf::from("res"),
        }
    }
}

impl AppConfig {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub const fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    #[must_use]
    pub const fn with_target_fps(mut self, fps: u32) -> Self {
        self.target_fps = Some(fps);
        self
    }

    #[must_use]
    pub const fn with_vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    #[must_use]
    pub const fn with_validation(mut self, validation: bool) -> Self {
        self.validation = validation;
        self
    }

    #[must_use]
    pub fn with_res_dir(mut self, res_dir: impl Into<PathBuf>) -> Self {
        self.res_dir = res_dir.into();
        self
    }

    /// Window settings for the platform shell.
    pub fn platform(&self) -> PlatformConfig {
        PlatformConfig {
            title: self.title.clone(),
            width: self.width,
            height: self.height,
            resizable: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = AppConfig::default();
        assert_eq!(config.title, "Sprite Seer");
        assert_eq!((config.width, config.height), (1600, 800));
        assert_eq!(config.res_dir, PathBuf::from("res"));
        assert!(config.target_fps.is_none());
    }

    #[test]
    fn builder_overrides() {
        let config = AppConfig::new("demo")
            .with_size(640, 480)
            .with_vsync(true)
            .with_target_fps(30)
            .with_res_dir("assets");
        assert_eq!(config.title, "demo");
        assert!(config.vsync);
        assert_eq!(config.target_fps, Some(30));

        let platform = config.platform();
        assert_eq!((platform.width, platform.height), (640, 480));
        assert_eq!(platform.title, "demo");
    }
}
