//! Platform shell for the Sprite Seer engine.
//!
//! Window attributes, the window icon and the translation of winit window
//! events into the small [`PlatformEvent`] vocabulary the frame loop reads.

mod event;
mod icon;

pub use event::{drawable_extent, PlatformEvent};
pub use icon::{icon_from_rgba, load_window_icon, WINDOW_ICON};

use spriteseer_core::constants::{HEIGHT, WIDTH};
use thiserror::Error;
use winit::dpi::PhysicalSize;
use winit::window::WindowAttributes;

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("Window creation failed: {0}")]
    WindowCreation(String),
    #[error("Event loop error: {0}")]
    EventLoop(String),
    #[error("Icon {path}: {reason}")]
    Icon { path: String, reason: String },
}

pub type Result<T> = std::result::Result<T, PlatformError>;

/// Window configuration.
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub resizable: bool,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            title: "Sprite Seer".to_string(),
            width: WIDTH,
            height: HEIGHT,
            resizable: true,
        }
    }
}

impl PlatformConfig {
    /// Attributes for `ActiveEventLoop::create_window`; the size is in
    /// physical pixels.
    #[must_use]
    pub fn window_attributes(&self) -> WindowAttributes {
        WindowAttributes::default()
            .with_title(self.title.clone())
            .with_inner_size(PhysicalSize::new(self.width, self.height))
            .with_resizable(self.resizable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_engine_window() {
        let config = PlatformConfig::default();
        assert_eq!(config.title, "Sprite Seer");
        assert_eq!((config.width, config.height), (1600, 800));
        assert!(config.resizable);
    }

    #[test]
    fn attributes_carry_config() {
        let config = PlatformConfig {
            title: "test".into(),
            resizable: false,
            ..Default::default()
        };
        let attributes = config.window_attributes();
        assert_eq!(attributes.title, "test");
        assert!(!attributes.resizable);
    }
}
