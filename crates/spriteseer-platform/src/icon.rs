//! Window icon loading.

use std::path::Path;

use winit::window::Icon;

use crate::{PlatformError, Result};

/// Icon location relative to the resource directory.
pub const WINDOW_ICON: &str = "icon/icon.jpg";

/// Load [`WINDOW_ICON`] from `res_dir`.
///
/// A missing or unreadable icon is not fatal: it is logged and the window
/// keeps the platform default.
pub fn load_window_icon(res_dir: &Path) -> Option<Icon> {
    let path = res_dir.join(WINDOW_ICON);
    if !path.is_file() {
        tracing::warn!("No window icon at {}", path.display());
        return None;
    }

    let decoded = image::open(&path).map_err(|e| PlatformError::Icon {
        path: path.display().to_string(),
        reason: e.to_string(),
    });
    let icon = decoded.and_then(|img| {
        let rgba = img.into_rgba8();
        let (width, height) = rgba.dimensions();
        icon_from_rgba(rgba.into_raw(), width, height)
    });

    match icon {
        Ok(icon) => {
            tracing::debug!("Loaded window icon {}", path.display());
            Some(icon)
        }
        Err(e) => {
            tracing::warn!("{e}");
            None
        }
    }
}

/// Build an icon from tightly packed RGBA8 pixels.
pub fn icon_from_rgba(rgba: Vec<u8>, width: u32, height: u32) -> Result<Icon> {
    Icon::from_rgba(rgba, width, height).map_err(|e| PlatformError::Icon {
        path: format!("<{width}x{height} rgba>"),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgba_icon_accepts_matching_buffer() {
        assert!(icon_from_rgba(vec![255; 4 * 4 * 4], 4, 4).is_ok());
    }

    #[test]
    fn rgba_icon_rejects_short_buffer() {
        let err = icon_from_rgba(vec![0; 7], 2, 2).unwrap_err();
        assert!(matches!(err, PlatformError::Icon { .. }));
    }

    #[test]
    fn missing_icon_is_not_fatal() {
        assert!(load_window_icon(Path::new("/nonexistent/spriteseer-res")).is_none());
    }
}
