//! Fixed key bindings.

use spriteseer_core::{Keys, SimState};
use winit::keyboard::KeyCode;

/// Snapshot flag a physical key feeds, if the simulation reads it.
///
/// Both left and right modifier keys map to the same flag.
#[must_use]
pub const fn key_flag(key: KeyCode) -> Option<Keys> {
    Some(match key {
        KeyCode::KeyW => Keys::W,
        KeyCode::KeyA => Keys::A,
        KeyCode::KeyS => Keys::S,
        KeyCode::KeyD => Keys::D,
        KeyCode::Space => Keys::SPACE,
        KeyCode::ShiftLeft | KeyCode::ShiftRight => Keys::SHIFT,
        KeyCode::ControlLeft | KeyCode::ControlRight => Keys::CTRL,
        _ => return None,
    })
}

/// Render switches flipped on the frame their key goes down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineToggle {
    /// `F1`: fill / wireframe.
    PolygonMode,
    /// `F2`: player outline.
    DebugLines,
}

impl EngineToggle {
    pub const ALL: [Self; 2] = [Self::PolygonMode, Self::DebugLines];

    #[must_use]
    pub const fn key(self) -> KeyCode {
        match self {
            Self::PolygonMode => KeyCode::F1,
            Self::DebugLines => KeyCode::F2,
        }
    }

    pub fn apply(self, state: &mut SimState) {
        match self {
            Self::PolygonMode => state.toggle_polygon_mode(),
            Self::DebugLines => state.toggle_debug_lines(),
        }
        tracing::debug!(
            "{self:?} toggled (polygon mode {:?}, debug lines {})",
            state.polygon_mode,
            state.show_debug_lines
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spriteseer_core::PolygonMode;

    #[test]
    fn movement_keys_have_flags() {
        assert_eq!(key_flag(KeyCode::KeyD), Some(Keys::D));
        assert_eq!(key_flag(KeyCode::ShiftRight), Some(Keys::SHIFT));
        assert_eq!(key_flag(KeyCode::ControlLeft), Some(Keys::CTRL));
        assert_eq!(key_flag(KeyCode::KeyQ), None);
        assert_eq!(key_flag(KeyCode::F1), None);
    }

    #[test]
    fn toggles_flip_render_state() {
        let mut state = SimState::default();
        let lines = state.show_debug_lines;

        EngineToggle::PolygonMode.apply(&mut state);
        assert_eq!(state.polygon_mode, PolygonMode::Line);
        EngineToggle::PolygonMode.apply(&mut state);
        assert_eq!(state.polygon_mode, PolygonMode::Fill);

        EngineToggle::DebugLines.apply(&mut state);
        assert_eq!(state.show_debug_lines, !lines);
    }
}
