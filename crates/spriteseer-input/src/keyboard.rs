//! Keyboard state tracking.

use hashbrown::HashMap;
use spriteseer_core::Keys;
use winit::event::{ElementState, KeyEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::bindings::{key_flag, EngineToggle};
use crate::button_state::ButtonState;

/// Every physical key seen so far and where it is in its press cycle.
#[derive(Debug, Default)]
pub struct KeyboardState {
    keys: HashMap<KeyCode, ButtonState>,
}

impl KeyboardState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a winit key event. Keys without a physical code are ignored.
    pub fn process_key_event(&mut self, event: &KeyEvent) {
        let PhysicalKey::Code(key) = event.physical_key else {
            return;
        };
        self.process_key(key, event.state == ElementState::Pressed);
    }

    /// Record a key going down (`true`) or up (`false`).
    pub fn process_key(&mut self, key: KeyCode, down: bool) {
        self.keys.entry(key).or_default().apply(down);
    }

    #[must_use]
    pub fn is_pressed(&self, key: KeyCode) -> bool {
        self.keys.get(&key).is_some_and(|s| s.is_pressed())
    }

    #[must_use]
    pub fn is_just_pressed(&self, key: KeyCode) -> bool {
        self.keys.get(&key).is_some_and(|s| s.is_just_pressed())
    }

    /// Held simulation keys as a [`Keys`] snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Keys {
        self.keys
            .iter()
            .filter(|(_, state)| state.is_pressed())
            .filter_map(|(&key, _)| key_flag(key))
            .fold(Keys::empty(), |acc, flag| acc | flag)
    }

    /// Toggles whose key went down this frame, in `F1`, `F2` order.
    pub fn just_pressed_toggles(&self) -> impl Iterator<Item = EngineToggle> + '_ {
        EngineToggle::ALL
            .into_iter()
            .filter(|toggle| self.is_just_pressed(toggle.key()))
    }

    /// Settle this frame's press and release edges.
    pub fn end_frame(&mut self) {
        for state in self.keys.values_mut() {
            state.end_frame();
        }
    }

    /// Forget every key, e.g. when the window loses focus and key-up events
    /// would otherwise never arrive.
    pub fn clear(&mut self) {
        self.keys.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_follows_held_keys() {
        let mut keyboard = KeyboardState::new();
        assert_eq!(keyboard.snapshot(), Keys::empty());

        keyboard.process_key(KeyCode::KeyD, true);
        keyboard.process_key(KeyCode::Space, true);
        keyboard.process_key(KeyCode::KeyQ, true);
        assert_eq!(keyboard.snapshot(), Keys::D | Keys::SPACE);

        keyboard.end_frame();
        assert_eq!(keyboard.snapshot(), Keys::D | Keys::SPACE);

        keyboard.process_key(KeyCode::Space, false);
        assert_eq!(keyboard.snapshot(), Keys::D);
    }

    #[test]
    fn toggles_fire_once_per_press() {
        let mut keyboard = KeyboardState::new();
        keyboard.process_key(KeyCode::F2, true);
        keyboard.process_key(KeyCode::F1, true);
        let fired: Vec<_> = keyboard.just_pressed_toggles().collect();
        assert_eq!(
            fired,
            vec![EngineToggle::PolygonMode, EngineToggle::DebugLines]
        );

        keyboard.end_frame();
        keyboard.process_key(KeyCode::F1, true);
        assert_eq!(keyboard.just_pressed_toggles().count(), 0);
        assert!(keyboard.is_pressed(KeyCode::F1));
    }

    #[test]
    fn clear_releases_everything() {
        let mut keyboard = KeyboardState::new();
        keyboard.process_key(KeyCode::KeyA, true);
        keyboard.clear();
        assert!(!keyboard.is_pressed(KeyCode::KeyA));
        assert_eq!(keyboard.snapshot(), Keys::empty());
    }
}
