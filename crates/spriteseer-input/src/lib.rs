//! Keyboard input for the Sprite Seer engine.
//!
//! [`KeyboardState`] follows every physical key reported by winit and folds
//! the ones the simulation reads into a [`Keys`] snapshot once per frame.
//! Engine toggles (wireframe, debug lines) are edge triggered through
//! [`EngineToggle`].
//!
//! ```ignore
//! keyboard.process_key_event(&event);
//! let keys = keyboard.snapshot();
//! for toggle in keyboard.just_pressed_toggles() {
//!     toggle.apply(&mut state);
//! }
//! keyboard.end_frame();
//! ```

mod bindings;
mod button_state;
mod keyboard;

pub use bindings::{key_flag, EngineToggle};
pub use button_state::ButtonState;
pub use keyboard::KeyboardState;
pub use spriteseer_core::Keys;

pub use winit::keyboard::KeyCode;
