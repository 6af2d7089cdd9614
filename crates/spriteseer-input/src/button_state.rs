//! Per-key press tracking with single-frame edges.

/// Where a key is in its press cycle.
///
/// ```text
/// Released ─press─> JustPressed ─end_frame─> Pressed
///     ^                                         │
///     └──end_frame── JustReleased <──release────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ButtonState {
    JustPressed,
    Pressed,
    JustReleased,
    #[default]
    Released,
}

impl ButtonState {
    /// Held down, including the frame it went down.
    #[inline]
    #[must_use]
    pub const fn is_pressed(self) -> bool {
        matches!(self, Self::JustPressed | Self::Pressed)
    }

    #[inline]
    #[must_use]
    pub const fn is_just_pressed(self) -> bool {
        matches!(self, Self::JustPressed)
    }

    #[inline]
    #[must_use]
    pub const fn is_just_released(self) -> bool {
        matches!(self, Self::JustReleased)
    }

    /// Apply a key-down (`true`) or key-up (`false`) report.
    ///
    /// Repeated reports in the same direction (OS key repeat) leave the state
    /// alone, so a held key produces exactly one `JustPressed` edge.
    #[inline]
    pub fn apply(&mut self, down: bool) {
        match (down, self.is_pressed()) {
            (true, false) => *self = Self::JustPressed,
            (false, true) => *self = Self::JustReleased,
            _ => {}
        }
    }

    /// Settle single-frame edges into their steady state.
    #[inline]
    pub fn end_frame(&mut self) {
        *self = match *self {
            Self::JustPressed | Self::Pressed => Self::Pressed,
            Self::JustReleased | Self::Released => Self::Released,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_cycle_settles_after_each_frame() {
        let mut key = ButtonState::default();
        key.apply(true);
        assert!(key.is_just_pressed());

        key.end_frame();
        assert_eq!(key, ButtonState::Pressed);

        key.apply(false);
        assert!(key.is_just_released());
        assert!(!key.is_pressed());

        key.end_frame();
        assert_eq!(key, ButtonState::Released);
    }

    #[test]
    fn key_repeat_does_not_retrigger() {
        let mut key = ButtonState::default();
        key.apply(true);
        key.end_frame();
        key.apply(true);
        assert_eq!(key, ButtonState::Pressed);
    }

    #[test]
    fn release_without_press_is_ignored() {
        let mut key = ButtonState::Released;
        key.apply(false);
        assert_eq!(key, ButtonState::Released);
    }
}
