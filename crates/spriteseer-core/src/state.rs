//! Simulation/render state shared by every stage of a frame.
//!
//! There is exactly one [`SimState`] per engine. It is passed by `&mut` to
//! whoever needs it; field ownership is by convention:
//! - the frame scheduler writes `time`, `delta` and `extent`
//! - input handling writes `keys`, `polygon_mode` and `show_debug_lines`
//! - entities set the remap flags, the geometry batcher clears them

use std::fmt;

use crate::keys::Keys;

/// Drawable size in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Extent {
    pub width: u32,
    pub height: u32,
}

impl Extent {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A zero-area extent (minimized window).
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Width divided by height, or 1.0 for an empty extent.
    #[inline]
    #[allow(clippy::cast_precision_loss)]
    pub fn aspect_ratio(&self) -> f32 {
        if self.is_empty() {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Rasterization mode applied to the quad pipeline as dynamic state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PolygonMode {
    #[default]
    Fill,
    /// Wireframe
    Line,
}

impl PolygonMode {
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Fill => Self::Line,
            Self::Line => Self::Fill,
        }
    }
}

/// The per-engine simulation/render record.
#[derive(Clone, Debug)]
pub struct SimState {
    /// Current drawable extent
    pub extent: Extent,
    /// Global sprite scale factor
    pub sprite_scale: f32,
    /// Keys held this frame
    pub keys: Keys,
    /// Seconds since the simulation started
    pub time: f32,
    /// Seconds elapsed during the last simulation step
    pub delta: f32,
    /// Quad geometry changed since the last remap
    pub needs_triangle_remap: bool,
    /// Line geometry changed since the last remap
    pub needs_line_remap: bool,
    pub polygon_mode: PolygonMode,
    /// Draw entity outlines
    pub show_debug_lines: bool,
}

impl SimState {
    /// Fresh state for a drawable of `extent`.
    ///
    /// Both remap flags start set so the first frame uploads everything.
    pub const fn new(extent: Extent) -> Self {
        Self {
            extent,
            sprite_scale: 1.0,
            keys: Keys::empty(),
            time: 0.0,
            delta: 0.0,
            needs_triangle_remap: true,
            needs_line_remap: true,
            polygon_mode: PolygonMode::Fill,
            show_debug_lines: true,
        }
    }

    /// Mark both geometry buffers stale.
    #[inline]
    pub fn mark_geometry_dirty(&mut self) {
        self.needs_triangle_remap = true;
        self.needs_line_remap = true;
    }

    /// Whether any geometry buffer needs a remap.
    #[inline]
    pub const fn needs_remap(&self) -> bool {
        self.needs_triangle_remap || self.needs_line_remap
    }

    /// Record one simulation step of `delta` seconds.
    #[inline]
    pub fn advance(&mut self, delta: f32) {
        self.delta = delta;
        self.time += delta;
    }

    /// Flip between filled and wireframe rendering.
    pub fn toggle_polygon_mode(&mut self) {
        self.polygon_mode = self.polygon_mode.toggled();
    }

    /// Show or hide debug outlines; the line buffer must be rebuilt either way.
    pub fn toggle_debug_lines(&mut self) {
        self.show_debug_lines = !self.show_debug_lines;
        self.needs_line_remap = true;
    }
}

impl Default for SimState {
    fn default() -> Self {
        Self::new(Extent::new(
            crate::constants::WIDTH,
            crate::constants::HEIGHT,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn new_state_requests_full_upload() {
        let state = SimState::new(Extent::new(1600, 800));
        assert!(state.needs_triangle_remap);
        assert!(state.needs_line_remap);
        assert_relative_eq!(state.extent.aspect_ratio(), 2.0);
    }

    #[test]
    fn advance_accumulates_time() {
        let mut state = SimState::default();
        state.advance(0.1);
        state.advance(0.25);
        assert_relative_eq!(state.delta, 0.25);
        assert_relative_eq!(state.time, 0.35);
    }

    #[test]
    fn toggles() {
        let mut state = SimState::default();
        state.needs_line_remap = false;

        state.toggle_polygon_mode();
        assert_eq!(state.polygon_mode, PolygonMode::Line);
        state.toggle_polygon_mode();
        assert_eq!(state.polygon_mode, PolygonMode::Fill);

        state.toggle_debug_lines();
        assert!(!state.show_debug_lines);
        assert!(state.needs_line_remap);
    }

    #[test]
    fn empty_extent() {
        assert!(Extent::new(0, 800).is_empty());
        assert!(!Extent::new(1, 1).is_empty());
        assert_eq!(Extent::new(1600, 800).to_string(), "1600x800");
    }
}
