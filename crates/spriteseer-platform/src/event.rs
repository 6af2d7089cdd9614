//! Window event translation.

use spriteseer_core::Extent;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::Window;

/// The window events the frame loop acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformEvent {
    Quit,
    KeyDown(KeyCode),
    KeyUp(KeyCode),
    /// New drawable size in pixels; zero while minimized.
    Resized(Extent),
    /// Key-up events stop arriving once focus is gone.
    FocusLost,
}

impl PlatformEvent {
    /// Translate a winit window event, or `None` for events the engine
    /// ignores.
    #[must_use]
    pub fn from_window_event(event: &WindowEvent) -> Option<Self> {
        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => Some(Self::Quit),
            WindowEvent::KeyboardInput { event, .. } => {
                let PhysicalKey::Code(key) = event.physical_key else {
                    return None;
                };
                Some(match event.state {
                    ElementState::Pressed => Self::KeyDown(key),
                    ElementState::Released => Self::KeyUp(key),
                })
            }
            WindowEvent::Resized(size) => Some(Self::Resized(extent_of(*size))),
            WindowEvent::Focused(false) => Some(Self::FocusLost),
            _ => None,
        }
    }
}

/// Current drawable size of `window` in pixels.
#[must_use]
pub fn drawable_extent(window: &Window) -> Extent {
    extent_of(window.inner_size())
}

const fn extent_of(size: PhysicalSize<u32>) -> Extent {
    Extent::new(size.width, size.height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_request_quits() {
        assert_eq!(
            PlatformEvent::from_window_event(&WindowEvent::CloseRequested),
            Some(PlatformEvent::Quit)
        );
    }

    #[test]
    fn resize_carries_pixel_extent() {
        let event = WindowEvent::Resized(PhysicalSize::new(800, 600));
        assert_eq!(
            PlatformEvent::from_window_event(&event),
            Some(PlatformEvent::Resized(Extent::new(800, 600)))
        );

        let minimized = WindowEvent::Resized(PhysicalSize::new(0, 0));
        let Some(PlatformEvent::Resized(extent)) = PlatformEvent::from_window_event(&minimized)
        else {
            panic!("expected a resize");
        };
        assert!(extent.is_empty());
    }

    #[test]
    fn focus_changes() {
        assert_eq!(
            PlatformEvent::from_window_event(&WindowEvent::Focused(false)),
            Some(PlatformEvent::FocusLost)
        );
        assert_eq!(
            PlatformEvent::from_window_event(&WindowEvent::Focused(true)),
            None
        );
    }
}
