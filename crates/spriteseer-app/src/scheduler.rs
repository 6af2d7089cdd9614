//! Per-frame phase ordering.

/// One step of a frame, in the order the runner executes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePhase {
    /// Fold the keys gathered since the last frame into the simulation.
    PollEvents,
    /// Block on the slot's fence.
    WaitForSlot,
    /// Acquire a swapchain image; a stale swapchain ends the frame here.
    Acquire,
    /// Advance the clock and update every entity once.
    Simulate,
    /// Rewrite the geometry buffers whose dirty flag is set.
    Remap,
    RecordAndSubmit,
    Present,
}

const VISIBLE: [FramePhase; 7] = [
    FramePhase::PollEvents,
    FramePhase::WaitForSlot,
    FramePhase::Acquire,
    FramePhase::Simulate,
    FramePhase::Remap,
    FramePhase::RecordAndSubmit,
    FramePhase::Present,
];

const MINIMIZED: [FramePhase; 2] = [FramePhase::PollEvents, FramePhase::Simulate];

/// The phases one frame runs.
///
/// A minimized window keeps simulating but never touches the swapchain, the
/// frame slots or the geometry buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSchedule {
    visible: bool,
}

impl FrameSchedule {
    pub const fn new(visible: bool) -> Self {
        Self { visible }
    }

    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    pub const fn phases(&self) -> &'static [FramePhase] {
        if self.visible {
            &VISIBLE
        } else {
            &MINIMIZED
        }
    }
}
