//! Frame-in-flight synchronization.
//!
//! Each frame slot owns a completion fence, an image-available semaphore, a
//! render-finished semaphore and a command buffer. Slot `k` is reused only
//! after its fence has signaled, which bounds the CPU to at most
//! `frames_in_flight` frames ahead of the GPU.

use crate::command::{CommandPool, Submission};
use crate::error::{GpuError, Result};
use ash::vk;

/// Create a semaphore.
///
/// # Safety
/// The device must be valid.
pub unsafe fn create_semaphore(device: &ash::Device) -> Result<vk::Semaphore> {
    let create_info = vk::SemaphoreCreateInfo::default();
    device
        .create_semaphore(&create_info, None)
        .map_err(GpuError::SyncCreation)
}

/// Create a fence.
///
/// # Safety
/// The device must be valid.
pub unsafe fn create_fence(device: &ash::Device, signaled: bool) -> Result<vk::Fence> {
    let flags = if signaled {
        vk::FenceCreateFlags::SIGNALED
    } else {
        vk::FenceCreateFlags::empty()
    };

    let create_info = vk::FenceCreateInfo::default().flags(flags);
    device
        .create_fence(&create_info, None)
        .map_err(GpuError::SyncCreation)
}

/// Device operations the synchronizer performs on a slot.
pub trait SlotDevice {
    /// Block until the fence signals.
    fn wait_fence(&self, fence: vk::Fence) -> Result<()>;
    /// Return the fence to the unsignaled state.
    fn reset_fence(&self, fence: vk::Fence) -> Result<()>;
    /// Reset a command buffer whose previous submission has completed.
    fn reset_command_buffer(&self, cmd: vk::CommandBuffer) -> Result<()>;
}

impl SlotDevice for ash::Device {
    fn wait_fence(&self, fence: vk::Fence) -> Result<()> {
        unsafe { self.wait_for_fences(&[fence], true, u64::MAX)? };
        Ok(())
    }

    fn reset_fence(&self, fence: vk::Fence) -> Result<()> {
        unsafe { self.reset_fences(&[fence])? };
        Ok(())
    }

    fn reset_command_buffer(&self, cmd: vk::CommandBuffer) -> Result<()> {
        unsafe {
            Self::reset_command_buffer(self, cmd, vk::CommandBufferResetFlags::empty())?;
        }
        Ok(())
    }
}

/// Monotonic frame counter mapped onto a fixed number of slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotCounter {
    frame: u64,
    slots: usize,
}

impl SlotCounter {
    /// Counter over `slots` slots (at least one).
    pub const fn new(slots: usize) -> Self {
        Self {
            frame: 0,
            slots: if slots == 0 { 1 } else { slots },
        }
    }

    /// Frames handed out so far.
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    pub const fn slots(&self) -> usize {
        self.slots
    }

    /// Slot of the next frame, `frame mod slots`.
    #[allow(clippy::cast_possible_truncation)]
    pub const fn peek(&self) -> usize {
        (self.frame % self.slots as u64) as usize
    }

    /// Hand out the next frame's slot and advance the counter.
    pub fn advance(&mut self) -> usize {
        let slot = self.peek();
        self.frame += 1;
        slot
    }
}

/// Synchronization resources for one frame in flight.
#[derive(Debug, Clone, Copy)]
pub struct FrameSlot {
    /// Signaled when the acquired swapchain image is ready to be written
    pub image_available: vk::Semaphore,
    /// Signaled when this slot's submission finishes rendering
    pub render_finished: vk::Semaphore,
    /// Signaled when the GPU is done with this slot
    pub in_flight: vk::Fence,
    pub command_buffer: vk::CommandBuffer,
}

/// Owns the frame slots and decides which one a frame uses.
pub struct FrameSynchronizer {
    slots: Vec<FrameSlot>,
    counter: SlotCounter,
}

impl FrameSynchronizer {
    /// Create `frames_in_flight` slots with signaled fences.
    ///
    /// Any creation failure is fatal; objects created before the failure are
    /// destroyed.
    ///
    /// # Safety
    /// The device must be valid and the pool must belong to it.
    pub unsafe fn new(
        device: &ash::Device,
        pool: &CommandPool,
        frames_in_flight: usize,
    ) -> Result<Self> {
        let count = u32::try_from(frames_in_flight)
            .map_err(|_| GpuError::InvalidState("Too many frames in flight".to_string()))?;
        let command_buffers = pool.allocate_command_buffers(count)?;

        let mut slots = Vec::with_capacity(frames_in_flight);
        for command_buffer in command_buffers {
            match Self::create_slot(device, command_buffer) {
                Ok(slot) => slots.push(slot),
                Err(e) => {
                    Self::from_slots(slots).destroy(device);
                    return Err(e);
                }
            }
        }

        tracing::debug!("Created {frames_in_flight} frame slots");

        Ok(Self::from_slots(slots))
    }

    unsafe fn create_slot(
        device: &ash::Device,
        command_buffer: vk::CommandBuffer,
    ) -> Result<FrameSlot> {
        let image_available = create_semaphore(device)?;
        let render_finished = match create_semaphore(device) {
            Ok(s) => s,
            Err(e) => {
                device.destroy_semaphore(image_available, None);
                return Err(e);
            }
        };
        let in_flight = match create_fence(device, true) {
            Ok(f) => f,
            Err(e) => {
                device.destroy_semaphore(image_available, None);
                device.destroy_semaphore(render_finished, None);
                return Err(e);
            }
        };

        Ok(FrameSlot {
            image_available,
            render_finished,
            in_flight,
            command_buffer,
        })
    }

    /// Wrap already-created slots.
    pub fn from_slots(slots: Vec<FrameSlot>) -> Self {
        let counter = SlotCounter::new(slots.len());
        Self { slots, counter }
    }

    pub fn frames_in_flight(&self) -> usize {
        self.slots.len()
    }

    /// Frames started so far.
    pub const fn frame_count(&self) -> u64 {
        self.counter.frame()
    }

    /// Pick the slot for the next frame.
    pub fn acquire_slot(&mut self) -> usize {
        self.counter.advance()
    }

    pub fn slot(&self, index: usize) -> &FrameSlot {
        &self.slots[index]
    }

    /// Block until the GPU has finished with the slot's previous submission.
    ///
    /// The fence is left signaled so an abandoned frame (stale swapchain)
    /// cannot deadlock the next wait on this slot.
    pub fn wait_for_slot_ready<D: SlotDevice + ?Sized>(&self, device: &D, slot: usize) -> Result<()> {
        device.wait_fence(self.slots[slot].in_flight)
    }

    /// Claim a ready slot for recording: unsignal its fence and reset its
    /// command buffer.
    ///
    /// Call only after an image was acquired, so that every reset is
    /// followed by a submission that signals the fence again.
    pub fn arm_slot<D: SlotDevice + ?Sized>(&self, device: &D, slot: usize) -> Result<()> {
        let slot = &self.slots[slot];
        device.reset_fence(slot.in_flight)?;
        device.reset_command_buffer(slot.command_buffer)
    }

    /// Submit the slot's command buffer.
    ///
    /// Waits on image-available at color-attachment output and signals
    /// render-finished and the slot fence.
    ///
    /// # Safety
    /// The command buffer must be fully recorded and the queue valid.
    pub unsafe fn submit(&self, device: &ash::Device, queue: vk::Queue, slot: usize) -> Result<()> {
        let slot = &self.slots[slot];
        Submission::new(std::slice::from_ref(&slot.command_buffer))
            .waiting(
                std::slice::from_ref(&slot.image_available),
                &[vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT],
            )
            .signaling(std::slice::from_ref(&slot.render_finished))
            .fence(slot.in_flight)
            .submit(device, queue)
    }

    /// Destroy all semaphores and fences.
    ///
    /// Command buffers are freed with their pool.
    ///
    /// # Safety
    /// The device must be idle with respect to these objects.
    pub unsafe fn destroy(&self, device: &ash::Device) {
        for slot in &self.slots {
            device.destroy_semaphore(slot.image_available, None);
            device.destroy_semaphore(slot.render_finished, None);
            device.destroy_fence(slot.in_flight, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ash::vk::Handle;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum FenceState {
        Signaled,
        Unsignaled,
        Pending,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Op {
        Wait(u64),
        ResetFence(u64),
        ResetCmd(u64),
    }

    #[derive(Default)]
    struct MockDevice {
        fences: RefCell<HashMap<u64, FenceState>>,
        ops: RefCell<Vec<Op>>,
    }

    impl MockDevice {
        fn submit(&self, fence: vk::Fence) {
            self.fences
                .borrow_mut()
                .insert(fence.as_raw(), FenceState::Pending);
        }
    }

    impl SlotDevice for MockDevice {
        fn wait_fence(&self, fence: vk::Fence) -> Result<()> {
            self.ops.borrow_mut().push(Op::Wait(fence.as_raw()));
            let mut fences = self.fences.borrow_mut();
            let state = fences.entry(fence.as_raw()).or_insert(FenceState::Signaled);
            match *state {
                FenceState::Unsignaled => {
                    Err(GpuError::InvalidState("wait would never return".to_string()))
                }
                FenceState::Pending | FenceState::Signaled => {
                    *state = FenceState::Signaled;
                    Ok(())
                }
            }
        }

        fn reset_fence(&self, fence: vk::Fence) -> Result<()> {
            self.ops.borrow_mut().push(Op::ResetFence(fence.as_raw()));
            let mut fences = self.fences.borrow_mut();
            let state = fences.entry(fence.as_raw()).or_insert(FenceState::Signaled);
            if *state == FenceState::Pending {
                return Err(GpuError::InvalidState("fence still in use".to_string()));
            }
            *state = FenceState::Unsignaled;
            Ok(())
        }

        fn reset_command_buffer(&self, cmd: vk::CommandBuffer) -> Result<()> {
            self.ops.borrow_mut().push(Op::ResetCmd(cmd.as_raw()));
            Ok(())
        }
    }

    fn synchronizer(slots: u64) -> FrameSynchronizer {
        FrameSynchronizer::from_slots(
            (0..slots)
                .map(|i| FrameSlot {
                    image_available: vk::Semaphore::from_raw(100 + i),
                    render_finished: vk::Semaphore::from_raw(200 + i),
                    in_flight: vk::Fence::from_raw(300 + i),
                    command_buffer: vk::CommandBuffer::from_raw(400 + i),
                })
                .collect(),
        )
    }

    #[test]
    fn slots_rotate_modulo_frames_in_flight() {
        let mut sync = synchronizer(2);
        let slots: Vec<usize> = (0..5).map(|_| sync.acquire_slot()).collect();
        assert_eq!(slots, vec![0, 1, 0, 1, 0]);
        assert_eq!(sync.frame_count(), 5);
    }

    #[test]
    fn counter_peek_does_not_advance() {
        let mut counter = SlotCounter::new(3);
        assert_eq!(counter.peek(), 0);
        assert_eq!(counter.peek(), 0);
        assert_eq!(counter.advance(), 0);
        assert_eq!(counter.advance(), 1);
        assert_eq!(counter.advance(), 2);
        assert_eq!(counter.peek(), 0);
        assert_eq!(SlotCounter::new(0).slots(), 1);
    }

    #[test]
    fn fence_is_waited_before_it_is_reset() {
        let device = MockDevice::default();
        let mut sync = synchronizer(2);

        for _ in 0..6 {
            let slot = sync.acquire_slot();
            sync.wait_for_slot_ready(&device, slot).unwrap();
            sync.arm_slot(&device, slot).unwrap();
            device.submit(sync.slot(slot).in_flight);
        }

        let ops = device.ops.borrow();
        for (i, op) in ops.iter().enumerate() {
            if let Op::ResetFence(fence) = op {
                assert_eq!(ops[i - 1], Op::Wait(*fence));
                assert_eq!(ops[i + 1], Op::ResetCmd(*fence + 100));
            }
        }
    }

    #[test]
    fn abandoned_frame_leaves_slot_waitable() {
        let device = MockDevice::default();
        let mut sync = synchronizer(2);

        // Frame 0: acquisition reports a stale swapchain, nothing is submitted.
        let slot = sync.acquire_slot();
        sync.wait_for_slot_ready(&device, slot).unwrap();

        // Frame 1 renders normally.
        let slot = sync.acquire_slot();
        sync.wait_for_slot_ready(&device, slot).unwrap();
        sync.arm_slot(&device, slot).unwrap();
        device.submit(sync.slot(slot).in_flight);

        // Frame 2 reuses slot 0; its fence must still be signaled.
        let slot = sync.acquire_slot();
        assert_eq!(slot, 0);
        assert!(sync.wait_for_slot_ready(&device, slot).is_ok());
    }

    #[test]
    fn arming_without_submission_would_deadlock() {
        let device = MockDevice::default();
        let sync = synchronizer(1);

        sync.wait_for_slot_ready(&device, 0).unwrap();
        sync.arm_slot(&device, 0).unwrap();
        assert!(sync.wait_for_slot_ready(&device, 0).is_err());
    }
}
