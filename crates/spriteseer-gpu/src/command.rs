//! Command pools, recording and queue submission.

use std::sync::Arc;

use ash::vk;

use crate::error::Result;

/// Resettable command pool on one queue family.
///
/// Dropping the pool frees every command buffer allocated from it.
pub struct CommandPool {
    pool: vk::CommandPool,
    device: Arc<ash::Device>,
}

impl CommandPool {
    /// # Safety
    /// `queue_family` must be a queue family of `device`.
    pub unsafe fn new(device: Arc<ash::Device>, queue_family: u32) -> Result<Self> {
        let pool = device.create_command_pool(
            &vk::CommandPoolCreateInfo::default()
                .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER)
                .queue_family_index(queue_family),
            None,
        )?;
        Ok(Self { pool, device })
    }

    /// Allocate `count` primary command buffers.
    pub fn allocate_command_buffers(&self, count: u32) -> Result<Vec<vk::CommandBuffer>> {
        let info = vk::CommandBufferAllocateInfo::default()
            .command_pool(self.pool)
            .command_buffer_count(count)
            .level(vk::CommandBufferLevel::PRIMARY);
        Ok(unsafe { self.device.allocate_command_buffers(&info)? })
    }

    /// Record `f` into a throwaway command buffer, submit it and block until
    /// the queue is idle.
    ///
    /// # Safety
    /// `queue` must come from this pool's family; `f` must record valid
    /// commands.
    pub unsafe fn execute_single_time<F>(&self, queue: vk::Queue, f: F) -> Result<()>
    where
        F: FnOnce(&ash::Device, vk::CommandBuffer),
    {
        let buffers = self.allocate_command_buffers(1)?;
        let outcome = buffers
            .first()
            .copied()
            .map_or(Ok(()), |cmd| {
                record(&self.device, cmd, vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT, f)?;
                Submission::new(&buffers).submit(&self.device, queue)?;
                self.device.queue_wait_idle(queue)?;
                Ok(())
            });
        self.device.free_command_buffers(self.pool, &buffers);
        outcome
    }
}

impl Drop for CommandPool {
    fn drop(&mut self) {
        unsafe { self.device.destroy_command_pool(self.pool, None) };
    }
}

/// Begin, run `f`, end.
///
/// # Safety
/// `cmd` must be in the initial state.
pub unsafe fn record<F>(
    device: &ash::Device,
    cmd: vk::CommandBuffer,
    flags: vk::CommandBufferUsageFlags,
    f: F,
) -> Result<()>
where
    F: FnOnce(&ash::Device, vk::CommandBuffer),
{
    begin_command_buffer(device, cmd, flags)?;
    f(device, cmd);
    end_command_buffer(device, cmd)
}

/// # Safety
/// `cmd` must be in the initial state.
pub unsafe fn begin_command_buffer(
    device: &ash::Device,
    cmd: vk::CommandBuffer,
    flags: vk::CommandBufferUsageFlags,
) -> Result<()> {
    device.begin_command_buffer(cmd, &vk::CommandBufferBeginInfo::default().flags(flags))?;
    Ok(())
}

/// # Safety
/// `cmd` must be recording.
pub unsafe fn end_command_buffer(device: &ash::Device, cmd: vk::CommandBuffer) -> Result<()> {
    device.end_command_buffer(cmd)?;
    Ok(())
}

/// One batch for `vkQueueSubmit`.
#[derive(Clone, Copy)]
pub struct Submission<'a> {
    commands: &'a [vk::CommandBuffer],
    wait: &'a [vk::Semaphore],
    wait_stages: &'a [vk::PipelineStageFlags],
    signal: &'a [vk::Semaphore],
    fence: vk::Fence,
}

impl<'a> Submission<'a> {
    pub const fn new(commands: &'a [vk::CommandBuffer]) -> Self {
        Self {
            commands,
            wait: &[],
            wait_stages: &[],
            signal: &[],
            fence: vk::Fence::null(),
        }
    }

    /// Wait on `semaphores`, each paired with the stage in `stages` at the
    /// same index.
    #[must_use]
    pub const fn waiting(
        mut self,
        semaphores: &'a [vk::Semaphore],
        stages: &'a [vk::PipelineStageFlags],
    ) -> Self {
        self.wait = semaphores;
        self.wait_stages = stages;
        self
    }

    #[must_use]
    pub const fn signaling(mut self, semaphores: &'a [vk::Semaphore]) -> Self {
        self.signal = semaphores;
        self
    }

    #[must_use]
    pub const fn fence(mut self, fence: vk::Fence) -> Self {
        self.fence = fence;
        self
    }

    /// # Safety
    /// Every handle must be valid and the command buffers fully recorded.
    pub unsafe fn submit(&self, device: &ash::Device, queue: vk::Queue) -> Result<()> {
        let info = vk::SubmitInfo::default()
            .wait_semaphores(self.wait)
            .wait_dst_stage_mask(self.wait_stages)
            .command_buffers(self.commands)
            .signal_semaphores(self.signal);
        device.queue_submit(queue, &[info], self.fence)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submission_defaults_to_no_sync() {
        let cmds = [vk::CommandBuffer::null()];
        let submission = Submission::new(&cmds);
        assert!(submission.wait.is_empty());
        assert!(submission.signal.is_empty());
        assert_eq!(submission.fence, vk::Fence::null());
    }

    #[test]
    fn submission_builder_sets_sync_objects() {
        let cmds = [vk::CommandBuffer::null()];
        let waits = [vk::Semaphore::null()];
        let stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let submission = Submission::new(&cmds)
            .waiting(&waits, &stages)
            .signaling(&waits);
        assert_eq!(submission.wait.len(), 1);
        assert_eq!(submission.wait_stages, &stages);
        assert_eq!(submission.signal.len(), 1);
    }
}
