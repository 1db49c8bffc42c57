use std::sync::Arc;

use ash::vk;
use color_eyre::Result;

use crate::renderer::device::RenderDevice;

/// Per-frame-slot synchronization and recording state. Each slot's resources
/// are exclusively owned by that slot; two slots bound the CPU's lead over
/// the GPU.
pub struct FrameSlot {
    /// Signaled by acquire, gates the color-attachment-output stage.
    pub image_available: vk::Semaphore,
    /// Signaled by the submitted command buffer, gates presentation.
    pub render_finished: vk::Semaphore,
    /// Signaled when the slot's previous submission has fully executed.
    /// Created signaled so the first wait falls through.
    pub in_flight: vk::Fence,
    pub command_buffer: vk::CommandBuffer,

    device: Arc<ash::Device>,
}

impl FrameSlot {
    pub fn new(dev: &RenderDevice, command_buffer: vk::CommandBuffer) -> Result<Self> {
        let device = dev.logical.clone();
        let image_available =
            unsafe { device.create_semaphore(&vk::SemaphoreCreateInfo::default(), None)? };
        let render_finished =
            unsafe { device.create_semaphore(&vk::SemaphoreCreateInfo::default(), None)? };
        let in_flight = unsafe {
            device.create_fence(
                &vk::FenceCreateInfo::default().flags(vk::FenceCreateFlags::SIGNALED),
                None,
            )?
        };

        Ok(Self {
            image_available,
            render_finished,
            in_flight,
            command_buffer,
            device,
        })
    }
}

impl Drop for FrameSlot {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_semaphore(self.image_available, None);
            self.device.destroy_semaphore(self.render_finished, None);
            self.device.destroy_fence(self.in_flight, None);
        }
        // the command buffer goes down with the device's pool
    }
}

/// What an image-acquire attempt means for the frame about to be recorded.
#[derive(Debug, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// Record and submit against this image.
    Ready(u32),
    /// Usable, but the surface changed underneath; draw, then rebuild.
    Suboptimal(u32),
    /// The swapchain no longer matches the surface. Rebuild, draw nothing.
    Stale,
}

impl AcquireOutcome {
    pub fn from_result(result: std::result::Result<(u32, bool), vk::Result>) -> Result<Self> {
        match result {
            Ok((image_index, false)) => Ok(Self::Ready(image_index)),
            Ok((image_index, true)) => Ok(Self::Suboptimal(image_index)),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(Self::Stale),
            Err(e) => Err(e.into()),
        }
    }
}

/// What a present attempt means for the next frame boundary.
#[derive(Debug, PartialEq, Eq)]
pub enum PresentOutcome {
    Presented,
    /// Stale or suboptimal; rebuild before the next acquire.
    RebuildNeeded,
}

impl PresentOutcome {
    pub fn from_result(result: std::result::Result<bool, vk::Result>) -> Result<Self> {
        match result {
            Ok(false) => Ok(Self::Presented),
            Ok(true) => Ok(Self::RebuildNeeded),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(Self::RebuildNeeded),
            Err(e) => Err(e.into()),
        }
    }
}

/// Round-robin advance through the frame slots.
pub fn next_frame_index(current: usize, frames_in_flight: usize) -> usize {
    (current + 1) % frames_in_flight
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_maps_the_two_recoverable_codes() {
        assert_eq!(
            AcquireOutcome::from_result(Ok((3, false))).unwrap(),
            AcquireOutcome::Ready(3)
        );
        assert_eq!(
            AcquireOutcome::from_result(Ok((1, true))).unwrap(),
            AcquireOutcome::Suboptimal(1)
        );
        assert_eq!(
            AcquireOutcome::from_result(Err(vk::Result::ERROR_OUT_OF_DATE_KHR)).unwrap(),
            AcquireOutcome::Stale
        );
    }

    #[test]
    fn acquire_propagates_everything_else() {
        assert!(AcquireOutcome::from_result(Err(vk::Result::ERROR_DEVICE_LOST)).is_err());
        assert!(AcquireOutcome::from_result(Err(vk::Result::ERROR_SURFACE_LOST_KHR)).is_err());
    }

    #[test]
    fn present_maps_suboptimal_and_stale_to_rebuild() {
        assert_eq!(
            PresentOutcome::from_result(Ok(false)).unwrap(),
            PresentOutcome::Presented
        );
        assert_eq!(
            PresentOutcome::from_result(Ok(true)).unwrap(),
            PresentOutcome::RebuildNeeded
        );
        assert_eq!(
            PresentOutcome::from_result(Err(vk::Result::ERROR_OUT_OF_DATE_KHR)).unwrap(),
            PresentOutcome::RebuildNeeded
        );
        assert!(PresentOutcome::from_result(Err(vk::Result::ERROR_DEVICE_LOST)).is_err());
    }

    #[test]
    fn frame_index_cycles_through_both_slots() {
        assert_eq!(next_frame_index(0, 2), 1);
        assert_eq!(next_frame_index(1, 2), 0);
    }
}
