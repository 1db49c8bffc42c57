use std::sync::{Arc, Mutex};

use ash::vk;
use color_eyre::Result;
use color_eyre::eyre::eyre;
use gpu_allocator::MemoryLocation;
use gpu_allocator::vulkan::{
    Allocation, AllocationCreateDesc, AllocationScheme, Allocator,
};

use crate::renderer::device::RenderDevice;
use crate::renderer::error::RendererError;

/// A GPU buffer and its backing memory, released together. `CpuToGpu`
/// allocations are persistently mapped and written through [`Buffer::write`];
/// `GpuOnly` buffers are filled once via [`Buffer::new_device_local`].
pub struct Buffer {
    pub buffer: vk::Buffer,
    pub size: u64,

    allocation: Option<Allocation>,
    memory_allocator: Arc<Mutex<Allocator>>,
    device: Arc<ash::Device>,
}

impl Buffer {
    pub fn new(
        size: u64,
        usage: vk::BufferUsageFlags,
        location: MemoryLocation,
        name: &str,
        memory_allocator: Arc<Mutex<Allocator>>,
        device: Arc<ash::Device>,
    ) -> Result<Self> {
        let buffer = {
            let buffer_info = vk::BufferCreateInfo::default()
                .size(size)
                .usage(usage)
                .sharing_mode(vk::SharingMode::EXCLUSIVE);
            unsafe { device.create_buffer(&buffer_info, None)? }
        };

        let requirements = unsafe { device.get_buffer_memory_requirements(buffer) };
        let allocation = memory_allocator
            .lock()
            .map_err(|e| eyre!(e.to_string()))?
            .allocate(&AllocationCreateDesc {
                name,
                requirements,
                location,
                linear: true,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            })
            .map_err(|e| match e {
                gpu_allocator::AllocationError::OutOfMemory => {
                    color_eyre::Report::from(RendererError::OutOfDeviceMemory { size })
                }
                other => other.into(),
            })?;

        unsafe {
            device.bind_buffer_memory(buffer, allocation.memory(), allocation.offset())?;
        }

        Ok(Self {
            buffer,
            size,
            allocation: Some(allocation),
            memory_allocator,
            device,
        })
    }

    /// Device-local buffer populated through the staging pattern: write the
    /// bytes into a host-visible staging buffer, then one-shot copy them into
    /// the destination. The staging buffer dies on return.
    pub fn new_device_local(
        dev: &RenderDevice,
        data: &[u8],
        usage: vk::BufferUsageFlags,
        name: &str,
    ) -> Result<Self> {
        let size = data.len() as u64;

        let mut staging = Buffer::new(
            size,
            vk::BufferUsageFlags::TRANSFER_SRC,
            MemoryLocation::CpuToGpu,
            "staging",
            dev.allocator(),
            dev.logical.clone(),
        )?;
        staging.write(data, 0)?;

        let buffer = Buffer::new(
            size,
            usage | vk::BufferUsageFlags::TRANSFER_DST,
            MemoryLocation::GpuOnly,
            name,
            dev.allocator(),
            dev.logical.clone(),
        )?;

        dev.one_shot_commands(|cmd, device| {
            let region = vk::BufferCopy::default().size(size);
            unsafe {
                device.cmd_copy_buffer(cmd, staging.buffer, buffer.buffer, &[region]);
            }
            Ok(())
        })?;

        Ok(buffer)
    }

    /// Copy `data` into the persistent mapping at `offset` bytes.
    pub fn write(&mut self, data: &[u8], offset: usize) -> Result<()> {
        let allocation = self
            .allocation
            .as_mut()
            .expect("Allocation does not exist");
        let mapped = allocation
            .mapped_slice_mut()
            .ok_or_else(|| eyre!("Cannot write to buffer that is not host-visible"))?;

        let end = offset + data.len();
        if end > mapped.len() {
            return Err(eyre!("Data too large to write into buffer"));
        }
        mapped[offset..end].copy_from_slice(data);

        Ok(())
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        let allocation = self
            .allocation
            .take()
            .expect("Allocation does not exist");
        self.memory_allocator
            .lock()
            .expect("Failed to acquire lock for memory allocator")
            .free(allocation)
            .expect("Failed to free buffer memory");
        unsafe {
            self.device.destroy_buffer(self.buffer, None);
        }
    }
}
