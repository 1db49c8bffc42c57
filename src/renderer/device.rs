use std::sync::{Arc, Mutex};

use ash::vk;
use color_eyre::Result;
use color_eyre::eyre::eyre;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};

use crate::renderer::config::RendererConfig;
use crate::renderer::error::RendererError;
use crate::renderer::instance::RenderInstance;
use crate::renderer::resources::buffer::Buffer;

/// Queue family indices covering rendering and presentation. The two may
/// name the same family.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct QueueFamilies {
    pub graphics: u32,
    pub present: u32,
}

impl QueueFamilies {
    pub fn unique(&self) -> Vec<u32> {
        if self.graphics == self.present {
            vec![self.graphics]
        } else {
            vec![self.graphics, self.present]
        }
    }
}

/// Logical execution context over the selected accelerator: queues, command
/// pool for one-shot submissions, and the GPU memory allocator. Owns every
/// other GPU object transitively; created once, destroyed last.
pub struct RenderDevice {
    pub physical: vk::PhysicalDevice,
    pub logical: Arc<ash::Device>,
    pub families: QueueFamilies,
    pub graphics_queue: vk::Queue,
    pub present_queue: vk::Queue,
    pub limits: vk::PhysicalDeviceLimits,
    command_pool: vk::CommandPool,

    // Declaration order matters: the allocator releases its memory blocks
    // before `device_owner` destroys the logical device.
    allocator: Arc<Mutex<Allocator>>,
    device_owner: DeviceOwner,

    instance: ash::Instance,
}

impl RenderDevice {
    pub fn new(config: &RendererConfig, instance: &RenderInstance) -> Result<Self> {
        let (physical, families) = Self::select_physical_device(config, instance)?;

        let properties = unsafe { instance.instance.get_physical_device_properties(physical) };
        log::info!(
            "Selected device: {:?}",
            properties.device_name_as_c_str().unwrap_or(c"<unnamed>")
        );

        let logical = Self::create_logical_device(config, instance, physical, families)?;
        let logical = Arc::new(logical);

        let graphics_queue = unsafe { logical.get_device_queue(families.graphics, 0) };
        let present_queue = unsafe { logical.get_device_queue(families.present, 0) };

        let command_pool = {
            let pool_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(families.graphics)
                .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);
            unsafe { logical.create_command_pool(&pool_info, None)? }
        };

        let allocator = Allocator::new(&AllocatorCreateDesc {
            instance: instance.instance.clone(),
            device: (*logical).clone(),
            physical_device: physical,
            debug_settings: gpu_allocator::AllocatorDebugSettings {
                log_leaks_on_shutdown: true,
                ..Default::default()
            },
            buffer_device_address: false,
            allocation_sizes: Default::default(),
        })?;

        Ok(Self {
            physical,
            logical: logical.clone(),
            families,
            graphics_queue,
            present_queue,
            limits: properties.limits,
            command_pool,
            allocator: Arc::new(Mutex::new(allocator)),
            device_owner: DeviceOwner(logical),
            instance: instance.instance.clone(),
        })
    }

    pub fn allocator(&self) -> Arc<Mutex<Allocator>> {
        self.allocator.clone()
    }

    /// Convenience over [`Buffer::new`] with this device's allocator.
    pub fn create_buffer(
        &self,
        size: u64,
        usage: vk::BufferUsageFlags,
        location: gpu_allocator::MemoryLocation,
        name: &str,
    ) -> Result<Buffer> {
        Buffer::new(size, usage, location, name, self.allocator(), self.logical.clone())
    }

    /// Record and synchronously execute commands outside the frame loop.
    /// Allocates a transient command buffer, runs `f` on it, submits on the
    /// graphics queue, and blocks on a fence until the GPU finishes. Setup
    /// path only; never called while frames are in flight.
    pub fn one_shot_commands<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(vk::CommandBuffer, &ash::Device) -> Result<()>,
    {
        let cmd = {
            let alloc_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(self.command_pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);
            unsafe { self.logical.allocate_command_buffers(&alloc_info)?[0] }
        };

        let begin_info = vk::CommandBufferBeginInfo::default()
            .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
        unsafe {
            self.logical.begin_command_buffer(cmd, &begin_info)?;
        }

        f(cmd, &self.logical)?;

        unsafe {
            self.logical.end_command_buffer(cmd)?;
        }

        let fence = unsafe {
            self.logical
                .create_fence(&vk::FenceCreateInfo::default(), None)?
        };
        let cmds = [cmd];
        let submit = vk::SubmitInfo::default().command_buffers(&cmds);
        unsafe {
            self.logical
                .queue_submit(self.graphics_queue, &[submit], fence)?;
            self.logical.wait_for_fences(&[fence], true, u64::MAX)?;
            self.logical.destroy_fence(fence, None);
            self.logical.free_command_buffers(self.command_pool, &cmds);
        }

        Ok(())
    }

    pub fn allocate_command_buffers(&self, count: u32) -> Result<Vec<vk::CommandBuffer>> {
        let alloc_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(self.command_pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(count);
        Ok(unsafe { self.logical.allocate_command_buffers(&alloc_info)? })
    }

    /// First candidate format whose optimal-tiling features cover `features`.
    pub fn find_supported_format(
        &self,
        candidates: &[vk::Format],
        features: vk::FormatFeatureFlags,
    ) -> Result<vk::Format> {
        candidates
            .iter()
            .copied()
            .find(|format| {
                let props = unsafe {
                    self.instance
                        .get_physical_device_format_properties(self.physical, *format)
                };
                props.optimal_tiling_features.contains(features)
            })
            .ok_or_else(|| eyre!("No candidate format supports {:?}", features))
    }

    pub fn wait_idle(&self) {
        unsafe {
            let _ = self.logical.device_wait_idle();
        }
    }

    fn select_physical_device(
        config: &RendererConfig,
        instance: &RenderInstance,
    ) -> Result<(vk::PhysicalDevice, QueueFamilies)> {
        let devices = unsafe { instance.instance.enumerate_physical_devices()? };

        for device in devices {
            let Some(families) = Self::find_queue_families(instance, device)? else {
                continue;
            };
            if !Self::supports_device_extensions(config, instance, device)? {
                continue;
            }
            if !Self::surface_is_adequate(instance, device)? {
                continue;
            }
            let features = unsafe { instance.instance.get_physical_device_features(device) };
            if features.sampler_anisotropy != vk::TRUE {
                continue;
            }
            return Ok((device, families));
        }

        Err(RendererError::NoSuitableDevice.into())
    }

    fn find_queue_families(
        instance: &RenderInstance,
        device: vk::PhysicalDevice,
    ) -> Result<Option<QueueFamilies>> {
        let props = unsafe {
            instance
                .instance
                .get_physical_device_queue_family_properties(device)
        };
        let present_support = (0..props.len() as u32)
            .map(|i| unsafe {
                instance.surface_loader.get_physical_device_surface_support(
                    device,
                    i,
                    instance.surface,
                )
            })
            .collect::<Result<Vec<bool>, _>>()?;

        Ok(pick_queue_families(&props, &present_support))
    }

    fn supports_device_extensions(
        config: &RendererConfig,
        instance: &RenderInstance,
        device: vk::PhysicalDevice,
    ) -> Result<bool> {
        let available = unsafe {
            instance
                .instance
                .enumerate_device_extension_properties(device)?
        };

        let all_present = config.device_extensions.iter().all(|req| {
            available
                .iter()
                .filter_map(|props| props.extension_name_as_c_str().ok())
                .any(|ext| ext == *req)
        });

        Ok(all_present)
    }

    fn surface_is_adequate(instance: &RenderInstance, device: vk::PhysicalDevice) -> Result<bool> {
        let formats = unsafe {
            instance
                .surface_loader
                .get_physical_device_surface_formats(device, instance.surface)?
        };
        let present_modes = unsafe {
            instance
                .surface_loader
                .get_physical_device_surface_present_modes(device, instance.surface)?
        };
        Ok(!formats.is_empty() && !present_modes.is_empty())
    }

    fn create_logical_device(
        config: &RendererConfig,
        instance: &RenderInstance,
        physical: vk::PhysicalDevice,
        families: QueueFamilies,
    ) -> Result<ash::Device> {
        let queue_priorities = [1.0];
        let queue_create_infos = families
            .unique()
            .into_iter()
            .map(|family| {
                vk::DeviceQueueCreateInfo::default()
                    .queue_family_index(family)
                    .queue_priorities(&queue_priorities)
            })
            .collect::<Vec<_>>();

        let enabled_extension_names = config
            .device_extensions
            .iter()
            .map(|ext| ext.as_ptr())
            .collect::<Vec<_>>();
        let enabled_features = vk::PhysicalDeviceFeatures::default().sampler_anisotropy(true);

        let device_create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(&queue_create_infos)
            .enabled_extension_names(&enabled_extension_names)
            .enabled_features(&enabled_features);

        Ok(unsafe {
            instance
                .instance
                .create_device(physical, &device_create_info, None)?
        })
    }
}

impl Drop for RenderDevice {
    fn drop(&mut self) {
        self.wait_idle();
        unsafe {
            self.logical.destroy_command_pool(self.command_pool, None);
        }
    }
}

/// Destroys the logical device after every field declared before it (the
/// allocator in particular) has been dropped.
struct DeviceOwner(Arc<ash::Device>);

impl Drop for DeviceOwner {
    fn drop(&mut self) {
        unsafe {
            self.0.destroy_device(None);
        }
    }
}

/// First family supporting graphics and first supporting presentation; the
/// device qualifies only when both exist.
fn pick_queue_families(
    props: &[vk::QueueFamilyProperties],
    present_support: &[bool],
) -> Option<QueueFamilies> {
    let graphics = props
        .iter()
        .position(|q| q.queue_flags.contains(vk::QueueFlags::GRAPHICS))?;
    let present = present_support.iter().position(|supported| *supported)?;
    Some(QueueFamilies {
        graphics: graphics as u32,
        present: present as u32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family(flags: vk::QueueFlags) -> vk::QueueFamilyProperties {
        vk::QueueFamilyProperties {
            queue_flags: flags,
            queue_count: 1,
            ..Default::default()
        }
    }

    #[test]
    fn graphics_and_present_may_share_a_family() {
        let props = [family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE)];
        let families = pick_queue_families(&props, &[true]).unwrap();
        assert_eq!(families.graphics, 0);
        assert_eq!(families.present, 0);
        assert_eq!(families.unique(), vec![0]);
    }

    #[test]
    fn split_families_are_both_reported() {
        let props = [
            family(vk::QueueFlags::GRAPHICS),
            family(vk::QueueFlags::TRANSFER),
        ];
        let families = pick_queue_families(&props, &[false, true]).unwrap();
        assert_eq!(families.graphics, 0);
        assert_eq!(families.present, 1);
        assert_eq!(families.unique(), vec![0, 1]);
    }

    #[test]
    fn missing_presentation_support_disqualifies() {
        let props = [family(vk::QueueFlags::GRAPHICS)];
        assert!(pick_queue_families(&props, &[false]).is_none());
    }

    #[test]
    fn missing_graphics_support_disqualifies() {
        let props = [family(vk::QueueFlags::COMPUTE)];
        assert!(pick_queue_families(&props, &[true]).is_none());
    }
}
