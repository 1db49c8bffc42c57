use std::sync::Arc;

use ash::vk;
use color_eyre::Result;

use crate::renderer::device::RenderDevice;
use crate::renderer::instance::RenderInstance;
use crate::renderer::resources::image::Image;

/// The set of presentable images and the depth buffer matching the current
/// surface extent. Image count and extent are fixed for the lifetime of the
/// object; a resize drops the whole thing and builds a new one.
pub struct Swapchain {
    pub handle: vk::SwapchainKHR,
    pub loader: ash::khr::swapchain::Device,
    pub format: vk::Format,
    pub present_mode: vk::PresentModeKHR,
    pub extent: vk::Extent2D,
    pub images: Vec<vk::Image>,
    pub image_views: Vec<vk::ImageView>,
    pub depth: Image,
    device: Arc<ash::Device>,
}

impl Swapchain {
    pub fn new(
        instance: &RenderInstance,
        dev: &RenderDevice,
        window_extent: vk::Extent2D,
    ) -> Result<Self> {
        let capabilities = unsafe {
            instance
                .surface_loader
                .get_physical_device_surface_capabilities(dev.physical, instance.surface)?
        };
        let formats = unsafe {
            instance
                .surface_loader
                .get_physical_device_surface_formats(dev.physical, instance.surface)?
        };
        let present_modes = unsafe {
            instance
                .surface_loader
                .get_physical_device_surface_present_modes(dev.physical, instance.surface)?
        };

        let surface_format = choose_surface_format(&formats);
        let present_mode = choose_present_mode(&present_modes);
        let extent = choose_extent(&capabilities, window_extent);
        let image_count = choose_image_count(&capabilities);
        log::info!(
            "Swapchain: {:?} {:?} {}x{}, {} images",
            surface_format.format,
            present_mode,
            extent.width,
            extent.height,
            image_count
        );

        let pre_transform = if capabilities
            .supported_transforms
            .contains(vk::SurfaceTransformFlagsKHR::IDENTITY)
        {
            vk::SurfaceTransformFlagsKHR::IDENTITY
        } else {
            capabilities.current_transform
        };

        let loader = ash::khr::swapchain::Device::new(&instance.instance, &dev.logical);
        let queue_family_indices = dev.families.unique();
        let mut swapchain_info = vk::SwapchainCreateInfoKHR::default()
            .surface(instance.surface)
            .min_image_count(image_count)
            .image_format(surface_format.format)
            .image_color_space(surface_format.color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .pre_transform(pre_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(present_mode)
            .clipped(true);
        // Distinct graphics/present families share the images concurrently,
        // a single family keeps exclusive access.
        swapchain_info = if queue_family_indices.len() > 1 {
            swapchain_info
                .image_sharing_mode(vk::SharingMode::CONCURRENT)
                .queue_family_indices(&queue_family_indices)
        } else {
            swapchain_info.image_sharing_mode(vk::SharingMode::EXCLUSIVE)
        };

        let handle = unsafe { loader.create_swapchain(&swapchain_info, None)? };

        let images = unsafe { loader.get_swapchain_images(handle)? };
        let image_views = images
            .iter()
            .map(|image| {
                let view_info = vk::ImageViewCreateInfo::default()
                    .image(*image)
                    .view_type(vk::ImageViewType::TYPE_2D)
                    .format(surface_format.format)
                    .subresource_range(vk::ImageSubresourceRange {
                        aspect_mask: vk::ImageAspectFlags::COLOR,
                        base_mip_level: 0,
                        level_count: 1,
                        base_array_layer: 0,
                        layer_count: 1,
                    });
                unsafe { dev.logical.create_image_view(&view_info, None) }
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let depth_format = dev.find_supported_format(
            &[
                vk::Format::D32_SFLOAT,
                vk::Format::D32_SFLOAT_S8_UINT,
                vk::Format::D24_UNORM_S8_UINT,
            ],
            vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT,
        )?;
        let depth = Image::new_depth(extent.width, extent.height, depth_format, dev)?;

        Ok(Self {
            handle,
            loader,
            format: surface_format.format,
            present_mode,
            extent,
            images,
            image_views,
            depth,
            device: dev.logical.clone(),
        })
    }

    pub fn image_count(&self) -> u32 {
        self.images.len() as u32
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        unsafe {
            for view in self.image_views.drain(..) {
                self.device.destroy_image_view(view, None);
            }
            self.loader.destroy_swapchain(self.handle, None);
        }
        // presentable images belong to the swapchain; only the depth image
        // (dropped with `self.depth`) is ours
    }
}

/// Prefer 8-bit-per-channel sRGB in the display-referred color space, fall
/// back to whatever the surface lists first.
pub fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> vk::SurfaceFormatKHR {
    formats
        .iter()
        .copied()
        .find(|f| {
            f.format == vk::Format::B8G8R8A8_SRGB
                && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
        })
        .unwrap_or(formats[0])
}

/// Mailbox when available for lowest latency, otherwise the always-present
/// blocking vsync.
pub fn choose_present_mode(present_modes: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
    if present_modes.contains(&vk::PresentModeKHR::MAILBOX) {
        vk::PresentModeKHR::MAILBOX
    } else {
        vk::PresentModeKHR::FIFO
    }
}

/// The device-reported extent, unless it reports "follow the window"
/// (u32::MAX), in which case the framebuffer size clamped to the surface
/// bounds.
pub fn choose_extent(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    window_extent: vk::Extent2D,
) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        capabilities.current_extent
    } else {
        vk::Extent2D {
            width: window_extent.width.clamp(
                capabilities.min_image_extent.width,
                capabilities.max_image_extent.width,
            ),
            height: window_extent.height.clamp(
                capabilities.min_image_extent.height,
                capabilities.max_image_extent.height,
            ),
        }
    }
}

/// One more than the minimum so the driver never makes acquire wait on its
/// internal bookkeeping, capped at the reported maximum (0 = unlimited).
pub fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let desired = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 {
        desired.min(capabilities.max_image_count)
    } else {
        desired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capabilities(min: u32, max: u32) -> vk::SurfaceCapabilitiesKHR {
        vk::SurfaceCapabilitiesKHR {
            min_image_count: min,
            max_image_count: max,
            ..Default::default()
        }
    }

    #[test]
    fn image_count_is_min_plus_one_within_the_cap() {
        assert_eq!(choose_image_count(&capabilities(1, 3)), 2);
        assert_eq!(choose_image_count(&capabilities(2, 3)), 3);
    }

    #[test]
    fn image_count_caps_at_the_reported_maximum() {
        assert_eq!(choose_image_count(&capabilities(3, 3)), 3);
    }

    #[test]
    fn zero_maximum_means_unlimited() {
        assert_eq!(choose_image_count(&capabilities(3, 0)), 4);
    }

    #[test]
    fn srgb_bgra_is_preferred_when_listed() {
        let formats = [
            vk::SurfaceFormatKHR {
                format: vk::Format::R16G16B16A16_SFLOAT,
                color_space: vk::ColorSpaceKHR::EXTENDED_SRGB_LINEAR_EXT,
            },
            vk::SurfaceFormatKHR {
                format: vk::Format::B8G8R8A8_SRGB,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
        ];
        assert_eq!(choose_surface_format(&formats), formats[1]);
    }

    #[test]
    fn first_format_is_the_fallback() {
        let formats = [
            vk::SurfaceFormatKHR {
                format: vk::Format::R8G8B8A8_UNORM,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
            vk::SurfaceFormatKHR {
                format: vk::Format::B8G8R8A8_UNORM,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
        ];
        assert_eq!(choose_surface_format(&formats), formats[0]);
    }

    #[test]
    fn mailbox_wins_and_fifo_is_the_fallback() {
        assert_eq!(
            choose_present_mode(&[
                vk::PresentModeKHR::FIFO,
                vk::PresentModeKHR::MAILBOX,
                vk::PresentModeKHR::IMMEDIATE,
            ]),
            vk::PresentModeKHR::MAILBOX
        );
        assert_eq!(
            choose_present_mode(&[vk::PresentModeKHR::FIFO, vk::PresentModeKHR::IMMEDIATE]),
            vk::PresentModeKHR::FIFO
        );
    }

    #[test]
    fn device_reported_extent_is_authoritative() {
        let caps = vk::SurfaceCapabilitiesKHR {
            current_extent: vk::Extent2D {
                width: 640,
                height: 480,
            },
            ..Default::default()
        };
        let extent = choose_extent(
            &caps,
            vk::Extent2D {
                width: 1920,
                height: 1080,
            },
        );
        assert_eq!((extent.width, extent.height), (640, 480));
    }

    #[test]
    fn follow_the_window_clamps_to_surface_bounds() {
        let caps = vk::SurfaceCapabilitiesKHR {
            current_extent: vk::Extent2D {
                width: u32::MAX,
                height: u32::MAX,
            },
            min_image_extent: vk::Extent2D {
                width: 200,
                height: 200,
            },
            max_image_extent: vk::Extent2D {
                width: 1000,
                height: 1000,
            },
            ..Default::default()
        };
        let extent = choose_extent(
            &caps,
            vk::Extent2D {
                width: 1920,
                height: 100,
            },
        );
        assert_eq!((extent.width, extent.height), (1000, 200));
    }
}
