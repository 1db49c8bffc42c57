use std::path::Path;
use std::sync::Arc;

use ash::vk;
use color_eyre::Result;

use crate::renderer::device::RenderDevice;
use crate::renderer::error::RendererError;
use crate::renderer::resources::image::Image;

/// A sampled 2D texture: device-local image, view, and sampler, plus the
/// combined image+sampler descriptor the shader binds. Immutable after
/// construction.
pub struct Texture {
    image: Image,
    sampler: vk::Sampler,
    descriptor: vk::DescriptorImageInfo,
    device: Arc<ash::Device>,
}

impl Texture {
    /// Decode an image file to tightly packed RGBA8 and upload it through the
    /// staging pattern.
    pub fn create_from_file(path: &Path, dev: &RenderDevice) -> Result<Self> {
        let decoded = image::open(path).map_err(|source| RendererError::TextureLoad {
            path: path.display().to_string(),
            source,
        })?;
        let pixels = decoded.to_rgba8();
        let (width, height) = pixels.dimensions();
        log::info!("Loaded texture {:?} ({}x{})", path, width, height);

        Self::from_rgba8(width, height, pixels.as_raw(), dev)
    }

    pub fn from_rgba8(width: u32, height: u32, pixels: &[u8], dev: &RenderDevice) -> Result<Self> {
        let image = Image::new_sampled_color(width, height, pixels, dev)?;
        let sampler = Self::create_sampler(dev)?;

        let descriptor = vk::DescriptorImageInfo::default()
            .image_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
            .image_view(image.view)
            .sampler(sampler);

        Ok(Self {
            image,
            sampler,
            descriptor,
            device: dev.logical.clone(),
        })
    }

    fn create_sampler(dev: &RenderDevice) -> Result<vk::Sampler> {
        let sampler_info = vk::SamplerCreateInfo::default()
            .mag_filter(vk::Filter::LINEAR)
            .min_filter(vk::Filter::LINEAR)
            .mipmap_mode(vk::SamplerMipmapMode::LINEAR)
            .address_mode_u(vk::SamplerAddressMode::REPEAT)
            .address_mode_v(vk::SamplerAddressMode::REPEAT)
            .address_mode_w(vk::SamplerAddressMode::REPEAT)
            .anisotropy_enable(true)
            .max_anisotropy(dev.limits.max_sampler_anisotropy)
            .border_color(vk::BorderColor::FLOAT_OPAQUE_WHITE)
            .compare_op(vk::CompareOp::NEVER);

        Ok(unsafe { dev.logical.create_sampler(&sampler_info, None)? })
    }

    pub fn descriptor(&self) -> vk::DescriptorImageInfo {
        self.descriptor
    }

    pub fn extent(&self) -> vk::Extent3D {
        self.image.extent
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_sampler(self.sampler, None);
        }
        // image + view + memory go down with `self.image`
    }
}
