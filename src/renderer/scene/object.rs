use std::sync::Arc;

use ash::vk;
use bytemuck::bytes_of;
use color_eyre::Result;
use glam::Vec3;
use gpu_allocator::MemoryLocation;

use crate::renderer::camera::Camera;
use crate::renderer::device::RenderDevice;
use crate::renderer::material::MaterialKind;
use crate::renderer::resources::buffer::Buffer;
use crate::renderer::resources::model::Model;
use crate::renderer::resources::texture::Texture;
use crate::renderer::shader_data::{ObjectMatrices, ShadingConstants};

/// How an object is shaded. Holding the texture inside the variant makes
/// "textured" and "material" mutually exclusive by construction.
pub enum Shading {
    Textured(Texture),
    Material(MaterialKind),
}

impl Shading {
    pub fn is_textured(&self) -> bool {
        matches!(self, Shading::Textured(_))
    }
}

/// Pool sizes for exactly one object's per-frame descriptor sets: one uniform
/// buffer per slot, plus one combined image sampler per slot when textured.
pub fn descriptor_pool_sizes(textured: bool, frame_count: u32) -> Vec<vk::DescriptorPoolSize> {
    let mut sizes = vec![
        vk::DescriptorPoolSize::default()
            .ty(vk::DescriptorType::UNIFORM_BUFFER)
            .descriptor_count(frame_count),
    ];
    if textured {
        sizes.push(
            vk::DescriptorPoolSize::default()
                .ty(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                .descriptor_count(frame_count),
        );
    }
    sizes
}

/// One renderable thing in the scene: a model, its shading, a world position,
/// and per-frame-slot uniform buffers and descriptor sets. Each frame slot
/// owns its buffer and set exclusively, so updating slot i while the GPU
/// reads slot j cannot race.
pub struct SceneObject {
    model: Model,
    shading: Shading,
    position: Vec3,
    // Teardown order: texture (in `shading`), uniform buffers, then the pool.
    uniform_buffers: Vec<Buffer>,
    descriptor_sets: Vec<vk::DescriptorSet>,
    descriptor_pool: Option<DescriptorPool>,
}

impl SceneObject {
    pub fn new(model: Model, shading: Shading, position: Vec3) -> Self {
        Self {
            model,
            shading,
            position,
            uniform_buffers: Vec::new(),
            descriptor_sets: Vec::new(),
            descriptor_pool: None,
        }
    }

    pub fn is_textured(&self) -> bool {
        self.shading.is_textured()
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn frame_count(&self) -> usize {
        self.uniform_buffers.len()
    }

    /// One mapped uniform buffer per frame slot.
    pub fn create_uniform_buffers(&mut self, dev: &RenderDevice, frame_count: usize) -> Result<()> {
        let size = std::mem::size_of::<ObjectMatrices>() as u64;
        self.uniform_buffers = (0..frame_count)
            .map(|_| {
                dev.create_buffer(
                    size,
                    vk::BufferUsageFlags::UNIFORM_BUFFER,
                    MemoryLocation::CpuToGpu,
                    "object uniforms",
                )
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(())
    }

    /// Allocate a pool sized for exactly this object and write one set per
    /// frame slot against that slot's uniform buffer (plus the texture when
    /// present). Must run after [`Self::create_uniform_buffers`].
    pub fn create_descriptor_sets(
        &mut self,
        dev: &RenderDevice,
        layout: vk::DescriptorSetLayout,
    ) -> Result<()> {
        assert!(
            !self.uniform_buffers.is_empty(),
            "descriptor sets requested before uniform buffers exist"
        );
        let frame_count = self.uniform_buffers.len() as u32;

        let pool_sizes = descriptor_pool_sizes(self.is_textured(), frame_count);
        let pool = {
            let pool_info = vk::DescriptorPoolCreateInfo::default()
                .pool_sizes(&pool_sizes)
                .max_sets(frame_count);
            unsafe { dev.logical.create_descriptor_pool(&pool_info, None)? }
        };
        self.descriptor_pool = Some(DescriptorPool {
            pool,
            device: dev.logical.clone(),
        });

        let layouts = vec![layout; frame_count as usize];
        let alloc_info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(pool)
            .set_layouts(&layouts);
        self.descriptor_sets = unsafe { dev.logical.allocate_descriptor_sets(&alloc_info)? };

        let image_infos = match &self.shading {
            Shading::Textured(texture) => Some([texture.descriptor()]),
            Shading::Material(_) => None,
        };
        for (set, buffer) in self.descriptor_sets.iter().zip(&self.uniform_buffers) {
            let buffer_infos = [vk::DescriptorBufferInfo::default()
                .buffer(buffer.buffer)
                .offset(0)
                .range(std::mem::size_of::<ObjectMatrices>() as u64)];
            let mut writes = vec![
                vk::WriteDescriptorSet::default()
                    .dst_set(*set)
                    .dst_binding(0)
                    .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                    .buffer_info(&buffer_infos),
            ];
            if let Some(ref infos) = image_infos {
                writes.push(
                    vk::WriteDescriptorSet::default()
                        .dst_set(*set)
                        .dst_binding(1)
                        .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                        .image_info(infos),
                );
            }
            unsafe {
                dev.logical.update_descriptor_sets(&writes, &[]);
            }
        }

        Ok(())
    }

    /// Recompute model/view/projection and copy them into this frame slot's
    /// mapping. The slot is exclusively owned by the frame being recorded.
    pub fn update_uniform_buffer(&mut self, frame_index: usize, camera: &Camera) -> Result<()> {
        let matrices = ObjectMatrices {
            model: glam::Mat4::from_translation(self.position),
            view: camera.view_matrix(),
            proj: camera.projection(),
        };
        self.uniform_buffers[frame_index].write(bytes_of(&matrices), 0)
    }

    /// Bind this frame slot's descriptor set, push the shading constants, and
    /// draw the model. The pipeline for this shading variant must already be
    /// bound.
    pub fn draw(
        &self,
        cmd: vk::CommandBuffer,
        device: &ash::Device,
        pipeline_layout: vk::PipelineLayout,
        frame_index: usize,
        camera_pos: Vec3,
        light_pos: Vec3,
    ) {
        assert!(
            !self.descriptor_sets.is_empty(),
            "draw before descriptor sets were created"
        );

        let constants = match &self.shading {
            Shading::Textured(_) => ShadingConstants::textured(light_pos, camera_pos),
            Shading::Material(kind) => {
                ShadingConstants::material(light_pos, camera_pos, &kind.props())
            }
        };

        unsafe {
            device.cmd_bind_descriptor_sets(
                cmd,
                vk::PipelineBindPoint::GRAPHICS,
                pipeline_layout,
                0,
                &[self.descriptor_sets[frame_index]],
                &[],
            );
            device.cmd_push_constants(
                cmd,
                pipeline_layout,
                vk::ShaderStageFlags::FRAGMENT,
                0,
                bytes_of(&constants),
            );
        }
        self.model.draw(cmd, device);
    }
}

/// Owns the descriptor pool; destroying it frees every set allocated from it.
struct DescriptorPool {
    pool: vk::DescriptorPool,
    device: Arc<ash::Device>,
}

impl Drop for DescriptorPool {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_descriptor_pool(self.pool, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn material_pool_holds_only_uniform_buffers() {
        let sizes = descriptor_pool_sizes(false, 2);
        assert_eq!(sizes.len(), 1);
        assert_eq!(sizes[0].ty, vk::DescriptorType::UNIFORM_BUFFER);
        assert_eq!(sizes[0].descriptor_count, 2);
    }

    #[test]
    fn textured_pool_adds_one_sampler_per_frame_slot() {
        let sizes = descriptor_pool_sizes(true, 2);
        assert_eq!(sizes.len(), 2);
        assert_eq!(sizes[1].ty, vk::DescriptorType::COMBINED_IMAGE_SAMPLER);
        assert_eq!(sizes[1].descriptor_count, 2);
    }

    #[test]
    fn shading_variants_are_mutually_exclusive() {
        assert!(!Shading::Material(MaterialKind::Gold).is_textured());
        // a Textured variant cannot exist without a Texture, and a Material
        // variant cannot carry one
    }
}
