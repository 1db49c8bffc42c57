use std::path::Path;

use ash::vk;
use color_eyre::Result;

use crate::renderer::device::RenderDevice;
use crate::renderer::resources::buffer::Buffer;
use crate::renderer::resources::mesh::MeshData;

/// Immutable device-local vertex and index buffers for one mesh, populated
/// once through the staging pattern at load time.
pub struct Model {
    vertex_buffer: Buffer,
    index_buffer: Buffer,
    index_count: u32,
}

impl Model {
    pub fn load_from_file(path: &Path, dev: &RenderDevice) -> Result<Self> {
        let mesh = MeshData::load_obj(path)?;
        Self::from_mesh(&mesh, dev)
    }

    pub fn from_mesh(mesh: &MeshData, dev: &RenderDevice) -> Result<Self> {
        let vertex_buffer = Buffer::new_device_local(
            dev,
            bytemuck::cast_slice(&mesh.vertices),
            vk::BufferUsageFlags::VERTEX_BUFFER,
            "vertex buffer",
        )?;
        let index_buffer = Buffer::new_device_local(
            dev,
            bytemuck::cast_slice(&mesh.indices),
            vk::BufferUsageFlags::INDEX_BUFFER,
            "index buffer",
        )?;

        Ok(Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
        })
    }

    /// Bind both buffers and issue the indexed draw. Pipeline state and
    /// descriptor sets must already be bound.
    pub fn draw(&self, cmd: vk::CommandBuffer, device: &ash::Device) {
        unsafe {
            device.cmd_bind_vertex_buffers(cmd, 0, &[self.vertex_buffer.buffer], &[0]);
            device.cmd_bind_index_buffer(cmd, self.index_buffer.buffer, 0, vk::IndexType::UINT32);
            device.cmd_draw_indexed(cmd, self.index_count, 1, 0, 0, 0);
        }
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }
}
