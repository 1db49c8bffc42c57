pub mod object;

use std::path::Path;

use ash::vk;
use color_eyre::Result;
use glam::Vec3;
use slotmap::SlotMap;

use crate::renderer::camera::Camera;
use crate::renderer::device::RenderDevice;
use crate::renderer::material::MaterialKind;
use crate::renderer::pipeline::ScenePipelines;
use crate::renderer::resources::mesh::MeshData;
use crate::renderer::resources::model::Model;
use crate::renderer::resources::texture::Texture;
use crate::renderer::scene::object::{SceneObject, Shading};

slotmap::new_key_type! {
    pub struct SceneObjectKey;
}

/// Where an object's mesh comes from.
pub enum ModelSource<'a> {
    Obj(&'a Path),
    /// Built-in quad of the given edge length, facing +Z.
    Quad { extent: f32 },
}

/// Where an object's shading comes from. Mirrors [`Shading`] before the
/// texture has been loaded.
pub enum ShadingSource<'a> {
    Texture(&'a Path),
    Material(MaterialKind),
}

/// Owns every scene object (keyed, uniqueness enforced by the map) plus the
/// draw-order list and the camera. Objects never outlive the scene, and the
/// scene is torn down before the device.
pub struct Scene {
    objects: SlotMap<SceneObjectKey, SceneObject>,
    draw_order: Vec<SceneObjectKey>,
    camera: Camera,
}

impl Scene {
    pub fn new(camera: Camera) -> Self {
        Self {
            objects: SlotMap::with_key(),
            draw_order: Vec::new(),
            camera,
        }
    }

    /// Load, position, and register one object. Ownership transfers to the
    /// scene; the returned key addresses it from then on.
    pub fn create_object(
        &mut self,
        dev: &RenderDevice,
        model: ModelSource,
        shading: ShadingSource,
        position: Vec3,
        frame_count: usize,
    ) -> Result<SceneObjectKey> {
        let model = match model {
            ModelSource::Obj(path) => Model::load_from_file(path, dev)?,
            ModelSource::Quad { extent } => Model::from_mesh(&MeshData::quad(extent), dev)?,
        };
        let shading = match shading {
            ShadingSource::Texture(path) => Shading::Textured(Texture::create_from_file(path, dev)?),
            ShadingSource::Material(kind) => Shading::Material(kind),
        };

        let mut object = SceneObject::new(model, shading, position);
        object.create_uniform_buffers(dev, frame_count)?;

        let key = self.objects.insert(object);
        self.draw_order.push(key);
        Ok(key)
    }

    /// Allocate and write every object's descriptor sets. Must run after the
    /// last `create_object` and before the first frame.
    pub fn create_descriptor_sets(
        &mut self,
        dev: &RenderDevice,
        pipelines: &ScenePipelines,
    ) -> Result<()> {
        for object in self.objects.values_mut() {
            let layout = pipelines.variant(object.is_textured()).set_layout;
            object.create_descriptor_sets(dev, layout)?;
        }
        Ok(())
    }

    /// Refresh every object's uniform buffer for the frame slot about to be
    /// recorded.
    pub fn update_uniform_buffers(&mut self, frame_index: usize) -> Result<()> {
        for object in self.objects.values_mut() {
            object.update_uniform_buffer(frame_index, &self.camera)?;
        }
        Ok(())
    }

    /// Record every object in draw order, binding the pipeline variant its
    /// shading requires.
    pub fn draw(
        &self,
        cmd: vk::CommandBuffer,
        device: &ash::Device,
        pipelines: &ScenePipelines,
        frame_index: usize,
        light_pos: Vec3,
    ) {
        for key in &self.draw_order {
            let object = &self.objects[*key];
            let variant = pipelines.variant(object.is_textured());
            unsafe {
                device.cmd_bind_pipeline(cmd, vk::PipelineBindPoint::GRAPHICS, variant.pipeline);
            }
            object.draw(
                cmd,
                device,
                variant.layout,
                frame_index,
                self.camera.position(),
                light_pos,
            );
        }
    }

    pub fn move_camera(&mut self, dx: f32, dy: f32) {
        self.camera.move_by(dx, dy);
    }

    pub fn rotate_camera(&mut self, d_yaw_deg: f32, d_pitch_deg: f32) {
        self.camera.rotate_by(d_yaw_deg, d_pitch_deg);
    }

    pub fn set_screen_size(&mut self, width: u32, height: u32) {
        self.camera.set_screen_size(width, height);
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn object_count(&self) -> usize {
        self.draw_order.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::config::RendererConfig;

    fn empty_scene() -> Scene {
        let camera = Camera::new(&RendererConfig::default(), Vec3::new(0.0, 25.0, 180.0));
        Scene::new(camera)
    }

    #[test]
    fn camera_calls_are_forwarded() {
        let mut scene = empty_scene();
        let before = scene.camera().position();
        scene.move_camera(1.0, 2.0);
        assert_ne!(scene.camera().position(), before);

        scene.rotate_camera(0.0, 1.0e6);
        assert!(scene.camera().pitch_deg() < 90.0);
    }

    #[test]
    fn screen_size_reaches_the_projection() {
        let mut scene = empty_scene();
        scene.set_screen_size(1024, 768);
        let first = scene.camera().projection();
        scene.set_screen_size(2048, 768);
        assert_ne!(scene.camera().projection(), first);
    }
}
