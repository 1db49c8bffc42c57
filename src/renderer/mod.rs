pub mod camera;
pub mod config;
pub mod device;
pub mod error;
pub mod frame;
pub mod instance;
pub mod material;
pub mod pipeline;
pub mod resources;
pub mod scene;
pub mod shader_data;
pub mod swapchain;

use std::sync::Arc;
use std::time::Instant;

use ash::vk;
use color_eyre::Result;
use glam::Vec3;
use winit::window::Window;

use crate::renderer::camera::Camera;
use crate::renderer::config::RendererConfig;
use crate::renderer::device::RenderDevice;
use crate::renderer::frame::{AcquireOutcome, FrameSlot, PresentOutcome, next_frame_index};
use crate::renderer::instance::RenderInstance;
use crate::renderer::pipeline::{Framebuffers, ScenePipelines};
use crate::renderer::scene::{ModelSource, Scene, SceneObjectKey, ShadingSource};
use crate::renderer::shader_data::orbit_light_position;
use crate::renderer::swapchain::Swapchain;

/// Everything keyed to the current surface extent. Rebuilt wholesale on
/// resize; absent while the window reports zero size. Framebuffers reference
/// the swapchain's views, so they are declared (and dropped) first.
struct SurfaceState {
    framebuffers: Framebuffers,
    swapchain: Swapchain,
}

/// Owns the full GPU state and runs the per-frame orchestration. Declaration
/// order is teardown order: the scene and frame slots go before the surface,
/// the surface before the pipelines, everything before the device, and the
/// device before the instance.
pub struct Renderer {
    scene: Scene,
    frames: Vec<FrameSlot>,
    frame_index: usize,
    resize_pending: bool,
    start_time: Instant,

    surface: Option<SurfaceState>,
    pipelines: ScenePipelines,
    device: RenderDevice,
    instance: RenderInstance,

    window: Arc<Window>,
    config: RendererConfig,
}

impl Renderer {
    pub fn new(config: RendererConfig, window: Arc<Window>) -> Result<Self> {
        let instance = RenderInstance::new(&config, &window)?;
        let device = RenderDevice::new(&config, &instance)?;

        let size = window.inner_size();
        let swapchain = Swapchain::new(
            &instance,
            &device,
            vk::Extent2D {
                width: size.width,
                height: size.height,
            },
        )?;

        let pipelines = ScenePipelines::new(&device, swapchain.format, swapchain.depth.format)?;
        let framebuffers = Framebuffers::new(&device, pipelines.render_pass, &swapchain)?;

        let command_buffers = device.allocate_command_buffers(config.frames_in_flight as u32)?;
        let frames = command_buffers
            .into_iter()
            .map(|cmd| FrameSlot::new(&device, cmd))
            .collect::<Result<Vec<_>>>()?;

        let mut camera = Camera::new(&config, Vec3::new(0.0, 25.0, 180.0));
        camera.set_screen_size(swapchain.extent.width, swapchain.extent.height);
        let scene = Scene::new(camera);

        Ok(Self {
            scene,
            frames,
            frame_index: 0,
            resize_pending: false,
            start_time: Instant::now(),
            surface: Some(SurfaceState {
                framebuffers,
                swapchain,
            }),
            pipelines,
            device,
            instance,
            window,
            config,
        })
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// Load and register one scene object. Setup path.
    pub fn create_object(
        &mut self,
        model: ModelSource,
        shading: ShadingSource,
        position: Vec3,
    ) -> Result<SceneObjectKey> {
        self.scene
            .create_object(&self.device, model, shading, position, self.config.frames_in_flight)
    }

    /// Allocate every object's descriptor sets. Must run after the last
    /// `create_object` and before the first `draw_frame`.
    pub fn finish_scene_setup(&mut self) -> Result<()> {
        self.scene.create_descriptor_sets(&self.device, &self.pipelines)
    }

    /// Note a resize. The swapchain is rebuilt at the next frame boundary,
    /// never mid-frame.
    pub fn request_resize(&mut self) {
        self.resize_pending = true;
    }

    /// One frame: wait on this slot's fence, acquire, record, submit,
    /// present, advance. A stale acquire rebuilds the swapchain and submits
    /// nothing.
    pub fn draw_frame(&mut self) -> Result<()> {
        if self.resize_pending {
            self.rebuild_surface()?;
        }
        // Zero-sized window: nothing to render into until the next resize.
        let Some(surface) = self.surface.as_ref() else {
            return Ok(());
        };

        let slot = &self.frames[self.frame_index];
        let device = &self.device.logical;
        unsafe {
            device.wait_for_fences(&[slot.in_flight], true, u64::MAX)?;
        }

        let acquire = unsafe {
            surface.swapchain.loader.acquire_next_image(
                surface.swapchain.handle,
                u64::MAX,
                slot.image_available,
                vk::Fence::null(),
            )
        };
        let image_index = match AcquireOutcome::from_result(acquire)? {
            AcquireOutcome::Ready(i) => i,
            AcquireOutcome::Suboptimal(i) => {
                // Still usable; draw this frame and rebuild at the present
                // boundary.
                self.resize_pending = true;
                i
            }
            AcquireOutcome::Stale => {
                self.rebuild_surface()?;
                return Ok(());
            }
        };

        unsafe {
            device.reset_fences(&[slot.in_flight])?;
            device.reset_command_buffer(slot.command_buffer, vk::CommandBufferResetFlags::empty())?;
        }

        self.scene.update_uniform_buffers(self.frame_index)?;
        let elapsed = self.start_time.elapsed().as_secs_f32();
        self.record_commands(slot.command_buffer, surface, image_index, elapsed)?;

        let wait_semaphores = [slot.image_available];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let command_buffers = [slot.command_buffer];
        let signal_semaphores = [slot.render_finished];
        let submit = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);
        unsafe {
            device.queue_submit(self.device.graphics_queue, &[submit], slot.in_flight)?;
        }

        let swapchains = [surface.swapchain.handle];
        let image_indices = [image_index];
        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&signal_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);
        let present = unsafe {
            surface
                .swapchain
                .loader
                .queue_present(self.device.present_queue, &present_info)
        };
        if PresentOutcome::from_result(present)? == PresentOutcome::RebuildNeeded {
            self.resize_pending = true;
        }

        self.frame_index = next_frame_index(self.frame_index, self.config.frames_in_flight);
        Ok(())
    }

    fn record_commands(
        &self,
        cmd: vk::CommandBuffer,
        surface: &SurfaceState,
        image_index: u32,
        elapsed: f32,
    ) -> Result<()> {
        let device = &self.device.logical;
        let extent = surface.swapchain.extent;

        unsafe {
            device.begin_command_buffer(cmd, &vk::CommandBufferBeginInfo::default())?;
        }

        let clear_values = [
            vk::ClearValue {
                color: vk::ClearColorValue {
                    float32: self.config.clear_color,
                },
            },
            vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue {
                    depth: 1.0,
                    stencil: 0,
                },
            },
        ];
        let render_pass_info = vk::RenderPassBeginInfo::default()
            .render_pass(self.pipelines.render_pass)
            .framebuffer(surface.framebuffers.get(image_index))
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent,
            })
            .clear_values(&clear_values);

        let viewports = [vk::Viewport::default()
            .width(extent.width as f32)
            .height(extent.height as f32)
            .max_depth(1.0)];
        let scissors = [vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent,
        }];

        unsafe {
            device.cmd_begin_render_pass(cmd, &render_pass_info, vk::SubpassContents::INLINE);
            device.cmd_set_viewport(cmd, 0, &viewports);
            device.cmd_set_scissor(cmd, 0, &scissors);
        }

        self.scene.draw(
            cmd,
            device,
            &self.pipelines,
            self.frame_index,
            orbit_light_position(elapsed),
        );

        unsafe {
            device.cmd_end_render_pass(cmd);
            device.end_command_buffer(cmd)?;
        }

        Ok(())
    }

    /// The resize protocol: skip while the window reports zero size, wait for
    /// the device to go idle, destroy the old swapchain and framebuffers,
    /// build new ones, and tell the camera about the new extent.
    fn rebuild_surface(&mut self) -> Result<()> {
        self.device.wait_idle();
        self.surface = None;

        let size = self.window.inner_size();
        if size.width == 0 || size.height == 0 {
            // Stay pending; retried at the next frame boundary.
            return Ok(());
        }

        let swapchain = Swapchain::new(
            &self.instance,
            &self.device,
            vk::Extent2D {
                width: size.width,
                height: size.height,
            },
        )?;
        let framebuffers = Framebuffers::new(&self.device, self.pipelines.render_pass, &swapchain)?;

        self.scene
            .set_screen_size(swapchain.extent.width, swapchain.extent.height);
        self.surface = Some(SurfaceState {
            framebuffers,
            swapchain,
        });
        self.resize_pending = false;
        Ok(())
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        // Nothing may still be executing when the fields start tearing down.
        self.device.wait_idle();
    }
}
