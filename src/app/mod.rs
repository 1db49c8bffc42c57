mod camera_controller;
mod input_state;

use std::path::Path;
use std::sync::Arc;

use color_eyre::{Report, Result};
use glam::Vec3;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowId};

use crate::app::camera_controller::CameraController;
use crate::app::input_state::{InputState, WindowSignal};
use crate::renderer::Renderer;
use crate::renderer::config::RendererConfig;
use crate::renderer::material::MaterialKind;
use crate::renderer::scene::{ModelSource, ShadingSource};

const MODEL_PATH: &str = "assets/models/viking_room.obj";
const TEXTURE_PATH: &str = "assets/textures/viking_room.png";

/// Window/event-loop driver. Window callbacks only enqueue signals; the frame
/// loop drains them at the frame boundary, then draws.
pub struct App {
    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,
    input: InputState,
    controller: CameraController,
    close_requested: bool,
    fatal: Option<Report>,
}

impl App {
    pub fn run() -> Result<()> {
        let event_loop = EventLoop::new()?;
        let mut app = App {
            window: None,
            renderer: None,
            input: InputState::default(),
            controller: CameraController::new(),
            close_requested: false,
            fatal: None,
        };
        event_loop.run_app(&mut app)?;

        match app.fatal.take() {
            Some(report) => Err(report),
            None => Ok(()),
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window = Arc::new(
            event_loop.create_window(Window::default_attributes().with_title("vantage"))?,
        );
        self.window = Some(window.clone());

        let mut renderer = Renderer::new(RendererConfig::default(), window)?;
        build_scene(&mut renderer)?;
        self.renderer = Some(renderer);
        Ok(())
    }

    /// Drain the signal queue in arrival order: resizes go to the renderer,
    /// everything else to the camera controller.
    fn drain_input(&mut self) {
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };
        for signal in self.input.drain() {
            match signal {
                WindowSignal::Resized { .. } => renderer.request_resize(),
                other => self.controller.apply(other, renderer.scene_mut()),
            }
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, report: Report) {
        self.fatal = Some(report);
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(report) = self.init(event_loop) {
            self.fail(event_loop, report);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = self.window.as_ref() else {
            return;
        };
        if window_id != window.id() {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                self.close_requested = true;
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                self.close_requested = true;
            }
            WindowEvent::ScaleFactorChanged { .. } => {
                let size = window.inner_size();
                self.input.push(WindowSignal::Resized {
                    width: size.width,
                    height: size.height,
                });
            }
            WindowEvent::RedrawRequested => {
                self.drain_input();
                if let Some(renderer) = self.renderer.as_mut() {
                    if let Err(report) = renderer.draw_frame() {
                        self.fail(event_loop, report);
                    }
                }
            }
            other => self.input.record(&other),
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.close_requested {
            event_loop.exit();
            return;
        }
        if let Some(window) = self.window.as_ref() {
            window.request_redraw();
        }
    }
}

/// The demo scene: the textured viking room at the origin, flanked by one
/// quad per material finish.
fn build_scene(renderer: &mut Renderer) -> Result<()> {
    renderer.create_object(
        ModelSource::Obj(Path::new(MODEL_PATH)),
        ShadingSource::Texture(Path::new(TEXTURE_PATH)),
        Vec3::ZERO,
    )?;
    renderer.create_object(
        ModelSource::Quad { extent: 30.0 },
        ShadingSource::Material(MaterialKind::Gold),
        Vec3::new(-45.0, 30.0, 0.0),
    )?;
    renderer.create_object(
        ModelSource::Quad { extent: 30.0 },
        ShadingSource::Material(MaterialKind::Emerald),
        Vec3::new(0.0, 60.0, 0.0),
    )?;
    renderer.create_object(
        ModelSource::Quad { extent: 30.0 },
        ShadingSource::Material(MaterialKind::Plastic),
        Vec3::new(45.0, 30.0, 0.0),
    )?;
    renderer.finish_scene_setup()
}
