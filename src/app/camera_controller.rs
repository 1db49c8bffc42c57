use glam::Vec2;
use winit::event::MouseButton;

use crate::app::input_state::WindowSignal;
use crate::renderer::scene::Scene;

/// Turns drained window signals into camera calls: left-drag rotates,
/// right-drag strafes and elevates. Button and cursor state live here, fed
/// strictly in arrival order.
pub struct CameraController {
    rotate_sensitivity: f32,
    move_sensitivity: f32,

    cursor: Option<Vec2>,
    left_down: bool,
    right_down: bool,
}

impl CameraController {
    pub fn new() -> Self {
        Self {
            rotate_sensitivity: 0.2,
            move_sensitivity: 0.15,
            cursor: None,
            left_down: false,
            right_down: false,
        }
    }

    pub fn apply(&mut self, signal: WindowSignal, scene: &mut Scene) {
        match signal {
            WindowSignal::MouseButton { button, pressed } => match button {
                MouseButton::Left => self.left_down = pressed,
                MouseButton::Right => self.right_down = pressed,
                _ => {}
            },
            WindowSignal::CursorMoved(pos) => {
                let delta = match self.cursor {
                    Some(prev) => pos - prev,
                    None => Vec2::ZERO,
                };
                self.cursor = Some(pos);

                // Screen y grows downward; dragging up pitches or lifts up.
                if self.left_down {
                    scene.rotate_camera(
                        delta.x * self.rotate_sensitivity,
                        -delta.y * self.rotate_sensitivity,
                    );
                } else if self.right_down {
                    scene.move_camera(
                        delta.x * self.move_sensitivity,
                        -delta.y * self.move_sensitivity,
                    );
                }
            }
            WindowSignal::Resized { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::camera::Camera;
    use crate::renderer::config::RendererConfig;
    use glam::Vec3;

    fn scene() -> Scene {
        Scene::new(Camera::new(
            &RendererConfig::default(),
            Vec3::new(0.0, 25.0, 180.0),
        ))
    }

    fn moved(x: f32, y: f32) -> WindowSignal {
        WindowSignal::CursorMoved(Vec2::new(x, y))
    }

    fn button(button: MouseButton, pressed: bool) -> WindowSignal {
        WindowSignal::MouseButton { button, pressed }
    }

    #[test]
    fn motion_without_a_button_is_ignored() {
        let mut controller = CameraController::new();
        let mut scene = scene();
        let pos = scene.camera().position();
        let fwd = scene.camera().forward();

        controller.apply(moved(10.0, 10.0), &mut scene);
        controller.apply(moved(90.0, 40.0), &mut scene);

        assert_eq!(scene.camera().position(), pos);
        assert_eq!(scene.camera().forward(), fwd);
    }

    #[test]
    fn left_drag_rotates_and_release_stops_it() {
        let mut controller = CameraController::new();
        let mut scene = scene();
        let fwd = scene.camera().forward();

        controller.apply(moved(100.0, 100.0), &mut scene);
        controller.apply(button(MouseButton::Left, true), &mut scene);
        controller.apply(moved(150.0, 100.0), &mut scene);
        assert_ne!(scene.camera().forward(), fwd);

        controller.apply(button(MouseButton::Left, false), &mut scene);
        let fwd = scene.camera().forward();
        controller.apply(moved(300.0, 300.0), &mut scene);
        assert_eq!(scene.camera().forward(), fwd);
    }

    #[test]
    fn right_drag_moves_without_turning() {
        let mut controller = CameraController::new();
        let mut scene = scene();
        let pos = scene.camera().position();
        let fwd = scene.camera().forward();

        controller.apply(moved(100.0, 100.0), &mut scene);
        controller.apply(button(MouseButton::Right, true), &mut scene);
        // Upward drag (decreasing screen y) lifts the camera.
        controller.apply(moved(100.0, 60.0), &mut scene);

        assert!(scene.camera().position().y > pos.y);
        assert_eq!(scene.camera().forward(), fwd);
    }

    #[test]
    fn first_cursor_report_produces_no_jump() {
        let mut controller = CameraController::new();
        let mut scene = scene();
        let fwd = scene.camera().forward();

        controller.apply(button(MouseButton::Left, true), &mut scene);
        controller.apply(moved(999.0, 999.0), &mut scene);
        assert_eq!(scene.camera().forward(), fwd);
    }
}
