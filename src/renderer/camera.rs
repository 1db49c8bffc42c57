use glam::{Mat4, Vec3};

use crate::renderer::config::RendererConfig;

/// Pitch is kept just shy of +-90 degrees so the forward vector never
/// degenerates against the world up axis.
const PITCH_LIMIT_DEG: f32 = 89.9;

/// Fly camera: yaw/pitch orientation, strafe/elevate movement, cached
/// perspective projection recomputed on resize.
pub struct Camera {
    position: Vec3,
    yaw_deg: f32,
    pitch_deg: f32,
    forward: Vec3,
    world_up: Vec3,

    fov_y_deg: f32,
    near_clip: f32,
    far_clip: f32,
    projection: Mat4,
}

impl Camera {
    pub fn new(config: &RendererConfig, position: Vec3) -> Self {
        let mut camera = Self {
            position,
            yaw_deg: -90.0,
            pitch_deg: 0.0,
            forward: Vec3::NEG_Z,
            world_up: Vec3::Y,

            fov_y_deg: config.fov_y_deg,
            near_clip: config.near_clip,
            far_clip: config.far_clip,
            projection: Mat4::IDENTITY,
        };
        camera.look_at(Vec3::ZERO);
        camera
    }

    /// Aim at a world point by resetting yaw and pitch.
    pub fn look_at(&mut self, target: Vec3) {
        if target == self.position {
            return;
        }
        let dir = (target - self.position).normalize();
        self.pitch_deg = dir
            .y
            .clamp(-1.0, 1.0)
            .asin()
            .to_degrees()
            .clamp(-PITCH_LIMIT_DEG, PITCH_LIMIT_DEG);
        self.yaw_deg = dir.z.atan2(dir.x).to_degrees();
        self.forward = direction_from_angles(self.yaw_deg, self.pitch_deg);
    }

    /// Strafe along the camera-local right vector by `dx` and elevate along
    /// world up by `dy`. This never dollies along the view direction.
    pub fn move_by(&mut self, dx: f32, dy: f32) {
        let right = self.forward.cross(self.world_up).normalize();
        self.position += right * dx + self.world_up * dy;
    }

    /// Accumulate yaw (unclamped) and pitch (clamped), then rebuild the
    /// forward direction from the spherical angles.
    pub fn rotate_by(&mut self, d_yaw_deg: f32, d_pitch_deg: f32) {
        self.yaw_deg += d_yaw_deg;
        self.pitch_deg = (self.pitch_deg + d_pitch_deg).clamp(-PITCH_LIMIT_DEG, PITCH_LIMIT_DEG);
        self.forward = direction_from_angles(self.yaw_deg, self.pitch_deg);
    }

    /// Recompute the perspective projection for a new surface size. Must be
    /// called on every resize; the Y flip moves clip space to Vulkan's
    /// downward Y.
    pub fn set_screen_size(&mut self, width: u32, height: u32) {
        let aspect = width as f32 / height as f32;
        let mut proj = Mat4::perspective_rh(
            self.fov_y_deg.to_radians(),
            aspect,
            self.near_clip,
            self.far_clip,
        );
        proj.y_axis.y *= -1.0;
        self.projection = proj;
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_to_rh(self.position, self.forward, self.world_up)
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn forward(&self) -> Vec3 {
        self.forward
    }

    pub fn pitch_deg(&self) -> f32 {
        self.pitch_deg
    }
}

fn direction_from_angles(yaw_deg: f32, pitch_deg: f32) -> Vec3 {
    let (yaw, pitch) = (yaw_deg.to_radians(), pitch_deg.to_radians());
    Vec3::new(
        yaw.cos() * pitch.cos(),
        pitch.sin(),
        yaw.sin() * pitch.cos(),
    )
    .normalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_camera() -> Camera {
        Camera::new(&RendererConfig::default(), Vec3::new(0.0, 25.0, 180.0))
    }

    #[test]
    fn pitch_stays_clamped_through_any_rotation_sequence() {
        let mut camera = test_camera();
        let deltas = [15.0, -400.0, 89.0, 1000.0, -3.5, 77.7, -1e6, 1e6];
        for (i, d) in deltas.iter().cycle().take(64).enumerate() {
            camera.rotate_by(i as f32 * 13.0, *d);
            assert!(camera.pitch_deg() >= -PITCH_LIMIT_DEG);
            assert!(camera.pitch_deg() <= PITCH_LIMIT_DEG);
        }
    }

    #[test]
    fn forward_is_always_a_unit_vector() {
        let mut camera = test_camera();
        for i in 0..100 {
            camera.rotate_by(i as f32 * 7.3, (i as f32 * 3.1) - 50.0);
            assert!((camera.forward().length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn full_yaw_turn_restores_the_direction() {
        let mut camera = test_camera();
        let before = camera.forward();
        camera.rotate_by(360.0, 0.0);
        assert!(before.distance(camera.forward()) < 1e-4);
    }

    #[test]
    fn same_screen_size_produces_bit_identical_projection() {
        let mut camera = test_camera();
        camera.set_screen_size(1280, 720);
        let first = camera.projection().to_cols_array().map(f32::to_bits);
        camera.set_screen_size(1280, 720);
        let second = camera.projection().to_cols_array().map(f32::to_bits);
        assert_eq!(first, second);
    }

    #[test]
    fn projection_flips_y_for_vulkan() {
        let mut camera = test_camera();
        camera.set_screen_size(800, 600);
        assert!(camera.projection().y_axis.y < 0.0);
    }

    #[test]
    fn move_strafes_and_elevates_without_dolly() {
        let mut camera = test_camera();
        camera.rotate_by(0.0, -camera.pitch_deg()); // flatten pitch
        let before = camera.position();
        camera.move_by(2.0, 3.0);
        let delta = camera.position() - before;
        assert!((delta.y - 3.0).abs() < 1e-5);
        // strafe axis is perpendicular to forward
        let strafe = Vec3::new(delta.x, 0.0, delta.z);
        assert!(strafe.dot(camera.forward()).abs() < 1e-4);
    }
}
