use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};

use crate::renderer::material::MaterialProps;

/// Per-object matrices, one copy per frame slot (binding 0).
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub struct ObjectMatrices {
    pub model: Mat4,
    pub view: Mat4,
    pub proj: Mat4,
}

/// Per-draw push constants for the fragment stage. Positions carry a w of 1,
/// shininess rides in `specular.w`. Must stay within the 128-byte push budget
/// every device guarantees.
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub struct ShadingConstants {
    pub light_pos: Vec4,
    pub camera_pos: Vec4,
    pub ambient: Vec4,
    pub diffuse: Vec4,
    pub specular: Vec4,
    pub textured: u32,
    pub _pad: [u32; 3],
}

impl ShadingConstants {
    pub fn textured(light_pos: Vec3, camera_pos: Vec3) -> Self {
        Self {
            light_pos: light_pos.extend(1.0),
            camera_pos: camera_pos.extend(1.0),
            ambient: Vec4::ONE,
            diffuse: Vec4::ONE,
            specular: Vec4::ONE,
            textured: 1,
            _pad: [0; 3],
        }
    }

    pub fn material(light_pos: Vec3, camera_pos: Vec3, props: &MaterialProps) -> Self {
        Self {
            light_pos: light_pos.extend(1.0),
            camera_pos: camera_pos.extend(1.0),
            ambient: props.ambient.extend(1.0),
            diffuse: props.diffuse.extend(1.0),
            specular: props.specular.extend(props.shininess),
            textured: 0,
            _pad: [0; 3],
        }
    }
}

/// Light orbit around the scene origin, driven by seconds since startup.
pub fn orbit_light_position(elapsed_secs: f32) -> Vec3 {
    const ORBIT_RADIUS: f32 = 60.0;
    const ORBIT_HEIGHT: f32 = 40.0;
    const ORBIT_PERIOD_SECS: f32 = 8.0;

    let angle = elapsed_secs * std::f32::consts::TAU / ORBIT_PERIOD_SECS;
    Vec3::new(
        ORBIT_RADIUS * angle.cos(),
        ORBIT_HEIGHT,
        ORBIT_RADIUS * angle.sin(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::material::MaterialKind;

    #[test]
    fn shading_constants_fit_guaranteed_push_budget() {
        assert!(std::mem::size_of::<ShadingConstants>() <= 128);
        assert_eq!(std::mem::size_of::<ShadingConstants>() % 16, 0);
    }

    #[test]
    fn object_matrices_are_three_mat4() {
        assert_eq!(std::mem::size_of::<ObjectMatrices>(), 3 * 64);
    }

    #[test]
    fn material_constants_carry_shininess_in_w() {
        let props = MaterialKind::Gold.props();
        let pc = ShadingConstants::material(Vec3::ZERO, Vec3::ZERO, &props);
        assert_eq!(pc.specular.w, props.shininess);
        assert_eq!(pc.textured, 0);
    }

    #[test]
    fn orbit_light_stays_on_the_orbit() {
        for i in 0..32 {
            let p = orbit_light_position(i as f32 * 0.37);
            let radial = (p.x * p.x + p.z * p.z).sqrt();
            assert!((radial - 60.0).abs() < 1e-3);
            assert_eq!(p.y, 40.0);
        }
    }
}
