use std::ffi::CStr;

/// Immutable renderer configuration, built once by the app and passed by
/// reference into instance and device construction.
pub struct RendererConfig {
    pub enable_validation: bool,
    pub validation_layers: &'static [&'static CStr],
    pub device_extensions: &'static [&'static CStr],
    pub frames_in_flight: usize,
    pub clear_color: [f32; 4],
    pub fov_y_deg: f32,
    pub near_clip: f32,
    pub far_clip: f32,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            enable_validation: cfg!(debug_assertions),
            validation_layers: &[c"VK_LAYER_KHRONOS_validation"],
            device_extensions: &[ash::khr::swapchain::NAME],
            frames_in_flight: 2,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            fov_y_deg: 45.0,
            near_clip: 0.1,
            far_clip: 10_000.0,
        }
    }
}
