use std::path::Path;
use std::sync::Arc;

use ash::vk;
use color_eyre::Result;

use crate::renderer::error::RendererError;

const SHADERS_DIR: &str = "shaders-built";

/// Vertex + fragment shader modules for one pipeline. The SPIR-V blobs are
/// consumed verbatim; dropped once the pipeline holds them.
pub struct GraphicsShader {
    pub vert_mod: vk::ShaderModule,
    pub frag_mod: vk::ShaderModule,
    device: Arc<ash::Device>,
}

impl GraphicsShader {
    pub fn new(vert_name: &str, frag_name: &str, device: Arc<ash::Device>) -> Result<Self> {
        let vert_mod = create_shader_module(
            format!("{}/{}.vert.spv", SHADERS_DIR, vert_name).as_ref(),
            &device,
        )?;
        let frag_mod = create_shader_module(
            format!("{}/{}.frag.spv", SHADERS_DIR, frag_name).as_ref(),
            &device,
        )?;
        Ok(Self {
            vert_mod,
            frag_mod,
            device,
        })
    }
}

impl Drop for GraphicsShader {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_shader_module(self.vert_mod, None);
            self.device.destroy_shader_module(self.frag_mod, None);
        }
    }
}

fn create_shader_module(filepath: &Path, device: &ash::Device) -> Result<vk::ShaderModule> {
    let load_error = |source| RendererError::ShaderLoad {
        path: filepath.display().to_string(),
        source,
    };
    let mut file = std::fs::File::open(filepath).map_err(load_error)?;
    let code = ash::util::read_spv(&mut file).map_err(load_error)?;

    let shader_module_info = vk::ShaderModuleCreateInfo::default().code(&code);

    let shader_module = unsafe { device.create_shader_module(&shader_module_info, None)? };

    Ok(shader_module)
}
