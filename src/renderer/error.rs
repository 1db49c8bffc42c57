use ash::vk;
use thiserror::Error;

/// Setup and programming errors surfaced by the renderer. Everything here is
/// fatal: setup failures unwind to `main`, invariant violations are defects.
/// Stale/suboptimal swapchain results are recovered internally and never
/// appear as an error.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("no physical device covers graphics + presentation with the required extensions")]
    NoSuitableDevice,

    #[error("device memory allocation of {size} bytes failed")]
    OutOfDeviceMemory { size: u64 },

    #[error("no transition masks for image layout pair {old:?} -> {new:?}")]
    UnsupportedTransition {
        old: vk::ImageLayout,
        new: vk::ImageLayout,
    },

    #[error("failed to decode texture {path}: {source}")]
    TextureLoad {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to load mesh {path}: {source}")]
    MeshLoad {
        path: String,
        #[source]
        source: tobj::LoadError,
    },

    #[error("failed to read shader binary {path}: {source}")]
    ShaderLoad {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("required instance extension {0} is not available")]
    MissingInstanceExtension(String),
}
