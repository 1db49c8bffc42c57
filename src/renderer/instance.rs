use std::ffi::{CStr, c_char, c_void};
use std::sync::Arc;

use ash::vk;
use color_eyre::Result;
use color_eyre::eyre::eyre;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use winit::window::Window;

use crate::renderer::config::RendererConfig;
use crate::renderer::error::RendererError;

/// Initializes Vulkan and keeps the instance, debug messenger, and
/// presentation surface alive. Dropped last; the surface goes before the
/// instance, the instance before the entry.
pub struct RenderInstance {
    pub surface: vk::SurfaceKHR,
    pub surface_loader: ash::khr::surface::Instance,
    debug_utils: Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,
    pub instance: ash::Instance,
    _entry: ash::Entry,
}

impl RenderInstance {
    pub fn new(config: &RendererConfig, window: &Arc<Window>) -> Result<Self> {
        let entry = unsafe { ash::Entry::load()? };

        let instance = Self::create_instance(config, &entry, window)?;

        let debug_utils = if config.enable_validation {
            Some(Self::create_debug_utils_messenger(&entry, &instance)?)
        } else {
            None
        };

        let surface = unsafe {
            ash_window::create_surface(
                &entry,
                &instance,
                window.display_handle()?.as_raw(),
                window.window_handle()?.as_raw(),
                None,
            )?
        };
        let surface_loader = ash::khr::surface::Instance::new(&entry, &instance);

        Ok(Self {
            surface,
            surface_loader,
            debug_utils,
            instance,
            _entry: entry,
        })
    }

    fn create_instance(
        config: &RendererConfig,
        entry: &ash::Entry,
        window: &Arc<Window>,
    ) -> Result<ash::Instance> {
        if config.enable_validation {
            Self::check_validation_layers_supported(config, entry)?;
        }

        let required_extensions = Self::required_instance_extensions(config, window)?;
        Self::check_instance_extensions_available(entry, &required_extensions)?;

        let application_info = vk::ApplicationInfo::default().api_version(vk::API_VERSION_1_0);
        let enabled_layer_names = if config.enable_validation {
            config
                .validation_layers
                .iter()
                .map(|layer| layer.as_ptr())
                .collect::<Vec<*const c_char>>()
        } else {
            Vec::new()
        };
        let enabled_extension_names = required_extensions
            .iter()
            .map(|ext| ext.as_ptr())
            .collect::<Vec<*const c_char>>();
        let instance_info = vk::InstanceCreateInfo::default()
            .application_info(&application_info)
            .enabled_layer_names(&enabled_layer_names)
            .enabled_extension_names(&enabled_extension_names);

        Ok(unsafe { entry.create_instance(&instance_info, None)? })
    }

    fn create_debug_utils_messenger(
        entry: &ash::Entry,
        instance: &ash::Instance,
    ) -> Result<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)> {
        let debug_utils_loader = ash::ext::debug_utils::Instance::new(entry, instance);
        let debug_utils_info = debug_utils_messenger_create_info();
        let debug_utils_messenger = unsafe {
            debug_utils_loader.create_debug_utils_messenger(&debug_utils_info, None)?
        };
        Ok((debug_utils_loader, debug_utils_messenger))
    }

    fn required_instance_extensions(
        config: &RendererConfig,
        window: &Arc<Window>,
    ) -> Result<Vec<&'static CStr>> {
        let mut exts = ash_window::enumerate_required_extensions(
            window.display_handle()?.as_raw(),
        )?
        .iter()
        .map(|ext| unsafe { CStr::from_ptr(*ext) })
        .collect::<Vec<_>>();

        if config.enable_validation {
            exts.push(ash::ext::debug_utils::NAME);
        }

        Ok(exts)
    }

    fn check_instance_extensions_available(
        entry: &ash::Entry,
        required: &[&'static CStr],
    ) -> Result<()> {
        let available = unsafe { entry.enumerate_instance_extension_properties(None)? };

        for req in required {
            let found = available
                .iter()
                .filter_map(|props| props.extension_name_as_c_str().ok())
                .any(|ext| ext == *req);
            if !found {
                return Err(RendererError::MissingInstanceExtension(
                    req.to_string_lossy().into_owned(),
                )
                .into());
            }
        }

        Ok(())
    }

    fn check_validation_layers_supported(
        config: &RendererConfig,
        entry: &ash::Entry,
    ) -> Result<()> {
        let supported_layers = unsafe {
            entry
                .enumerate_instance_layer_properties()?
                .iter()
                .map(|props| props.layer_name_as_c_str().map(CStr::to_owned))
                .collect::<Result<Vec<_>, _>>()?
        };

        for layer in config.validation_layers {
            if !supported_layers.iter().any(|l| l.as_c_str() == *layer) {
                return Err(eyre!("Validation layer {:?} not supported", layer));
            }
        }

        Ok(())
    }
}

impl Drop for RenderInstance {
    fn drop(&mut self) {
        unsafe {
            self.surface_loader.destroy_surface(self.surface, None);
            if let Some((loader, messenger)) = self.debug_utils.take() {
                loader.destroy_debug_utils_messenger(messenger, None);
            }
            self.instance.destroy_instance(None);
        }
    }
}

fn debug_utils_messenger_create_info() -> vk::DebugUtilsMessengerCreateInfoEXT<'static> {
    let message_severity = vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE
        | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
        | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR;
    let message_type = vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
        | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
        | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE;
    vk::DebugUtilsMessengerCreateInfoEXT::default()
        .message_severity(message_severity)
        .message_type(message_type)
        .pfn_user_callback(Some(debug_callback))
}

unsafe extern "system" fn debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _p_user_data: *mut c_void,
) -> vk::Bool32 {
    let msg_type = match message_type {
        vk::DebugUtilsMessageTypeFlagsEXT::GENERAL => "[General]",
        vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE => "[Performance]",
        vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION => "[Validation]",
        _ => "[Unknown]",
    };
    let msg = unsafe { CStr::from_ptr((*p_callback_data).p_message) };
    match message_severity {
        vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE => {
            log::trace!("{} {:?}", msg_type, msg);
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::INFO => {
            log::info!("{} {:?}", msg_type, msg);
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::WARNING => {
            log::warn!("{} {:?}", msg_type, msg);
        }
        _ => {
            log::error!("{} {:?}", msg_type, msg);
        }
    }

    vk::FALSE
}
