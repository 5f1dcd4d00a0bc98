//! Vulkan instance creation and validation setup
//!
//! One-time negotiation of instance layers and extensions. Every layer and
//! extension the renderer needs is checked against what the loader actually
//! reports before instance creation; a missing requirement aborts startup
//! with a configuration error rather than failing later inside the driver.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use ash::extensions::ext::DebugUtils;
use ash::{vk, Entry, Instance};

use super::window::Window;
use super::{VulkanError, VulkanResult};

const VALIDATION_LAYER: &CStr =
    unsafe { CStr::from_bytes_with_nul_unchecked(b"VK_LAYER_KHRONOS_validation\0") };

/// Vulkan instance wrapper with validation support and RAII cleanup
pub struct VulkanInstance {
    entry: Entry,
    instance: Instance,
    debug_utils: Option<DebugUtils>,
    debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
}

impl VulkanInstance {
    /// Load the Vulkan library and create an instance for the given window.
    ///
    /// `enable_validation` turns on the Khronos validation layer and the
    /// debug messenger that routes its output into `log`.
    pub fn new(window: &Window, app_name: &str, enable_validation: bool) -> VulkanResult<Self> {
        let entry = unsafe { Entry::load() }.map_err(|e| {
            VulkanError::InitializationFailed(format!("failed to load the Vulkan library: {e}"))
        })?;

        let required_layers = Self::check_required_layers(&entry, enable_validation)?;
        let layer_ptrs: Vec<*const c_char> = required_layers.iter().map(|l| l.as_ptr()).collect();

        let extension_names = Self::check_required_extensions(&entry, window, enable_validation)?;
        let extension_ptrs: Vec<*const c_char> =
            extension_names.iter().map(|e| e.as_ptr()).collect();

        let app_name_cstr = CString::new(app_name).unwrap();
        let engine_name_cstr = CString::new("PrismEngine").unwrap();
        let app_info = vk::ApplicationInfo::builder()
            .application_name(&app_name_cstr)
            .application_version(vk::make_api_version(0, 1, 0, 0))
            .engine_name(&engine_name_cstr)
            .engine_version(vk::make_api_version(0, 1, 0, 0))
            .api_version(vk::API_VERSION_1_3);

        let create_info = vk::InstanceCreateInfo::builder()
            .application_info(&app_info)
            .enabled_layer_names(&layer_ptrs)
            .enabled_extension_names(&extension_ptrs);

        let instance = unsafe { entry.create_instance(&create_info, None) }
            .map_err(|e| VulkanError::InitializationFailed(format!("instance creation: {e:?}")))?;

        let (debug_utils, debug_messenger) = if enable_validation {
            let debug_utils = DebugUtils::new(&entry, &instance);
            let debug_messenger = Self::setup_debug_messenger(&debug_utils)?;
            (Some(debug_utils), Some(debug_messenger))
        } else {
            (None, None)
        };

        Ok(Self {
            entry,
            instance,
            debug_utils,
            debug_messenger,
        })
    }

    /// Verify every required layer is reported by the loader.
    fn check_required_layers(entry: &Entry, enable_validation: bool) -> VulkanResult<Vec<&'static CStr>> {
        let mut required: Vec<&'static CStr> = Vec::new();
        if enable_validation {
            required.push(VALIDATION_LAYER);
        }

        let available = entry.enumerate_instance_layer_properties().map_err(|e| {
            VulkanError::InitializationFailed(format!("layer enumeration: {e:?}"))
        })?;

        for layer in &required {
            let found = available.iter().any(|props| {
                let name = unsafe { CStr::from_ptr(props.layer_name.as_ptr()) };
                name == *layer
            });
            if !found {
                return Err(VulkanError::Configuration(format!(
                    "required layer not supported: {}",
                    layer.to_string_lossy()
                )));
            }
        }

        Ok(required)
    }

    /// Collect the required instance extensions and verify the loader
    /// reports every one of them.
    fn check_required_extensions(
        entry: &Entry,
        window: &Window,
        enable_validation: bool,
    ) -> VulkanResult<Vec<CString>> {
        let window_extensions = window.get_required_instance_extensions().map_err(|e| {
            VulkanError::InitializationFailed(format!("windowing extensions: {e}"))
        })?;

        let mut required: Vec<CString> = window_extensions
            .iter()
            .map(|ext| CString::new(ext.as_str()).unwrap())
            .collect();
        if enable_validation {
            required.push(DebugUtils::name().to_owned());
        }
        required.push(vk::KhrGetPhysicalDeviceProperties2Fn::name().to_owned());

        let available = entry
            .enumerate_instance_extension_properties(None)
            .map_err(|e| {
                VulkanError::InitializationFailed(format!("extension enumeration: {e:?}"))
            })?;

        for extension in &required {
            let found = available.iter().any(|props| {
                let name = unsafe { CStr::from_ptr(props.extension_name.as_ptr()) };
                name == extension.as_c_str()
            });
            if !found {
                return Err(VulkanError::Configuration(format!(
                    "required extension not supported: {}",
                    extension.to_string_lossy()
                )));
            }
        }

        Ok(required)
    }

    fn setup_debug_messenger(debug_utils: &DebugUtils) -> VulkanResult<vk::DebugUtilsMessengerEXT> {
        let create_info = vk::DebugUtilsMessengerCreateInfoEXT::builder()
            .message_severity(
                vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                    | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
            )
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .pfn_user_callback(Some(debug_callback));

        unsafe {
            debug_utils
                .create_debug_utils_messenger(&create_info, None)
                .map_err(|e| VulkanError::InitializationFailed(format!("debug messenger: {e:?}")))
        }
    }

    /// Get a reference to the Vulkan entry point.
    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    /// Get a reference to the raw instance.
    pub fn instance(&self) -> &Instance {
        &self.instance
    }
}

impl Drop for VulkanInstance {
    fn drop(&mut self) {
        unsafe {
            if let (Some(debug_utils), Some(debug_messenger)) =
                (&self.debug_utils, self.debug_messenger)
            {
                debug_utils.destroy_debug_utils_messenger(debug_messenger, None);
            }
            self.instance.destroy_instance(None);
        }
    }
}

/// Debug callback routing validation messages into the logging facade
unsafe extern "system" fn debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _user_data: *mut std::ffi::c_void,
) -> vk::Bool32 {
    let callback_data = *callback_data;
    let message = CStr::from_ptr(callback_data.p_message).to_string_lossy();

    if message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        log::error!("[vulkan] {message_type:?} - {message}");
    } else {
        log::warn!("[vulkan] {message_type:?} - {message}");
    }

    vk::FALSE
}
