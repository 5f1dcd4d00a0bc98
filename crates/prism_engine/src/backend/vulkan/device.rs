//! Physical device selection and logical device management
//!
//! A candidate GPU is suitable iff it reports at least Vulkan 1.3, exposes a
//! graphics-capable queue family, and supports the full required device
//! extension set. Selection takes the first suitable device in enumeration
//! order. The suitability subchecks are pure functions over driver-reported
//! data so they can be tested without a live instance.

use std::ffi::CStr;
use std::os::raw::c_char;

use ash::extensions::khr;
use ash::{vk, Device, Instance};

use super::{VulkanError, VulkanResult};

/// Device extensions every suitable GPU must expose.
pub fn required_device_extensions() -> [&'static CStr; 4] {
    [
        khr::Swapchain::name(),
        vk::KhrSpirv14Fn::name(),
        vk::KhrSynchronization2Fn::name(),
        vk::KhrCreateRenderpass2Fn::name(),
    ]
}

/// Whether the reported device API version meets the minimum required.
pub fn meets_api_version(properties: &vk::PhysicalDeviceProperties) -> bool {
    properties.api_version >= vk::API_VERSION_1_3
}

/// Index of the first queue family supporting graphics operations, if any.
pub fn find_graphics_family(families: &[vk::QueueFamilyProperties]) -> Option<u32> {
    families
        .iter()
        .position(|family| family.queue_flags.contains(vk::QueueFlags::GRAPHICS))
        .map(|index| index as u32)
}

/// Whether the reported extension set covers every required device extension.
pub fn supports_required_extensions(available: &[vk::ExtensionProperties]) -> bool {
    required_device_extensions().iter().all(|required| {
        available.iter().any(|props| {
            let name = unsafe { CStr::from_ptr(props.extension_name.as_ptr()) };
            name == *required
        })
    })
}

/// Selected physical device and its driver-reported properties
pub struct PhysicalDeviceInfo {
    /// Vulkan physical device handle (non-owning)
    pub device: vk::PhysicalDevice,
    /// Device properties and limits
    pub properties: vk::PhysicalDeviceProperties,
    /// Available queue families
    pub queue_families: Vec<vk::QueueFamilyProperties>,
    /// Index of the graphics queue family
    pub graphics_family: u32,
}

impl PhysicalDeviceInfo {
    /// Select the first suitable physical device in enumeration order.
    pub fn select(instance: &Instance) -> VulkanResult<Self> {
        let devices = unsafe { instance.enumerate_physical_devices() }.map_err(|e| {
            VulkanError::InitializationFailed(format!("device enumeration: {e:?}"))
        })?;

        for device in devices {
            if let Some(info) = Self::evaluate(instance, device) {
                log::info!("selected GPU: {}", unsafe {
                    CStr::from_ptr(info.properties.device_name.as_ptr()).to_string_lossy()
                });
                return Ok(info);
            }
        }

        Err(VulkanError::NoSuitableDevice(
            "no enumerated device supports Vulkan 1.3 with the required extensions".to_string(),
        ))
    }

    /// Evaluate one candidate against the suitability predicate.
    fn evaluate(instance: &Instance, device: vk::PhysicalDevice) -> Option<Self> {
        let properties = unsafe { instance.get_physical_device_properties(device) };
        let device_name = unsafe {
            CStr::from_ptr(properties.device_name.as_ptr()).to_string_lossy().into_owned()
        };

        if !meets_api_version(&properties) {
            log::debug!("{device_name}: API version below 1.3, skipping");
            return None;
        }

        let queue_families =
            unsafe { instance.get_physical_device_queue_family_properties(device) };
        let Some(graphics_family) = find_graphics_family(&queue_families) else {
            log::debug!("{device_name}: no graphics queue family, skipping");
            return None;
        };

        let extensions =
            unsafe { instance.enumerate_device_extension_properties(device) }.ok()?;
        if !supports_required_extensions(&extensions) {
            log::debug!("{device_name}: required device extensions missing, skipping");
            return None;
        }

        Some(Self {
            device,
            properties,
            queue_families,
            graphics_family,
        })
    }
}

/// Logical device wrapper owning the device handle and its graphics queue
pub struct LogicalDevice {
    /// Vulkan logical device handle
    pub device: Device,
    /// Graphics and presentation queue
    pub graphics_queue: vk::Queue,
    /// Index of the graphics queue family
    pub graphics_family: u32,
}

impl LogicalDevice {
    /// Create a logical device with one graphics queue and the dynamic
    /// rendering feature chain enabled.
    pub fn new(instance: &Instance, physical_device: &PhysicalDeviceInfo) -> VulkanResult<Self> {
        let queue_priorities = [1.0_f32];
        let queue_infos = [vk::DeviceQueueCreateInfo::builder()
            .queue_family_index(physical_device.graphics_family)
            .queue_priorities(&queue_priorities)
            .build()];

        let extension_ptrs: Vec<*const c_char> = required_device_extensions()
            .iter()
            .map(|ext| ext.as_ptr())
            .collect();

        let mut vulkan13_features =
            vk::PhysicalDeviceVulkan13Features::builder().dynamic_rendering(true);
        let mut extended_dynamic_state =
            vk::PhysicalDeviceExtendedDynamicStateFeaturesEXT::builder()
                .extended_dynamic_state(true);

        let create_info = vk::DeviceCreateInfo::builder()
            .queue_create_infos(&queue_infos)
            .enabled_extension_names(&extension_ptrs)
            .push_next(&mut vulkan13_features)
            .push_next(&mut extended_dynamic_state);

        let device = unsafe {
            instance.create_device(physical_device.device, &create_info, None)
        }
        .map_err(VulkanError::from_resource)?;

        let graphics_queue =
            unsafe { device.get_device_queue(physical_device.graphics_family, 0) };

        Ok(Self {
            device,
            graphics_queue,
            graphics_family: physical_device.graphics_family,
        })
    }
}

impl Drop for LogicalDevice {
    fn drop(&mut self) {
        unsafe {
            // All dependent resources must already be gone at this point.
            let _ = self.device.device_wait_idle();
            self.device.destroy_device(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue_family(flags: vk::QueueFlags) -> vk::QueueFamilyProperties {
        vk::QueueFamilyProperties {
            queue_flags: flags,
            queue_count: 1,
            ..Default::default()
        }
    }

    fn extension(name: &CStr) -> vk::ExtensionProperties {
        let mut props = vk::ExtensionProperties::default();
        for (i, byte) in name.to_bytes().iter().enumerate() {
            props.extension_name[i] = *byte as c_char;
        }
        props
    }

    #[test]
    fn test_graphics_family_first_match_wins() {
        let families = [
            queue_family(vk::QueueFlags::TRANSFER),
            queue_family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE),
            queue_family(vk::QueueFlags::GRAPHICS),
        ];

        assert_eq!(find_graphics_family(&families), Some(1));
    }

    #[test]
    fn test_no_graphics_family() {
        let families = [
            queue_family(vk::QueueFlags::TRANSFER),
            queue_family(vk::QueueFlags::COMPUTE),
        ];

        assert_eq!(find_graphics_family(&families), None);
    }

    #[test]
    fn test_api_version_gate() {
        let mut properties = vk::PhysicalDeviceProperties::default();

        properties.api_version = vk::API_VERSION_1_2;
        assert!(!meets_api_version(&properties));

        properties.api_version = vk::API_VERSION_1_3;
        assert!(meets_api_version(&properties));
    }

    #[test]
    fn test_full_extension_set_required() {
        let mut available: Vec<vk::ExtensionProperties> = required_device_extensions()
            .iter()
            .map(|name| extension(name))
            .collect();

        assert!(supports_required_extensions(&available));

        // Dropping any one required extension fails the check.
        available.pop();
        assert!(!supports_required_extensions(&available));
    }

    #[test]
    fn test_extra_extensions_are_ignored() {
        let mut available: Vec<vk::ExtensionProperties> = required_device_extensions()
            .iter()
            .map(|name| extension(name))
            .collect();
        available.push(extension(
            unsafe { CStr::from_bytes_with_nul_unchecked(b"VK_EXT_mesh_shader\0") },
        ));

        assert!(supports_required_extensions(&available));
    }
}
