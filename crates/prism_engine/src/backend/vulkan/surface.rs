//! Vulkan surface management and the capability query layer
//!
//! Wraps the window-tied `vk::SurfaceKHR` together with its extension
//! loader. The query methods are pure reads against driver state and are
//! safe to call repeatedly; results reflect current surface conditions.

use ash::extensions::khr;
use ash::{vk, Entry, Instance};

use super::window::Window;
use super::{VulkanError, VulkanResult};

/// Vulkan surface wrapper owning the surface handle for the window's lifetime
pub struct Surface {
    surface_loader: khr::Surface,
    surface: vk::SurfaceKHR,
}

impl Surface {
    /// Create a presentation surface for the window.
    pub fn new(entry: &Entry, instance: &Instance, window: &mut Window) -> VulkanResult<Self> {
        let surface_loader = khr::Surface::new(entry, instance);
        let surface = window
            .create_vulkan_surface(instance.handle())
            .map_err(|e| VulkanError::InitializationFailed(format!("surface creation: {e}")))?;

        Ok(Self {
            surface_loader,
            surface,
        })
    }

    /// Get the underlying surface handle.
    pub fn handle(&self) -> vk::SurfaceKHR {
        self.surface
    }

    /// Get the surface extension loader.
    pub fn loader(&self) -> &khr::Surface {
        &self.surface_loader
    }

    /// Query current surface capabilities for a physical device.
    pub fn capabilities(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> VulkanResult<vk::SurfaceCapabilitiesKHR> {
        unsafe {
            self.surface_loader
                .get_physical_device_surface_capabilities(physical_device, self.surface)
        }
        .map_err(VulkanError::from_query)
    }

    /// Query supported surface formats for a physical device.
    ///
    /// Any conformant driver reports at least one format; an empty result is
    /// a fatal configuration error.
    pub fn formats(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> VulkanResult<Vec<vk::SurfaceFormatKHR>> {
        let formats = unsafe {
            self.surface_loader
                .get_physical_device_surface_formats(physical_device, self.surface)
        }
        .map_err(VulkanError::from_query)?;

        if formats.is_empty() {
            return Err(VulkanError::Configuration(
                "surface reports no supported formats".to_string(),
            ));
        }
        Ok(formats)
    }

    /// Query supported present modes for a physical device.
    ///
    /// FIFO is guaranteed present by the backend contract; its absence is an
    /// invariant violation, not a condition handled here.
    pub fn present_modes(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> VulkanResult<Vec<vk::PresentModeKHR>> {
        unsafe {
            self.surface_loader
                .get_physical_device_surface_present_modes(physical_device, self.surface)
        }
        .map_err(VulkanError::from_query)
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        // The swap chain referencing this surface must already be gone.
        unsafe {
            self.surface_loader.destroy_surface(self.surface, None);
        }
    }
}
