//! Vulkan context composition and teardown ordering
//!
//! [`VulkanContext`] owns every core GPU resource for the process lifetime.
//! Field declaration order encodes the mandatory destruction order: the swap
//! chain goes first (views before chain, via its own Drop), then the
//! surface, then the logical device, and the instance last. The physical
//! device entry is a non-owning handle and needs no teardown.

use ash::vk;

use super::device::{LogicalDevice, PhysicalDeviceInfo};
use super::instance::VulkanInstance;
use super::surface::Surface;
use super::swapchain::Swapchain;
use super::window::Window;
use super::{VulkanError, VulkanResult};

/// Owns the instance, selected device, surface, and swap chain
pub struct VulkanContext {
    // Declaration order is teardown order; do not reorder these fields.
    swapchain: Swapchain,
    surface: Surface,
    device: LogicalDevice,
    physical_device: PhysicalDeviceInfo,
    instance: VulkanInstance,
}

impl VulkanContext {
    /// Initialize the full GPU context for the window.
    ///
    /// Startup ordering: instance (with validation when enabled) → surface →
    /// physical device selection → logical device and queue → swap chain.
    /// Any failure propagates out; there is no partial or degraded mode.
    pub fn new(window: &mut Window, app_name: &str, enable_validation: bool) -> VulkanResult<Self> {
        let instance = VulkanInstance::new(window, app_name, enable_validation)?;
        let surface = Surface::new(instance.entry(), instance.instance(), window)?;
        let physical_device = PhysicalDeviceInfo::select(instance.instance())?;
        let device = LogicalDevice::new(instance.instance(), &physical_device)?;

        let swapchain = Swapchain::new(
            instance.instance(),
            device.device.clone(),
            &surface,
            physical_device.device,
            window.framebuffer_extent(),
        )?;

        Ok(Self {
            swapchain,
            surface,
            device,
            physical_device,
            instance,
        })
    }

    /// Rebuild the swap chain, e.g. after a window resize.
    ///
    /// The device is drained first so no in-flight work references the
    /// handles about to be destroyed.
    pub fn recreate_swapchain(&mut self, window_extent: vk::Extent2D) -> VulkanResult<()> {
        unsafe {
            self.device
                .device
                .device_wait_idle()
                .map_err(VulkanError::Resource)?;
        }
        self.swapchain.recreate(&self.surface, window_extent)
    }

    /// Get the instance wrapper.
    pub fn instance(&self) -> &VulkanInstance {
        &self.instance
    }

    /// Get the logical device wrapper.
    pub fn device(&self) -> &LogicalDevice {
        &self.device
    }

    /// Get the selected physical device info.
    pub fn physical_device(&self) -> &PhysicalDeviceInfo {
        &self.physical_device
    }

    /// Get the presentation surface.
    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Get the swap chain.
    pub fn swapchain(&self) -> &Swapchain {
        &self.swapchain
    }

    /// Get the graphics/presentation queue.
    pub fn graphics_queue(&self) -> vk::Queue {
        self.device.graphics_queue
    }
}

impl Drop for VulkanContext {
    fn drop(&mut self) {
        // Drain the queue before any resource goes away; the field drops
        // that follow then run in declaration order.
        unsafe {
            let _ = self.device.device.device_wait_idle();
        }
    }
}
