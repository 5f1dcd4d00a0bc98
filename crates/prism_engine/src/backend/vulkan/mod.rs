//! Vulkan backend implementation
//!
//! Organized into window, instance, device, surface, and swap-chain modules,
//! composed by [`VulkanContext`]. All GPU lifecycle operations are
//! single-threaded; the swap chain is only ever reached through `&mut`.

use ash::vk;
use thiserror::Error;

pub mod context;
pub mod device;
pub mod instance;
pub mod surface;
pub mod swapchain;
pub mod window;

pub use context::VulkanContext;
pub use device::{LogicalDevice, PhysicalDeviceInfo};
pub use instance::VulkanInstance;
pub use surface::Surface;
pub use swapchain::Swapchain;
pub use window::{Window, WindowError, WindowResult};

/// Vulkan-specific error types
#[derive(Error, Debug)]
pub enum VulkanError {
    /// A required layer or extension is missing, or the driver reported an
    /// unusable configuration. Raised before any GPU resource exists.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// No enumerated physical device passed the suitability checks
    #[error("no suitable GPU found: {0}")]
    NoSuitableDevice(String),

    /// A capability query was rejected by the driver
    #[error("capability query failed: {0:?}")]
    Query(vk::Result),

    /// Device, swap-chain, or image-view creation was rejected by the driver.
    /// The only recovery path is a full recreate cycle, not a same-call retry.
    #[error("resource creation failed: {0:?}")]
    Resource(vk::Result),

    /// The presentation surface was invalidated (e.g. the window was
    /// destroyed). There is no reconnection logic; this is fatal.
    #[error("presentation surface lost")]
    SurfaceLost,

    /// Vulkan loader or instance initialization failed
    #[error("initialization failed: {0}")]
    InitializationFailed(String),
}

impl VulkanError {
    /// Map a failed capability query to the error taxonomy.
    pub(crate) fn from_query(result: vk::Result) -> Self {
        match result {
            vk::Result::ERROR_SURFACE_LOST_KHR => Self::SurfaceLost,
            other => Self::Query(other),
        }
    }

    /// Map a rejected resource creation call to the error taxonomy.
    pub(crate) fn from_resource(result: vk::Result) -> Self {
        match result {
            vk::Result::ERROR_SURFACE_LOST_KHR => Self::SurfaceLost,
            other => Self::Resource(other),
        }
    }
}

/// Result type for Vulkan operations
pub type VulkanResult<T> = Result<T, VulkanError>;
