//! Swap-chain lifecycle management
//!
//! The swap chain must be rebuilt whenever the window is resized or the
//! surface otherwise invalidates what the driver handed out. Recreation is
//! strictly cleanup-then-create: image views are destroyed before the chain,
//! the chain before a new one is built, and at no point do two live chains
//! reference the same surface. Between `cleanup()` and the next `create()`
//! the chain is empty and no rendering may be issued against it.
//!
//! The format, present-mode, extent, and image-count policies are pure
//! functions over driver-reported candidate sets, deterministic for
//! identical input.

use ash::extensions::khr;
use ash::{vk, Device, Instance};

use super::surface::Surface;
use super::{VulkanError, VulkanResult};

/// Pick the surface format: 8-bit BGRA sRGB with non-linear sRGB color space
/// when offered, otherwise the first candidate in driver-reported order.
///
/// Callers must pass at least one candidate; the query layer rejects empty
/// sets before selection runs.
pub fn choose_surface_format(available: &[vk::SurfaceFormatKHR]) -> vk::SurfaceFormatKHR {
    available
        .iter()
        .find(|sf| {
            sf.format == vk::Format::B8G8R8A8_SRGB
                && sf.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
        })
        .copied()
        .unwrap_or(available[0])
}

/// Pick the present mode: mailbox (low latency, no tearing) when offered,
/// otherwise FIFO, which every implementation must support. No other mode is
/// considered even if present.
pub fn choose_present_mode(available: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
    available
        .iter()
        .copied()
        .find(|&mode| mode == vk::PresentModeKHR::MAILBOX)
        .unwrap_or(vk::PresentModeKHR::FIFO)
}

/// Pick the swap-chain extent.
///
/// When the surface reports a fixed `current_extent` the driver mandates its
/// use verbatim. The `u32::MAX` width sentinel means the application chooses;
/// in that case `window_extent` (the window's real framebuffer size) is
/// clamped componentwise into the supported range.
pub fn choose_extent(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    window_extent: vk::Extent2D,
) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        return capabilities.current_extent;
    }

    vk::Extent2D {
        width: window_extent.width.clamp(
            capabilities.min_image_extent.width,
            capabilities.max_image_extent.width,
        ),
        height: window_extent.height.clamp(
            capabilities.min_image_extent.height,
            capabilities.max_image_extent.height,
        ),
    }
}

/// Pick the minimum image count: triple buffering when the surface allows
/// it, raised to the surface minimum and capped at the surface maximum.
/// A zero `max_image_count` means the backend sets no upper bound.
pub fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let mut count = 3_u32.max(capabilities.min_image_count);
    if capabilities.max_image_count > 0 && count > capabilities.max_image_count {
        count = capabilities.max_image_count;
    }
    count
}

/// Presentable image chain with per-image views, recreated in place on
/// resize or surface invalidation
///
/// A null chain handle is the uninitialized state; `create` is only valid
/// there, and `cleanup` returns to it from any state. The images themselves
/// are owned by the driver and only referenced here; the views are owned by
/// this struct, one per image.
pub struct Swapchain {
    device: Device,
    loader: khr::Swapchain,
    physical_device: vk::PhysicalDevice,
    handle: vk::SwapchainKHR,
    images: Vec<vk::Image>,
    image_views: Vec<vk::ImageView>,
    format: vk::SurfaceFormatKHR,
    extent: vk::Extent2D,
}

impl Swapchain {
    /// Build a live swap chain for the surface.
    ///
    /// `window_extent` is the window's current framebuffer size, used only
    /// when the surface leaves the resolution to the application.
    pub fn new(
        instance: &Instance,
        device: Device,
        surface: &Surface,
        physical_device: vk::PhysicalDevice,
        window_extent: vk::Extent2D,
    ) -> VulkanResult<Self> {
        let loader = khr::Swapchain::new(instance, &device);

        let mut swapchain = Self {
            device,
            loader,
            physical_device,
            handle: vk::SwapchainKHR::null(),
            images: Vec::new(),
            image_views: Vec::new(),
            format: vk::SurfaceFormatKHR::default(),
            extent: vk::Extent2D::default(),
        };
        swapchain.create(surface, window_extent)?;
        Ok(swapchain)
    }

    /// Build the presentable chain against current surface conditions.
    ///
    /// Valid only from the uninitialized state. On failure the chain is left
    /// uninitialized; callers recover with a fresh `recreate`, not by
    /// retrying this call against the same conditions.
    pub fn create(&mut self, surface: &Surface, window_extent: vk::Extent2D) -> VulkanResult<()> {
        debug_assert!(
            self.handle == vk::SwapchainKHR::null(),
            "create() on a live swap chain; cleanup() must run first"
        );

        // Re-run the capability queries every time: resize and surface loss
        // both change what the driver reports.
        let capabilities = surface.capabilities(self.physical_device)?;
        let formats = surface.formats(self.physical_device)?;
        let present_modes = surface.present_modes(self.physical_device)?;

        let format = choose_surface_format(&formats);
        let present_mode = choose_present_mode(&present_modes);
        let extent = choose_extent(&capabilities, window_extent);
        let min_image_count = choose_image_count(&capabilities);

        let create_info = vk::SwapchainCreateInfoKHR::builder()
            .surface(surface.handle())
            .min_image_count(min_image_count)
            .image_format(format.format)
            .image_color_space(format.color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            .pre_transform(capabilities.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(present_mode)
            .clipped(true);

        let handle = unsafe { self.loader.create_swapchain(&create_info, None) }
            .map_err(VulkanError::from_resource)?;

        let images = match unsafe { self.loader.get_swapchain_images(handle) } {
            Ok(images) => images,
            Err(e) => {
                unsafe { self.loader.destroy_swapchain(handle, None) };
                return Err(VulkanError::from_resource(e));
            }
        };

        // One view per image. A failed view leaves no partial chain behind:
        // everything built so far is torn down in views-then-chain order.
        let mut image_views: Vec<vk::ImageView> = Vec::with_capacity(images.len());
        for &image in &images {
            let view_info = vk::ImageViewCreateInfo::builder()
                .image(image)
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(format.format)
                .components(vk::ComponentMapping::default())
                .subresource_range(vk::ImageSubresourceRange {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    base_mip_level: 0,
                    level_count: 1,
                    base_array_layer: 0,
                    layer_count: 1,
                });

            match unsafe { self.device.create_image_view(&view_info, None) } {
                Ok(view) => image_views.push(view),
                Err(e) => {
                    unsafe {
                        for view in image_views.drain(..) {
                            self.device.destroy_image_view(view, None);
                        }
                        self.loader.destroy_swapchain(handle, None);
                    }
                    return Err(VulkanError::from_resource(e));
                }
            }
        }

        self.handle = handle;
        self.images = images;
        self.image_views = image_views;
        self.format = format;
        self.extent = extent;

        log::debug!(
            "swap chain created: {} images, {:?}/{:?}, {}x{}, {:?}",
            self.images.len(),
            format.format,
            format.color_space,
            extent.width,
            extent.height,
            present_mode,
        );
        Ok(())
    }

    /// Release all chain resources and return to the uninitialized state.
    ///
    /// Idempotent. Views are destroyed before the chain handle; the images
    /// belong to the driver and are never freed individually.
    pub fn cleanup(&mut self) {
        unsafe {
            for view in self.image_views.drain(..) {
                self.device.destroy_image_view(view, None);
            }
            if self.handle != vk::SwapchainKHR::null() {
                self.loader.destroy_swapchain(self.handle, None);
                self.handle = vk::SwapchainKHR::null();
            }
        }
        self.images.clear();
    }

    /// Rebuild the chain after a resize or surface invalidation.
    ///
    /// `cleanup` runs to completion before `create` begins; no stale image
    /// or view handle survives into the new chain.
    pub fn recreate(&mut self, surface: &Surface, window_extent: vk::Extent2D) -> VulkanResult<()> {
        log::debug!("recreating swap chain at {}x{}", window_extent.width, window_extent.height);
        self.cleanup();
        self.create(surface, window_extent)
    }

    /// Whether the chain currently holds live resources.
    pub fn is_live(&self) -> bool {
        self.handle != vk::SwapchainKHR::null()
    }

    /// Get the chain handle.
    pub fn handle(&self) -> vk::SwapchainKHR {
        self.handle
    }

    /// Get the driver-owned presentable images.
    pub fn images(&self) -> &[vk::Image] {
        &self.images
    }

    /// Get the per-image views, index-aligned with `images`.
    pub fn image_views(&self) -> &[vk::ImageView] {
        &self.image_views
    }

    /// Get the selected surface format.
    pub fn format(&self) -> vk::SurfaceFormatKHR {
        self.format
    }

    /// Get the selected extent.
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    /// Number of presentable images in the chain.
    pub fn image_count(&self) -> usize {
        self.images.len()
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        self.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preferred() -> vk::SurfaceFormatKHR {
        vk::SurfaceFormatKHR {
            format: vk::Format::B8G8R8A8_SRGB,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
        }
    }

    fn capabilities(
        current: (u32, u32),
        min: (u32, u32),
        max: (u32, u32),
    ) -> vk::SurfaceCapabilitiesKHR {
        vk::SurfaceCapabilitiesKHR {
            current_extent: vk::Extent2D { width: current.0, height: current.1 },
            min_image_extent: vk::Extent2D { width: min.0, height: min.1 },
            max_image_extent: vk::Extent2D { width: max.0, height: max.1 },
            ..Default::default()
        }
    }

    #[test]
    fn test_format_prefers_bgra_srgb_regardless_of_position() {
        let candidates = [
            vk::SurfaceFormatKHR {
                format: vk::Format::R8G8B8A8_UNORM,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
            preferred(),
        ];

        let chosen = choose_surface_format(&candidates);
        assert_eq!(chosen.format, vk::Format::B8G8R8A8_SRGB);
        assert_eq!(chosen.color_space, vk::ColorSpaceKHR::SRGB_NONLINEAR);
    }

    #[test]
    fn test_format_requires_exact_pair() {
        // Right format with the wrong color space is not a match.
        let candidates = [
            vk::SurfaceFormatKHR {
                format: vk::Format::B8G8R8A8_SRGB,
                color_space: vk::ColorSpaceKHR::EXTENDED_SRGB_LINEAR_EXT,
            },
            vk::SurfaceFormatKHR {
                format: vk::Format::R8G8B8A8_UNORM,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
        ];

        let chosen = choose_surface_format(&candidates);
        assert_eq!(chosen.format, vk::Format::B8G8R8A8_SRGB);
        assert_eq!(chosen.color_space, vk::ColorSpaceKHR::EXTENDED_SRGB_LINEAR_EXT);
    }

    #[test]
    fn test_format_falls_back_to_first_candidate() {
        let candidates = [
            vk::SurfaceFormatKHR {
                format: vk::Format::R8G8B8A8_UNORM,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
            vk::SurfaceFormatKHR {
                format: vk::Format::R16G16B16A16_SFLOAT,
                color_space: vk::ColorSpaceKHR::EXTENDED_SRGB_LINEAR_EXT,
            },
        ];

        assert_eq!(choose_surface_format(&candidates).format, vk::Format::R8G8B8A8_UNORM);
    }

    #[test]
    fn test_format_selection_is_deterministic() {
        let candidates = [
            vk::SurfaceFormatKHR {
                format: vk::Format::R8G8B8A8_UNORM,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
            preferred(),
        ];

        let first = choose_surface_format(&candidates);
        let second = choose_surface_format(&candidates);
        assert_eq!(first.format, second.format);
        assert_eq!(first.color_space, second.color_space);
    }

    #[test]
    fn test_present_mode_prefers_mailbox() {
        let modes = [vk::PresentModeKHR::FIFO, vk::PresentModeKHR::MAILBOX];
        assert_eq!(choose_present_mode(&modes), vk::PresentModeKHR::MAILBOX);
    }

    #[test]
    fn test_present_mode_fifo_only() {
        let modes = [vk::PresentModeKHR::FIFO];
        assert_eq!(choose_present_mode(&modes), vk::PresentModeKHR::FIFO);
    }

    #[test]
    fn test_present_mode_ignores_other_modes() {
        // Immediate is never selected even when offered.
        let modes = [
            vk::PresentModeKHR::IMMEDIATE,
            vk::PresentModeKHR::FIFO_RELAXED,
            vk::PresentModeKHR::FIFO,
        ];
        assert_eq!(choose_present_mode(&modes), vk::PresentModeKHR::FIFO);
    }

    #[test]
    fn test_extent_uses_fixed_current_extent_verbatim() {
        let caps = capabilities((1280, 720), (1, 1), (4096, 4096));
        let chosen = choose_extent(&caps, vk::Extent2D { width: 640, height: 480 });

        assert_eq!(chosen.width, 1280);
        assert_eq!(chosen.height, 720);
    }

    #[test]
    fn test_extent_clamps_window_size_when_unconstrained() {
        let caps = capabilities((u32::MAX, u32::MAX), (1, 1), (4096, 4096));
        let chosen = choose_extent(&caps, vk::Extent2D { width: 800, height: 600 });

        assert_eq!(chosen.width, 800);
        assert_eq!(chosen.height, 600);
    }

    #[test]
    fn test_extent_clamps_each_dimension_independently() {
        let caps = capabilities((u32::MAX, u32::MAX), (320, 240), (1920, 1080));

        let oversized = choose_extent(&caps, vk::Extent2D { width: 2560, height: 100 });
        assert_eq!(oversized.width, 1920);
        assert_eq!(oversized.height, 240);
    }

    #[test]
    fn test_extent_is_idempotent() {
        let caps = capabilities((u32::MAX, u32::MAX), (1, 1), (4096, 4096));
        let window = vk::Extent2D { width: 1024, height: 768 };

        let first = choose_extent(&caps, window);
        let second = choose_extent(&caps, window);
        assert_eq!(first.width, second.width);
        assert_eq!(first.height, second.height);
    }

    #[test]
    fn test_image_count_prefers_triple_buffering() {
        let caps = vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 8,
            ..Default::default()
        };

        assert_eq!(choose_image_count(&caps), 3);
    }

    #[test]
    fn test_image_count_capped_by_surface_maximum() {
        let caps = vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 2,
            ..Default::default()
        };

        assert_eq!(choose_image_count(&caps), 2);
    }

    #[test]
    fn test_image_count_raised_to_surface_minimum() {
        let caps = vk::SurfaceCapabilitiesKHR {
            min_image_count: 4,
            max_image_count: 0,
            ..Default::default()
        };

        assert_eq!(choose_image_count(&caps), 4);
    }

    #[test]
    fn test_image_count_unbounded_maximum() {
        // max_image_count of zero means no upper bound.
        let caps = vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 0,
            ..Default::default()
        };

        assert_eq!(choose_image_count(&caps), 3);
    }
}
