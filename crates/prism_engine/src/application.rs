//! Application driver: startup ordering and the main event loop
//!
//! Owns the window and the GPU context. Startup failures propagate out to
//! the process boundary; there is no partial or degraded mode. During the
//! loop the driver consumes close requests and framebuffer resizes from the
//! windowing layer and rebuilds the swap chain before any further
//! presentation work would run.

use ash::vk;
use thiserror::Error;

use crate::backend::vulkan::{VulkanContext, VulkanError, Window, WindowError};
use crate::config::{ApplicationConfig, ConfigError};
use crate::foundation::time::Timer;
#[cfg(feature = "profiler")]
use crate::profiler::{Profiler, ProfilerUi};

/// Application-level errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Windowing layer failure
    #[error("window error: {0}")]
    Window(#[from] WindowError),

    /// GPU backend failure
    #[error("renderer error: {0}")]
    Vulkan(#[from] VulkanError),

    /// Configuration failure
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Owns the window, the GPU context, and the main loop
pub struct Application {
    window: Window,
    context: VulkanContext,
    config: ApplicationConfig,
    timer: Timer,
    #[cfg(feature = "profiler")]
    profiler: Profiler,
    #[cfg(feature = "profiler")]
    profiler_ui: ProfilerUi,
}

impl Application {
    /// Initialize the window and the full GPU context.
    pub fn new(config: ApplicationConfig) -> Result<Self, AppError> {
        let mut window = Window::new(
            &config.window.title,
            config.window.width,
            config.window.height,
            config.window.resizable,
        )?;

        let context = VulkanContext::new(
            &mut window,
            &config.renderer.app_name,
            config.renderer.enable_validation,
        )?;

        log::info!(
            "renderer initialized: {} swap-chain images at {}x{}",
            context.swapchain().image_count(),
            context.swapchain().extent().width,
            context.swapchain().extent().height,
        );

        Ok(Self {
            window,
            context,
            timer: Timer::new(),
            #[cfg(feature = "profiler")]
            profiler: Profiler::new(),
            #[cfg(feature = "profiler")]
            profiler_ui: ProfilerUi::new(config.profiler.history_frames),
            config,
        })
    }

    /// Run the main loop until the window requests close.
    pub fn run(&mut self) -> Result<(), AppError> {
        log::info!("entering main loop");

        while !self.window.should_close() {
            #[cfg(feature = "profiler")]
            let frame_zone = self.profiler.zone("frame");

            if self.config.window.wait_for_events {
                self.window.wait_events();
            } else {
                self.window.poll_events();
            }

            let events: Vec<glfw::WindowEvent> =
                self.window.flush_events().map(|(_, event)| event).collect();

            let mut framebuffer_size = None;
            for event in events {
                match event {
                    glfw::WindowEvent::FramebufferSize(width, height) => {
                        framebuffer_size = Some((width, height));
                    }
                    glfw::WindowEvent::Key(glfw::Key::Escape, _, glfw::Action::Press, _) => {
                        self.window.set_should_close(true);
                    }
                    _ => {}
                }
            }

            // A zero-sized framebuffer means the window is minimized; the
            // next non-zero resize rebuilds the chain.
            if let Some((width, height)) = framebuffer_size {
                if width > 0 && height > 0 {
                    let extent = vk::Extent2D {
                        width: width as u32,
                        height: height as u32,
                    };
                    self.context.recreate_swapchain(extent)?;
                }
            }

            self.timer.update();

            #[cfg(feature = "profiler")]
            {
                drop(frame_zone);
                self.profiler_ui.update(self.profiler.end_frame());
                let interval = self.config.profiler.report_interval;
                if interval > 0 && self.timer.frame_count() % interval == 0 {
                    self.profiler_ui.render();
                }
            }
        }

        log::info!(
            "shutting down after {} frames ({:.1} fps average)",
            self.timer.frame_count(),
            self.timer.average_fps(),
        );
        Ok(())
    }

    /// Get the GPU context.
    pub fn context(&self) -> &VulkanContext {
        &self.context
    }

    /// Get the window.
    pub fn window(&self) -> &Window {
        &self.window
    }
}
