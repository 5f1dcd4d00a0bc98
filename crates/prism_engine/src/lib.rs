//! # Prism Engine
//!
//! A minimal Vulkan presentation engine. The crate establishes a GPU context,
//! selects a capable physical device, creates a logical device and window
//! surface, and keeps a presentable swap chain valid across the window's
//! lifetime, recreating it on resize and surface invalidation.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use prism_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ApplicationConfig::default();
//!     let mut app = Application::new(config)?;
//!     app.run()?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod backend;
pub mod config;
pub mod foundation;
pub mod profiler;

mod application;

pub use application::{AppError, Application};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        application::{AppError, Application},
        backend::vulkan::{VulkanContext, VulkanError, VulkanResult, Window, WindowError},
        config::{ApplicationConfig, Config, ConfigError},
        foundation::time::Timer,
        profiler::{Profiler, ProfilerUi},
    };
}
