//! Backend implementations
//!
//! Platform- and API-specific code lives here, isolated from the
//! application-facing modules.

pub mod vulkan;
