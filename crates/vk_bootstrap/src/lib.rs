//! # Vulkan Bootstrap
//!
//! Opens a native window, loads the Vulkan driver, negotiates instance
//! extensions and validation layers, creates the instance and attaches a
//! debug messenger, then pumps window events until the user closes the
//! window. Teardown runs in exact reverse order of creation.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vk_bootstrap::prelude::*;
//!
//! fn main() -> Result<(), BootstrapError> {
//!     let config = ApplicationConfig::default();
//!     let driver = VulkanDriver::load().map_err(BootstrapError::Loader)?;
//!     let mut windows = GlfwWindowSystem::init()?;
//!     Lifecycle::new(&config).run(&mut windows, &driver)
//! }
//! ```
//!
//! Negotiation lives in [`vulkan::negotiation`] and is pure, so it can be
//! tested with fabricated layer and extension sets.

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names)]

pub mod config;
pub mod core;
pub mod foundation;
pub mod lifecycle;
pub mod vulkan;
pub mod window;

#[cfg(test)]
mod testing;

pub use lifecycle::{BootstrapError, Lifecycle, LifecycleState};

/// Common imports for bootstrap users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError},
        core::config::{ApiVersion, ApplicationConfig, WindowConfig},
        lifecycle::{BootstrapError, Lifecycle, LifecycleState},
        vulkan::{DiagnosticSink, LogSink, Severity, VulkanDriver},
        window::GlfwWindowSystem,
    };
}
