//! Window management subsystem
//!
//! The lifecycle only ever talks to the [`WindowSystem`] and
//! [`WindowBackend`] traits. The GLFW implementation lives in [`glfw_backend`];
//! tests substitute fabricated windows.
//!
//! ```text
//! ┌─────────────────────────────┐
//! │ Lifecycle                   │
//! └─────────────┬───────────────┘
//!               │ create_window / poll / should_close
//!      ┌────────▼────────┐
//!      │ WindowSystem    │ ← backend.rs
//!      │ WindowBackend   │
//!      └────────┬────────┘
//!               │ implemented by
//!      ┌────────▼────────┐
//!      │ GlfwWindow      │ ← glfw_backend.rs
//!      └─────────────────┘
//! ```

pub mod backend;
pub mod glfw_backend;

pub use backend::{WindowBackend, WindowSystem};
pub use glfw_backend::{GlfwWindow, GlfwWindowSystem};

use thiserror::Error;

/// Window management errors
#[derive(Error, Debug)]
pub enum WindowError {
    /// The native windowing library could not be initialized
    #[error("GLFW initialization failed")]
    InitializationFailed,

    /// The native windowing subsystem refused to allocate a window
    #[error("Window creation failed")]
    CreationFailed,

    /// The windowing library cannot present through Vulkan on this system
    #[error("Vulkan is not supported by the windowing system")]
    VulkanUnsupported,
}

/// Result type for window operations
pub type WindowResult<T> = Result<T, WindowError>;
