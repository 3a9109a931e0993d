//! Backend-agnostic window traits
//!
//! These traits describe the small slice of a windowing library the
//! bootstrap depends on: making a window, pumping its events and asking which
//! Vulkan instance extensions it needs to present.

use super::WindowResult;
use crate::core::WindowConfig;

/// Factory for native windows
pub trait WindowSystem {
    /// Concrete window type produced by this system
    type Window: WindowBackend;

    /// Create a window with the given geometry and title
    ///
    /// Fails with [`super::WindowError::CreationFailed`] if the native
    /// windowing subsystem cannot allocate one. The window is destroyed when
    /// the returned value is dropped.
    fn create_window(&mut self, config: &WindowConfig) -> WindowResult<Self::Window>;
}

/// A live native window and its event queue
///
/// Window operations happen on the thread that created the window.
pub trait WindowBackend {
    /// Check if the window should close
    ///
    /// Returns true once the native window system has delivered a close
    /// request. Nothing else raises it.
    fn should_close(&self) -> bool;

    /// Dispatch pending input and system events
    ///
    /// Never blocks waiting for new events.
    fn poll_events(&mut self);

    /// Instance extensions the platform needs for presentation to this window
    fn required_instance_extensions(&self) -> WindowResult<Vec<String>>;
}
