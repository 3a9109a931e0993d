//! Window management using GLFW
//!
//! Provides window creation and event handling for Vulkan. Windows are
//! created without a client API so no OpenGL context is made.

use glfw::WindowEvent;

use super::{WindowBackend, WindowError, WindowResult, WindowSystem};
use crate::core::WindowConfig;

/// Initialized GLFW library
pub struct GlfwWindowSystem {
    glfw: glfw::Glfw,
}

impl GlfwWindowSystem {
    /// Initialize GLFW
    ///
    /// GLFW errors raised later are logged through the `log` facade rather
    /// than aborting the process.
    pub fn init() -> WindowResult<Self> {
        let glfw = glfw::init(glfw::log_errors).map_err(|e| {
            log::error!("GLFW init failed: {:?}", e);
            WindowError::InitializationFailed
        })?;

        Ok(Self { glfw })
    }

    /// Whether a Vulkan loader and ICD were found by GLFW
    pub fn vulkan_supported(&self) -> bool {
        self.glfw.vulkan_supported()
    }
}

impl WindowSystem for GlfwWindowSystem {
    type Window = GlfwWindow;

    fn create_window(&mut self, config: &WindowConfig) -> WindowResult<GlfwWindow> {
        // Configure for Vulkan (no OpenGL context)
        self.glfw.window_hint(glfw::WindowHint::ClientApi(glfw::ClientApiHint::NoApi));
        self.glfw.window_hint(glfw::WindowHint::Resizable(config.resizable));

        let (mut window, events) = self
            .glfw
            .create_window(config.width, config.height, &config.title, glfw::WindowMode::Windowed)
            .ok_or(WindowError::CreationFailed)?;

        window.set_close_polling(true);

        log::info!(
            "Created window \"{}\" ({}x{})",
            config.title,
            config.width,
            config.height
        );

        Ok(GlfwWindow {
            glfw: self.glfw.clone(),
            window,
            events,
        })
    }
}

/// GLFW window wrapper; the native window is destroyed on drop
pub struct GlfwWindow {
    glfw: glfw::Glfw,
    window: glfw::PWindow,
    events: glfw::GlfwReceiver<(f64, glfw::WindowEvent)>,
}

// GLFW raises the close flag itself; the event is only reported
fn close_requested(event: &WindowEvent) -> bool {
    matches!(event, WindowEvent::Close)
}

impl WindowBackend for GlfwWindow {
    fn should_close(&self) -> bool {
        self.window.should_close()
    }

    fn poll_events(&mut self) {
        self.glfw.poll_events();
        for (_, event) in glfw::flush_messages(&self.events) {
            log::trace!("Window event: {:?}", event);
            if close_requested(&event) {
                log::info!("Window close requested");
            }
        }
    }

    fn required_instance_extensions(&self) -> WindowResult<Vec<String>> {
        if !self.glfw.vulkan_supported() {
            return Err(WindowError::VulkanUnsupported);
        }
        self.glfw
            .get_required_instance_extensions()
            .ok_or(WindowError::VulkanUnsupported)
    }
}

impl Drop for GlfwWindow {
    fn drop(&mut self) {
        log::debug!("Destroying window");
    }
}
