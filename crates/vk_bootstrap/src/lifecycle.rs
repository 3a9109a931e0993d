//! Bootstrap lifecycle
//!
//! Runs the whole sequence on the calling thread:
//!
//! ```text
//! Uninitialized → WindowReady → CapabilitiesNegotiated → InstanceReady
//!               → (MessengerReady) → Running → TornDown
//! ```
//!
//! Every resource is a local of [`Lifecycle::run`], declared in acquisition
//! order, so Rust drops them in exactly the reverse order no matter how the
//! function is left: normal return, an error part way through, or a panic.

use std::sync::Arc;
use thiserror::Error;

use crate::core::ApplicationConfig;
use crate::vulkan::{
    instance, negotiation, DiagnosticSink, DriverInstance, GraphicsDriver, LogSink, VulkanError,
};
use crate::window::{WindowBackend, WindowError, WindowSystem};

/// Exit status reported to the OS for any bootstrap failure
pub const FAILURE_EXIT_CODE: i32 = 1;

/// Bootstrap errors
///
/// None of these are transient, so nothing is retried.
#[derive(Error, Debug)]
pub enum BootstrapError {
    /// The configuration is inconsistent
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The Vulkan loader could not be loaded
    #[error("Vulkan loader unavailable: {0}")]
    Loader(#[source] VulkanError),

    /// The native window could not be created
    #[error("Window creation failed: {0}")]
    Window(#[from] WindowError),

    /// Validation was requested but some layers are not installed
    #[error("validation layers requested, but not available: {}", missing.join(", "))]
    LayerUnavailable {
        /// Requested layers that were not found
        missing: Vec<String>,
    },

    /// Layers or extensions could not be enumerated
    #[error("Failed to enumerate driver capabilities: {0}")]
    Enumeration(#[source] VulkanError),

    /// The driver rejected the instance creation request
    #[error("failed to create instance: {0}")]
    InstanceCreation(#[source] VulkanError),

    /// The debug messenger could not be registered
    #[error("Failed to attach debug messenger: {0}")]
    Messenger(#[source] VulkanError),

    /// `run` was called on a lifecycle that already finished
    #[error("lifecycle already torn down")]
    AlreadyTornDown,
}

impl BootstrapError {
    /// Process exit status for this error
    pub fn exit_code(&self) -> i32 {
        FAILURE_EXIT_CODE
    }
}

/// Stage the bootstrap sequence has reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LifecycleState {
    /// Nothing acquired yet
    Uninitialized,
    /// Native window exists
    WindowReady,
    /// Extension request computed
    CapabilitiesNegotiated,
    /// Driver instance exists
    InstanceReady,
    /// Debug messenger registered (only with validation)
    MessengerReady,
    /// Polling window events
    Running,
    /// Everything released
    TornDown,
}

/// Orchestrates window, instance and messenger setup, the event loop and
/// teardown
pub struct Lifecycle<'c> {
    config: &'c ApplicationConfig,
    sink: Arc<dyn DiagnosticSink>,
    state: LifecycleState,
    history: Vec<LifecycleState>,
}

impl<'c> Lifecycle<'c> {
    /// Create a lifecycle for `config`, logging diagnostics through `log`
    pub fn new(config: &'c ApplicationConfig) -> Self {
        Self {
            config,
            sink: Arc::new(LogSink),
            state: LifecycleState::Uninitialized,
            history: vec![LifecycleState::Uninitialized],
        }
    }

    /// Forward driver diagnostics to `sink` instead of the log
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Current state
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Every state entered so far, in order
    pub fn history(&self) -> &[LifecycleState] {
        &self.history
    }

    /// Run the full bootstrap until the window is closed
    ///
    /// Always ends in [`LifecycleState::TornDown`]. On failure only what had
    /// been acquired is released, then the error is returned. A lifecycle
    /// runs once; later calls fail with [`BootstrapError::AlreadyTornDown`]
    /// and acquire nothing.
    pub fn run<S, D>(&mut self, windows: &mut S, driver: &D) -> Result<(), BootstrapError>
    where
        S: WindowSystem,
        D: GraphicsDriver,
    {
        if self.state != LifecycleState::Uninitialized {
            return Err(BootstrapError::AlreadyTornDown);
        }

        let result = self.run_until_closed(windows, driver);
        if let Err(e) = &result {
            log::error!("Bootstrap failed: {}", e);
        }
        self.advance(LifecycleState::TornDown);
        result
    }

    fn run_until_closed<S, D>(&mut self, windows: &mut S, driver: &D) -> Result<(), BootstrapError>
    where
        S: WindowSystem,
        D: GraphicsDriver,
    {
        let config = self.config;
        config.validate().map_err(BootstrapError::InvalidConfig)?;

        // Locals drop in reverse: messenger, instance, window
        let mut window = windows.create_window(&config.window)?;
        self.advance(LifecycleState::WindowReady);

        let platform_extensions = window.required_instance_extensions()?;
        let extensions = negotiation::resolve_extensions(&platform_extensions, config.enable_validation);
        self.advance(LifecycleState::CapabilitiesNegotiated);

        let instance = instance::create_instance(driver, config, &extensions, &self.sink)?;
        self.advance(LifecycleState::InstanceReady);

        let _messenger = if config.enable_validation {
            let messenger = instance
                .attach_messenger(config.diagnostic_severity, Arc::clone(&self.sink))
                .map_err(BootstrapError::Messenger)?;
            self.advance(LifecycleState::MessengerReady);
            Some(messenger)
        } else {
            None
        };

        self.advance(LifecycleState::Running);
        log::info!("Entering main loop");
        while !window.should_close() {
            window.poll_events();
        }
        log::info!("Window closed, shutting down");

        Ok(())
    }

    fn advance(&mut self, next: LifecycleState) {
        debug_assert!(
            next > self.state,
            "lifecycle moved backwards: {:?} -> {:?}",
            self.state,
            next
        );
        log::debug!("Lifecycle: {:?} -> {:?}", self.state, next);
        self.state = next;
        self.history.push(next);
    }
}
