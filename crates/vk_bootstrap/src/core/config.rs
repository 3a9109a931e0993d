//! # Application Configuration
//!
//! Everything the bootstrap needs to know is carried by one
//! [`ApplicationConfig`] value, built once at process start and passed by
//! reference to every component. There are no global switches: whether
//! validation is enabled and which layers are requested are plain fields,
//! so negotiation can be exercised with fabricated configs.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::config::Config;
use crate::vulkan::debug::Severity;

/// Khronos validation layer, requested by default when validation is enabled
pub const KHRONOS_VALIDATION_LAYER: &str = "VK_LAYER_KHRONOS_validation";

/// A `major.minor.patch` version as encoded by `vk::make_api_version`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ApiVersion {
    /// Major version
    pub major: u32,
    /// Minor version
    pub minor: u32,
    /// Patch version
    pub patch: u32,
}

impl ApiVersion {
    /// Vulkan 1.0
    pub const V1_0: Self = Self::new(1, 0, 0);

    /// Create a new version triple
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }

    /// Packed form used by `VkApplicationInfo`
    pub fn to_raw(self) -> u32 {
        ash::vk::make_api_version(0, self.major, self.minor, self.patch)
    }
}

impl Default for ApiVersion {
    fn default() -> Self {
        Self::V1_0
    }
}

impl std::fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// # Window Configuration
///
/// Geometry and title of the native window. The window never gets a client
/// graphics API context; Vulkan talks to it through a surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Client area width in pixels
    pub width: u32,
    /// Client area height in pixels
    pub height: u32,
    /// Title bar text
    pub title: String,
    /// Whether the user may resize the window
    pub resizable: bool,
}

impl WindowConfig {
    /// Create a non-resizable window configuration
    pub fn new(width: u32, height: u32, title: impl Into<String>) -> Self {
        Self {
            width,
            height,
            title: title.into(),
            resizable: false,
        }
    }

    /// Allow or forbid resizing
    pub fn with_resizable(mut self, resizable: bool) -> Self {
        self.resizable = resizable;
        self
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self::new(800, 600, "Vulkan")
    }
}

/// # Application Configuration
///
/// Top-level configuration for the bootstrap: window geometry, the
/// application descriptor handed to the driver and the diagnostics setup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Native window settings
    pub window: WindowConfig,
    /// Application name reported to the driver
    pub application_name: String,
    /// Application version reported to the driver
    pub application_version: ApiVersion,
    /// Engine name reported to the driver
    pub engine_name: String,
    /// Engine version reported to the driver
    pub engine_version: ApiVersion,
    /// Vulkan API version the application targets
    pub api_version: ApiVersion,
    /// Whether validation layers and the debug messenger are enabled
    pub enable_validation: bool,
    /// Validation layers requested when validation is enabled, in order
    pub validation_layers: Vec<String>,
    /// Lowest message severity the debug messenger subscribes to
    pub diagnostic_severity: Severity,
}

impl ApplicationConfig {
    /// Create a configuration with defaults and the given application name
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            window: WindowConfig::default(),
            application_name: app_name.into(),
            application_version: ApiVersion::new(1, 0, 0),
            engine_name: "No Engine".to_string(),
            engine_version: ApiVersion::new(1, 0, 0),
            api_version: ApiVersion::V1_0,
            enable_validation: cfg!(debug_assertions),
            validation_layers: vec![KHRONOS_VALIDATION_LAYER.to_string()],
            diagnostic_severity: Severity::Warning,
        }
    }

    /// Set window settings
    pub fn with_window(mut self, window: WindowConfig) -> Self {
        self.window = window;
        self
    }

    /// Set engine name and version
    pub fn with_engine(mut self, name: impl Into<String>, version: ApiVersion) -> Self {
        self.engine_name = name.into();
        self.engine_version = version;
        self
    }

    /// Set the targeted Vulkan API version
    pub fn with_api_version(mut self, version: ApiVersion) -> Self {
        self.api_version = version;
        self
    }

    /// Enable or disable validation layers and the debug messenger
    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.enable_validation = enabled;
        self
    }

    /// Replace the requested validation layers
    pub fn with_layers<I, S>(mut self, layers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.validation_layers = layers.into_iter().map(Into::into).collect();
        self
    }

    /// Set the lowest severity forwarded by the debug messenger
    pub fn with_diagnostic_severity(mut self, severity: Severity) -> Self {
        self.diagnostic_severity = severity;
        self
    }

    /// Layers that go into the instance descriptor
    ///
    /// Empty unless validation is enabled.
    pub fn enabled_layers(&self) -> &[String] {
        if self.enable_validation {
            &self.validation_layers
        } else {
            &[]
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(format!(
                "Window size must be non-zero, got {}x{}",
                self.window.width, self.window.height
            ));
        }

        if self.application_name.is_empty() {
            return Err("Application name cannot be empty".to_string());
        }

        let names = [&self.application_name, &self.engine_name, &self.window.title];
        if let Some(name) = names.iter().find(|name| name.contains('\0')) {
            return Err(format!("Name contains a NUL byte: {name:?}"));
        }

        let mut seen = HashSet::new();
        for layer in &self.validation_layers {
            if layer.is_empty() || layer.contains('\0') {
                return Err(format!("Invalid validation layer name: {layer:?}"));
            }
            if !seen.insert(layer.as_str()) {
                return Err(format!("Validation layer listed twice: {layer}"));
            }
        }

        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self::new("Hello Triangle")
    }
}

impl Config for ApplicationConfig {}
