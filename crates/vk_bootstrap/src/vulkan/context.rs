//! Vulkan driver and instance management
//!
//! [`GraphicsDriver`] and [`DriverInstance`] are the seam between the
//! bootstrap sequence and the driver. [`VulkanDriver`] and [`VulkanInstance`]
//! implement them on top of `ash`; tests implement them with fabricated
//! drivers so negotiation and teardown can run without a GPU.

use ash::{vk, Entry, Instance};
use std::ffi::CString;
use std::os::raw::c_char;
use std::sync::Arc;
use thiserror::Error;

use super::debug::{messenger_create_info, DebugMessenger, DiagnosticSink, Severity};
use super::instance::InstanceDescriptor;

/// Vulkan-specific error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VulkanError {
    /// The Vulkan loader library could not be loaded
    #[error("Failed to load Vulkan: {0}")]
    Loading(String),

    /// General Vulkan API error with result code
    #[error("Vulkan API error: {0:?}")]
    Api(vk::Result),

    /// A name handed to the driver cannot be expressed as a C string
    #[error("Invalid name: {0:?}")]
    InvalidName(String),
}

/// Result type for Vulkan operations
pub type VulkanResult<T> = Result<T, VulkanError>;

/// Entry point into a graphics driver
pub trait GraphicsDriver {
    /// Live instance produced by this driver
    type Instance: DriverInstance;

    /// Names of the instance layers installed on the system
    ///
    /// Enumerated on every call.
    fn layer_names(&self) -> VulkanResult<Vec<String>>;

    /// Names of the instance extensions the driver advertises
    ///
    /// Enumerated on every call.
    fn extension_names(&self) -> VulkanResult<Vec<String>>;

    /// Create an instance; the caller owns and eventually drops it
    ///
    /// When `descriptor.diagnostics` is set, messages raised while the
    /// instance is being created or destroyed go to `sink`.
    fn create_instance(
        &self,
        descriptor: &InstanceDescriptor,
        sink: &Arc<dyn DiagnosticSink>,
    ) -> VulkanResult<Self::Instance>;
}

/// A live driver instance
pub trait DriverInstance {
    /// Debug messenger registration, bound to the instance's lifetime
    type Messenger<'i>
    where
        Self: 'i;

    /// Register a debug messenger forwarding messages to `sink`
    ///
    /// The instance must have been created with the debug utils extension.
    fn attach_messenger(
        &self,
        min_severity: Severity,
        sink: Arc<dyn DiagnosticSink>,
    ) -> VulkanResult<Self::Messenger<'_>>;
}

/// Loaded Vulkan library
pub struct VulkanDriver {
    entry: Entry,
}

impl VulkanDriver {
    /// Load the system Vulkan loader
    pub fn load() -> VulkanResult<Self> {
        let entry = unsafe { Entry::load() }
            .map_err(|e| VulkanError::Loading(e.to_string()))?;

        if let Ok(Some(version)) = unsafe { entry.try_enumerate_instance_version() } {
            log::info!(
                "Vulkan loader supports API {}.{}.{}",
                vk::api_version_major(version),
                vk::api_version_minor(version),
                vk::api_version_patch(version)
            );
        }

        Ok(Self { entry })
    }

    /// Vulkan entry point
    pub fn entry(&self) -> &Entry {
        &self.entry
    }
}

impl GraphicsDriver for VulkanDriver {
    type Instance = VulkanInstance;

    fn layer_names(&self) -> VulkanResult<Vec<String>> {
        let layers = unsafe { self.entry.enumerate_instance_layer_properties() }
            .map_err(VulkanError::Api)?;
        Ok(layers
            .iter()
            .map(|layer| fixed_name(&layer.layer_name))
            .collect())
    }

    fn extension_names(&self) -> VulkanResult<Vec<String>> {
        let extensions = unsafe { self.entry.enumerate_instance_extension_properties(None) }
            .map_err(VulkanError::Api)?;
        Ok(extensions
            .iter()
            .map(|extension| fixed_name(&extension.extension_name))
            .collect())
    }

    fn create_instance(
        &self,
        descriptor: &InstanceDescriptor,
        sink: &Arc<dyn DiagnosticSink>,
    ) -> VulkanResult<VulkanInstance> {
        let app_name = c_string(&descriptor.application_name)?;
        let engine_name = c_string(&descriptor.engine_name)?;
        let extension_names = descriptor
            .extensions
            .iter()
            .map(|name| c_string(name))
            .collect::<VulkanResult<Vec<_>>>()?;
        let layer_names = descriptor
            .layers
            .iter()
            .map(|name| c_string(name))
            .collect::<VulkanResult<Vec<_>>>()?;

        let extension_ptrs: Vec<*const c_char> =
            extension_names.iter().map(|name| name.as_ptr()).collect();
        let layer_ptrs: Vec<*const c_char> = layer_names.iter().map(|name| name.as_ptr()).collect();

        let app_info = vk::ApplicationInfo::builder()
            .application_name(&app_name)
            .application_version(descriptor.application_version.to_raw())
            .engine_name(&engine_name)
            .engine_version(descriptor.engine_version.to_raw())
            .api_version(descriptor.api_version.to_raw());

        // Must outlive the instance: vkDestroyInstance reports through it too
        let creation_sink = descriptor.diagnostics.map(|_| Box::new(Arc::clone(sink)));
        let mut debug_info = descriptor.diagnostics.zip(creation_sink.as_ref()).map(|(min, sink)| {
            messenger_create_info(min, std::ptr::addr_of!(**sink).cast_mut().cast())
        });

        let mut create_info = vk::InstanceCreateInfo::builder()
            .application_info(&app_info)
            .enabled_extension_names(&extension_ptrs)
            .enabled_layer_names(&layer_ptrs);
        if let Some(debug_info) = debug_info.as_mut() {
            create_info = create_info.push_next(debug_info);
        }

        let instance = unsafe {
            self.entry
                .create_instance(&create_info, None)
                .map_err(VulkanError::Api)?
        };

        Ok(VulkanInstance {
            entry: self.entry.clone(),
            instance,
            _creation_sink: creation_sink,
        })
    }
}

/// Vulkan instance wrapper with RAII cleanup
pub struct VulkanInstance {
    // Keeps the loader library alive for as long as the instance
    entry: Entry,
    instance: Instance,
    // User data of the messenger chained into instance creation
    _creation_sink: Option<Box<Arc<dyn DiagnosticSink>>>,
}

impl VulkanInstance {
    /// Get a reference to the Vulkan instance
    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    /// Raw instance handle
    pub fn handle(&self) -> vk::Instance {
        self.instance.handle()
    }
}

impl DriverInstance for VulkanInstance {
    type Messenger<'i> = DebugMessenger<'i>;

    fn attach_messenger(
        &self,
        min_severity: Severity,
        sink: Arc<dyn DiagnosticSink>,
    ) -> VulkanResult<DebugMessenger<'_>> {
        DebugMessenger::attach(&self.entry, &self.instance, min_severity, sink)
    }
}

impl Drop for VulkanInstance {
    fn drop(&mut self) {
        log::debug!("Destroying Vulkan instance {:?}", self.instance.handle());
        unsafe {
            self.instance.destroy_instance(None);
        }
    }
}

fn c_string(name: &str) -> VulkanResult<CString> {
    CString::new(name).map_err(|_| VulkanError::InvalidName(name.to_string()))
}

// Driver name arrays are fixed-size and NUL-padded
fn fixed_name(raw: &[c_char]) -> String {
    let bytes: Vec<u8> = raw
        .iter()
        .take_while(|&&c| c != 0)
        .map(|&c| c as u8)
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}
