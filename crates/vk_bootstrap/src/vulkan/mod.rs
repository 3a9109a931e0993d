//! Vulkan bootstrap: driver access, capability negotiation, instance
//! creation and the debug messenger

pub mod context;
pub mod debug;
pub mod instance;
pub mod negotiation;

pub use context::{DriverInstance, GraphicsDriver, VulkanDriver, VulkanError, VulkanInstance, VulkanResult};
pub use debug::{DebugMessenger, DiagnosticMessage, DiagnosticSink, LogSink, MessageTypes, RelatedObject, Severity};
pub use instance::{create_instance, InstanceDescriptor};
pub use negotiation::{
    extensions_supported, layers_supported, missing_names, resolve_extensions, Availability,
    ExtensionRequest, DEBUG_UTILS_EXTENSION,
};
