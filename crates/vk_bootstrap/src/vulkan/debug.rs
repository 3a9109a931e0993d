//! Driver diagnostics: message model, sinks and the debug messenger
//!
//! The validation layers report through `VK_EXT_debug_utils`. The callback
//! registered here does not touch any global state: the sink it forwards to
//! is handed over at registration time and travels through the messenger's
//! user-data pointer.

use ash::extensions::ext::DebugUtils;
use ash::{vk, Entry, Instance};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::ffi::{c_void, CStr};
use std::marker::PhantomData;
use std::os::raw::c_char;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use super::context::{VulkanError, VulkanResult};

/// Log target used for driver diagnostics
pub const LOG_TARGET: &str = "vulkan";

/// Diagnostic message severity, ordered least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Diagnostic chatter from the loader and layers
    Verbose,
    /// Informational, e.g. resource creation
    Info,
    /// Likely an application bug, not necessarily invalid usage
    Warning,
    /// Invalid usage that may crash
    Error,
}

impl Severity {
    const ALL: [Self; 4] = [Self::Verbose, Self::Info, Self::Warning, Self::Error];

    /// Severity of a single message as reported by the driver
    pub fn from_vk(flags: vk::DebugUtilsMessageSeverityFlagsEXT) -> Self {
        if flags.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
            Self::Error
        } else if flags.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
            Self::Warning
        } else if flags.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
            Self::Info
        } else {
            Self::Verbose
        }
    }

    /// Matching Vulkan severity bit
    pub fn to_vk(self) -> vk::DebugUtilsMessageSeverityFlagsEXT {
        match self {
            Self::Verbose => vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE,
            Self::Info => vk::DebugUtilsMessageSeverityFlagsEXT::INFO,
            Self::Warning => vk::DebugUtilsMessageSeverityFlagsEXT::WARNING,
            Self::Error => vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
        }
    }

    /// Severities a messenger subscribes to for a given minimum
    ///
    /// Warnings and errors are always part of the subscription.
    pub fn subscription(min: Self) -> vk::DebugUtilsMessageSeverityFlagsEXT {
        let floor = min.min(Self::Warning);
        Self::ALL
            .iter()
            .filter(|severity| **severity >= floor)
            .fold(vk::DebugUtilsMessageSeverityFlagsEXT::empty(), |flags, severity| {
                flags | severity.to_vk()
            })
    }

    /// Log level a message of this severity is routed to
    pub fn log_level(self) -> log::Level {
        match self {
            Self::Verbose => log::Level::Debug,
            Self::Info => log::Level::Info,
            Self::Warning => log::Level::Warn,
            Self::Error => log::Level::Error,
        }
    }
}

bitflags! {
    /// Categories a diagnostic message belongs to
    ///
    /// Bit values match `VkDebugUtilsMessageTypeFlagBitsEXT`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MessageTypes: u32 {
        /// Unrelated to Vulkan API validity or performance
        const GENERAL = 0b001;
        /// Violates Vulkan usage rules or indicates a likely mistake
        const VALIDATION = 0b010;
        /// Potentially non-optimal use of Vulkan
        const PERFORMANCE = 0b100;
    }
}

impl MessageTypes {
    /// Convert from driver flags, dropping categories not modelled here
    pub fn from_vk(flags: vk::DebugUtilsMessageTypeFlagsEXT) -> Self {
        Self::from_bits_truncate(flags.as_raw())
    }

    /// Convert to driver flags
    pub fn to_vk(self) -> vk::DebugUtilsMessageTypeFlagsEXT {
        vk::DebugUtilsMessageTypeFlagsEXT::from_raw(self.bits())
    }
}

/// A driver object a diagnostic message refers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedObject {
    /// Object type as reported by the driver
    pub object_type: vk::ObjectType,
    /// Raw handle value
    pub handle: u64,
    /// Debug name, if the application assigned one
    pub name: Option<String>,
}

/// One message delivered by the debug messenger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticMessage {
    /// How bad it is
    pub severity: Severity,
    /// What kind of message it is
    pub types: MessageTypes,
    /// Message identifier name, e.g. a validation VUID
    pub id_name: Option<String>,
    /// Human readable text
    pub text: String,
    /// Objects involved in the message
    pub objects: Vec<RelatedObject>,
}

impl DiagnosticMessage {
    /// Copy a message out of raw callback data
    ///
    /// # Safety
    /// `data` must be callback data as handed to a
    /// `PFN_vkDebugUtilsMessengerCallbackEXT`: string pointers null or
    /// NUL-terminated, `p_objects` valid for `object_count` elements.
    pub unsafe fn from_raw(
        severity: vk::DebugUtilsMessageSeverityFlagsEXT,
        types: vk::DebugUtilsMessageTypeFlagsEXT,
        data: &vk::DebugUtilsMessengerCallbackDataEXT,
    ) -> Self {
        let objects = if data.p_objects.is_null() || data.object_count == 0 {
            Vec::new()
        } else {
            // SAFETY: the driver guarantees `object_count` entries
            unsafe { std::slice::from_raw_parts(data.p_objects, data.object_count as usize) }
                .iter()
                .map(|object| RelatedObject {
                    object_type: object.object_type,
                    handle: object.object_handle,
                    name: unsafe { optional_string(object.p_object_name) },
                })
                .collect()
        };

        Self {
            severity: Severity::from_vk(severity),
            types: MessageTypes::from_vk(types),
            id_name: unsafe { optional_string(data.p_message_id_name) },
            text: unsafe { optional_string(data.p_message) }.unwrap_or_default(),
            objects,
        }
    }
}

unsafe fn optional_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        None
    } else {
        // SAFETY: caller guarantees a NUL-terminated string
        Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
    }
}

/// Destination for driver diagnostics
///
/// The driver may invoke the callback from any of its threads, so sinks must
/// be `Send + Sync` and must not block.
pub trait DiagnosticSink: Send + Sync {
    /// Receive one message
    fn report(&self, message: &DiagnosticMessage);
}

/// Forwards diagnostics to the `log` facade, routed by severity
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&self, message: &DiagnosticMessage) {
        log::log!(
            target: LOG_TARGET,
            message.severity.log_level(),
            "[{:?}] {}",
            message.types,
            message.text
        );
        for object in &message.objects {
            log::trace!(
                target: LOG_TARGET,
                "  object {:?} 0x{:x} {}",
                object.object_type,
                object.handle,
                object.name.as_deref().unwrap_or("")
            );
        }
    }
}

/// Debug callback registered with `VK_EXT_debug_utils`
///
/// Always returns `VK_FALSE`: a diagnostic never aborts the call that
/// triggered it.
///
/// # Safety
/// `user_data` must be null or point to the `Arc<dyn DiagnosticSink>` owned by
/// the live [`DebugMessenger`] that registered this callback.
pub(crate) unsafe extern "system" fn debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    user_data: *mut c_void,
) -> vk::Bool32 {
    if callback_data.is_null() || user_data.is_null() {
        return vk::FALSE;
    }

    // Unwinding across the FFI boundary is undefined behaviour
    let _ = panic::catch_unwind(AssertUnwindSafe(|| {
        // SAFETY: both pointers checked above and valid for this call
        let sink = unsafe { &*(user_data as *const Arc<dyn DiagnosticSink>) };
        let message = unsafe { DiagnosticMessage::from_raw(message_severity, message_type, &*callback_data) };
        sink.report(&message);
    }));

    vk::FALSE
}

/// Create info for a messenger subscribed to `min_severity` and above
pub fn messenger_create_info(
    min_severity: Severity,
    user_data: *mut c_void,
) -> vk::DebugUtilsMessengerCreateInfoEXT {
    vk::DebugUtilsMessengerCreateInfoEXT::builder()
        .message_severity(Severity::subscription(min_severity))
        .message_type(MessageTypes::all().to_vk())
        .pfn_user_callback(Some(debug_callback))
        .user_data(user_data)
        .build()
}

/// Registered debug messenger
///
/// Borrows the instance it was created on, so it is always destroyed first.
pub struct DebugMessenger<'i> {
    loader: DebugUtils,
    handle: vk::DebugUtilsMessengerEXT,
    // Pointed to by the callback's user data; boxed so the address is stable
    _sink: Box<Arc<dyn DiagnosticSink>>,
    _instance: PhantomData<&'i Instance>,
}

impl<'i> DebugMessenger<'i> {
    /// Register the debug callback on `instance`
    ///
    /// The instance must have been created with `VK_EXT_debug_utils` enabled.
    pub fn attach(
        entry: &Entry,
        instance: &'i Instance,
        min_severity: Severity,
        sink: Arc<dyn DiagnosticSink>,
    ) -> VulkanResult<Self> {
        let loader = DebugUtils::new(entry, instance);
        let sink = Box::new(sink);
        let user_data = std::ptr::addr_of!(*sink).cast_mut().cast::<c_void>();
        let create_info = messenger_create_info(min_severity, user_data);

        let handle = unsafe {
            loader
                .create_debug_utils_messenger(&create_info, None)
                .map_err(VulkanError::Api)?
        };
        log::debug!("Debug messenger attached (min severity {:?})", min_severity);

        Ok(Self {
            loader,
            handle,
            _sink: sink,
            _instance: PhantomData,
        })
    }

    /// Raw messenger handle
    pub fn handle(&self) -> vk::DebugUtilsMessengerEXT {
        self.handle
    }
}

impl Drop for DebugMessenger<'_> {
    fn drop(&mut self) {
        log::debug!("Detaching debug messenger");
        unsafe {
            self.loader.destroy_debug_utils_messenger(self.handle, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingSink;
    use std::ffi::CString;

    #[test]
    fn test_severity_ordering_and_round_trip() {
        assert!(Severity::Verbose < Severity::Info);
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
        for severity in Severity::ALL {
            assert_eq!(Severity::from_vk(severity.to_vk()), severity);
        }
    }

    #[test]
    fn test_subscription_always_includes_warning_and_error() {
        use vk::DebugUtilsMessageSeverityFlagsEXT as F;

        assert_eq!(Severity::subscription(Severity::Error), F::WARNING | F::ERROR);
        assert_eq!(Severity::subscription(Severity::Warning), F::WARNING | F::ERROR);
        assert_eq!(Severity::subscription(Severity::Info), F::INFO | F::WARNING | F::ERROR);
        assert_eq!(
            Severity::subscription(Severity::Verbose),
            F::VERBOSE | F::INFO | F::WARNING | F::ERROR
        );
    }

    #[test]
    fn test_message_types_match_vk_bits() {
        assert_eq!(
            MessageTypes::all().to_vk(),
            vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE
        );
        assert_eq!(
            MessageTypes::from_vk(vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION),
            MessageTypes::VALIDATION
        );
    }

    #[test]
    fn test_log_routing() {
        assert_eq!(Severity::Error.log_level(), log::Level::Error);
        assert_eq!(Severity::Warning.log_level(), log::Level::Warn);
        assert_eq!(Severity::Info.log_level(), log::Level::Info);
        assert_eq!(Severity::Verbose.log_level(), log::Level::Debug);
    }

    #[test]
    fn test_create_info_subscriptions() {
        let info = messenger_create_info(Severity::Warning, std::ptr::null_mut());
        assert_eq!(info.message_severity, Severity::subscription(Severity::Warning));
        assert_eq!(info.message_type, MessageTypes::all().to_vk());
        assert!(info.pfn_user_callback.is_some());
    }

    #[test]
    fn test_callback_forwards_to_sink_and_never_aborts() {
        let recorder = Arc::new(RecordingSink::default());
        let sink: Arc<dyn DiagnosticSink> = recorder.clone();
        let user_data = std::ptr::addr_of!(sink).cast_mut().cast::<c_void>();

        let text = CString::new("vkCreateBuffer: size is zero").unwrap();
        let id = CString::new("VUID-VkBufferCreateInfo-size-00912").unwrap();
        let name = CString::new("staging").unwrap();
        let objects = [vk::DebugUtilsObjectNameInfoEXT {
            object_type: vk::ObjectType::BUFFER,
            object_handle: 0xdead,
            p_object_name: name.as_ptr(),
            ..Default::default()
        }];
        let data = vk::DebugUtilsMessengerCallbackDataEXT {
            p_message_id_name: id.as_ptr(),
            p_message: text.as_ptr(),
            object_count: 1,
            p_objects: objects.as_ptr(),
            ..Default::default()
        };

        let result = unsafe {
            debug_callback(
                vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
                vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION,
                &data,
                user_data,
            )
        };

        assert_eq!(result, vk::FALSE);
        let messages = recorder.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].severity, Severity::Error);
        assert_eq!(messages[0].types, MessageTypes::VALIDATION);
        assert_eq!(messages[0].text, "vkCreateBuffer: size is zero");
        assert_eq!(messages[0].id_name.as_deref(), Some("VUID-VkBufferCreateInfo-size-00912"));
        assert_eq!(
            messages[0].objects,
            vec![RelatedObject {
                object_type: vk::ObjectType::BUFFER,
                handle: 0xdead,
                name: Some("staging".to_string()),
            }]
        );
    }

    #[test]
    fn test_callback_tolerates_missing_fields() {
        let recorder = Arc::new(RecordingSink::default());
        let sink: Arc<dyn DiagnosticSink> = recorder.clone();
        let user_data = std::ptr::addr_of!(sink).cast_mut().cast::<c_void>();
        let data = vk::DebugUtilsMessengerCallbackDataEXT::default();

        let verbose = unsafe {
            debug_callback(
                vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE,
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL,
                &data,
                user_data,
            )
        };
        let no_sink = unsafe {
            debug_callback(
                vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL,
                &data,
                std::ptr::null_mut(),
            )
        };

        assert_eq!(verbose, vk::FALSE);
        assert_eq!(no_sink, vk::FALSE);
        let messages = recorder.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].severity, Severity::Verbose);
        assert!(messages[0].text.is_empty());
        assert!(messages[0].id_name.is_none());
        assert!(messages[0].objects.is_empty());
    }

    #[test]
    fn test_panicking_sink_does_not_unwind_into_driver() {
        struct PanickingSink;
        impl DiagnosticSink for PanickingSink {
            fn report(&self, _message: &DiagnosticMessage) {
                panic!("sink failure");
            }
        }

        let sink: Arc<dyn DiagnosticSink> = Arc::new(PanickingSink);
        let user_data = std::ptr::addr_of!(sink).cast_mut().cast::<c_void>();
        let data = vk::DebugUtilsMessengerCallbackDataEXT::default();

        let result = unsafe {
            debug_callback(
                vk::DebugUtilsMessageSeverityFlagsEXT::WARNING,
                vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
                &data,
                user_data,
            )
        };
        assert_eq!(result, vk::FALSE);
    }
}
