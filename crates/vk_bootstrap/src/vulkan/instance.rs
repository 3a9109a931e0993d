//! Instance creation
//!
//! Turns an [`ApplicationConfig`] plus the negotiated extension list into an
//! [`InstanceDescriptor`] and asks the driver for an instance. Requested
//! validation layers are checked against a fresh enumeration first; if any
//! is missing no instance is created.

use std::sync::Arc;

use super::context::GraphicsDriver;
use super::debug::{DiagnosticSink, Severity};
use super::negotiation::{self, Availability, ExtensionRequest};
use crate::core::{ApiVersion, ApplicationConfig};
use crate::lifecycle::BootstrapError;

/// Everything the driver needs to create an instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceDescriptor {
    /// Application name
    pub application_name: String,
    /// Application version
    pub application_version: ApiVersion,
    /// Engine name
    pub engine_name: String,
    /// Engine version
    pub engine_version: ApiVersion,
    /// Targeted API version
    pub api_version: ApiVersion,
    /// Instance extensions to enable
    pub extensions: ExtensionRequest,
    /// Instance layers to enable; empty unless validation is on
    pub layers: Vec<String>,
    /// Minimum severity reported during instance creation and destruction;
    /// `None` unless validation is on
    pub diagnostics: Option<Severity>,
}

impl InstanceDescriptor {
    /// Build the descriptor for `config` with the negotiated extensions
    pub fn new(config: &ApplicationConfig, extensions: ExtensionRequest) -> Self {
        Self {
            application_name: config.application_name.clone(),
            application_version: config.application_version,
            engine_name: config.engine_name.clone(),
            engine_version: config.engine_version,
            api_version: config.api_version,
            extensions,
            layers: config.enabled_layers().to_vec(),
            diagnostics: config.enable_validation.then_some(config.diagnostic_severity),
        }
    }
}

/// Create an instance for `config`
///
/// When validation is enabled the installed layers are enumerated now and
/// creation fails with [`BootstrapError::LayerUnavailable`] if any requested
/// layer is missing. Extensions the driver does not advertise are logged; the
/// driver's own verdict on them is what counts. With validation on, messages
/// the driver raises while creating or destroying the instance go to `sink`.
pub fn create_instance<D: GraphicsDriver>(
    driver: &D,
    config: &ApplicationConfig,
    extensions: &ExtensionRequest,
    sink: &Arc<dyn DiagnosticSink>,
) -> Result<D::Instance, BootstrapError> {
    if config.enable_validation {
        let available = Availability::layers(driver).map_err(BootstrapError::Enumeration)?;
        if !negotiation::layers_supported(&config.validation_layers, &available) {
            return Err(BootstrapError::LayerUnavailable {
                missing: negotiation::missing_names(&config.validation_layers, &available),
            });
        }
    }

    match Availability::extensions(driver) {
        Ok(available) if !negotiation::extensions_supported(extensions, &available) => {
            log::warn!(
                "Driver does not advertise requested extensions: {:?}",
                negotiation::missing_names(extensions, &available)
            );
        }
        Ok(_) => {}
        Err(e) => log::warn!("Could not enumerate instance extensions: {}", e),
    }

    let descriptor = InstanceDescriptor::new(config, extensions.clone());
    log::info!(
        "Creating Vulkan instance for \"{}\" (API {}) with extensions {:?} and layers {:?}",
        descriptor.application_name,
        descriptor.api_version,
        descriptor.extensions.names(),
        descriptor.layers
    );

    driver
        .create_instance(&descriptor, sink)
        .map_err(BootstrapError::InstanceCreation)
}
