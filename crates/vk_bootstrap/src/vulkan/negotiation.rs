//! Capability negotiation
//!
//! Pure functions deciding which instance extensions to request and whether
//! the requested validation layers are installed. Nothing here talks to the
//! driver except [`Availability::layers`] and [`Availability::extensions`],
//! which take a fresh snapshot every time they are called.

use std::collections::HashSet;

use super::context::{GraphicsDriver, VulkanResult};

/// Name of the `VK_EXT_debug_utils` instance extension
pub const DEBUG_UTILS_EXTENSION: &str = "VK_EXT_debug_utils";

/// Ordered, duplicate-free list of instance extensions to enable
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionRequest {
    names: Vec<String>,
}

impl ExtensionRequest {
    /// Extension names in request order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Iterate over extension names in request order
    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.names.iter()
    }

    /// Number of extensions requested
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether nothing is requested
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Whether `name` is requested
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    fn push_unique(&mut self, name: &str) {
        if !self.contains(name) {
            self.names.push(name.to_owned());
        }
    }
}

impl<'a> IntoIterator for &'a ExtensionRequest {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Snapshot of names a driver reports as available
///
/// Used for both layers and extensions. Never cached: each negotiation
/// queries the driver again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Availability {
    names: HashSet<String>,
}

impl Availability {
    /// Build a snapshot from a list of names
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Enumerate the layers currently installed
    pub fn layers<D: GraphicsDriver>(driver: &D) -> VulkanResult<Self> {
        driver.layer_names().map(Self::from_names)
    }

    /// Enumerate the instance extensions currently advertised
    pub fn extensions<D: GraphicsDriver>(driver: &D) -> VulkanResult<Self> {
        driver.extension_names().map(Self::from_names)
    }

    /// Exact, case-sensitive membership test
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Number of available names
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether nothing is available
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Compute the extensions to request at instance creation
///
/// Every platform-required extension is kept in its original order (repeats
/// collapse to the first occurrence), followed by [`DEBUG_UTILS_EXTENSION`]
/// when diagnostics are enabled.
pub fn resolve_extensions<S: AsRef<str>>(
    platform_required: &[S],
    diagnostics_enabled: bool,
) -> ExtensionRequest {
    let mut request = ExtensionRequest {
        names: Vec::with_capacity(platform_required.len() + 1),
    };
    for name in platform_required {
        request.push_unique(name.as_ref());
    }
    if diagnostics_enabled {
        request.push_unique(DEBUG_UTILS_EXTENSION);
    }
    request
}

/// Whether every requested layer is available
///
/// Fails closed: one missing layer fails the whole set. An empty request is
/// always satisfied.
pub fn layers_supported<S: AsRef<str>>(requested: &[S], available: &Availability) -> bool {
    requested.iter().all(|name| available.contains(name.as_ref()))
}

/// Whether every requested extension is advertised by the driver
pub fn extensions_supported(requested: &ExtensionRequest, available: &Availability) -> bool {
    requested.iter().all(|name| available.contains(name))
}

/// Requested names absent from `available`, in request order
pub fn missing_names<'a, I, S>(requested: I, available: &Availability) -> Vec<String>
where
    I: IntoIterator<Item = &'a S>,
    S: AsRef<str> + 'a + ?Sized,
{
    requested
        .into_iter()
        .map(AsRef::as_ref)
        .filter(|name| !available.contains(name))
        .map(str::to_owned)
        .collect()
}
