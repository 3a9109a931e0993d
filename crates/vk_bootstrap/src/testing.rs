#![allow(missing_docs)]

//! Fabricated windows and drivers for exercising the bootstrap without a
//! display or GPU
//!
//! Every fake resource writes `acquire <name>` when created and
//! `release <name>` when dropped into a shared [`EventLog`].

use ash::vk;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use crate::core::WindowConfig;
use crate::vulkan::{
    DiagnosticMessage, DiagnosticSink, DriverInstance, GraphicsDriver, InstanceDescriptor,
    MessageTypes, Severity, VulkanError, VulkanResult,
};
use crate::window::{WindowBackend, WindowError, WindowResult, WindowSystem};

/// Ordered record of acquire/release events
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Rc<RefCell<Vec<String>>>,
}

impl EventLog {
    fn record(&self, event: String) {
        self.events.borrow_mut().push(event);
    }

    pub fn events(&self) -> Vec<String> {
        self.events.borrow().clone()
    }

    /// Resource names in event order, without the acquire/release verb
    pub fn resource_names(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|event| event.split_once(' ').map(|(_, name)| name.to_string()))
            .collect()
    }
}

/// Sink that keeps every message it receives
#[derive(Debug, Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<DiagnosticMessage>>,
}

impl RecordingSink {
    pub fn messages(&self) -> Vec<DiagnosticMessage> {
        self.messages.lock().unwrap().clone()
    }
}

impl DiagnosticSink for RecordingSink {
    fn report(&self, message: &DiagnosticMessage) {
        self.messages.lock().unwrap().push(message.clone());
    }
}

pub struct FakeWindowSystem {
    log: EventLog,
    platform_extensions: Vec<String>,
    close_after: usize,
    refuse: bool,
    vulkan_supported: bool,
    polls: Rc<Cell<usize>>,
}

impl FakeWindowSystem {
    pub fn new<I, S>(log: &EventLog, platform_extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            log: log.clone(),
            platform_extensions: platform_extensions.into_iter().map(Into::into).collect(),
            close_after: 1,
            refuse: false,
            vulkan_supported: true,
            polls: Rc::default(),
        }
    }

    /// Report close requested after `polls` calls to `poll_events`
    pub fn closing_after(mut self, polls: usize) -> Self {
        self.close_after = polls;
        self
    }

    pub fn refusing_windows(mut self) -> Self {
        self.refuse = true;
        self
    }

    /// Windows report that they cannot present through Vulkan
    pub fn without_vulkan(mut self) -> Self {
        self.vulkan_supported = false;
        self
    }

    pub fn polls(&self) -> usize {
        self.polls.get()
    }
}

impl WindowSystem for FakeWindowSystem {
    type Window = FakeWindow;

    fn create_window(&mut self, _config: &WindowConfig) -> WindowResult<FakeWindow> {
        if self.refuse {
            return Err(WindowError::CreationFailed);
        }
        self.log.record("acquire window".to_string());
        Ok(FakeWindow {
            log: self.log.clone(),
            platform_extensions: self.platform_extensions.clone(),
            close_after: self.close_after,
            vulkan_supported: self.vulkan_supported,
            polls: Rc::clone(&self.polls),
            should_close: false,
        })
    }
}

pub struct FakeWindow {
    log: EventLog,
    platform_extensions: Vec<String>,
    close_after: usize,
    vulkan_supported: bool,
    polls: Rc<Cell<usize>>,
    should_close: bool,
}

impl WindowBackend for FakeWindow {
    fn should_close(&self) -> bool {
        self.should_close
    }

    fn poll_events(&mut self) {
        self.polls.set(self.polls.get() + 1);
        if self.polls.get() >= self.close_after {
            self.should_close = true;
        }
    }

    fn required_instance_extensions(&self) -> WindowResult<Vec<String>> {
        if !self.vulkan_supported {
            return Err(WindowError::VulkanUnsupported);
        }
        Ok(self.platform_extensions.clone())
    }
}

impl Drop for FakeWindow {
    fn drop(&mut self) {
        self.log.record("release window".to_string());
    }
}

#[derive(Default)]
pub struct FakeDriver {
    log: EventLog,
    layers: RefCell<Vec<String>>,
    extensions: Vec<String>,
    failure: Option<vk::Result>,
    layer_failure: Option<vk::Result>,
    messenger_failure: Option<vk::Result>,
    emitted: Option<String>,
    emitted_during_creation: Option<String>,
    layer_queries: Cell<usize>,
    instances_created: Cell<usize>,
    last_descriptor: RefCell<Option<InstanceDescriptor>>,
}

impl FakeDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_log(mut self, log: &EventLog) -> Self {
        self.log = log.clone();
        self
    }

    pub fn with_layers<I, S>(self, layers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_layers(layers);
        self
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Make instance creation fail with `status`
    pub fn failing_with(mut self, status: vk::Result) -> Self {
        self.failure = Some(status);
        self
    }

    /// Make layer enumeration fail with `status`
    pub fn failing_layer_enumeration(mut self, status: vk::Result) -> Self {
        self.layer_failure = Some(status);
        self
    }

    /// Make messenger registration fail with `status`
    pub fn failing_messenger(mut self, status: vk::Result) -> Self {
        self.messenger_failure = Some(status);
        self
    }

    /// Emit one message through the messenger chained into instance creation
    pub fn emitting_during_creation(mut self, text: &str) -> Self {
        self.emitted_during_creation = Some(text.to_string());
        self
    }

    /// Emit one validation message as soon as a messenger is attached
    pub fn emitting(mut self, text: &str) -> Self {
        self.emitted = Some(text.to_string());
        self
    }

    pub fn set_layers<I, S>(&self, layers: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self.layers.borrow_mut() = layers.into_iter().map(Into::into).collect();
    }

    pub fn layer_queries(&self) -> usize {
        self.layer_queries.get()
    }

    pub fn instances_created(&self) -> usize {
        self.instances_created.get()
    }

    pub fn last_descriptor(&self) -> Option<InstanceDescriptor> {
        self.last_descriptor.borrow().clone()
    }
}

impl GraphicsDriver for FakeDriver {
    type Instance = FakeInstance;

    fn layer_names(&self) -> VulkanResult<Vec<String>> {
        self.layer_queries.set(self.layer_queries.get() + 1);
        if let Some(status) = self.layer_failure {
            return Err(VulkanError::Api(status));
        }
        Ok(self.layers.borrow().clone())
    }

    fn extension_names(&self) -> VulkanResult<Vec<String>> {
        Ok(self.extensions.clone())
    }

    fn create_instance(
        &self,
        descriptor: &InstanceDescriptor,
        sink: &Arc<dyn DiagnosticSink>,
    ) -> VulkanResult<FakeInstance> {
        *self.last_descriptor.borrow_mut() = Some(descriptor.clone());
        if let (Some(_), Some(text)) = (descriptor.diagnostics, &self.emitted_during_creation) {
            sink.report(&validation_message(text));
        }
        if let Some(status) = self.failure {
            return Err(VulkanError::Api(status));
        }
        self.instances_created.set(self.instances_created.get() + 1);
        self.log.record("acquire instance".to_string());
        Ok(FakeInstance {
            log: self.log.clone(),
            descriptor: descriptor.clone(),
            emitted: self.emitted.clone(),
            messenger_failure: self.messenger_failure,
        })
    }
}

#[derive(Debug)]
pub struct FakeInstance {
    log: EventLog,
    descriptor: InstanceDescriptor,
    emitted: Option<String>,
    messenger_failure: Option<vk::Result>,
}

impl FakeInstance {
    pub fn descriptor(&self) -> &InstanceDescriptor {
        &self.descriptor
    }
}

impl DriverInstance for FakeInstance {
    type Messenger<'i> = FakeMessenger<'i>;

    fn attach_messenger(
        &self,
        _min_severity: Severity,
        sink: Arc<dyn DiagnosticSink>,
    ) -> VulkanResult<FakeMessenger<'_>> {
        if let Some(status) = self.messenger_failure {
            return Err(VulkanError::Api(status));
        }
        self.log.record("acquire messenger".to_string());
        if let Some(text) = &self.emitted {
            sink.report(&validation_message(text));
        }
        Ok(FakeMessenger { instance: self })
    }
}

impl Drop for FakeInstance {
    fn drop(&mut self) {
        self.log.record("release instance".to_string());
    }
}

pub struct FakeMessenger<'i> {
    instance: &'i FakeInstance,
}

impl Drop for FakeMessenger<'_> {
    fn drop(&mut self) {
        self.instance.log.record("release messenger".to_string());
    }
}

fn validation_message(text: &str) -> DiagnosticMessage {
    DiagnosticMessage {
        severity: Severity::Error,
        types: MessageTypes::VALIDATION,
        id_name: None,
        text: text.to_string(),
        objects: Vec::new(),
    }
}
