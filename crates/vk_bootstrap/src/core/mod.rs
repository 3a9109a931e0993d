//! # Core Module
//!
//! Shared configuration types used by every bootstrap component.

pub mod config;

pub use config::{ApiVersion, ApplicationConfig, WindowConfig, KHRONOS_VALIDATION_LAYER};
