//! Foundation module - low-level utilities shared by the bootstrap
//!
//! - Logging setup

pub mod logging;
