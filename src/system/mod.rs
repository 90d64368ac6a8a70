//! System-level modules
//!
//! This module contains system-level functionality:
//! - Logging initialization (tracing subscriber, file rotation)

pub mod logging;

pub use logging::init_logging;
