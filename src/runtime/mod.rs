//! Application runtime
//!
//! This module owns the application lifecycle:
//! - `lifetime`: startup wiring and graceful shutdown
//! - `modes`: execution mode entry points (HTTP server)

pub mod lifetime;
pub mod modes;
