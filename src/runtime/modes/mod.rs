//! Mode routing
//!
//! The service runs as a single-mode HTTP server; this module keeps the
//! entry point for it.

pub mod server;

pub use server::run_server;
