//! Outlinker - A weighted outbound-redirect service
//!
//! This library provides the core functionality for the Outlinker service:
//! a managed pool of destination links with per-link weights, a redirect
//! endpoint that draws a destination on every visit, hit tracking and
//! visitor analytics.
//!
//! # Architecture
//! - `storage`: SeaORM storage backend and data access
//! - `analytics`: Hit buffering, hourly usage stats and data retention
//! - `services`: Business logic (weighted selection, link management, tracking)
//! - `api`: HTTP services and middleware
//! - `config`: Configuration management
//! - `runtime`: Application lifecycle and execution modes
//! - `system`: Logging and system utilities

pub mod analytics;
pub mod api;
pub mod config;
pub mod errors;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
