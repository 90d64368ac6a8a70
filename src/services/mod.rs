//! Service layer for business logic
//!
//! This module provides unified business logic that can be shared between
//! different interfaces (HTTP API and background tasks).

mod analytics_service;
mod link_service;
mod selector;
mod tracking_service;

pub use analytics_service::*;
pub use link_service::*;
pub use selector::*;
pub use tracking_service::*;
