pub mod admin;
pub mod health;
pub mod redirect;
pub mod tracking;

pub use health::{AppStartTime, HealthService, health_routes};
pub use redirect::{RedirectService, redirect_routes};
pub use tracking::tracking_routes;
