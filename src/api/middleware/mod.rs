pub mod auth;
pub mod csrf;
pub mod health;
pub mod timing;

pub use auth::AdminAuth;
pub use csrf::CsrfGuard;
pub use health::HealthAuth;
pub use timing::RequestTiming;
