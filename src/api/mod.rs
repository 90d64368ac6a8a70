//! HTTP layer: public redirect/tracking endpoints, admin API and the
//! middleware stack around them.

pub mod constants;
pub mod jwt;
pub mod middleware;
pub mod rate_limit;
pub mod services;
