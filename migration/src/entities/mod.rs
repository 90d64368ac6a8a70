pub mod redirect_link;
pub mod usage_stats_hourly;
pub mod visitor_event;
pub mod visitor_session;

pub use redirect_link::Entity as RedirectLinkEntity;
pub use usage_stats_hourly::Entity as UsageStatsHourlyEntity;
pub use visitor_event::Entity as VisitorEventEntity;
pub use visitor_session::Entity as VisitorSessionEntity;
