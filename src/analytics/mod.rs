pub mod global;
pub mod manager;
pub mod retention;
pub mod sink;
pub mod usage;

pub use global::{get_hit_manager, set_global_hit_manager};
pub use manager::HitManager;
pub use retention::RetentionTask;
pub use sink::HitSink;
pub use usage::{UsageDelta, UsageRecorder, UsageSink};
