pub use sea_orm_migration::prelude::*;

pub mod entities;
mod m020250812_000001_initial_table;
mod m020250812_000002_usage_stats;
mod m020250901_000001_visitor_tracking;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m020250812_000001_initial_table::Migration),
            Box::new(m020250812_000002_usage_stats::Migration),
            Box::new(m020250901_000001_visitor_tracking::Migration),
        ]
    }
}
