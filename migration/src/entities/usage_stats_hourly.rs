use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "usage_stats_hourly")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Bucket date, "YYYY-MM-DD" (UTC).
    pub stat_date: String,
    /// Bucket hour, 0-23 (UTC).
    pub stat_hour: i32,
    pub requests_total: i64,
    pub redirects_total: i64,
    pub errors_total: i64,
    pub rate_limited_total: i64,
    /// Streaming mean of response time in milliseconds.
    pub avg_response_ms: f64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
