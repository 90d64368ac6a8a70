//! Hourly usage statistics persistence.
//!
//! The usage table keeps one row per (date, hour). Counters are additive;
//! avg_response_ms is a running mean weighted by the request count, so a
//! plain additive upsert does not work here. Each flush reads the current
//! row, merges in memory and writes back. The recorder flushes from a single
//! task, which keeps read-merge-write free of write races.

use async_trait::async_trait;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use tracing::debug;

use super::SeaOrmStorage;
use super::retry;
use crate::analytics::{UsageDelta, UsageSink};

use migration::entities::usage_stats_hourly;

#[async_trait]
impl UsageSink for SeaOrmStorage {
    async fn flush_usage(&self, deltas: Vec<UsageDelta>) -> anyhow::Result<()> {
        if deltas.is_empty() {
            return Ok(());
        }

        let total_count = deltas.len();

        for delta in deltas {
            self.merge_usage_row(delta).await?;
        }

        debug!(
            "Usage stats flushed to {} database ({} buckets)",
            self.backend_name.to_uppercase(),
            total_count
        );

        Ok(())
    }
}

impl SeaOrmStorage {
    async fn merge_usage_row(&self, delta: UsageDelta) -> anyhow::Result<()> {
        let db = &self.db;
        let date = delta.date.clone();
        let hour = delta.hour;

        let existing = retry::with_retry("usage(fetch)", self.retry_config, || async {
            usage_stats_hourly::Entity::find()
                .filter(usage_stats_hourly::Column::StatDate.eq(date.clone()))
                .filter(usage_stats_hourly::Column::StatHour.eq(hour))
                .one(db)
                .await
        })
        .await?;

        match existing {
            Some(row) => {
                let prior_requests = row.requests_total;
                let merged_requests = prior_requests + delta.requests;
                // 加权合并运行平均：老的均值按已有请求数加权，新样本按响应时间总和并入
                let merged_avg = if merged_requests > 0 {
                    (row.avg_response_ms * prior_requests as f64 + delta.response_ms_sum)
                        / merged_requests as f64
                } else {
                    0.0
                };

                let model = usage_stats_hourly::ActiveModel {
                    id: Set(row.id),
                    requests_total: Set(merged_requests),
                    redirects_total: Set(row.redirects_total + delta.redirects),
                    errors_total: Set(row.errors_total + delta.errors),
                    rate_limited_total: Set(row.rate_limited_total + delta.rate_limited),
                    avg_response_ms: Set(merged_avg),
                    updated_at: Set(chrono::Utc::now()),
                    ..Default::default()
                };
                retry::with_retry("usage(update)", self.retry_config, || async {
                    model.clone().update(db).await
                })
                .await?;
            }
            None => {
                let now = chrono::Utc::now();
                let avg = if delta.requests > 0 {
                    delta.response_ms_sum / delta.requests as f64
                } else {
                    0.0
                };
                let model = usage_stats_hourly::ActiveModel {
                    stat_date: Set(delta.date.clone()),
                    stat_hour: Set(delta.hour),
                    requests_total: Set(delta.requests),
                    redirects_total: Set(delta.redirects),
                    errors_total: Set(delta.errors),
                    rate_limited_total: Set(delta.rate_limited),
                    avg_response_ms: Set(avg),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                };
                retry::with_retry("usage(insert)", self.retry_config, || async {
                    usage_stats_hourly::Entity::insert(model.clone())
                        .exec(db)
                        .await
                })
                .await?;
            }
        }

        Ok(())
    }

    /// 读取最近 N 天的用量统计，按日期和小时升序
    pub async fn get_usage_since(
        &self,
        cutoff_date: &str,
    ) -> anyhow::Result<Vec<usage_stats_hourly::Model>> {
        usage_stats_hourly::Entity::find()
            .filter(usage_stats_hourly::Column::StatDate.gte(cutoff_date))
            .order_by_asc(usage_stats_hourly::Column::StatDate)
            .order_by_asc(usage_stats_hourly::Column::StatHour)
            .all(&self.db)
            .await
            .map_err(Into::into)
    }
}
