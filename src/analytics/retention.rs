//! 数据清理任务
//!
//! 负责清理过期的访客事件和会话，防止数据库无限增长。

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use tracing::{debug, error, info, warn};

use crate::storage::SeaOrmStorage;
use migration::entities::{visitor_event, visitor_session};

/// 清理报告
#[derive(Debug, Default)]
pub struct CleanupReport {
    /// 删除的访客事件数量
    pub events_deleted: u64,
    /// 删除的访客会话数量
    pub sessions_deleted: u64,
}

/// 数据清理任务
pub struct RetentionTask {
    storage: Arc<SeaOrmStorage>,
    /// 访客数据保留天数
    retention_days: u32,
    /// 每次删除批量大小
    batch_size: u64,
}

impl RetentionTask {
    pub fn new(storage: Arc<SeaOrmStorage>, retention_days: u32) -> Self {
        Self {
            storage,
            retention_days,
            batch_size: 10000,
        }
    }

    /// 运行完整的清理流程
    pub async fn run_cleanup(&self) -> anyhow::Result<CleanupReport> {
        let mut report = CleanupReport::default();
        let cutoff = Utc::now() - Duration::days(self.retention_days as i64);

        // 1. 清理过期事件（分批删除）
        match self.cleanup_events(cutoff).await {
            Ok(deleted) => {
                report.events_deleted = deleted;
            }
            Err(e) => {
                error!("Failed to clean up visitor events: {}", e);
            }
        }

        // 2. 清理过期会话（按最后活跃时间）
        match self.cleanup_sessions(cutoff).await {
            Ok(deleted) => {
                report.sessions_deleted = deleted;
            }
            Err(e) => {
                error!("Failed to clean up visitor sessions: {}", e);
            }
        }

        info!(
            "Data cleanup completed: events {}, sessions {}",
            report.events_deleted, report.sessions_deleted
        );

        Ok(report)
    }

    /// 清理过期的访客事件（分批删除避免长事务）
    async fn cleanup_events(&self, cutoff: chrono::DateTime<Utc>) -> anyhow::Result<u64> {
        let db = self.storage.get_db();

        let mut total_deleted = 0u64;
        let mut iterations = 0;
        let max_iterations = 1000; // 防止无限循环

        loop {
            if iterations >= max_iterations {
                warn!(
                    "Event cleanup reached max iterations {} (deleted {} rows)",
                    max_iterations, total_deleted
                );
                break;
            }

            // 查找要删除的 ID 列表
            let ids_to_delete: Vec<i64> = visitor_event::Entity::find()
                .select_only()
                .column(visitor_event::Column::Id)
                .filter(visitor_event::Column::CreatedAt.lt(cutoff))
                .order_by_asc(visitor_event::Column::Id)
                .limit(self.batch_size)
                .into_tuple()
                .all(db)
                .await?;

            if ids_to_delete.is_empty() {
                break;
            }

            // 批量删除
            let deleted = visitor_event::Entity::delete_many()
                .filter(visitor_event::Column::Id.is_in(ids_to_delete.clone()))
                .exec(db)
                .await?
                .rows_affected;

            total_deleted += deleted;
            iterations += 1;

            debug!(
                "Event cleanup batch {}: deleted {} rows (total {})",
                iterations, deleted, total_deleted
            );

            // 如果删除的数量小于批量大小，说明已经没有更多数据
            if deleted < self.batch_size {
                break;
            }

            // 短暂暂停，避免对数据库造成过大压力
            tokio::time::sleep(StdDuration::from_millis(100)).await;
        }

        Ok(total_deleted)
    }

    /// 清理过期的访客会话
    async fn cleanup_sessions(&self, cutoff: chrono::DateTime<Utc>) -> anyhow::Result<u64> {
        let db = self.storage.get_db();

        let mut total_deleted = 0u64;
        let mut iterations = 0;
        let max_iterations = 1000;

        loop {
            if iterations >= max_iterations {
                warn!(
                    "Session cleanup reached max iterations {} (deleted {} rows)",
                    max_iterations, total_deleted
                );
                break;
            }

            let ids_to_delete: Vec<String> = visitor_session::Entity::find()
                .select_only()
                .column(visitor_session::Column::SessionId)
                .filter(visitor_session::Column::LastSeenAt.lt(cutoff))
                .order_by_asc(visitor_session::Column::SessionId)
                .limit(self.batch_size)
                .into_tuple()
                .all(db)
                .await?;

            if ids_to_delete.is_empty() {
                break;
            }

            let deleted = visitor_session::Entity::delete_many()
                .filter(visitor_session::Column::SessionId.is_in(ids_to_delete.clone()))
                .exec(db)
                .await?
                .rows_affected;

            total_deleted += deleted;
            iterations += 1;

            debug!(
                "Session cleanup batch {}: deleted {} rows (total {})",
                iterations, deleted, total_deleted
            );

            if deleted < self.batch_size {
                break;
            }

            tokio::time::sleep(StdDuration::from_millis(100)).await;
        }

        Ok(total_deleted)
    }

    /// 启动后台清理任务
    ///
    /// 每隔指定时间运行一次清理
    pub fn spawn_background_task(self: Arc<Self>, interval_hours: u64) {
        tokio::spawn(async move {
            let interval = StdDuration::from_secs(interval_hours * 60 * 60);

            // 首次运行延迟 5 分钟
            tokio::time::sleep(StdDuration::from_secs(300)).await;

            loop {
                if let Err(e) = self.run_cleanup().await {
                    error!("Data cleanup task failed: {}", e);
                }

                tokio::time::sleep(interval).await;
            }
        });

        info!(
            "Data cleanup background task started (interval: {} hours)",
            interval_hours
        );
    }
}
