//! Analytics service layer
//!
//! Read-side queries for the admin dashboard: hourly usage rows, visitor
//! session summaries and recent events. All writes go through the buffered
//! recorders and `TrackingService`; this service only reads.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;
use tracing::debug;

use crate::errors::{OutlinkerError, Result};
use crate::storage::SeaOrmStorage;

// ============ 公共类型定义 ============

/// 单小时用量数据
#[derive(Debug, Clone, Serialize)]
pub struct UsageRow {
    pub date: String,
    pub hour: i32,
    pub requests_total: i64,
    pub redirects_total: i64,
    pub errors_total: i64,
    pub rate_limited_total: i64,
    pub avg_response_ms: f64,
}

/// 会话概览
#[derive(Debug, Clone, Serialize)]
pub struct SessionOverview {
    pub total_sessions: u64,
    pub converted_sessions: u64,
    pub conversion_rate: f64,
    pub top_sources: Vec<SourceCount>,
}

/// 来源计数
#[derive(Debug, Clone, Serialize)]
pub struct SourceCount {
    pub source: String,
    pub count: u64,
}

/// 访客事件（展示用）
#[derive(Debug, Clone, Serialize)]
pub struct EventRow {
    pub id: i64,
    pub session_id: String,
    pub event_type: String,
    pub event_data: Option<serde_json::Value>,
    pub link_id: Option<String>,
    pub created_at: String,
}

// ============ AnalyticsService ============

/// Analytics 服务
pub struct AnalyticsService {
    storage: Arc<SeaOrmStorage>,
}

impl AnalyticsService {
    /// 创建 AnalyticsService 实例
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    /// `days` 查询参数统一约束到 1..=90
    fn clamp_days(days: u32) -> i64 {
        i64::from(days.clamp(1, 90))
    }

    /// 获取最近 N 天的小时级用量
    pub async fn usage_overview(&self, days: u32) -> Result<Vec<UsageRow>> {
        let cutoff = (Utc::now() - Duration::days(Self::clamp_days(days)))
            .format("%Y-%m-%d")
            .to_string();

        let rows = self.storage.get_usage_since(&cutoff).await.map_err(|e| {
            OutlinkerError::database_operation(format!("Usage query failed: {}", e))
        })?;

        debug!("Analytics: usage_overview returned {} rows", rows.len());

        Ok(rows
            .into_iter()
            .map(|m| UsageRow {
                date: m.stat_date,
                hour: m.stat_hour,
                requests_total: m.requests_total,
                redirects_total: m.redirects_total,
                errors_total: m.errors_total,
                rate_limited_total: m.rate_limited_total,
                avg_response_ms: m.avg_response_ms,
            })
            .collect())
    }

    /// 会话概览：总量、转化量与来源 TopN
    ///
    /// 两个查询通过 `tokio::try_join!` 并发执行。
    pub async fn session_overview(&self, days: u32) -> Result<SessionOverview> {
        let since = Utc::now() - Duration::days(Self::clamp_days(days));

        let (summary, sources) = tokio::try_join!(
            self.storage.session_summary(since),
            self.storage.session_sources(since, 10),
        )
        .map_err(|e| OutlinkerError::database_operation(format!("Session query failed: {}", e)))?;

        let conversion_rate = if summary.total_sessions > 0 {
            summary.converted_sessions as f64 / summary.total_sessions as f64
        } else {
            0.0
        };

        Ok(SessionOverview {
            total_sessions: summary.total_sessions,
            converted_sessions: summary.converted_sessions,
            conversion_rate,
            top_sources: sources
                .into_iter()
                .map(|row| SourceCount {
                    source: row.source.unwrap_or_else(|| "direct".to_string()),
                    count: row.count.max(0) as u64,
                })
                .collect(),
        })
    }

    /// 最近事件，可按会话过滤
    pub async fn recent_events(
        &self,
        session_id: Option<&str>,
        limit: u32,
    ) -> Result<Vec<EventRow>> {
        let limit = u64::from(limit.clamp(1, 200));

        let rows = self
            .storage
            .recent_events(session_id, limit)
            .await
            .map_err(|e| {
                OutlinkerError::database_operation(format!("Event query failed: {}", e))
            })?;

        debug!("Analytics: recent_events returned {} rows", rows.len());

        Ok(rows
            .into_iter()
            .map(|m| EventRow {
                id: m.id,
                session_id: m.session_id,
                event_type: m.event_type,
                // 存的是 JSON 文本，坏数据展示为 null 而不是整条失败
                event_data: m
                    .event_data
                    .as_deref()
                    .and_then(|raw| serde_json::from_str(raw).ok()),
                link_id: m.link_id,
                created_at: m.created_at.to_rfc3339(),
            })
            .collect())
    }
}
