//! Visitor session and event persistence.
//!
//! Sessions are keyed by a client-generated id and upserted on every ping;
//! events are append-only and pruned by the retention task.

use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ExprTrait, FromQueryResult, QueryFilter,
    QueryOrder, QuerySelect, sea_query::Expr,
};
use serde::Serialize;

use super::{SeaOrmStorage, retry};
use migration::entities::{visitor_event, visitor_session};

/// 会话汇总统计
#[derive(Debug, Default, Clone, Serialize)]
pub struct SessionSummary {
    pub total_sessions: u64,
    pub converted_sessions: u64,
}

#[derive(Debug, FromQueryResult)]
struct SessionStatsResult {
    total_sessions: i64,
    converted_sessions: Option<i64>,
}

/// 来源分布查询结果行
#[derive(Debug, FromQueryResult, Serialize)]
pub struct SourceRow {
    pub source: Option<String>,
    pub count: i64,
}

impl SeaOrmStorage {
    /// 写入或刷新一个访客会话
    ///
    /// 已存在的会话只刷新 last_seen_at，首次出现时落库全部字段。
    /// 返回是否新建。
    pub async fn upsert_session(
        &self,
        session_id: &str,
        referrer: Option<String>,
        landing_page: Option<String>,
        user_agent: Option<String>,
        source: Option<String>,
    ) -> anyhow::Result<bool> {
        let db = &self.db;
        let now = Utc::now();
        let id_owned = session_id.to_string();

        let existing = retry::with_retry("upsert_session(fetch)", self.retry_config, || async {
            visitor_session::Entity::find_by_id(&id_owned).one(db).await
        })
        .await?;

        if existing.is_some() {
            let model = visitor_session::ActiveModel {
                session_id: Set(session_id.to_string()),
                last_seen_at: Set(now),
                ..Default::default()
            };
            retry::with_retry("upsert_session(touch)", self.retry_config, || async {
                model.clone().update(db).await
            })
            .await?;
            return Ok(false);
        }

        let model = visitor_session::ActiveModel {
            session_id: Set(session_id.to_string()),
            first_seen_at: Set(now),
            last_seen_at: Set(now),
            referrer: Set(referrer),
            landing_page: Set(landing_page),
            user_agent: Set(user_agent),
            source: Set(source),
            converted: Set(false),
            conversion_link_id: Set(None),
        };
        retry::with_retry("upsert_session(insert)", self.retry_config, || async {
            visitor_session::Entity::insert(model.clone()).exec(db).await
        })
        .await?;

        Ok(true)
    }

    /// 追加一条访客事件并刷新会话活跃时间
    pub async fn insert_event(
        &self,
        session_id: &str,
        event_type: &str,
        event_data: Option<String>,
        link_id: Option<String>,
    ) -> anyhow::Result<()> {
        let db = &self.db;
        let now = Utc::now();

        let model = visitor_event::ActiveModel {
            session_id: Set(session_id.to_string()),
            event_type: Set(event_type.to_string()),
            event_data: Set(event_data),
            link_id: Set(link_id),
            created_at: Set(now),
            ..Default::default()
        };
        retry::with_retry("insert_event", self.retry_config, || async {
            visitor_event::Entity::insert(model.clone()).exec(db).await
        })
        .await?;

        // 会话可能尚未注册，忽略 RecordNotUpdated
        let touch = visitor_session::ActiveModel {
            session_id: Set(session_id.to_string()),
            last_seen_at: Set(now),
            ..Default::default()
        };
        match touch.update(db).await {
            Ok(_) | Err(sea_orm::DbErr::RecordNotUpdated) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// 标记会话已转化
    pub async fn mark_conversion(&self, session_id: &str, link_id: &str) -> anyhow::Result<bool> {
        let db = &self.db;

        let model = visitor_session::ActiveModel {
            session_id: Set(session_id.to_string()),
            last_seen_at: Set(Utc::now()),
            converted: Set(true),
            conversion_link_id: Set(Some(link_id.to_string())),
            ..Default::default()
        };
        match retry::with_retry("mark_conversion", self.retry_config, || async {
            model.clone().update(db).await
        })
        .await
        {
            Ok(_) => Ok(true),
            Err(sea_orm::DbErr::RecordNotUpdated) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// 会话汇总（总数与转化数）
    pub async fn session_summary(&self, since: DateTime<Utc>) -> anyhow::Result<SessionSummary> {
        let result = visitor_session::Entity::find()
            .select_only()
            .column_as(visitor_session::Column::SessionId.count(), "total_sessions")
            .column_as(
                Expr::case(visitor_session::Column::Converted.eq(true), 1)
                    .finally(0)
                    .sum(),
                "converted_sessions",
            )
            .filter(visitor_session::Column::LastSeenAt.gte(since))
            .into_model::<SessionStatsResult>()
            .one(&self.db)
            .await?;

        Ok(result
            .map(|r| SessionSummary {
                total_sessions: std::cmp::Ord::max(r.total_sessions, 0) as u64,
                converted_sessions: std::cmp::Ord::max(r.converted_sessions.unwrap_or(0), 0) as u64,
            })
            .unwrap_or_default())
    }

    /// 会话来源分布
    pub async fn session_sources(
        &self,
        since: DateTime<Utc>,
        limit: u64,
    ) -> anyhow::Result<Vec<SourceRow>> {
        visitor_session::Entity::find()
            .select_only()
            .column(visitor_session::Column::Source)
            .column_as(visitor_session::Column::SessionId.count(), "count")
            .filter(visitor_session::Column::LastSeenAt.gte(since))
            .group_by(visitor_session::Column::Source)
            .order_by_desc(Expr::cust("count"))
            .limit(limit)
            .into_model::<SourceRow>()
            .all(&self.db)
            .await
            .map_err(Into::into)
    }

    /// 最近事件，可选限定某个会话
    pub async fn recent_events(
        &self,
        session_id: Option<&str>,
        limit: u64,
    ) -> anyhow::Result<Vec<visitor_event::Model>> {
        let mut query = visitor_event::Entity::find();
        if let Some(sid) = session_id {
            query = query.filter(visitor_event::Column::SessionId.eq(sid));
        }
        query
            .order_by_desc(visitor_event::Column::CreatedAt)
            .order_by_desc(visitor_event::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(Into::into)
    }
}
