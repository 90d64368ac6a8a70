//! Analytics API 端点
//!
//! 提供仪表盘所需的统计查询：
//! - 小时级用量（请求数 / 跳转数 / 错误数 / 限流数 / 平均响应时间）
//! - 访客会话概览与转化率
//! - 最近事件流

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, web};
use std::sync::Arc;
use tracing::error;

use crate::api::services::admin::{ErrorCode, error_response, success_response};
use crate::services::AnalyticsService;

use super::types::{AnalyticsDaysQuery, EventsQuery};

const DEFAULT_DAYS: u32 = 7;
const DEFAULT_EVENT_LIMIT: u32 = 50;

/// 小时级用量统计 `GET /analytics/usage?days=7`
pub async fn get_usage(
    _req: HttpRequest,
    query: web::Query<AnalyticsDaysQuery>,
    analytics: web::Data<Arc<AnalyticsService>>,
) -> actix_web::Result<HttpResponse> {
    let days = query.days.unwrap_or(DEFAULT_DAYS);

    match analytics.usage_overview(days).await {
        Ok(rows) => Ok(success_response(rows)),
        Err(e) => {
            error!("Analytics API: usage query failed: {}", e);
            Ok(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::AnalyticsQueryFailed,
                "Usage query failed",
            ))
        }
    }
}

/// 会话概览 `GET /analytics/sessions?days=7`
pub async fn get_sessions(
    _req: HttpRequest,
    query: web::Query<AnalyticsDaysQuery>,
    analytics: web::Data<Arc<AnalyticsService>>,
) -> actix_web::Result<HttpResponse> {
    let days = query.days.unwrap_or(DEFAULT_DAYS);

    match analytics.session_overview(days).await {
        Ok(overview) => Ok(success_response(overview)),
        Err(e) => {
            error!("Analytics API: session query failed: {}", e);
            Ok(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::AnalyticsQueryFailed,
                "Session query failed",
            ))
        }
    }
}

/// 最近事件 `GET /analytics/events?session_id=&limit=50`
pub async fn get_events(
    _req: HttpRequest,
    query: web::Query<EventsQuery>,
    analytics: web::Data<Arc<AnalyticsService>>,
) -> actix_web::Result<HttpResponse> {
    let limit = query.limit.unwrap_or(DEFAULT_EVENT_LIMIT);

    match analytics
        .recent_events(query.session_id.as_deref(), limit)
        .await
    {
        Ok(events) => Ok(success_response(events)),
        Err(e) => {
            error!("Analytics API: event query failed: {}", e);
            Ok(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::AnalyticsQueryFailed,
                "Event query failed",
            ))
        }
    }
}

/// Analytics 路由 `/analytics`
pub fn analytics_routes() -> actix_web::Scope {
    web::scope("/analytics")
        .route("/usage", web::get().to(get_usage))
        .route("/sessions", web::get().to(get_sessions))
        .route("/events", web::get().to(get_events))
}
