//! 访客跟踪公共端点
//!
//! 会话注册、事件上报、转化标记。与跳转入口共用同一个滑动窗口限流器，
//! 防止匿名端点被刷。

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, web};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::analytics::UsageRecorder;
use crate::api::rate_limit::{RateDecision, SlidingWindowLimiter};
use crate::api::services::admin::{ErrorCode, error_from_outlinker, error_response,
    success_response};
use crate::services::{SessionInput, TrackingService};
use crate::utils::ip::extract_client_ip;

#[derive(Deserialize, Clone, Debug)]
pub struct SessionPayload {
    pub session_id: Option<String>,
    pub referrer: Option<String>,
    pub landing_page: Option<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct EventPayload {
    pub session_id: String,
    pub event_type: String,
    pub event_data: Option<serde_json::Value>,
    pub link_id: Option<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ConversionPayload {
    pub session_id: String,
    pub link_id: String,
}

#[derive(Serialize, Clone, Debug)]
pub struct SessionResponse {
    pub session_id: String,
    pub created: bool,
}

#[derive(Serialize, Clone, Debug)]
pub struct ConversionResponse {
    pub converted: bool,
}

fn check_rate_limit(
    req: &HttpRequest,
    limiter: &SlidingWindowLimiter,
    recorder: &UsageRecorder,
) -> Option<HttpResponse> {
    let client_key = extract_client_ip(req).unwrap_or_else(|| "unknown".to_string());

    if let RateDecision::Limited { retry_after_secs } = limiter.check(&client_key) {
        warn!("Tracking endpoint rate limited for {}", client_key);
        recorder.record_rate_limited();
        return Some(
            HttpResponse::build(StatusCode::TOO_MANY_REQUESTS)
                .insert_header(("Retry-After", retry_after_secs.to_string()))
                .json(crate::api::services::admin::ApiResponse::<()> {
                    code: ErrorCode::RateLimitExceeded as i32,
                    message: "Too many requests, slow down".to_string(),
                    data: None,
                }),
        );
    }
    None
}

/// 会话注册 `POST /track/session`
///
/// 客户端可以带自己的 session_id，缺省时服务端生成。
pub async fn track_session(
    req: HttpRequest,
    payload: web::Json<SessionPayload>,
    tracking: web::Data<Arc<TrackingService>>,
    limiter: web::Data<Arc<SlidingWindowLimiter>>,
    recorder: web::Data<Arc<UsageRecorder>>,
) -> actix_web::Result<HttpResponse> {
    if let Some(denied) = check_rate_limit(&req, &limiter, &recorder) {
        return Ok(denied);
    }

    let payload = payload.into_inner();
    // UA 由服务端从请求头取，不信任请求体
    let user_agent = req
        .headers()
        .get("user-agent")
        .and_then(|h| h.to_str().ok())
        .map(String::from);

    let input = SessionInput {
        session_id: payload.session_id,
        referrer: payload.referrer,
        landing_page: payload.landing_page,
        user_agent,
    };

    match tracking.record_session(input).await {
        Ok(record) => {
            debug!("Tracking API: session {} registered", record.session_id);
            Ok(success_response(SessionResponse {
                session_id: record.session_id,
                created: record.created,
            }))
        }
        Err(e) => Ok(error_from_outlinker(&e)),
    }
}

/// 事件上报 `POST /track/event`
pub async fn track_event(
    req: HttpRequest,
    payload: web::Json<EventPayload>,
    tracking: web::Data<Arc<TrackingService>>,
    limiter: web::Data<Arc<SlidingWindowLimiter>>,
    recorder: web::Data<Arc<UsageRecorder>>,
) -> actix_web::Result<HttpResponse> {
    if let Some(denied) = check_rate_limit(&req, &limiter, &recorder) {
        return Ok(denied);
    }

    let payload = payload.into_inner();
    if payload.session_id.is_empty() || payload.event_type.is_empty() {
        return Ok(error_response(
            StatusCode::BAD_REQUEST,
            ErrorCode::BadRequest,
            "session_id and event_type are required",
        ));
    }

    match tracking
        .record_event(
            &payload.session_id,
            &payload.event_type,
            payload.event_data,
            payload.link_id,
        )
        .await
    {
        Ok(()) => Ok(success_response(serde_json::json!({
            "message": "Event recorded"
        }))),
        Err(e) => Ok(error_from_outlinker(&e)),
    }
}

/// 转化标记 `POST /track/conversion`
pub async fn track_conversion(
    req: HttpRequest,
    payload: web::Json<ConversionPayload>,
    tracking: web::Data<Arc<TrackingService>>,
    limiter: web::Data<Arc<SlidingWindowLimiter>>,
    recorder: web::Data<Arc<UsageRecorder>>,
) -> actix_web::Result<HttpResponse> {
    if let Some(denied) = check_rate_limit(&req, &limiter, &recorder) {
        return Ok(denied);
    }

    let payload = payload.into_inner();
    if payload.session_id.is_empty() || payload.link_id.is_empty() {
        return Ok(error_response(
            StatusCode::BAD_REQUEST,
            ErrorCode::BadRequest,
            "session_id and link_id are required",
        ));
    }

    match tracking
        .mark_conversion(&payload.session_id, &payload.link_id)
        .await
    {
        Ok(converted) => Ok(success_response(ConversionResponse { converted })),
        Err(e) => Ok(error_from_outlinker(&e)),
    }
}

/// Tracking 路由配置
pub fn tracking_routes(prefix: &str) -> actix_web::Scope {
    web::scope(prefix)
        .route("/session", web::post().to(track_session))
        .route("/event", web::post().to(track_event))
        .route("/conversion", web::post().to(track_conversion))
}
