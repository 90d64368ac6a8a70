use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use tracing::{debug, error, trace};

use crate::analytics::UsageRecorder;
use crate::api::rate_limit::{RateDecision, SlidingWindowLimiter};
use crate::api::services::admin::{ApiResponse, ErrorCode};
use crate::errors::OutlinkerError;
use crate::services::WeightedSelector;
use crate::utils::ip::extract_client_ip;

pub struct RedirectService {}

impl RedirectService {
    /// 出站跳转入口：按权重抽一条活跃链接，307 到目标地址
    pub async fn handle_redirect(
        req: HttpRequest,
        selector: web::Data<Arc<WeightedSelector>>,
        limiter: web::Data<Arc<SlidingWindowLimiter>>,
        recorder: web::Data<Arc<UsageRecorder>>,
    ) -> impl Responder {
        let client_key = extract_client_ip(&req).unwrap_or_else(|| "unknown".to_string());

        if let RateDecision::Limited { retry_after_secs } = limiter.check(&client_key) {
            trace!("Redirect rate limited for {}", client_key);
            recorder.record_rate_limited();
            return Self::rate_limited_response(retry_after_secs);
        }

        match selector.select().await {
            Ok(link) => {
                recorder.record_redirect();
                Self::finish_redirect(&link.url)
            }
            Err(OutlinkerError::NoActiveLinks(_)) => {
                debug!("Redirect requested but no active links are configured");
                Self::no_links_response()
            }
            Err(e) => {
                error!("Redirect selection failed: {}", e);
                Self::error_response()
            }
        }
    }

    fn finish_redirect(url: &str) -> HttpResponse {
        HttpResponse::build(StatusCode::TEMPORARY_REDIRECT)
            .insert_header(("Location", url))
            // 每次命中都要重新抽签，禁止客户端和中间层缓存
            .insert_header(("Cache-Control", "no-store"))
            .finish()
    }

    #[inline]
    fn no_links_response() -> HttpResponse {
        HttpResponse::build(StatusCode::NOT_FOUND)
            .insert_header(("Cache-Control", "no-store"))
            .json(ApiResponse::<()> {
                code: ErrorCode::NoActiveLinks as i32,
                message: "No active redirect links available".to_string(),
                data: None,
            })
    }

    #[inline]
    fn rate_limited_response(retry_after_secs: u64) -> HttpResponse {
        HttpResponse::build(StatusCode::TOO_MANY_REQUESTS)
            .insert_header(("Retry-After", retry_after_secs.to_string()))
            .json(ApiResponse::<()> {
                code: ErrorCode::RateLimitExceeded as i32,
                message: "Too many requests, slow down".to_string(),
                data: None,
            })
    }

    #[inline]
    fn error_response() -> HttpResponse {
        HttpResponse::build(StatusCode::INTERNAL_SERVER_ERROR).json(ApiResponse::<()> {
            code: ErrorCode::InternalServerError as i32,
            message: "Internal Server Error".to_string(),
            data: None,
        })
    }
}

/// Redirect 路由配置
pub fn redirect_routes(path: &str) -> actix_web::Scope {
    use actix_web::web;

    web::scope(path)
        .route("", web::get().to(RedirectService::handle_redirect))
        .route("", web::head().to(RedirectService::handle_redirect))
}
