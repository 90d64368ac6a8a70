//! 健康检查端点守卫
//!
//! 配置了 `api.health_token` 时，详细健康报告要求
//! `Authorization: Bearer <token>`；`/live` 与 `/ready` 探针保持开放，
//! 方便编排系统直接拉取。未配置 token 时全部端点开放。

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::{Method, header::CONTENT_TYPE},
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use subtle::ConstantTimeEq;
use tracing::{trace, warn};

use crate::config::get_config;

#[derive(Clone)]
pub struct HealthAuth;

impl<S, B> Transform<S, ServiceRequest> for HealthAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = HealthAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        let config = get_config();
        let health_prefix = &config.routes.health_prefix;

        ready(Ok(HealthAuthMiddleware {
            service: Rc::new(service),
            probe_paths: vec![
                format!("{}/live", health_prefix),
                format!("{}/ready", health_prefix),
            ],
        }))
    }
}

pub struct HealthAuthMiddleware<S> {
    service: Rc<S>,
    probe_paths: Vec<String>,
}

impl<S, B> HealthAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    fn handle_unauthorized(req: ServiceRequest) -> ServiceResponse<EitherBody<B>> {
        warn!("Health report access denied - invalid or missing token");
        req.into_response(
            HttpResponse::Unauthorized()
                .insert_header((CONTENT_TYPE, "application/json; charset=utf-8"))
                .json(serde_json::json!({
                    "code": 401,
                    "message": "Unauthorized: Invalid or missing health token"
                }))
                .map_into_right_body(),
        )
    }

    fn bearer_token_matches(req: &ServiceRequest, expected: &str) -> bool {
        req.headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer "))
            .is_some_and(|token| token.as_bytes().ct_eq(expected.as_bytes()).into())
    }
}

impl<S, B> Service<ServiceRequest> for HealthAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        let probe_paths = self.probe_paths.clone();

        Box::pin(async move {
            let config = get_config();
            let health_token = config
                .api
                .health_token
                .as_deref()
                .filter(|t| !t.is_empty());

            let Some(expected) = health_token else {
                // token 未配置，端点全部开放
                let response = srv.call(req).await?.map_into_left_body();
                return Ok(response);
            };

            if req.method() == Method::OPTIONS {
                return Ok(req.into_response(
                    HttpResponse::NoContent()
                        .insert_header((CONTENT_TYPE, "text/plain; charset=utf-8"))
                        .finish()
                        .map_into_right_body(),
                ));
            }

            // 探针路径不做认证
            if probe_paths.iter().any(|p| p == req.path()) {
                trace!("Health probe accessed - bypassing token check");
                let response = srv.call(req).await?.map_into_left_body();
                return Ok(response);
            }

            if !Self::bearer_token_matches(&req, expected) {
                return Ok(Self::handle_unauthorized(req));
            }

            let response = srv.call(req).await?.map_into_left_body();
            Ok(response)
        })
    }
}
