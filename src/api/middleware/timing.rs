//! HTTP timing middleware
//!
//! Feeds the hourly usage recorder: one request sample per call, plus an
//! error mark for 5xx responses. Redirect and rate-limit outcomes are
//! recorded by the handlers that decide them.

use actix_service::{Service, Transform};
use actix_web::{
    Error,
    dev::{ServiceRequest, ServiceResponse},
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

use crate::analytics::UsageRecorder;

/// HTTP timing middleware factory
#[derive(Clone)]
pub struct RequestTiming {
    recorder: Arc<UsageRecorder>,
}

impl RequestTiming {
    pub fn new(recorder: Arc<UsageRecorder>) -> Self {
        Self { recorder }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequestTiming
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestTimingService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestTimingService {
            service: Rc::new(service),
            recorder: Arc::clone(&self.recorder),
        }))
    }
}

pub struct RequestTimingService<S> {
    service: Rc<S>,
    recorder: Arc<UsageRecorder>,
}

impl<S, B> Service<ServiceRequest> for RequestTimingService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
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
        let recorder = Arc::clone(&self.recorder);
        let start = Instant::now();

        Box::pin(async move {
            let result = srv.call(req).await;

            recorder.record_request(start.elapsed());
            match &result {
                Ok(response) if response.status().is_server_error() => recorder.record_error(),
                Err(_) => recorder.record_error(),
                Ok(_) => {}
            }

            result
        })
    }
}
