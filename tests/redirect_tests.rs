//! Public endpoint tests
//!
//! Tests for the outbound redirect entry point and the visitor tracking
//! endpoints. This is the hot path: GET on the redirect route → weighted
//! pick → 307 to the destination.

use std::sync::Arc;
use std::sync::Once;
use std::time::Duration;

use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use actix_web::{App, web};

use outlinker::analytics::{UsageRecorder, UsageSink};
use outlinker::api::rate_limit::SlidingWindowLimiter;
use outlinker::api::services::{redirect_routes, tracking_routes};
use outlinker::config::init_config;
use outlinker::services::{CreateLinkRequest, LinkService, TrackingService, WeightedSelector};
use outlinker::storage::backend::SeaOrmStorage;
use tempfile::TempDir;

// =============================================================================
// Test Setup
// =============================================================================

static INIT: Once = Once::new();

fn init_test_config() {
    INIT.call_once(|| {
        init_config();
    });
}

/// 每个测试配自己的存储。抽签池是全局的，共享库会让空池测试互相干扰。
async fn create_test_storage() -> (Arc<SeaOrmStorage>, TempDir) {
    init_test_config();

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("redirect_test.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let storage = Arc::new(
        SeaOrmStorage::new(&db_url, "sqlite")
            .await
            .expect("Failed to create storage"),
    );

    (storage, temp_dir)
}

async fn seed_link(storage: &Arc<SeaOrmStorage>, url: &str, weight: i32, active: bool) -> String {
    let service = LinkService::new(storage.clone());
    let req = CreateLinkRequest {
        url: url.to_string(),
        label: None,
        category: None,
        weight: Some(weight),
        is_active: Some(active),
    };
    service.create_link(req).await.unwrap().id
}

/// Create a test app with the public routes mounted
macro_rules! public_app {
    ($storage:expr, $limiter:expr) => {{
        let storage: Arc<SeaOrmStorage> = $storage;
        let selector = Arc::new(WeightedSelector::new(storage.clone()));
        let tracking = Arc::new(TrackingService::new(storage.clone()));
        let usage_sink: Arc<dyn UsageSink> = storage.clone();
        let recorder = Arc::new(UsageRecorder::new(usage_sink, Duration::from_secs(3600)));

        test::init_service(
            App::new()
                .app_data(web::Data::new(selector))
                .app_data(web::Data::new(tracking))
                .app_data(web::Data::new($limiter))
                .app_data(web::Data::new(recorder))
                .service(redirect_routes("/go"))
                .service(tracking_routes("/track")),
        )
        .await
    }};
}

fn permissive_limiter() -> Arc<SlidingWindowLimiter> {
    Arc::new(SlidingWindowLimiter::new(100_000, 1_000_000))
}

// =============================================================================
// Redirect Tests
// =============================================================================

#[tokio::test]
async fn test_redirect_single_active_link() {
    let (storage, _temp) = create_test_storage().await;
    seed_link(&storage, "https://example.com/dest", 1, true).await;

    let app = public_app!(storage, permissive_limiter());

    let req = TestRequest::get().uri("/go").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    let location = resp.headers().get("Location").unwrap().to_str().unwrap();
    assert_eq!(location, "https://example.com/dest");

    // 跳转结果不能被缓存，否则权重分布会失真
    let cache_control = resp
        .headers()
        .get("Cache-Control")
        .unwrap()
        .to_str()
        .unwrap();
    assert_eq!(cache_control, "no-store");
}

#[tokio::test]
async fn test_redirect_empty_pool() {
    let (storage, _temp) = create_test_storage().await;

    let app = public_app!(storage, permissive_limiter());

    let req = TestRequest::get().uri("/go").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 3004);
}

#[tokio::test]
async fn test_redirect_inactive_links_only() {
    let (storage, _temp) = create_test_storage().await;
    seed_link(&storage, "https://example.com/off", 100, false).await;

    let app = public_app!(storage, permissive_limiter());

    let req = TestRequest::get().uri("/go").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_redirect_head_request() {
    let (storage, _temp) = create_test_storage().await;
    seed_link(&storage, "https://example.com/head", 1, true).await;

    let app = public_app!(storage, permissive_limiter());

    let req = TestRequest::default()
        .method(actix_web::http::Method::HEAD)
        .uri("/go")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
}

#[tokio::test]
async fn test_redirect_rate_limited() {
    let (storage, _temp) = create_test_storage().await;
    seed_link(&storage, "https://example.com/limited", 1, true).await;

    // 两次放行，第三次触发限流
    let limiter = Arc::new(SlidingWindowLimiter::new(2, 100));
    let app = public_app!(storage, limiter);

    for _ in 0..2 {
        let req = TestRequest::get().uri("/go").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    }

    let req = TestRequest::get().uri("/go").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after: u64 = resp
        .headers()
        .get("Retry-After")
        .unwrap()
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!(retry_after > 0 && retry_after <= 60);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 2004);
}

// =============================================================================
// Tracking Endpoint Tests
// =============================================================================

#[tokio::test]
async fn test_track_session_generates_server_side_id() {
    let (storage, _temp) = create_test_storage().await;
    let app = public_app!(storage, permissive_limiter());

    let req = TestRequest::post()
        .uri("/track/session")
        .set_json(serde_json::json!({}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 0);
    assert_eq!(body["data"]["created"], true);
    assert!(!body["data"]["session_id"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_track_session_repeat_refreshes_instead_of_creating() {
    let (storage, _temp) = create_test_storage().await;
    let app = public_app!(storage, permissive_limiter());

    let payload = serde_json::json!({ "session_id": "visitor-abc" });

    let req = TestRequest::post()
        .uri("/track/session")
        .set_json(&payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["created"], true);
    assert_eq!(body["data"]["session_id"], "visitor-abc");

    let req = TestRequest::post()
        .uri("/track/session")
        .set_json(&payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["created"], false);
}

#[tokio::test]
async fn test_track_event_requires_session_and_type() {
    let (storage, _temp) = create_test_storage().await;
    let app = public_app!(storage, permissive_limiter());

    let req = TestRequest::post()
        .uri("/track/event")
        .set_json(serde_json::json!({
            "session_id": "",
            "event_type": "page_view"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 1000);
}

#[tokio::test]
async fn test_track_event_recorded() {
    let (storage, _temp) = create_test_storage().await;
    let app = public_app!(storage.clone(), permissive_limiter());

    let req = TestRequest::post()
        .uri("/track/session")
        .set_json(serde_json::json!({ "session_id": "evt-session" }))
        .to_request();
    test::call_service(&app, req).await;

    let req = TestRequest::post()
        .uri("/track/event")
        .set_json(serde_json::json!({
            "session_id": "evt-session",
            "event_type": "cta_click",
            "event_data": { "button": "join" }
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);

    let events = storage.recent_events(Some("evt-session"), 10).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, "cta_click");
}

#[tokio::test]
async fn test_track_conversion_unknown_session() {
    let (storage, _temp) = create_test_storage().await;
    let app = public_app!(storage, permissive_limiter());

    let req = TestRequest::post()
        .uri("/track/conversion")
        .set_json(serde_json::json!({
            "session_id": "never-seen",
            "link_id": "some-link"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["converted"], false);
}

#[tokio::test]
async fn test_track_conversion_known_session() {
    let (storage, _temp) = create_test_storage().await;
    let link_id = seed_link(&storage, "https://example.com/conv", 1, true).await;
    let app = public_app!(storage, permissive_limiter());

    let req = TestRequest::post()
        .uri("/track/session")
        .set_json(serde_json::json!({ "session_id": "conv-session" }))
        .to_request();
    test::call_service(&app, req).await;

    let req = TestRequest::post()
        .uri("/track/conversion")
        .set_json(serde_json::json!({
            "session_id": "conv-session",
            "link_id": link_id
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["converted"], true);
}

#[tokio::test]
async fn test_track_conversion_requires_both_ids() {
    let (storage, _temp) = create_test_storage().await;
    let app = public_app!(storage, permissive_limiter());

    let req = TestRequest::post()
        .uri("/track/conversion")
        .set_json(serde_json::json!({
            "session_id": "s",
            "link_id": ""
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
