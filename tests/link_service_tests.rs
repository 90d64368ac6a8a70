//! LinkService tests
//!
//! Tests for the link management service layer.

use std::sync::Arc;
use std::sync::Once;

use outlinker::config::init_config;
use outlinker::errors::OutlinkerError;
use outlinker::services::{CreateLinkRequest, DEFAULT_CATEGORY, LinkService};
use outlinker::storage::backend::SeaOrmStorage;
use outlinker::storage::{LinkFilter, LinkUpdate};
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

/// Create a test service with temporary storage
async fn create_test_service() -> (LinkService, TempDir) {
    init_test_config();

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test_service.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let storage = Arc::new(
        SeaOrmStorage::new(&db_url, "sqlite")
            .await
            .expect("Failed to create storage"),
    );

    let service = LinkService::new(storage);

    (service, temp_dir)
}

/// Helper to create a basic CreateLinkRequest
fn create_request(url: &str, weight: Option<i32>) -> CreateLinkRequest {
    CreateLinkRequest {
        url: url.to_string(),
        label: None,
        category: None,
        weight,
        is_active: None,
    }
}

// =============================================================================
// Create Link Tests
// =============================================================================

#[cfg(test)]
mod create_link_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_link_defaults() {
        let (service, _temp) = create_test_service().await;

        let req = create_request("https://example.com/one", None);
        let result = service.create_link(req).await;

        assert!(result.is_ok());
        let link = result.unwrap();
        assert_eq!(link.url, "https://example.com/one");
        assert_eq!(link.weight, 1);
        assert!(link.is_active);
        assert_eq!(link.category, DEFAULT_CATEGORY);
        assert_eq!(link.hit_count, 0);
        assert!(!link.id.is_empty());
    }

    #[tokio::test]
    async fn test_create_link_with_fields() {
        let (service, _temp) = create_test_service().await;

        let req = CreateLinkRequest {
            url: "https://example.com/full".to_string(),
            label: Some("Main channel".to_string()),
            category: Some("telegram".to_string()),
            weight: Some(40),
            is_active: Some(false),
        };
        let link = service.create_link(req).await.unwrap();

        assert_eq!(link.label, "Main channel");
        assert_eq!(link.category, "telegram");
        assert_eq!(link.weight, 40);
        assert!(!link.is_active);
    }

    #[tokio::test]
    async fn test_create_link_duplicate_url() {
        let (service, _temp) = create_test_service().await;

        let req1 = create_request("https://example.com/dup", None);
        service.create_link(req1).await.unwrap();

        let req2 = create_request("https://example.com/dup", None);
        let result = service.create_link(req2).await;

        assert!(result.is_err());
        match result.unwrap_err() {
            OutlinkerError::DuplicateUrl(msg) => {
                assert!(msg.contains("https://example.com/dup"));
            }
            other => panic!("Expected DuplicateUrl error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_link_invalid_url() {
        let (service, _temp) = create_test_service().await;

        let req = create_request("not-a-valid-url", None);
        let result = service.create_link(req).await;

        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            OutlinkerError::InvalidUrl(_)
        ));
    }

    #[tokio::test]
    async fn test_create_link_dangerous_scheme() {
        let (service, _temp) = create_test_service().await;

        let req = create_request("javascript:alert(1)", None);
        let result = service.create_link(req).await;

        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            OutlinkerError::InvalidUrl(_)
        ));
    }

    #[tokio::test]
    async fn test_create_link_weight_zero_rejected() {
        let (service, _temp) = create_test_service().await;

        let req = create_request("https://example.com/w0", Some(0));
        let result = service.create_link(req).await;

        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            OutlinkerError::InvalidWeight(_)
        ));
    }

    #[tokio::test]
    async fn test_create_link_weight_above_range_rejected() {
        let (service, _temp) = create_test_service().await;

        let req = create_request("https://example.com/w101", Some(101));
        let result = service.create_link(req).await;

        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            OutlinkerError::InvalidWeight(_)
        ));
    }

    #[tokio::test]
    async fn test_create_link_weight_boundaries_accepted() {
        let (service, _temp) = create_test_service().await;

        let low = service
            .create_link(create_request("https://example.com/w1", Some(1)))
            .await
            .unwrap();
        assert_eq!(low.weight, 1);

        let high = service
            .create_link(create_request("https://example.com/w100", Some(100)))
            .await
            .unwrap();
        assert_eq!(high.weight, 100);
    }

    #[tokio::test]
    async fn test_create_link_empty_category_uses_default() {
        let (service, _temp) = create_test_service().await;

        let req = CreateLinkRequest {
            url: "https://example.com/emptycat".to_string(),
            label: None,
            category: Some("".to_string()),
            weight: None,
            is_active: None,
        };
        let link = service.create_link(req).await.unwrap();
        assert_eq!(link.category, DEFAULT_CATEGORY);
    }
}

// =============================================================================
// Update Link Tests
// =============================================================================

#[cfg(test)]
mod update_link_tests {
    use super::*;

    #[tokio::test]
    async fn test_update_link_url_and_weight() {
        let (service, _temp) = create_test_service().await;

        let link = service
            .create_link(create_request("https://example.com/old", Some(10)))
            .await
            .unwrap();

        let update = LinkUpdate {
            url: Some("https://example.com/new".to_string()),
            weight: Some(20),
            ..Default::default()
        };
        let updated = service.update_link(&link.id, update).await.unwrap();

        assert_eq!(updated.url, "https://example.com/new");
        assert_eq!(updated.weight, 20);
    }

    #[tokio::test]
    async fn test_update_link_not_found() {
        let (service, _temp) = create_test_service().await;

        let update = LinkUpdate {
            url: Some("https://example.com/new".to_string()),
            ..Default::default()
        };
        let result = service.update_link("nonexistent-id", update).await;

        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), OutlinkerError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_link_invalid_url() {
        let (service, _temp) = create_test_service().await;

        let link = service
            .create_link(create_request("https://example.com/valid", None))
            .await
            .unwrap();

        let update = LinkUpdate {
            url: Some("ftp://example.com/file".to_string()),
            ..Default::default()
        };
        let result = service.update_link(&link.id, update).await;

        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            OutlinkerError::InvalidUrl(_)
        ));
    }

    #[tokio::test]
    async fn test_update_link_invalid_weight() {
        let (service, _temp) = create_test_service().await;

        let link = service
            .create_link(create_request("https://example.com/wupd", None))
            .await
            .unwrap();

        let update = LinkUpdate {
            weight: Some(0),
            ..Default::default()
        };
        let result = service.update_link(&link.id, update).await;

        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            OutlinkerError::InvalidWeight(_)
        ));
    }

    #[tokio::test]
    async fn test_update_link_url_conflict_with_other_link() {
        let (service, _temp) = create_test_service().await;

        service
            .create_link(create_request("https://example.com/taken", None))
            .await
            .unwrap();
        let link = service
            .create_link(create_request("https://example.com/mine", None))
            .await
            .unwrap();

        let update = LinkUpdate {
            url: Some("https://example.com/taken".to_string()),
            ..Default::default()
        };
        let result = service.update_link(&link.id, update).await;

        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            OutlinkerError::DuplicateUrl(_)
        ));
    }

    #[tokio::test]
    async fn test_update_link_same_url_is_not_conflict() {
        let (service, _temp) = create_test_service().await;

        let link = service
            .create_link(create_request("https://example.com/same", Some(5)))
            .await
            .unwrap();

        // 同一条链接保留自己的 URL 不算重复
        let update = LinkUpdate {
            url: Some("https://example.com/same".to_string()),
            weight: Some(6),
            ..Default::default()
        };
        let updated = service.update_link(&link.id, update).await.unwrap();
        assert_eq!(updated.weight, 6);
    }

    #[tokio::test]
    async fn test_update_link_empty_update_returns_current() {
        let (service, _temp) = create_test_service().await;

        let link = service
            .create_link(create_request("https://example.com/noop", Some(7)))
            .await
            .unwrap();

        let current = service
            .update_link(&link.id, LinkUpdate::default())
            .await
            .unwrap();

        assert_eq!(current.weight, 7);
        assert_eq!(current.url, link.url);
    }

    #[tokio::test]
    async fn test_update_link_preserves_created_at() {
        let (service, _temp) = create_test_service().await;

        let link = service
            .create_link(create_request("https://example.com/preserve", None))
            .await
            .unwrap();
        let stored = service.get_link(&link.id).await.unwrap();

        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;

        let update = LinkUpdate {
            label: Some("renamed".to_string()),
            ..Default::default()
        };
        let updated = service.update_link(&link.id, update).await.unwrap();

        assert_eq!(updated.created_at, stored.created_at);
        assert_eq!(updated.label, "renamed");
    }
}

// =============================================================================
// Activate / Delete Tests
// =============================================================================

#[cfg(test)]
mod lifecycle_tests {
    use super::*;

    #[tokio::test]
    async fn test_set_active_toggles_pool_membership() {
        let (service, _temp) = create_test_service().await;

        let link = service
            .create_link(create_request("https://example.com/toggle", None))
            .await
            .unwrap();
        assert!(link.is_active);

        let deactivated = service.set_active(&link.id, false).await.unwrap();
        assert!(!deactivated.is_active);

        let reactivated = service.set_active(&link.id, true).await.unwrap();
        assert!(reactivated.is_active);
    }

    #[tokio::test]
    async fn test_set_active_not_found() {
        let (service, _temp) = create_test_service().await;

        let result = service.set_active("missing-id", true).await;
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), OutlinkerError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_link() {
        let (service, _temp) = create_test_service().await;

        let link = service
            .create_link(create_request("https://example.com/gone", None))
            .await
            .unwrap();

        service.delete_link(&link.id).await.unwrap();

        let result = service.get_link(&link.id).await;
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), OutlinkerError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_link_not_found() {
        let (service, _temp) = create_test_service().await;

        let result = service.delete_link("never-existed").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_deleted_url_can_be_reused() {
        let (service, _temp) = create_test_service().await;

        let link = service
            .create_link(create_request("https://example.com/reuse", None))
            .await
            .unwrap();
        service.delete_link(&link.id).await.unwrap();

        let again = service
            .create_link(create_request("https://example.com/reuse", None))
            .await;
        assert!(again.is_ok());
    }
}

// =============================================================================
// Get/List Tests
// =============================================================================

#[cfg(test)]
mod query_tests {
    use super::*;

    #[tokio::test]
    async fn test_get_link() {
        let (service, _temp) = create_test_service().await;

        let created = service
            .create_link(create_request("https://example.com/getme", None))
            .await
            .unwrap();

        let fetched = service.get_link(&created.id).await.unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.url, "https://example.com/getme");
    }

    #[tokio::test]
    async fn test_list_links_pagination() {
        let (service, _temp) = create_test_service().await;

        for i in 0..15 {
            service
                .create_link(create_request(
                    &format!("https://example.com/list{:02}", i),
                    None,
                ))
                .await
                .unwrap();
        }

        let (links, total) = service.list_links(LinkFilter::default(), 1, 5).await;
        assert_eq!(total, 15);
        assert_eq!(links.len(), 5);

        let (links, _) = service.list_links(LinkFilter::default(), 3, 5).await;
        assert_eq!(links.len(), 5);
    }

    #[tokio::test]
    async fn test_list_links_search_matches_label_and_url() {
        let (service, _temp) = create_test_service().await;

        let req = CreateLinkRequest {
            url: "https://github.com/someorg".to_string(),
            label: Some("Code".to_string()),
            category: None,
            weight: None,
            is_active: None,
        };
        service.create_link(req).await.unwrap();

        let req = CreateLinkRequest {
            url: "https://example.com/other".to_string(),
            label: Some("Newsletter".to_string()),
            category: None,
            weight: None,
            is_active: None,
        };
        service.create_link(req).await.unwrap();

        // URL 命中
        let filter = LinkFilter {
            search: Some("github".to_string()),
            ..Default::default()
        };
        let (links, total) = service.list_links(filter, 1, 10).await;
        assert_eq!(total, 1);
        assert_eq!(links[0].url, "https://github.com/someorg");

        // label 命中
        let filter = LinkFilter {
            search: Some("Newsletter".to_string()),
            ..Default::default()
        };
        let (_, total) = service.list_links(filter, 1, 10).await;
        assert_eq!(total, 1);
    }

    #[tokio::test]
    async fn test_list_links_filter_by_category_and_active() {
        let (service, _temp) = create_test_service().await;

        let req = CreateLinkRequest {
            url: "https://example.com/tg1".to_string(),
            label: None,
            category: Some("telegram".to_string()),
            weight: None,
            is_active: Some(true),
        };
        service.create_link(req).await.unwrap();

        let req = CreateLinkRequest {
            url: "https://example.com/tg2".to_string(),
            label: None,
            category: Some("telegram".to_string()),
            weight: None,
            is_active: Some(false),
        };
        service.create_link(req).await.unwrap();

        let req = CreateLinkRequest {
            url: "https://example.com/web".to_string(),
            label: None,
            category: Some("web".to_string()),
            weight: None,
            is_active: Some(true),
        };
        service.create_link(req).await.unwrap();

        let filter = LinkFilter {
            category: Some("telegram".to_string()),
            ..Default::default()
        };
        let (_, total) = service.list_links(filter, 1, 10).await;
        assert_eq!(total, 2);

        let filter = LinkFilter {
            category: Some("telegram".to_string()),
            active: Some(true),
            ..Default::default()
        };
        let (links, total) = service.list_links(filter, 1, 10).await;
        assert_eq!(total, 1);
        assert_eq!(links[0].url, "https://example.com/tg1");
    }

    #[tokio::test]
    async fn test_page_size_clamped() {
        let (service, _temp) = create_test_service().await;

        for i in 0..5 {
            service
                .create_link(create_request(
                    &format!("https://example.com/clamp{}", i),
                    None,
                ))
                .await
                .unwrap();
        }

        let (links, _) = service.list_links(LinkFilter::default(), 1, 1000).await;
        assert!(links.len() <= 100);
    }

    #[tokio::test]
    async fn test_page_zero_treated_as_one() {
        let (service, _temp) = create_test_service().await;

        service
            .create_link(create_request("https://example.com/page0", None))
            .await
            .unwrap();

        let (links, _) = service.list_links(LinkFilter::default(), 0, 10).await;
        assert_eq!(links.len(), 1);
    }

    #[tokio::test]
    async fn test_get_stats() {
        let (service, _temp) = create_test_service().await;

        let stats = service.get_stats().await;
        assert_eq!(stats.total_links, 0);

        for i in 0..4 {
            let req = CreateLinkRequest {
                url: format!("https://example.com/stat{}", i),
                label: None,
                category: None,
                weight: Some(10),
                is_active: Some(i < 3),
            };
            service.create_link(req).await.unwrap();
        }

        let stats = service.get_stats().await;
        assert_eq!(stats.total_links, 4);
        assert_eq!(stats.active_links, 3);
        assert_eq!(stats.active_weight, 30);
        assert_eq!(stats.total_hits, 0);
    }
}
