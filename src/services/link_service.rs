//! Link management service
//!
//! Provides unified business logic for redirect link operations, shared
//! between the HTTP admin handlers and background tasks.

use std::ops::RangeInclusive;
use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::errors::{OutlinkerError, Result};
use crate::storage::{LinkFilter, LinkStats, LinkUpdate, RedirectLink, SeaOrmStorage};
use crate::utils::url_validator::validate_url;

/// Category applied when a link is created without one
pub const DEFAULT_CATEGORY: &str = "general";

const WEIGHT_RANGE: RangeInclusive<i32> = 1..=100;

/// Request to create a new redirect link
#[derive(Debug, Clone)]
pub struct CreateLinkRequest {
    /// Destination URL (http/https only)
    pub url: String,
    pub label: Option<String>,
    pub category: Option<String>,
    /// Selection weight, defaults to 1
    pub weight: Option<i32>,
    /// Whether the link joins the selection pool immediately, defaults to true
    pub is_active: Option<bool>,
}

/// Service for redirect link management
///
/// This service encapsulates all business logic for link CRUD operations,
/// ensuring validation behaves the same for every caller.
pub struct LinkService {
    storage: Arc<SeaOrmStorage>,
}

impl LinkService {
    /// Create a new LinkService instance
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    fn validate_target(url: &str) -> Result<()> {
        validate_url(url).map_err(|e| OutlinkerError::invalid_url(e.to_string()))
    }

    fn validate_weight(weight: i32) -> Result<()> {
        if !WEIGHT_RANGE.contains(&weight) {
            return Err(OutlinkerError::invalid_weight(format!(
                "Weight {} is out of range, expected {}..={}",
                weight,
                WEIGHT_RANGE.start(),
                WEIGHT_RANGE.end()
            )));
        }
        Ok(())
    }

    async fn ensure_url_free(&self, url: &str, exclude_id: Option<&str>) -> Result<()> {
        if self.storage.url_exists(url, exclude_id).await? {
            return Err(OutlinkerError::duplicate_url(format!(
                "URL already registered: {}",
                url
            )));
        }
        Ok(())
    }

    // ============ CRUD Operations ============

    /// Create a new redirect link
    pub async fn create_link(&self, req: CreateLinkRequest) -> Result<RedirectLink> {
        Self::validate_target(&req.url)?;

        let weight = req.weight.unwrap_or(1);
        Self::validate_weight(weight)?;

        self.ensure_url_free(&req.url, None).await?;

        let now = Utc::now();
        let link = RedirectLink {
            id: Uuid::new_v4().to_string(),
            url: req.url,
            label: req.label.unwrap_or_default(),
            category: req
                .category
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            weight,
            is_active: req.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
            hit_count: 0,
        };

        // 并发创建同一 URL 时由唯一约束兜底，insert 侧映射成 DuplicateUrl
        self.storage.insert_link(&link).await?;

        Ok(link)
    }

    /// Apply a partial update to an existing link
    pub async fn update_link(&self, id: &str, update: LinkUpdate) -> Result<RedirectLink> {
        if update.is_empty() {
            // 空更新等价于读取当前状态
            return self.get_link(id).await;
        }

        let existing = self
            .storage
            .get_link(id)
            .await
            .ok_or_else(|| OutlinkerError::not_found(format!("Link '{}' not found", id)))?;

        if let Some(ref url) = update.url {
            Self::validate_target(url)?;
            if *url != existing.url {
                self.ensure_url_free(url, Some(id)).await?;
            }
        }

        if let Some(weight) = update.weight {
            Self::validate_weight(weight)?;
        }

        let updated = self.storage.apply_update(id, update).await?;
        info!("LinkService: updated '{}'", id);
        Ok(updated)
    }

    /// Move a link in or out of the selection pool
    pub async fn set_active(&self, id: &str, active: bool) -> Result<RedirectLink> {
        let updated = self
            .storage
            .apply_update(
                id,
                LinkUpdate {
                    is_active: Some(active),
                    ..Default::default()
                },
            )
            .await?;

        info!(
            "LinkService: '{}' is now {}",
            id,
            if active { "active" } else { "inactive" }
        );
        Ok(updated)
    }

    /// Delete a link permanently
    pub async fn delete_link(&self, id: &str) -> Result<()> {
        self.storage.delete_link(id).await?;
        info!("LinkService: deleted '{}'", id);
        Ok(())
    }

    /// Get a single link
    pub async fn get_link(&self, id: &str) -> Result<RedirectLink> {
        self.storage
            .get_link(id)
            .await
            .ok_or_else(|| OutlinkerError::not_found(format!("Link '{}' not found", id)))
    }

    /// List links with pagination and filtering
    pub async fn list_links(
        &self,
        filter: LinkFilter,
        page: u64,
        page_size: u64,
    ) -> (Vec<RedirectLink>, u64) {
        let page = page.max(1);
        let page_size = page_size.clamp(1, 100);

        self.storage.list_links(page, page_size, filter).await
    }

    /// Aggregate statistics over the whole link table
    pub async fn get_stats(&self) -> LinkStats {
        self.storage.get_stats().await
    }
}
