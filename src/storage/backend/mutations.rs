//! Mutation operations for SeaOrmStorage
//!
//! This module contains all write database operations.

use chrono::Utc;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{ActiveModelTrait, DbErr, EntityTrait, SqlErr};
use tracing::info;

use super::SeaOrmStorage;
use super::converters::{link_to_insert_model, model_to_redirect_link};
use super::retry;
use crate::errors::{OutlinkerError, Result};
use crate::storage::{LinkUpdate, RedirectLink};

use migration::entities::redirect_link;

/// 将写入错误映射为领域错误
///
/// 唯一索引冲突单独识别，作为并发写入时 URL 查重的兜底。
fn map_write_error(context: &str, url: &str, e: DbErr) -> OutlinkerError {
    if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        return OutlinkerError::duplicate_url(format!("URL 已存在: {}", url));
    }
    OutlinkerError::database_operation(format!("{}: {}", context, e))
}

impl SeaOrmStorage {
    pub async fn insert_link(&self, link: &RedirectLink) -> Result<()> {
        let db = &self.db;
        let active_model = link_to_insert_model(link);

        retry::with_retry(
            &format!("insert_link({})", link.id),
            self.retry_config,
            || async {
                redirect_link::Entity::insert(active_model.clone())
                    .exec(db)
                    .await
            },
        )
        .await
        .map_err(|e| map_write_error("插入链接失败", &link.url, e))?;

        self.invalidate_count_cache();
        info!("Redirect link created: {} -> {}", link.id, link.url);
        Ok(())
    }

    /// 按字段更新链接，未提供的字段保持原值，updated_at 总是刷新
    pub async fn apply_update(&self, id: &str, update: LinkUpdate) -> Result<RedirectLink> {
        let db = &self.db;

        let active_model = redirect_link::ActiveModel {
            id: Set(id.to_string()),
            url: update.url.clone().map_or(NotSet, Set),
            label: update.label.map_or(NotSet, Set),
            category: update.category.map_or(NotSet, Set),
            weight: update.weight.map_or(NotSet, Set),
            is_active: update.is_active.map_or(NotSet, Set),
            hit_count: NotSet,
            created_at: NotSet,
            updated_at: Set(Utc::now()),
        };

        let result = retry::with_retry(
            &format!("apply_update({})", id),
            self.retry_config,
            || async { active_model.clone().update(db).await },
        )
        .await;

        let model = match result {
            Ok(model) => model,
            Err(DbErr::RecordNotUpdated) => {
                return Err(OutlinkerError::not_found(format!("链接不存在: {}", id)));
            }
            Err(e) => {
                let url = update.url.as_deref().unwrap_or("");
                return Err(map_write_error("更新链接失败", url, e));
            }
        };

        self.invalidate_count_cache();
        info!("Redirect link updated: {}", id);
        Ok(model_to_redirect_link(model))
    }

    pub async fn delete_link(&self, id: &str) -> Result<()> {
        let db = &self.db;
        let id_owned = id.to_string();

        let result = retry::with_retry(
            &format!("delete_link({})", id),
            self.retry_config,
            || async {
                redirect_link::Entity::delete_by_id(&id_owned)
                    .exec(db)
                    .await
            },
        )
        .await
        .map_err(|e| OutlinkerError::database_operation(format!("删除链接失败: {}", e)))?;

        if result.rows_affected == 0 {
            return Err(OutlinkerError::not_found(format!("链接不存在: {}", id)));
        }

        self.invalidate_count_cache();
        info!("Redirect link deleted: {}", id);
        Ok(())
    }
}
