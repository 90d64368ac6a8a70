//! Query operations for SeaOrmStorage
//!
//! This module contains all read-only database operations.

use sea_orm::{
    ColumnTrait, Condition, EntityTrait, ExprTrait, FromQueryResult, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, sea_query::Expr,
};
use tracing::{debug, error};

use super::{LinkFilter, SeaOrmStorage, retry};
use crate::errors::{OutlinkerError, Result};
use crate::storage::RedirectLink;
use crate::storage::models::LinkStats;

use migration::entities::redirect_link;

use super::converters::model_to_redirect_link;

/// 用于统计查询的结果结构体（DSL 聚合查询）
#[derive(Debug, FromQueryResult)]
struct StatsResult {
    total_links: i64,
    active_links: Option<i64>,
    total_hits: Option<i64>,
    active_weight: Option<i64>,
}

impl SeaOrmStorage {
    pub async fn get_link(&self, id: &str) -> Option<RedirectLink> {
        let db = &self.db;
        let id_owned = id.to_string();

        let result = retry::with_retry(&format!("get_link({})", id), self.retry_config, || async {
            redirect_link::Entity::find_by_id(&id_owned).one(db).await
        })
        .await;

        match result {
            Ok(Some(model)) => Some(model_to_redirect_link(model)),
            Ok(None) => None,
            Err(e) => {
                error!("查询链接失败（重试后仍失败）: {}", e);
                None
            }
        }
    }

    /// 检查 URL 是否已被其他链接占用
    ///
    /// `exclude_id` 用于更新场景，排除链接自身。
    pub async fn url_exists(&self, url: &str, exclude_id: Option<&str>) -> Result<bool> {
        let db = &self.db;
        let url_owned = url.to_string();
        let exclude_owned = exclude_id.map(|s| s.to_string());

        let count = retry::with_retry("url_exists", self.retry_config, || async {
            let mut query = redirect_link::Entity::find()
                .filter(redirect_link::Column::Url.eq(url_owned.clone()));
            if let Some(ref id) = exclude_owned {
                query = query.filter(redirect_link::Column::Id.ne(id.clone()));
            }
            query.count(db).await
        })
        .await
        .map_err(|e| OutlinkerError::database_operation(format!("URL 查重失败: {}", e)))?;

        Ok(count > 0)
    }

    /// 加载全部激活链接，供权重选择使用
    ///
    /// 顺序固定：weight 降序，created_at 升序，id 升序。
    /// 选择算法依赖这个顺序保证同一随机数落在同一条链接上。
    pub async fn load_active_links(&self) -> Result<Vec<RedirectLink>> {
        let db = &self.db;

        let models = retry::with_retry("load_active_links", self.retry_config, || async {
            redirect_link::Entity::find()
                .filter(redirect_link::Column::IsActive.eq(true))
                .order_by_desc(redirect_link::Column::Weight)
                .order_by_asc(redirect_link::Column::CreatedAt)
                .order_by_asc(redirect_link::Column::Id)
                .all(db)
                .await
        })
        .await
        .map_err(|e| OutlinkerError::database_operation(format!("加载激活链接失败: {}", e)))?;

        Ok(models.into_iter().map(model_to_redirect_link).collect())
    }

    /// 带过滤条件的分页加载链接（带 COUNT 缓存）
    ///
    /// 列表顺序：激活优先，权重降序，创建时间降序。
    pub async fn list_links(
        &self,
        page: u64,
        page_size: u64,
        filter: LinkFilter,
    ) -> (Vec<RedirectLink>, u64) {
        // 生成缓存 key（基于过滤条件）
        let cache_key = format!(
            "count:s={:?}:c={:?}:a={:?}",
            filter.search, filter.category, filter.active
        );

        // 构建查询条件
        let mut condition = Condition::all();

        // search: 模糊匹配 label 或 url
        if let Some(ref search) = filter.search {
            condition = condition.add(
                Condition::any()
                    .add(redirect_link::Column::Label.contains(search))
                    .add(redirect_link::Column::Url.contains(search)),
            );
        }

        if let Some(ref category) = filter.category {
            condition = condition.add(redirect_link::Column::Category.eq(category.clone()));
        }

        if let Some(active) = filter.active {
            condition = condition.add(redirect_link::Column::IsActive.eq(active));
        }

        // 尝试从缓存获取总数
        let total = if let Some(cached) = self.count_cache.get(&cache_key) {
            debug!("count cache hit: key={}, value={}", cache_key, cached);
            cached
        } else {
            // 缓存未命中，执行 COUNT 查询（带重试）
            let db = &self.db;
            let cond = condition.clone();
            let count_result =
                retry::with_retry("list_links(count)", self.retry_config, || async {
                    redirect_link::Entity::find()
                        .filter(cond.clone())
                        .count(db)
                        .await
                })
                .await;

            let count = count_result.unwrap_or(0);
            self.count_cache.insert(cache_key, count);
            count
        };

        // 执行分页数据查询（带重试）
        let db = &self.db;
        let page_offset = page.saturating_sub(1);
        let models_result = retry::with_retry("list_links(data)", self.retry_config, || async {
            redirect_link::Entity::find()
                .filter(condition.clone())
                .order_by_desc(redirect_link::Column::IsActive)
                .order_by_desc(redirect_link::Column::Weight)
                .order_by_desc(redirect_link::Column::CreatedAt)
                .paginate(db, page_size)
                .fetch_page(page_offset)
                .await
        })
        .await;

        let models = match models_result {
            Ok(models) => models,
            Err(e) => {
                error!("分页查询失败（重试后仍失败）: {}", e);
                return (Vec::new(), total);
            }
        };

        let links: Vec<RedirectLink> = models.into_iter().map(model_to_redirect_link).collect();
        (links, total)
    }

    /// 获取链接统计信息（SeaORM DSL 聚合查询）
    pub async fn get_stats(&self) -> LinkStats {
        let result = redirect_link::Entity::find()
            .select_only()
            // COUNT(*) - 总链接数
            .column_as(redirect_link::Column::Id.count(), "total_links")
            // SUM(CASE WHEN is_active THEN 1 ELSE 0 END) - 激活链接数
            .column_as(
                Expr::case(redirect_link::Column::IsActive.eq(true), 1)
                    .finally(0)
                    .sum(),
                "active_links",
            )
            // SUM(hit_count) - 总命中数
            .column_as(redirect_link::Column::HitCount.sum(), "total_hits")
            // SUM(CASE WHEN is_active THEN weight ELSE 0 END) - 激活权重之和
            .column_as(
                Expr::case(
                    redirect_link::Column::IsActive.eq(true),
                    Expr::col(redirect_link::Column::Weight),
                )
                .finally(0)
                .sum(),
                "active_weight",
            )
            .into_model::<StatsResult>()
            .one(&self.db)
            .await;

        match result {
            Ok(Some(stats)) => LinkStats {
                total_links: stats.total_links as usize,
                active_links: stats.active_links.unwrap_or(0) as usize,
                total_hits: stats.total_hits.unwrap_or(0) as usize,
                active_weight: stats.active_weight.unwrap_or(0),
            },
            Ok(None) => {
                error!("统计查询返回空结果");
                LinkStats::default()
            }
            Err(e) => {
                error!("统计查询失败: {}", e);
                LinkStats::default()
            }
        }
    }
}
