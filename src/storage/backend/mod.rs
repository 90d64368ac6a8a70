//! SeaORM storage backend
//!
//! This module provides database storage using SeaORM,
//! supporting SQLite, MySQL/MariaDB, and PostgreSQL.

mod connection;
mod converters;
mod hit_sink;
mod mutations;
mod query;
pub mod retry;
mod tracking;
mod usage;

use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;
use sea_orm::DatabaseConnection;
use tracing::warn;

use crate::analytics::HitSink;
use crate::errors::{OutlinkerError, Result};

pub use connection::{connect_generic, connect_sqlite, run_migrations};
pub use converters::{link_to_insert_model, model_to_redirect_link};
pub use tracking::{SessionSummary, SourceRow};

/// 从数据库 URL 推断数据库类型
pub fn infer_backend_from_url(database_url: &str) -> Result<String> {
    if database_url.starts_with("sqlite://")
        || database_url.ends_with(".db")
        || database_url.ends_with(".sqlite")
        || database_url == ":memory:"
    {
        Ok("sqlite".to_string())
    } else if database_url.starts_with("mysql://") || database_url.starts_with("mariadb://") {
        Ok("mysql".to_string())
    } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        Ok("postgres".to_string())
    } else {
        Err(OutlinkerError::database_config(format!(
            "无法从 URL 推断数据库类型: {}. 支持的 URL 格式: sqlite://, mysql://, mariadb://, postgres://",
            database_url
        )))
    }
}

/// 链接列表过滤条件
#[derive(Default, Clone, Debug)]
pub struct LinkFilter {
    /// 模糊搜索 label 或 url
    pub search: Option<String>,
    /// 精确匹配分类
    pub category: Option<String>,
    /// 按激活状态过滤
    pub active: Option<bool>,
}

/// SeaORM-based storage backend
#[derive(Clone)]
pub struct SeaOrmStorage {
    db: DatabaseConnection,
    backend_name: String,
    /// 分页 COUNT 缓存（TTL 30秒）
    count_cache: Cache<String, u64>,
    /// 重试配置
    retry_config: retry::RetryConfig,
}

impl SeaOrmStorage {
    pub async fn new(database_url: &str, backend_name: &str) -> Result<Self> {
        if database_url.is_empty() {
            return Err(OutlinkerError::database_config(
                "DATABASE_URL 未设置".to_string(),
            ));
        }

        // 读取重试配置
        let config = crate::config::get_config();
        let retry_config = retry::RetryConfig {
            max_retries: config.database.retry_count,
            base_delay_ms: config.database.retry_base_delay_ms,
            max_delay_ms: config.database.retry_max_delay_ms,
        };

        // 根据不同数据库类型配置连接选项
        let db = if backend_name == "sqlite" {
            connect_sqlite(database_url).await?
        } else {
            connect_generic(database_url, backend_name).await?
        };

        let storage = SeaOrmStorage {
            db,
            backend_name: backend_name.to_string(),
            count_cache: Cache::builder()
                .time_to_live(Duration::from_secs(30))
                .max_capacity(100)
                .build(),
            retry_config,
        };

        // 运行迁移
        run_migrations(&storage.db).await?;

        warn!(
            "{} Storage initialized.",
            storage.backend_name.to_uppercase()
        );
        Ok(storage)
    }

    pub fn backend_name(&self) -> &str {
        &self.backend_name
    }

    /// 数据库连通性探测，用于健康检查
    pub async fn ping(&self) -> Result<()> {
        self.db.ping().await?;
        Ok(())
    }

    pub fn as_hit_sink(&self) -> Arc<dyn HitSink> {
        Arc::new(self.clone()) as Arc<dyn HitSink>
    }

    /// 获取数据库连接（用于健康检查等需要直接访问数据库的场景）
    pub fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// 清除分页 COUNT 缓存（数据变更时调用）
    pub fn invalidate_count_cache(&self) {
        self.count_cache.invalidate_all();
    }
}
