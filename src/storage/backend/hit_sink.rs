//! HitSink implementation for SeaOrmStorage
//!
//! Flushes buffered hit counts into the links table. The whole batch is a
//! single parameterized UPDATE built with sea_query, one CASE WHEN arm per
//! link id.

use async_trait::async_trait;
use sea_orm::sea_query::{CaseStatement, Expr, Query};
use sea_orm::{ConnectionTrait, ExprTrait};
use tracing::debug;

use super::SeaOrmStorage;
use super::retry;
use crate::analytics::HitSink;

use migration::entities::redirect_link;

#[async_trait]
impl HitSink for SeaOrmStorage {
    async fn flush_hits(&self, updates: Vec<(String, usize)>) -> anyhow::Result<()> {
        if updates.is_empty() {
            return Ok(());
        }

        let total_count = updates.len();

        // 构建 CASE WHEN 表达式（跨平台兼容）
        let mut case_stmt = CaseStatement::new();
        let mut ids: Vec<String> = Vec::with_capacity(total_count);

        for (id, count) in &updates {
            case_stmt = case_stmt.case(
                Expr::col(redirect_link::Column::Id).eq(Expr::val(id.as_str())),
                Expr::col(redirect_link::Column::HitCount).add(Expr::val(*count as i64)),
            );
            ids.push(id.clone());
        }
        // 不匹配的保持原值
        case_stmt = case_stmt.finally(Expr::col(redirect_link::Column::HitCount));

        // 构建 UPDATE 语句，hit_count 只增不减
        let stmt = Query::update()
            .table(redirect_link::Entity)
            .value(redirect_link::Column::HitCount, case_stmt)
            .and_where(Expr::col(redirect_link::Column::Id).is_in(ids))
            .to_owned();

        // 使用参数化查询执行（SeaORM 内部自动 build 为带绑定参数的 Statement）
        let db = &self.db;
        let stmt_ref = &stmt;
        retry::with_retry("flush_hits", self.retry_config, || async {
            db.execute(stmt_ref).await
        })
        .await
        .map_err(|e| {
            anyhow::anyhow!(
                "Failed to batch update hit counts (still failed after retries): {}",
                e
            )
        })?;

        debug!(
            "Hit counts flushed to {} database ({} records)",
            self.backend_name.to_uppercase(),
            total_count
        );

        Ok(())
    }
}
