use serde::{Deserialize, Serialize};

/// 一条出站跳转链接
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedirectLink {
    pub id: String,
    pub url: String,
    pub label: String,
    pub category: String,
    /// 相对权重，取值范围 1..=100
    pub weight: i32,
    pub is_active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,

    #[serde(default)]
    pub hit_count: i64,
}

/// 部分更新的字段集合，None 表示该字段保持不变
#[derive(Debug, Clone, Default)]
pub struct LinkUpdate {
    pub url: Option<String>,
    pub label: Option<String>,
    pub category: Option<String>,
    pub weight: Option<i32>,
    pub is_active: Option<bool>,
}

impl LinkUpdate {
    pub fn is_empty(&self) -> bool {
        self.url.is_none()
            && self.label.is_none()
            && self.category.is_none()
            && self.weight.is_none()
            && self.is_active.is_none()
    }
}

/// 链接聚合统计
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkStats {
    pub total_links: usize,
    pub active_links: usize,
    pub total_hits: usize,
    /// 当前激活链接的权重之和
    pub active_weight: i64,
}
