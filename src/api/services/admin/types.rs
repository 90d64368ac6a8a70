//! Admin API 类型定义

use serde::{Deserialize, Serialize};

use crate::services::CreateLinkRequest;
use crate::storage::{LinkUpdate, RedirectLink};

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct LoginCredentials {
    pub password: String,
}

/// 统一响应信封：code 为 0 表示成功，非 0 为 ErrorCode
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    pub data: Option<T>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AuthSuccessResponse {
    pub message: String,
    /// access token 有效期，单位秒
    pub expires_in: i64,
}

/// 创建链接请求体
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CreateLinkPayload {
    pub url: String,
    pub label: Option<String>,
    pub category: Option<String>,
    pub weight: Option<i32>,
    pub is_active: Option<bool>,
}

impl From<CreateLinkPayload> for CreateLinkRequest {
    fn from(payload: CreateLinkPayload) -> Self {
        Self {
            url: payload.url,
            label: payload.label,
            category: payload.category,
            weight: payload.weight,
            is_active: payload.is_active,
        }
    }
}

/// 更新链接请求体，所有字段可选，缺省字段保持原值
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct UpdateLinkPayload {
    pub url: Option<String>,
    pub label: Option<String>,
    pub category: Option<String>,
    pub weight: Option<i32>,
    pub is_active: Option<bool>,
}

impl From<UpdateLinkPayload> for LinkUpdate {
    fn from(payload: UpdateLinkPayload) -> Self {
        Self {
            url: payload.url,
            label: payload.label,
            category: payload.category,
            weight: payload.weight,
            is_active: payload.is_active,
        }
    }
}

/// 激活/停用请求体
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SetActivePayload {
    pub is_active: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct GetLinksQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub search: Option<String>,
    pub category: Option<String>,
    pub active: Option<bool>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PaginatedResponse<T> {
    pub code: i32,
    pub message: String,
    pub data: T,
    pub pagination: PaginationInfo,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PaginationInfo {
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
    pub total_pages: u64,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct LinkResponse {
    pub id: String,
    pub url: String,
    pub label: String,
    pub category: String,
    pub weight: i32,
    pub is_active: bool,
    pub hit_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<RedirectLink> for LinkResponse {
    fn from(link: RedirectLink) -> Self {
        Self {
            id: link.id,
            url: link.url,
            label: link.label,
            category: link.category,
            weight: link.weight,
            is_active: link.is_active,
            hit_count: link.hit_count,
            created_at: link.created_at.to_rfc3339(),
            updated_at: link.updated_at.to_rfc3339(),
        }
    }
}

/// 统计信息响应
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct StatsResponse {
    pub total_links: usize,
    pub active_links: usize,
    pub total_hits: usize,
    /// 当前激活链接的权重之和
    pub active_weight: i64,
}

// ============ 分析统计查询参数 ============

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AnalyticsDaysQuery {
    pub days: Option<u32>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct EventsQuery {
    pub session_id: Option<String>,
    pub limit: Option<u32>,
}

// ============ 健康检查相关类型 ============

/// 存储健康检查状态
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct HealthStorageCheck {
    pub status: String,
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 健康检查项容器
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct HealthChecks {
    pub storage: HealthStorageCheck,
}

/// 健康检查响应
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
    pub uptime: u64,
    pub checks: HealthChecks,
    pub response_time_ms: u32,
}
