//! Admin API 服务模块
//!
//! 该模块包含管理 API 的所有端点，包括：
//! - 认证（登录、登出、token 刷新）
//! - 链接 CRUD 操作
//! - 分析统计

pub mod analytics;
pub mod auth;
pub mod error_code;
mod helpers;
mod link_crud;
pub mod routes;
mod types;

// 重新导出类型
pub use types::*;

// 重新导出帮助函数
pub use helpers::{
    CookieBuilder, api_result, error_from_outlinker, error_response, json_response,
    success_response,
};

// 重新导出错误码
pub use error_code::ErrorCode;

// 重新导出认证端点
pub use auth::{check_admin_password, logout, refresh_token, verify_token};

// 重新导出链接 CRUD 端点
pub use link_crud::{
    delete_link, get_all_links, get_link, get_stats, post_link, set_link_active, update_link,
};

// 重新导出分析统计端点
pub use analytics::{get_events, get_sessions, get_usage};
