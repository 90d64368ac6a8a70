//! Admin API 路由配置
//!
//! 将 /v1 下的路由按功能模块拆分，提高可读性和可维护性。

use actix_web::web;

use super::analytics::analytics_routes;
use super::auth::{
    check_admin_password, login_rate_limiter, logout, refresh_rate_limiter, refresh_token,
    verify_token,
};
use super::link_crud::{
    delete_link, get_all_links, get_link, get_stats, post_link, set_link_active, update_link,
};

/// 链接管理路由 `/links`
///
/// 包含：
/// - GET/HEAD /links - 获取所有链接
/// - POST /links - 创建链接
/// - PATCH /links/{id}/active - 激活/停用
/// - GET/HEAD /links/{id} - 获取单个链接
/// - PUT /links/{id} - 更新链接
/// - DELETE /links/{id} - 删除链接
pub fn links_routes() -> actix_web::Scope {
    web::scope("/links")
        .route("", web::get().to(get_all_links))
        .route("", web::head().to(get_all_links))
        .route("", web::post().to(post_link))
        // /{id}/active must be before /{id}
        .route("/{id}/active", web::patch().to(set_link_active))
        .route("/{id}", web::get().to(get_link))
        .route("/{id}", web::head().to(get_link))
        .route("/{id}", web::put().to(update_link))
        .route("/{id}", web::delete().to(delete_link))
}

/// 统计路由 `/stats`
pub fn stats_routes() -> actix_web::Scope {
    web::scope("/stats")
        .route("", web::get().to(get_stats))
        .route("", web::head().to(get_stats))
}

/// 认证路由 `/auth`
///
/// 包含：
/// - POST /auth/login - 登录（带限流）
/// - POST /auth/refresh - 刷新 token（带限流）
/// - POST /auth/logout - 登出
/// - GET /auth/verify - 验证 token
pub fn auth_routes() -> actix_web::Scope {
    web::scope("/auth")
        .route(
            "/login",
            web::post()
                .to(check_admin_password)
                .wrap(login_rate_limiter()),
        )
        .route(
            "/refresh",
            web::post().to(refresh_token).wrap(refresh_rate_limiter()),
        )
        .route("/logout", web::post().to(logout))
        .route("/verify", web::get().to(verify_token))
}

/// Admin API v1 路由
///
/// 组合所有子模块路由
pub fn admin_v1_routes() -> actix_web::Scope {
    web::scope("/v1")
        .service(links_routes())
        .service(stats_routes())
        .service(auth_routes())
        .service(analytics_routes())
}
