//! Admin API 链接 CRUD 操作

use actix_web::{HttpRequest, HttpResponse, Responder, Result as ActixResult, web};
use std::sync::Arc;
use tracing::{info, trace};

use crate::services::LinkService;
use crate::storage::LinkFilter;

use super::error_code::ErrorCode;
use super::helpers::{api_result, error_from_outlinker, success_response};
use super::types::{
    ApiResponse, CreateLinkPayload, GetLinksQuery, LinkResponse, PaginatedResponse,
    PaginationInfo, SetActivePayload, StatsResponse, UpdateLinkPayload,
};

/// 获取所有链接（支持分页和过滤）
pub async fn get_all_links(
    _req: HttpRequest,
    query: web::Query<GetLinksQuery>,
    link_service: web::Data<Arc<LinkService>>,
) -> ActixResult<impl Responder> {
    trace!(
        "Admin API: request to list links with filters: {:?}",
        query
    );

    let query = query.into_inner();
    let page = query.page.unwrap_or(1).max(1);
    let page_size = query.page_size.unwrap_or(20).clamp(1, 100);

    let filter = LinkFilter {
        search: query.search,
        category: query.category,
        active: query.active,
    };

    let (links, total) = link_service.list_links(filter, page, page_size).await;
    let total_pages = total.div_ceil(page_size);
    let data: Vec<LinkResponse> = links.into_iter().map(LinkResponse::from).collect();

    info!(
        "Admin API: returning {} links (page {} of {}, total: {})",
        data.len(),
        page,
        total_pages,
        total
    );

    Ok(HttpResponse::Ok()
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(PaginatedResponse {
            code: ErrorCode::Success as i32,
            message: "OK".to_string(),
            data,
            pagination: PaginationInfo {
                page,
                page_size,
                total,
                total_pages,
            },
        }))
}

/// 创建新链接
pub async fn post_link(
    _req: HttpRequest,
    payload: web::Json<CreateLinkPayload>,
    link_service: web::Data<Arc<LinkService>>,
) -> ActixResult<impl Responder> {
    let payload = payload.into_inner();
    info!("Admin API: create link request - url: {}", payload.url);

    match link_service.create_link(payload.into()).await {
        Ok(link) => Ok(HttpResponse::Created()
            .append_header(("Content-Type", "application/json; charset=utf-8"))
            .json(ApiResponse {
                code: ErrorCode::Success as i32,
                message: "OK".to_string(),
                data: Some(LinkResponse::from(link)),
            })),
        Err(e) => {
            info!("Admin API: link creation rejected: {}", e);
            Ok(error_from_outlinker(&e))
        }
    }
}

/// 获取单个链接
pub async fn get_link(
    _req: HttpRequest,
    id: web::Path<String>,
    link_service: web::Data<Arc<LinkService>>,
) -> ActixResult<impl Responder> {
    trace!("Admin API: get link request - id: {}", id);

    Ok(api_result(
        link_service.get_link(&id).await.map(LinkResponse::from),
    ))
}

/// 更新链接
pub async fn update_link(
    _req: HttpRequest,
    id: web::Path<String>,
    payload: web::Json<UpdateLinkPayload>,
    link_service: web::Data<Arc<LinkService>>,
) -> ActixResult<impl Responder> {
    info!("Admin API: update link request - id: {}", id);

    Ok(api_result(
        link_service
            .update_link(&id, payload.into_inner().into())
            .await
            .map(LinkResponse::from),
    ))
}

/// 激活/停用链接
pub async fn set_link_active(
    _req: HttpRequest,
    id: web::Path<String>,
    payload: web::Json<SetActivePayload>,
    link_service: web::Data<Arc<LinkService>>,
) -> ActixResult<impl Responder> {
    info!(
        "Admin API: set link active request - id: {}, is_active: {}",
        id, payload.is_active
    );

    Ok(api_result(
        link_service
            .set_active(&id, payload.is_active)
            .await
            .map(LinkResponse::from),
    ))
}

/// 删除链接
pub async fn delete_link(
    _req: HttpRequest,
    id: web::Path<String>,
    link_service: web::Data<Arc<LinkService>>,
) -> ActixResult<impl Responder> {
    info!("Admin API: delete link request - id: {}", id);

    match link_service.delete_link(&id).await {
        Ok(()) => Ok(success_response(serde_json::json!({
            "message": "Link deleted successfully"
        }))),
        Err(e) => {
            info!("Admin API: failed to delete link - {}: {}", id, e);
            Ok(error_from_outlinker(&e))
        }
    }
}

/// 获取链接聚合统计
pub async fn get_stats(
    _req: HttpRequest,
    link_service: web::Data<Arc<LinkService>>,
) -> ActixResult<impl Responder> {
    let stats = link_service.get_stats().await;

    Ok(success_response(StatsResponse {
        total_links: stats.total_links,
        active_links: stats.active_links,
        total_hits: stats.total_hits,
        active_weight: stats.active_weight,
    }))
}
