use crate::storage::RedirectLink;
use migration::entities::redirect_link;

/// 将 Sea-ORM Model 转换为 RedirectLink
pub fn model_to_redirect_link(model: redirect_link::Model) -> RedirectLink {
    RedirectLink {
        id: model.id,
        url: model.url,
        label: model.label,
        category: model.category,
        weight: model.weight,
        is_active: model.is_active,
        created_at: model.created_at,
        updated_at: model.updated_at,
        hit_count: model.hit_count.max(0),
    }
}

/// 将 RedirectLink 转换为 ActiveModel（用于插入）
pub fn link_to_insert_model(link: &RedirectLink) -> redirect_link::ActiveModel {
    use sea_orm::ActiveValue::Set;

    redirect_link::ActiveModel {
        id: Set(link.id.clone()),
        url: Set(link.url.clone()),
        label: Set(link.label.clone()),
        category: Set(link.category.clone()),
        weight: Set(link.weight),
        is_active: Set(link.is_active),
        hit_count: Set(link.hit_count),
        created_at: Set(link.created_at),
        updated_at: Set(link.updated_at),
    }
}
