//! 通知相关的 HTTP 处理器

use crate::{
    auth::middleware::AuthContext,
    error::Result,
    middleware::AppState,
    models::notification::NotificationListFilters,
};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// 当前用户的通知列表
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Query(filters): Query<NotificationListFilters>,
) -> Result<impl IntoResponse> {
    let page = filters.page.unwrap_or(1).max(1);
    let limit = filters
        .limit
        .unwrap_or(state.config.app.default_page_size)
        .clamp(1, state.config.app.max_page_size);
    let unread_only = filters.unread_only.unwrap_or(false);

    let (notifications, total) = state
        .notification_service
        .list(auth_context.user_id, unread_only, limit, (page - 1) * limit)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "notifications": notifications,
            "total": total,
            "page": page,
            "limit": limit
        }
    })))
}

/// 未读通知数量
pub async fn unread_count(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
) -> Result<impl IntoResponse> {
    let count = state
        .notification_service
        .unread_count(auth_context.user_id)
        .await?;

    Ok(Json(json!({ "success": true, "data": { "unread_count": count } })))
}

/// 标记单条通知为已读（幂等）
pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let notification = state
        .notification_service
        .mark_read(id, auth_context.user_id)
        .await?;

    Ok(Json(json!({ "success": true, "data": notification })))
}

/// 全部标记已读
pub async fn mark_all_read(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
) -> Result<impl IntoResponse> {
    let updated = state
        .notification_service
        .mark_all_read(auth_context.user_id)
        .await?;

    Ok(Json(json!({ "success": true, "data": { "updated_count": updated } })))
}
