//! 用户管理的 HTTP 处理器（管理员）

use crate::{
    auth::middleware::AuthContext,
    error::Result,
    middleware::AppState,
    models::user::{AdminUpdateUserRequest, CreateUserRequest, UserListFilters},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// 列出用户
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Query(filters): Query<UserListFilters>,
) -> Result<impl IntoResponse> {
    let page = state.user_service.list(&auth_context, filters).await?;

    Ok(Json(json!({ "success": true, "data": page })))
}

/// 创建用户（可信路径：允许创建 admin）
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Json(req): Json<CreateUserRequest>,
) -> Result<impl IntoResponse> {
    let user = state.user_service.create(&auth_context, req).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": user })),
    ))
}

/// 获取用户详情
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let user = state.user_service.get(&auth_context, id).await?;

    Ok(Json(json!({ "success": true, "data": user })))
}

/// 更新用户（角色 / 启用状态）
/// 自我保护：管理员不能改自己的角色、不能停用自己的账户
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Path(id): Path<Uuid>,
    Json(req): Json<AdminUpdateUserRequest>,
) -> Result<impl IntoResponse> {
    let user = state.user_service.update(&auth_context, id, req).await?;

    Ok(Json(json!({ "success": true, "data": user })))
}
