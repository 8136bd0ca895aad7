//! 认证相关的 HTTP 处理器

use crate::{
    auth::middleware::AuthContext,
    error::{AppError, Result},
    middleware::AppState,
    models::user::{
        ConfirmPasswordResetRequest, LoginRequest, RegisterRequest, RequestPasswordResetRequest,
    },
};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// 注册
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse> {
    let response = state.auth_service.register(req).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": response })),
    ))
}

/// 登录
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    let response = state.auth_service.login(req).await?;

    Ok(Json(json!({ "success": true, "data": response })))
}

/// 刷新令牌
pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RefreshRequest>,
) -> Result<impl IntoResponse> {
    let response = state.auth_service.refresh(&req.refresh_token).await?;

    Ok(Json(json!({ "success": true, "data": response })))
}

/// 当前用户信息
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
) -> Result<impl IntoResponse> {
    let user = state.auth_service.me(auth_context.user_id).await?;

    Ok(Json(json!({ "success": true, "data": user })))
}

/// 申请密码重置
pub async fn request_password_reset(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RequestPasswordResetRequest>,
) -> Result<impl IntoResponse> {
    req.validate().map_err(AppError::from)?;
    state.auth_service.request_password_reset(&req.email).await?;

    // 无论邮箱是否存在都返回相同响应
    Ok(Json(json!({
        "success": true,
        "message": "If the email exists, a reset token has been issued"
    })))
}

/// 使用重置令牌设置新密码
pub async fn confirm_password_reset(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ConfirmPasswordResetRequest>,
) -> Result<impl IntoResponse> {
    state.auth_service.confirm_password_reset(req).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Password has been reset"
    })))
}
