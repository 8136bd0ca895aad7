//! 仪表盘与统计端点（管理员）

use crate::{
    auth::middleware::AuthContext,
    error::{AppError, Result},
    middleware::AppState,
    models::dashboard::DashboardParams,
    models::user::Role,
};
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;

fn require_admin(auth_context: &AuthContext) -> Result<()> {
    if auth_context.role != Role::Admin {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

/// 概览指标
pub async fn overview(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Query(params): Query<DashboardParams>,
) -> Result<impl IntoResponse> {
    require_admin(&auth_context)?;

    let timeframe = state
        .analytics_service
        .resolve_timeframe(params.timeframe.as_deref());
    let metrics = state.analytics_service.overview(timeframe).await?;

    Ok(Json(json!({ "success": true, "data": metrics })))
}

/// 统计报表
pub async fn statistics(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Query(params): Query<DashboardParams>,
) -> Result<impl IntoResponse> {
    require_admin(&auth_context)?;

    let timeframe = state
        .analytics_service
        .resolve_timeframe(params.timeframe.as_deref());
    let report = state.analytics_service.statistics(timeframe).await?;

    Ok(Json(json!({ "success": true, "data": report })))
}
