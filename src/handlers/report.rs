//! 上报相关的 HTTP 处理器

use crate::{
    auth::middleware::AuthContext,
    error::Result,
    middleware::AppState,
    models::report::{
        AssignRequest, BulkAssignRequest, BulkStatusRequest, CreateReportRequest, FeedbackRequest,
        UpdateStatusRequest,
    },
    models::search::ReportSearchParams,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// 创建上报
pub async fn create_report(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Json(req): Json<CreateReportRequest>,
) -> Result<impl IntoResponse> {
    let report = state.report_service.create_report(&auth_context, req).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": report })),
    ))
}

/// 高级搜索：结果页 + 分页元数据 + 面向结果集的统计 + 过滤条件回显
pub async fn search_reports(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Query(params): Query<ReportSearchParams>,
) -> Result<impl IntoResponse> {
    let response = state.search_service.search(&auth_context, params).await?;

    Ok(Json(json!({
        "success": true,
        "reports": response.reports,
        "pagination": response.pagination,
        "statistics": response.statistics,
        "filters": response.filters
    })))
}

/// 查询上报详情
pub async fn get_report(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let report = state.report_service.get_report(&auth_context, id).await?;

    Ok(Json(json!({ "success": true, "data": report })))
}

/// 查询上报时间线
pub async fn get_timeline(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let timeline = state.report_service.timeline(&auth_context, id).await?;

    Ok(Json(json!({ "success": true, "data": timeline })))
}

/// 状态变更
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse> {
    let report = state
        .report_service
        .change_status(&auth_context, id, req)
        .await?;

    Ok(Json(json!({ "success": true, "data": report })))
}

/// 指派
pub async fn assign_report(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Path(id): Path<Uuid>,
    Json(req): Json<AssignRequest>,
) -> Result<impl IntoResponse> {
    let report = state.report_service.assign(&auth_context, id, req).await?;

    Ok(Json(json!({ "success": true, "data": report })))
}

/// 提交反馈
pub async fn submit_feedback(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Path(id): Path<Uuid>,
    Json(req): Json<FeedbackRequest>,
) -> Result<impl IntoResponse> {
    let report = state
        .report_service
        .submit_feedback(&auth_context, id, req)
        .await?;

    Ok(Json(json!({ "success": true, "data": report })))
}

/// 批量状态更新
pub async fn bulk_status_update(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Json(req): Json<BulkStatusRequest>,
) -> Result<impl IntoResponse> {
    let status = req.status.clone();
    let result = state.bulk_service.bulk_status(&auth_context, req).await?;

    Ok(Json(json!({
        "success": true,
        "updated_count": result.updated_count,
        "status": status,
        "report_ids": result.report_ids
    })))
}

/// 批量指派
pub async fn bulk_assign(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Json(req): Json<BulkAssignRequest>,
) -> Result<impl IntoResponse> {
    let result = state.bulk_service.bulk_assign(&auth_context, req).await?;

    Ok(Json(json!({
        "success": true,
        "updated_count": result.updated_count,
        "report_ids": result.report_ids
    })))
}

#[derive(Debug, Deserialize)]
pub struct BulkCloseRequest {
    pub report_ids: Vec<String>,
    pub comment: Option<String>,
}

/// 批量关闭（软删除口径）
pub async fn bulk_close(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Json(req): Json<BulkCloseRequest>,
) -> Result<impl IntoResponse> {
    let result = state
        .bulk_service
        .bulk_close(&auth_context, req.report_ids, req.comment)
        .await?;

    Ok(Json(json!({
        "success": true,
        "updated_count": result.updated_count,
        "report_ids": result.report_ids
    })))
}
