//! 路由注册
//! 创建所有 API 路由并应用中间件

use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::{handlers, middleware::AppState};

/// 请求体大小上限（图片以 URL 引用，正文只含元数据）
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// 创建应用路由
pub fn create_router(state: Arc<AppState>) -> Router {
    // 公开端点（健康检查）
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check));

    // 认证路由（无需认证）
    let auth_routes = Router::new()
        .route("/api/v1/auth/register", post(handlers::auth::register))
        .route("/api/v1/auth/login", post(handlers::auth::login))
        .route("/api/v1/auth/refresh", post(handlers::auth::refresh_token))
        .route(
            "/api/v1/auth/password-reset/request",
            post(handlers::auth::request_password_reset),
        )
        .route(
            "/api/v1/auth/password-reset/confirm",
            post(handlers::auth::confirm_password_reset),
        );

    // 需要认证的路由
    let authenticated_routes = Router::new()
        // 当前用户信息
        .route("/api/v1/auth/me", get(handlers::auth::get_current_user))

        // 用户管理（管理员）
        .route(
            "/api/v1/users",
            get(handlers::user::list_users)
                .post(handlers::user::create_user)
        )
        .route(
            "/api/v1/users/{id}",
            get(handlers::user::get_user)
                .put(handlers::user::update_user)
        )

        // 上报
        .route(
            "/api/v1/reports",
            get(handlers::report::search_reports)
                .post(handlers::report::create_report)
        )
        .route(
            "/api/v1/reports/{id}",
            get(handlers::report::get_report)
        )
        .route(
            "/api/v1/reports/{id}/timeline",
            get(handlers::report::get_timeline)
        )
        .route(
            "/api/v1/reports/{id}/status",
            put(handlers::report::update_status)
        )
        .route(
            "/api/v1/reports/{id}/assign",
            put(handlers::report::assign_report)
        )
        .route(
            "/api/v1/reports/{id}/feedback",
            post(handlers::report::submit_feedback)
        )

        // 批量操作（管理员）
        .route(
            "/api/v1/reports/bulk/status",
            post(handlers::report::bulk_status_update)
        )
        .route(
            "/api/v1/reports/bulk/assign",
            post(handlers::report::bulk_assign)
        )
        .route(
            "/api/v1/reports/bulk/close",
            post(handlers::report::bulk_close)
        )

        // 通知
        .route(
            "/api/v1/notifications",
            get(handlers::notification::list_notifications)
        )
        .route(
            "/api/v1/notifications/unread-count",
            get(handlers::notification::unread_count)
        )
        .route(
            "/api/v1/notifications/{id}/read",
            put(handlers::notification::mark_read)
        )
        .route(
            "/api/v1/notifications/read-all",
            put(handlers::notification::mark_all_read)
        )

        // 仪表盘与统计（管理员）
        .route("/api/v1/dashboard/overview", get(handlers::dashboard::overview))
        .route("/api/v1/dashboard/statistics", get(handlers::dashboard::statistics))
        .layer(axum::middleware::from_fn_with_state(
            state.jwt_service.clone(),
            crate::auth::middleware::jwt_auth_middleware,
        ));

    // 指标端点
    let metrics_routes = Router::new().route("/metrics", get(handlers::metrics::metrics_export));

    // 组合所有路由
    Router::new()
        .merge(public_routes)
        .merge(auth_routes)
        .merge(authenticated_routes)
        .merge(metrics_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
                .layer(CorsLayer::permissive()),
        )
        .layer(axum::middleware::from_fn(crate::middleware::request_tracking_middleware))
        .with_state(state)
}
