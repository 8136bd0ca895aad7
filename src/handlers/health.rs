//! 健康检查处理器

use crate::{db, middleware::AppState};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use once_cell::sync::OnceCell;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;

static START_TIME: OnceCell<Instant> = OnceCell::new();

/// 记录应用启动时间
pub fn set_start_time() {
    START_TIME.get_or_init(Instant::now);
}

/// 进程运行时长（秒）
pub fn get_uptime() -> u64 {
    START_TIME
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0)
}

/// 存活检查
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": get_uptime()
    }))
}

/// 就绪检查：数据库可用才算就绪
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match db::health_check(&state.db).await {
        db::HealthStatus::Healthy => (
            StatusCode::OK,
            Json(json!({ "status": "ready", "database": "ok" })),
        ),
        db::HealthStatus::Unhealthy(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "not_ready", "database": "unavailable" })),
        ),
    }
}
