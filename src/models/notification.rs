//! Notification domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 通知类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    ReportStatus,
    Assignment,
    Feedback,
    System,
    Message,
}

/// 通知优先级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_priority", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationPriority {
    Low,
    Normal,
    High,
}

/// Notification
/// related_model / related_id 为弱引用：被引用实体移除后允许悬空
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub recipient: Uuid,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub related_model: Option<String>,
    pub related_id: Option<Uuid>,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub priority: NotificationPriority,
    pub created_at: DateTime<Utc>,
}

/// 创建通知的输入
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub recipient: Uuid,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub related_model: Option<String>,
    pub related_id: Option<Uuid>,
    pub priority: NotificationPriority,
}

/// 通知列表查询参数
#[derive(Debug, Default, Deserialize)]
pub struct NotificationListFilters {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub unread_only: Option<bool>,
}
