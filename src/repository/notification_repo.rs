//! Notification repository (数据库访问层)
//! 通知是纯追加记录；创建后只有接收方可以翻转已读标记

use crate::{
    error::AppError,
    models::notification::{NewNotification, Notification},
};
use sqlx::PgPool;
use uuid::Uuid;

pub struct NotificationRepository {
    db: PgPool,
}

impl NotificationRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// 创建通知
    pub async fn create(&self, new: &NewNotification) -> Result<Notification, AppError> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (
                recipient, notification_type, title, message,
                related_model, related_id, priority
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(new.recipient)
        .bind(new.notification_type)
        .bind(&new.title)
        .bind(&new.message)
        .bind(&new.related_model)
        .bind(new.related_id)
        .bind(new.priority)
        .fetch_one(&self.db)
        .await?;

        Ok(notification)
    }

    /// 接收方的通知列表，最新在前
    pub async fn list_for_recipient(
        &self,
        recipient: Uuid,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Notification>, i64), AppError> {
        let notifications = if unread_only {
            sqlx::query_as::<_, Notification>(
                r#"
                SELECT * FROM notifications
                WHERE recipient = $1 AND NOT is_read
                ORDER BY created_at DESC
                LIMIT $2 OFFSET $3
                "#,
            )
            .bind(recipient)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.db)
            .await?
        } else {
            sqlx::query_as::<_, Notification>(
                r#"
                SELECT * FROM notifications
                WHERE recipient = $1
                ORDER BY created_at DESC
                LIMIT $2 OFFSET $3
                "#,
            )
            .bind(recipient)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.db)
            .await?
        };

        let total: i64 = if unread_only {
            sqlx::query_scalar(
                "SELECT COUNT(*) FROM notifications WHERE recipient = $1 AND NOT is_read",
            )
            .bind(recipient)
            .fetch_one(&self.db)
            .await?
        } else {
            sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE recipient = $1")
                .bind(recipient)
                .fetch_one(&self.db)
                .await?
        };

        Ok((notifications, total))
    }

    /// 未读数量
    pub async fn unread_count(&self, recipient: Uuid) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE recipient = $1 AND NOT is_read",
        )
        .bind(recipient)
        .fetch_one(&self.db)
        .await?;

        Ok(count)
    }

    /// 标记已读。幂等：read_at 只在第一次标记时写入，之后不再变化
    pub async fn mark_read(
        &self,
        id: Uuid,
        recipient: Uuid,
    ) -> Result<Option<Notification>, AppError> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            UPDATE notifications
            SET is_read = TRUE, read_at = COALESCE(read_at, NOW())
            WHERE id = $1 AND recipient = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(recipient)
        .fetch_optional(&self.db)
        .await?;

        Ok(notification)
    }

    /// 全部标记已读，返回受影响条数
    pub async fn mark_all_read(&self, recipient: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET is_read = TRUE, read_at = COALESCE(read_at, NOW())
            WHERE recipient = $1 AND NOT is_read
            "#,
        )
        .bind(recipient)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected())
    }

    /// 统计通知数量
    pub async fn count(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notifications")
            .fetch_one(&self.db)
            .await?;

        Ok(count)
    }
}
