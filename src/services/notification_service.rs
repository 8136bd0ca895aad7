//! 通知发射器
//! 由状态变更决定"何时通知、通知什么"；投递通道（推送/邮件）在本服务之外
//! 本服务的契约止于"通知记录已创建"

use crate::{
    error::AppError,
    models::notification::{
        NewNotification, Notification, NotificationPriority, NotificationType,
    },
    models::report::{Report, ReportPriority, ReportStatus},
    repository::{NotificationRepository, UserRepository},
};
use futures::future::join_all;
use sqlx::PgPool;
use uuid::Uuid;

pub struct NotificationService {
    notifications: NotificationRepository,
    users: UserRepository,
}

/// 上报优先级到通知优先级的映射
fn notification_priority(priority: ReportPriority) -> NotificationPriority {
    match priority {
        ReportPriority::Critical | ReportPriority::High => NotificationPriority::High,
        ReportPriority::Medium => NotificationPriority::Normal,
        ReportPriority::Low => NotificationPriority::Low,
    }
}

impl NotificationService {
    pub fn new(db: PgPool) -> Self {
        Self {
            notifications: NotificationRepository::new(db.clone()),
            users: UserRepository::new(db),
        }
    }

    fn related_to_report(report: &Report) -> (Option<String>, Option<Uuid>) {
        (Some("report".to_string()), Some(report.id))
    }

    /// 新上报创建：每个启用中的管理员各收到一条通知
    pub async fn report_submitted(&self, report: &Report) -> Result<(), AppError> {
        let admins = self.users.find_active_admins().await?;
        let (related_model, related_id) = Self::related_to_report(report);

        let creates = admins.iter().map(|admin| {
            let new = NewNotification {
                recipient: admin.id,
                notification_type: NotificationType::ReportStatus,
                title: "New report submitted".to_string(),
                message: format!("A new report \"{}\" has been submitted", report.title),
                related_model: related_model.clone(),
                related_id,
                priority: notification_priority(report.priority),
            };
            async move { self.notifications.create(&new).await }
        });

        for result in join_all(creates).await {
            result?;
        }

        Ok(())
    }

    /// 状态变更：通知提交人（行为人即提交人时跳过）
    pub async fn status_changed(
        &self,
        report: &Report,
        new_status: ReportStatus,
        actor_id: Uuid,
    ) -> Result<(), AppError> {
        if report.submitted_by == actor_id {
            return Ok(());
        }

        let (related_model, related_id) = Self::related_to_report(report);
        self.notifications
            .create(&NewNotification {
                recipient: report.submitted_by,
                notification_type: NotificationType::ReportStatus,
                title: "Report status updated".to_string(),
                message: format!(
                    "Your report \"{}\" is now {}",
                    report.title,
                    new_status.as_str()
                ),
                related_model,
                related_id,
                priority: NotificationPriority::Normal,
            })
            .await?;

        Ok(())
    }

    /// 指派：通知新的处理人
    pub async fn assigned(&self, report: &Report, assignee: Uuid) -> Result<(), AppError> {
        let (related_model, related_id) = Self::related_to_report(report);
        self.notifications
            .create(&NewNotification {
                recipient: assignee,
                notification_type: NotificationType::Assignment,
                title: "Report assigned to you".to_string(),
                message: format!("Report \"{}\" has been assigned to you", report.title),
                related_model,
                related_id,
                priority: notification_priority(report.priority),
            })
            .await?;

        Ok(())
    }

    /// 反馈：通知当前处理人（若有）
    pub async fn feedback_received(&self, report: &Report, rating: i16) -> Result<(), AppError> {
        let Some(assignee) = report.assigned_to else {
            return Ok(());
        };

        let (related_model, related_id) = Self::related_to_report(report);
        self.notifications
            .create(&NewNotification {
                recipient: assignee,
                notification_type: NotificationType::Feedback,
                title: "Feedback received".to_string(),
                message: format!(
                    "The submitter rated report \"{}\" {}/5",
                    report.title, rating
                ),
                related_model,
                related_id,
                priority: NotificationPriority::Normal,
            })
            .await?;

        Ok(())
    }

    /// 接收方的通知列表
    pub async fn list(
        &self,
        recipient: Uuid,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Notification>, i64), AppError> {
        self.notifications
            .list_for_recipient(recipient, unread_only, limit, offset)
            .await
    }

    /// 未读数量
    pub async fn unread_count(&self, recipient: Uuid) -> Result<i64, AppError> {
        self.notifications.unread_count(recipient).await
    }

    /// 标记已读（幂等）；只有接收方可以操作自己的通知
    pub async fn mark_read(&self, id: Uuid, recipient: Uuid) -> Result<Notification, AppError> {
        self.notifications
            .mark_read(id, recipient)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// 全部标记已读
    pub async fn mark_all_read(&self, recipient: Uuid) -> Result<u64, AppError> {
        self.notifications.mark_all_read(recipient).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_priority_mapping() {
        assert_eq!(
            notification_priority(ReportPriority::Critical),
            NotificationPriority::High
        );
        assert_eq!(
            notification_priority(ReportPriority::High),
            NotificationPriority::High
        );
        assert_eq!(
            notification_priority(ReportPriority::Medium),
            NotificationPriority::Normal
        );
        assert_eq!(
            notification_priority(ReportPriority::Low),
            NotificationPriority::Low
        );
    }
}
