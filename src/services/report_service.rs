//! 上报服务
//! 状态变更的唯一入口：结构校验 -> 策略授权 -> 事务内落库 -> 发通知

use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    models::report::{
        AssignRequest, CreateReportRequest, FeedbackRequest, Report, ReportPriority,
        ReportResponse, ReportStatus, UpdateStatusRequest,
    },
    models::user::Role,
    repository::{report_repo::NewReport, ReportRepository, UserRepository},
    services::policy_service::{self, ReportAction, ReportFacts},
    services::NotificationService,
};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

pub struct ReportService {
    reports: ReportRepository,
    users: UserRepository,
    notifier: Arc<NotificationService>,
}

impl ReportService {
    pub fn new(db: PgPool, notifier: Arc<NotificationService>) -> Self {
        Self {
            reports: ReportRepository::new(db.clone()),
            users: UserRepository::new(db),
            notifier,
        }
    }

    /// 创建上报：实体与初始 submitted 时间线条目一并写入，随后通知管理员
    pub async fn create_report(
        &self,
        actor: &AuthContext,
        req: CreateReportRequest,
    ) -> Result<ReportResponse, AppError> {
        req.validate()?;

        let (longitude, latitude) = req
            .location
            .validated()
            .map_err(|reason| AppError::validation("location.coordinates", &reason))?;

        let images = req.images.unwrap_or_default();
        let report = self
            .reports
            .create(NewReport {
                title: &req.title,
                description: &req.description,
                category: req.category,
                priority: req.priority.unwrap_or(ReportPriority::Medium),
                longitude,
                latitude,
                address: req.location.address.as_ref(),
                submitted_by: actor.user_id,
                images: &images,
            })
            .await?;

        tracing::info!(
            report_id = %report.id,
            category = report.category.as_str(),
            priority = report.priority.as_str(),
            "Report created"
        );

        // 状态已落库；通知失败向上抛为 InternalError，但不回滚上报
        self.notifier.report_submitted(&report).await?;

        self.response(report).await
    }

    /// 查询单个上报（含时间线与图片）
    pub async fn get_report(
        &self,
        actor: &AuthContext,
        report_id: Uuid,
    ) -> Result<ReportResponse, AppError> {
        let report = self
            .reports
            .find_by_id(report_id)
            .await?
            .ok_or(AppError::NotFound)?;

        policy_service::authorize_report(
            actor.role,
            actor.user_id,
            &ReportFacts::of(&report),
            ReportAction::View,
        )?;

        self.response(report).await
    }

    /// 状态变更操作（唯一合法的状态/时间线修改路径）
    pub async fn change_status(
        &self,
        actor: &AuthContext,
        report_id: Uuid,
        req: UpdateStatusRequest,
    ) -> Result<ReportResponse, AppError> {
        // 结构合法性先于存在性与授权
        let target: ReportStatus = req
            .status
            .parse()
            .map_err(|e: String| AppError::BadRequest(e))?;

        let report = self
            .reports
            .find_by_id(report_id)
            .await?
            .ok_or(AppError::NotFound)?;

        policy_service::authorize_report(
            actor.role,
            actor.user_id,
            &ReportFacts::of(&report),
            ReportAction::Transition(target),
        )?;

        let updated = self
            .apply_transition(actor.user_id, &report, target, req.comment.as_deref())
            .await?;

        self.response(updated).await
    }

    /// 已授权的状态变更：时间线追加 + 状态写入（同一事务），随后通知提交人
    /// 批量协调器对每个命中的上报独立调用本方法
    pub async fn apply_transition(
        &self,
        actor_id: Uuid,
        report: &Report,
        target: ReportStatus,
        comment: Option<&str>,
    ) -> Result<Report, AppError> {
        let updated = self
            .reports
            .append_transition(report.id, target, comment, actor_id)
            .await?;

        tracing::info!(
            report_id = %report.id,
            from = report.status.as_str(),
            to = target.as_str(),
            "Report status changed"
        );

        self.notifier
            .status_changed(&updated, target, actor_id)
            .await?;

        Ok(updated)
    }

    /// 指派上报给员工（仅管理员）
    pub async fn assign(
        &self,
        actor: &AuthContext,
        report_id: Uuid,
        req: AssignRequest,
    ) -> Result<ReportResponse, AppError> {
        let report = self
            .reports
            .find_by_id(report_id)
            .await?
            .ok_or(AppError::NotFound)?;

        policy_service::authorize_report(
            actor.role,
            actor.user_id,
            &ReportFacts::of(&report),
            ReportAction::Assign,
        )?;

        self.validate_assignee(req.assigned_to).await?;

        let updated = self
            .apply_assignment(actor.user_id, &report, req.assigned_to, req.comment.as_deref())
            .await?;

        self.response(updated).await
    }

    /// 指派目标必须是启用中的员工
    pub async fn validate_assignee(&self, assignee: Uuid) -> Result<(), AppError> {
        let user = self
            .users
            .find_by_id(assignee)
            .await?
            .ok_or_else(|| AppError::BadRequest("assignee does not exist".to_string()))?;

        if user.role != Role::Employee {
            return Err(AppError::BadRequest(
                "assignee must have the employee role".to_string(),
            ));
        }
        if !user.is_active {
            return Err(AppError::BadRequest("assignee account is inactive".to_string()));
        }

        Ok(())
    }

    /// 已授权且已验证处理人的指派落库 + 通知
    pub async fn apply_assignment(
        &self,
        actor_id: Uuid,
        report: &Report,
        assignee: Uuid,
        comment: Option<&str>,
    ) -> Result<Report, AppError> {
        let updated = self
            .reports
            .assign(report.id, assignee, comment, actor_id)
            .await?;

        self.notifier.assigned(&updated, assignee).await?;

        Ok(updated)
    }

    /// 提交反馈：仅提交人、仅 resolved、仅一次
    pub async fn submit_feedback(
        &self,
        actor: &AuthContext,
        report_id: Uuid,
        req: FeedbackRequest,
    ) -> Result<ReportResponse, AppError> {
        req.validate()?;

        let report = self
            .reports
            .find_by_id(report_id)
            .await?
            .ok_or(AppError::NotFound)?;

        policy_service::authorize_report(
            actor.role,
            actor.user_id,
            &ReportFacts::of(&report),
            ReportAction::SubmitFeedback,
        )?;

        // 策略检查与写入之间可能有并发提交，IS NULL 条件兜底
        let updated = self
            .reports
            .set_feedback(report_id, req.rating, req.comment.as_deref())
            .await?
            .ok_or_else(|| {
                AppError::Conflict("feedback has already been submitted for this report".to_string())
            })?;

        self.notifier.feedback_received(&updated, req.rating).await?;

        self.response(updated).await
    }

    /// 上报的时间线（按追加顺序）
    pub async fn timeline(
        &self,
        actor: &AuthContext,
        report_id: Uuid,
    ) -> Result<Vec<crate::models::report::TimelineEntry>, AppError> {
        let report = self
            .reports
            .find_by_id(report_id)
            .await?
            .ok_or(AppError::NotFound)?;

        policy_service::authorize_report(
            actor.role,
            actor.user_id,
            &ReportFacts::of(&report),
            ReportAction::View,
        )?;

        self.reports.timeline(report_id).await
    }

    async fn response(&self, report: Report) -> Result<ReportResponse, AppError> {
        let (timeline, images) =
            tokio::try_join!(self.reports.timeline(report.id), self.reports.images(report.id))?;

        Ok(ReportResponse::from_parts(report, timeline, images))
    }
}
