//! 批量操作协调器
//! 校验整批拒绝：空列表或任一格式非法的 id 在任何读取/写入之前使整批失败；
//! 格式合法但不存在的 id 被静默排除，命中集合为空则整体 NotFound；
//! 对每个命中的上报独立应用状态变更，单个失败不回滚其他

use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    models::report::{BulkAssignRequest, BulkOperationResult, BulkStatusRequest, ReportStatus},
    repository::ReportRepository,
    services::{policy_service, ReportService},
};
use futures::future::join_all;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

pub struct BulkService {
    reports: ReportRepository,
    report_service: Arc<ReportService>,
    max_batch: usize,
}

/// 解析 id 列表；空列表或任一非法 id 使整批在任何读取之前被拒绝
pub fn parse_report_ids(raw: &[String], max_batch: usize) -> Result<Vec<Uuid>, AppError> {
    if raw.is_empty() {
        return Err(AppError::BadRequest(
            "report_ids must not be empty".to_string(),
        ));
    }
    if raw.len() > max_batch {
        return Err(AppError::BadRequest(format!(
            "at most {} reports per bulk operation",
            max_batch
        )));
    }

    raw.iter()
        .map(|s| {
            Uuid::parse_str(s)
                .map_err(|_| AppError::BadRequest(format!("invalid report id: {}", s)))
        })
        .collect()
}

impl BulkService {
    pub fn new(db: PgPool, report_service: Arc<ReportService>, max_batch: usize) -> Self {
        Self {
            reports: ReportRepository::new(db),
            report_service,
            max_batch,
        }
    }

    /// 批量状态更新
    pub async fn bulk_status(
        &self,
        actor: &AuthContext,
        req: BulkStatusRequest,
    ) -> Result<BulkOperationResult, AppError> {
        policy_service::authorize_bulk(actor.role)?;

        let target: ReportStatus = req
            .status
            .parse()
            .map_err(|e: String| AppError::BadRequest(e))?;
        let ids = parse_report_ids(&req.report_ids, self.max_batch)?;

        let found = self.reports.find_existing(&ids).await?;
        if found.is_empty() {
            return Err(AppError::NotFound);
        }

        // 每个上报独立变更（扇出），单个失败不影响其他
        let results = join_all(found.iter().map(|report| {
            let comment = req.comment.as_deref();
            async move {
                self.report_service
                    .apply_transition(actor.user_id, report, target, comment)
                    .await
                    .map(|updated| updated.id)
            }
        }))
        .await;

        Ok(Self::collect(results))
    }

    /// 批量指派；处理人校验在任何上报被修改之前整批完成
    pub async fn bulk_assign(
        &self,
        actor: &AuthContext,
        req: BulkAssignRequest,
    ) -> Result<BulkOperationResult, AppError> {
        policy_service::authorize_bulk(actor.role)?;

        let ids = parse_report_ids(&req.report_ids, self.max_batch)?;
        self.report_service.validate_assignee(req.assigned_to).await?;

        let found = self.reports.find_existing(&ids).await?;
        if found.is_empty() {
            return Err(AppError::NotFound);
        }

        let results = join_all(found.iter().map(|report| async move {
            self.report_service
                .apply_assignment(actor.user_id, report, req.assigned_to, None)
                .await
                .map(|updated| updated.id)
        }))
        .await;

        Ok(Self::collect(results))
    }

    /// 批量关闭（软删除口径：上报不做物理删除）
    pub async fn bulk_close(
        &self,
        actor: &AuthContext,
        report_ids: Vec<String>,
        comment: Option<String>,
    ) -> Result<BulkOperationResult, AppError> {
        self.bulk_status(
            actor,
            BulkStatusRequest {
                report_ids,
                status: ReportStatus::Closed.as_str().to_string(),
                comment,
            },
        )
        .await
    }

    fn collect(results: Vec<Result<Uuid, AppError>>) -> BulkOperationResult {
        let mut report_ids = Vec::new();
        for result in results {
            match result {
                Ok(id) => report_ids.push(id),
                Err(e) => {
                    tracing::warn!(error = %e, "Bulk operation item failed");
                }
            }
        }

        BulkOperationResult {
            updated_count: report_ids.len(),
            report_ids,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_id_list_rejected() {
        let result = parse_report_ids(&[], 100);
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_single_malformed_id_rejects_whole_batch() {
        let ids = vec![
            Uuid::new_v4().to_string(),
            "not-a-uuid".to_string(),
            Uuid::new_v4().to_string(),
        ];
        let result = parse_report_ids(&ids, 100);
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_valid_ids_parsed_in_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let parsed = parse_report_ids(&[a.to_string(), b.to_string()], 100).unwrap();
        assert_eq!(parsed, vec![a, b]);
    }

    #[test]
    fn test_batch_size_cap() {
        let ids: Vec<String> = (0..3).map(|_| Uuid::new_v4().to_string()).collect();
        assert!(parse_report_ids(&ids, 2).is_err());
        assert!(parse_report_ids(&ids, 3).is_ok());
    }
}
