//! 高级搜索服务
//! 可见范围先生效，调用方过滤条件在其上取交集；
//! 结果页、分页元数据与面向该结果集的分面统计一次返回

use crate::{
    auth::middleware::AuthContext,
    config::AppSettings,
    error::AppError,
    models::dashboard::SearchStatistics,
    models::report::Report,
    models::search::{paginate, Pagination, ReportSearchParams},
    repository::{report_repo::Facet, ReportRepository},
    services::policy_service,
};
use serde::Serialize;
use sqlx::PgPool;

/// 搜索响应：结果页 + 分页 + 统计 + 过滤条件回显
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub reports: Vec<Report>,
    pub pagination: Pagination,
    pub statistics: SearchStatistics,
    pub filters: ReportSearchParams,
}

pub struct SearchService {
    reports: ReportRepository,
    settings: AppSettings,
}

impl SearchService {
    pub fn new(db: PgPool, settings: AppSettings) -> Self {
        Self {
            reports: ReportRepository::new(db),
            settings,
        }
    }

    pub async fn search(
        &self,
        actor: &AuthContext,
        params: ReportSearchParams,
    ) -> Result<SearchResponse, AppError> {
        let (filter, sort, page) = params.canonicalize(
            self.settings.default_page_size,
            self.settings.max_page_size,
        )?;

        let scope = policy_service::visibility_scope(actor.role, actor.user_id);

        // 结果页与各分面统计互相独立，并发发起
        let (page_result, status_counts, category_counts, priority_counts, avg_hours) = tokio::join!(
            self.reports.search(&scope, &filter, &sort, &page),
            self.reports.facet_counts(&scope, &filter, Facet::Status),
            self.reports.facet_counts(&scope, &filter, Facet::Category),
            self.reports.facet_counts(&scope, &filter, Facet::Priority),
            self.reports.avg_resolution_hours(&scope, &filter),
        );

        let (reports, total) = page_result?;
        let statistics = SearchStatistics {
            total_reports: total,
            status_counts: status_counts?,
            category_counts: category_counts?,
            priority_counts: priority_counts?,
            // 聚合层面取整到小时
            avg_resolution_hours: avg_hours?.map(|h| h.round() as i64),
        };

        Ok(SearchResponse {
            reports,
            pagination: paginate(total, &page),
            statistics,
            filters: params,
        })
    }
}
