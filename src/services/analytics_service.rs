//! 聚合分析服务
//! 只读快照计算：概览指标、分组计数、按天序列、地理汇总

use crate::{
    error::AppError,
    models::dashboard::{OverviewMetrics, StatisticsReport, Timeframe},
    models::search::ReportFilter,
    repository::{report_repo::Facet, NotificationRepository, ReportRepository, UserRepository},
    services::policy_service::VisibilityScope,
};
use chrono::{Duration, Utc};
use sqlx::PgPool;

pub struct AnalyticsService {
    users: UserRepository,
    reports: ReportRepository,
    notifications: NotificationRepository,
    default_timeframe: Timeframe,
}

/// 百分比，两位小数
fn percentage(part: i64, total: i64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round2(part as f64 / total as f64 * 100.0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl AnalyticsService {
    pub fn new(db: PgPool, default_timeframe: Timeframe) -> Self {
        Self {
            users: UserRepository::new(db.clone()),
            reports: ReportRepository::new(db.clone()),
            notifications: NotificationRepository::new(db),
            default_timeframe,
        }
    }

    pub fn resolve_timeframe(&self, raw: Option<&str>) -> Timeframe {
        Timeframe::parse_or(raw, self.default_timeframe)
    }

    /// 概览指标；各项计数互相独立，并发发起后合并
    pub async fn overview(&self, timeframe: Timeframe) -> Result<OverviewMetrics, AppError> {
        let since = Utc::now() - Duration::days(timeframe.days());
        let scope = VisibilityScope::All;
        let no_filter = ReportFilter::default();

        let (
            total_users,
            total_reports,
            total_notifications,
            active_users,
            recent_reports,
            resolved_reports,
            avg_hours,
        ) = tokio::join!(
            self.users.count(),
            self.reports.count(),
            self.notifications.count(),
            self.users.count_active_since(since),
            self.reports.count_since(since),
            self.reports.count_resolved(),
            self.reports.avg_resolution_hours(&scope, &no_filter),
        );

        let total_reports = total_reports?;
        let recent_reports = recent_reports?;

        Ok(OverviewMetrics {
            timeframe: timeframe.as_str().to_string(),
            total_users: total_users?,
            total_reports,
            total_notifications: total_notifications?,
            active_users: active_users?,
            recent_reports,
            // 遗留口径：分子分母都是上报数，字段名有误导性，下游依赖数值本身
            user_growth_rate: percentage(recent_reports, total_reports),
            resolution_rate: percentage(resolved_reports?, total_reports),
            avg_resolution_hours: avg_hours?.map(|h| h.round() as i64),
        })
    }

    /// 统计报表：分组计数、按天创建/解决序列、城市 Top10
    pub async fn statistics(&self, timeframe: Timeframe) -> Result<StatisticsReport, AppError> {
        let since = Utc::now() - Duration::days(timeframe.days());
        let scope = VisibilityScope::All;
        let no_filter = ReportFilter::default();

        let (status_counts, category_counts, priority_counts, role_counts, daily, cities, avg_hours) = tokio::join!(
            self.reports.facet_counts(&scope, &no_filter, Facet::Status),
            self.reports.facet_counts(&scope, &no_filter, Facet::Category),
            self.reports.facet_counts(&scope, &no_filter, Facet::Priority),
            self.users.counts_by_role(),
            self.reports.daily_resolution(since),
            self.reports.top_cities(),
            self.reports.avg_resolution_hours(&scope, &no_filter),
        );

        Ok(StatisticsReport {
            timeframe: timeframe.as_str().to_string(),
            status_counts: status_counts?,
            category_counts: category_counts?,
            priority_counts: priority_counts?,
            role_counts: role_counts?,
            daily_series: daily?,
            top_cities: cities?,
            avg_resolution_hours: avg_hours?.map(|h| h.round() as i64),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_two_decimal_rounding() {
        assert_eq!(percentage(1, 3), 33.33);
        assert_eq!(percentage(2, 3), 66.67);
        assert_eq!(percentage(1, 1), 100.0);
        assert_eq!(percentage(0, 5), 0.0);
    }

    #[test]
    fn test_percentage_zero_total() {
        // 空集合不产生 NaN
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(5, 0), 0.0);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(12.345), 12.35);
        assert_eq!(round2(12.344), 12.34);
    }
}
