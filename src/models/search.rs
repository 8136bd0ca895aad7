//! 查询构建模型
//! 将一组可选过滤参数规范化为类型化的查询谓词、排序与分页
//! 省略的参数不施加任何约束

use crate::error::AppError;
use crate::models::report::{ReportCategory, ReportPriority, ReportStatus};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// 原始查询参数（与 HTTP query string 一一对应）
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ReportSearchParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// 标题或描述的子串匹配（不区分大小写）
    pub search: Option<String>,
    /// 单值或逗号分隔列表
    pub status: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
    /// 具体员工 id，或哨兵值 "unassigned"
    pub assigned_to: Option<String>,
    pub submitted_by: Option<Uuid>,
    /// 创建时间下界（含），RFC3339 或 YYYY-MM-DD
    pub date_from: Option<String>,
    /// 创建时间上界（含）
    pub date_to: Option<String>,
    /// 地址（城市/街道）子串匹配
    pub location: Option<String>,
    pub has_images: Option<bool>,
    pub has_feedback: Option<bool>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

/// 指派过滤：具体员工 或 未指派哨兵
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssigneeFilter {
    Unassigned,
    Employee(Uuid),
}

/// 规范化后的过滤谓词（空集合 = 无约束）
#[derive(Debug, Default, Clone)]
pub struct ReportFilter {
    pub statuses: Vec<ReportStatus>,
    pub categories: Vec<ReportCategory>,
    pub priorities: Vec<ReportPriority>,
    pub assignee: Option<AssigneeFilter>,
    pub submitted_by: Option<Uuid>,
    pub search: Option<String>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub has_images: Option<bool>,
    pub has_feedback: Option<bool>,
}

/// 可排序字段（白名单，防止任意列注入）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    UpdatedAt,
    Priority,
    Status,
    Title,
}

impl SortField {
    pub fn column(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
            SortField::Priority => "priority",
            SortField::Status => "status",
            SortField::Title => "title",
        }
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created_at" => Ok(SortField::CreatedAt),
            "updated_at" => Ok(SortField::UpdatedAt),
            "priority" => Ok(SortField::Priority),
            "status" => Ok(SortField::Status),
            "title" => Ok(SortField::Title),
            other => Err(format!("unknown sort field: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// 排序说明，默认 created_at 降序
#[derive(Debug, Clone, Copy)]
pub struct SortSpec {
    pub field: SortField,
    pub order: SortOrder,
}

impl Default for SortSpec {
    fn default() -> Self {
        SortSpec {
            field: SortField::CreatedAt,
            order: SortOrder::Desc,
        }
    }
}

/// 分页说明（page 从 1 开始）
#[derive(Debug, Clone, Copy)]
pub struct PageSpec {
    pub page: i64,
    pub limit: i64,
}

impl PageSpec {
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

/// 分页元数据
#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_reports: i64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
    pub limit: i64,
}

/// 由总数与分页说明计算分页元数据（总页数为向上取整）
pub fn paginate(total: i64, page: &PageSpec) -> Pagination {
    let total_pages = if total == 0 {
        0
    } else {
        (total + page.limit - 1) / page.limit
    };

    Pagination {
        current_page: page.page,
        total_pages,
        total_reports: total,
        has_next_page: page.page < total_pages,
        has_prev_page: page.page > 1,
        limit: page.limit,
    }
}

/// 解析逗号分隔的枚举列表，未知取值整体报 BadRequest
fn parse_csv<T>(raw: &str, field: &str) -> Result<Vec<T>, AppError>
where
    T: FromStr<Err = String>,
{
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<T>()
                .map_err(|e| AppError::BadRequest(format!("invalid {}: {}", field, e)))
        })
        .collect()
}

/// 解析日期下界：RFC3339 原样使用，日期按当日 00:00:00 UTC
fn parse_date_lower(raw: &str) -> Result<DateTime<Utc>, AppError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("invalid date_from: {}", raw)))?;
    Ok(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)))
}

/// 解析日期上界（含）：日期按当日末尾对齐
fn parse_date_upper(raw: &str) -> Result<DateTime<Utc>, AppError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("invalid date_to: {}", raw)))?;
    let end_of_day = NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999).unwrap();
    Ok(Utc.from_utc_datetime(&date.and_time(end_of_day)))
}

impl ReportSearchParams {
    /// 规范化为 (过滤谓词, 排序, 分页)
    /// default_limit / max_limit 来自启动时加载的配置
    pub fn canonicalize(
        &self,
        default_limit: i64,
        max_limit: i64,
    ) -> Result<(ReportFilter, SortSpec, PageSpec), AppError> {
        let mut filter = ReportFilter::default();

        if let Some(raw) = &self.status {
            filter.statuses = parse_csv(raw, "status")?;
        }
        if let Some(raw) = &self.category {
            filter.categories = parse_csv(raw, "category")?;
        }
        if let Some(raw) = &self.priority {
            filter.priorities = parse_csv(raw, "priority")?;
        }

        if let Some(raw) = &self.assigned_to {
            filter.assignee = Some(if raw == "unassigned" {
                AssigneeFilter::Unassigned
            } else {
                let id = Uuid::parse_str(raw)
                    .map_err(|_| AppError::BadRequest(format!("invalid assigned_to: {}", raw)))?;
                AssigneeFilter::Employee(id)
            });
        }

        filter.submitted_by = self.submitted_by;
        filter.search = self.search.as_ref().map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        filter.location = self.location.as_ref().map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        filter.has_images = self.has_images;
        filter.has_feedback = self.has_feedback;

        if let Some(raw) = &self.date_from {
            filter.created_from = Some(parse_date_lower(raw)?);
        }
        if let Some(raw) = &self.date_to {
            filter.created_to = Some(parse_date_upper(raw)?);
        }

        let mut sort = SortSpec::default();
        if let Some(raw) = &self.sort_by {
            sort.field = raw
                .parse()
                .map_err(|e: String| AppError::BadRequest(e))?;
        }
        if let Some(raw) = &self.sort_order {
            sort.order = match raw.to_lowercase().as_str() {
                "asc" => SortOrder::Asc,
                "desc" => SortOrder::Desc,
                other => {
                    return Err(AppError::BadRequest(format!(
                        "invalid sort_order: {}",
                        other
                    )))
                }
            };
        }

        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(default_limit).clamp(1, max_limit);

        Ok((filter, sort, PageSpec { page, limit }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_filters_imposes_no_constraint() {
        let params = ReportSearchParams::default();
        let (filter, sort, page) = params.canonicalize(10, 100).unwrap();

        assert!(filter.statuses.is_empty());
        assert!(filter.categories.is_empty());
        assert!(filter.priorities.is_empty());
        assert!(filter.assignee.is_none());
        assert!(filter.search.is_none());
        assert!(filter.created_from.is_none());
        assert_eq!(sort.field, SortField::CreatedAt);
        assert_eq!(sort.order, SortOrder::Desc);
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, 10);
    }

    #[test]
    fn test_comma_list_is_any_of() {
        let params = ReportSearchParams {
            status: Some("submitted,in_review".to_string()),
            category: Some("road_issue".to_string()),
            ..Default::default()
        };
        let (filter, _, _) = params.canonicalize(10, 100).unwrap();

        assert_eq!(
            filter.statuses,
            vec![ReportStatus::Submitted, ReportStatus::InReview]
        );
        assert_eq!(filter.categories, vec![ReportCategory::RoadIssue]);
    }

    #[test]
    fn test_unknown_enum_value_rejected() {
        let params = ReportSearchParams {
            status: Some("submitted,done".to_string()),
            ..Default::default()
        };
        assert!(params.canonicalize(10, 100).is_err());
    }

    #[test]
    fn test_unassigned_sentinel_distinct_from_id() {
        let params = ReportSearchParams {
            assigned_to: Some("unassigned".to_string()),
            ..Default::default()
        };
        let (filter, _, _) = params.canonicalize(10, 100).unwrap();
        assert_eq!(filter.assignee, Some(AssigneeFilter::Unassigned));

        let id = Uuid::new_v4();
        let params = ReportSearchParams {
            assigned_to: Some(id.to_string()),
            ..Default::default()
        };
        let (filter, _, _) = params.canonicalize(10, 100).unwrap();
        assert_eq!(filter.assignee, Some(AssigneeFilter::Employee(id)));

        let params = ReportSearchParams {
            assigned_to: Some("not-a-uuid".to_string()),
            ..Default::default()
        };
        assert!(params.canonicalize(10, 100).is_err());
    }

    #[test]
    fn test_date_bounds_inclusive() {
        let params = ReportSearchParams {
            date_from: Some("2024-03-01".to_string()),
            date_to: Some("2024-03-31".to_string()),
            ..Default::default()
        };
        let (filter, _, _) = params.canonicalize(10, 100).unwrap();

        let from = filter.created_from.unwrap();
        let to = filter.created_to.unwrap();
        assert_eq!(from.to_rfc3339(), "2024-03-01T00:00:00+00:00");
        // 上界对齐到当日末尾，保证整天包含在内
        assert!(to > Utc.with_ymd_and_hms(2024, 3, 31, 23, 59, 58).unwrap());
        assert!(to < Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_limit_clamped_to_max() {
        let params = ReportSearchParams {
            page: Some(0),
            limit: Some(5000),
            ..Default::default()
        };
        let (_, _, page) = params.canonicalize(10, 100).unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, 100);
    }

    #[test]
    fn test_sort_whitelist() {
        let params = ReportSearchParams {
            sort_by: Some("priority".to_string()),
            sort_order: Some("asc".to_string()),
            ..Default::default()
        };
        let (_, sort, _) = params.canonicalize(10, 100).unwrap();
        assert_eq!(sort.field, SortField::Priority);
        assert_eq!(sort.order, SortOrder::Asc);

        let params = ReportSearchParams {
            sort_by: Some("password_hash".to_string()),
            ..Default::default()
        };
        assert!(params.canonicalize(10, 100).is_err());
    }

    #[test]
    fn test_pagination_metadata() {
        let page = PageSpec { page: 2, limit: 10 };
        let p = paginate(25, &page);
        assert_eq!(p.total_pages, 3);
        assert_eq!(p.total_reports, 25);
        assert!(p.has_next_page);
        assert!(p.has_prev_page);

        let first = paginate(25, &PageSpec { page: 1, limit: 10 });
        assert!(!first.has_prev_page);
        assert!(first.has_next_page);

        let empty = paginate(0, &PageSpec { page: 1, limit: 10 });
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next_page);
        assert!(!empty.has_prev_page);
    }

    #[test]
    fn test_page_offset() {
        assert_eq!(PageSpec { page: 1, limit: 10 }.offset(), 0);
        assert_eq!(PageSpec { page: 3, limit: 20 }.offset(), 40);
    }
}
