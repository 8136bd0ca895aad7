//! Report domain models
//! 上报实体、时间线、图片与各操作的请求/响应 DTO

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// 上报类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "report_category", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReportCategory {
    RoadIssue,
    WaterIssue,
    ElectricityIssue,
    WasteManagement,
    PublicSafety,
    Other,
}

impl ReportCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportCategory::RoadIssue => "road_issue",
            ReportCategory::WaterIssue => "water_issue",
            ReportCategory::ElectricityIssue => "electricity_issue",
            ReportCategory::WasteManagement => "waste_management",
            ReportCategory::PublicSafety => "public_safety",
            ReportCategory::Other => "other",
        }
    }
}

impl std::str::FromStr for ReportCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "road_issue" => Ok(ReportCategory::RoadIssue),
            "water_issue" => Ok(ReportCategory::WaterIssue),
            "electricity_issue" => Ok(ReportCategory::ElectricityIssue),
            "waste_management" => Ok(ReportCategory::WasteManagement),
            "public_safety" => Ok(ReportCategory::PublicSafety),
            "other" => Ok(ReportCategory::Other),
            other => Err(format!("unknown category: {}", other)),
        }
    }
}

/// 上报优先级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "report_priority", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReportPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl ReportPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportPriority::Low => "low",
            ReportPriority::Medium => "medium",
            ReportPriority::High => "high",
            ReportPriority::Critical => "critical",
        }
    }

    /// 地理汇总使用的数值分值（low=1 .. critical=4）
    pub fn score(&self) -> i32 {
        match self {
            ReportPriority::Low => 1,
            ReportPriority::Medium => 2,
            ReportPriority::High => 3,
            ReportPriority::Critical => 4,
        }
    }
}

impl std::str::FromStr for ReportPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(ReportPriority::Low),
            "medium" => Ok(ReportPriority::Medium),
            "high" => Ok(ReportPriority::High),
            "critical" => Ok(ReportPriority::Critical),
            other => Err(format!("unknown priority: {}", other)),
        }
    }
}

/// 上报状态
/// 状态机本身不限制状态间的跳转，跳转目标仅受角色策略约束
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "report_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Submitted,
    InReview,
    Assigned,
    InProgress,
    Resolved,
    Closed,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Submitted => "submitted",
            ReportStatus::InReview => "in_review",
            ReportStatus::Assigned => "assigned",
            ReportStatus::InProgress => "in_progress",
            ReportStatus::Resolved => "resolved",
            ReportStatus::Closed => "closed",
        }
    }
}

impl std::str::FromStr for ReportStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "submitted" => Ok(ReportStatus::Submitted),
            "in_review" => Ok(ReportStatus::InReview),
            "assigned" => Ok(ReportStatus::Assigned),
            "in_progress" => Ok(ReportStatus::InProgress),
            "resolved" => Ok(ReportStatus::Resolved),
            "closed" => Ok(ReportStatus::Closed),
            other => Err(format!("unknown status: {}", other)),
        }
    }
}

/// Report
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Report {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: ReportCategory,
    pub priority: ReportPriority,
    pub status: ReportStatus,
    pub longitude: f64,
    pub latitude: f64,
    pub address_street: Option<String>,
    pub address_city: Option<String>,
    pub address_state: Option<String>,
    pub address_zip: Option<String>,
    pub submitted_by: Uuid,
    pub assigned_to: Option<Uuid>,
    pub feedback_rating: Option<i16>,
    pub feedback_comment: Option<String>,
    pub feedback_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Report {
    pub fn has_feedback(&self) -> bool {
        self.feedback_rating.is_some()
    }
}

/// 时间线条目（仅追加）
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TimelineEntry {
    pub id: i64,
    pub report_id: Uuid,
    pub status: ReportStatus,
    pub comment: Option<String>,
    pub actor_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// 上报图片（URL 为不透明字符串，上传本身由媒体服务处理）
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ReportImage {
    pub id: Uuid,
    pub report_id: Uuid,
    pub url: String,
    pub caption: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

/// 结构化地址
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
}

/// 地理位置输入：[经度, 纬度] + 可选地址
#[derive(Debug, Clone, Deserialize)]
pub struct LocationInput {
    pub coordinates: Vec<f64>,
    pub address: Option<Address>,
}

impl LocationInput {
    /// 校验坐标：必须恰好两个元素，经度 [-180,180]，纬度 [-90,90]
    pub fn validated(&self) -> Result<(f64, f64), String> {
        if self.coordinates.len() != 2 {
            return Err("coordinates must be a [longitude, latitude] pair".to_string());
        }
        let (lon, lat) = (self.coordinates[0], self.coordinates[1]);
        if !(-180.0..=180.0).contains(&lon) {
            return Err("longitude must be between -180 and 180".to_string());
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err("latitude must be between -90 and 90".to_string());
        }
        Ok((lon, lat))
    }
}

/// 图片输入
#[derive(Debug, Clone, Deserialize)]
pub struct ImageInput {
    pub url: String,
    pub caption: Option<String>,
}

/// 创建上报请求
#[derive(Debug, Deserialize, Validate)]
pub struct CreateReportRequest {
    #[validate(length(min = 1, max = 200, message = "title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "description is required"))]
    pub description: String,
    pub category: ReportCategory,
    pub priority: Option<ReportPriority>,
    pub location: LocationInput,
    pub images: Option<Vec<ImageInput>>,
}

/// 状态变更请求
/// status 以字符串接收，非法取值由服务层报 BadRequest 而非反序列化失败
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
    pub comment: Option<String>,
}

/// 指派请求
#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub assigned_to: Uuid,
    pub comment: Option<String>,
}

/// 反馈请求（仅提交人、仅 resolved 状态、仅一次）
#[derive(Debug, Deserialize, Validate)]
pub struct FeedbackRequest {
    #[validate(range(min = 1, max = 5, message = "rating must be between 1 and 5"))]
    pub rating: i16,
    pub comment: Option<String>,
}

/// 批量状态更新请求
/// id 以字符串接收：任一格式非法则整批拒绝
#[derive(Debug, Deserialize)]
pub struct BulkStatusRequest {
    pub report_ids: Vec<String>,
    pub status: String,
    pub comment: Option<String>,
}

/// 批量指派请求
#[derive(Debug, Deserialize)]
pub struct BulkAssignRequest {
    pub report_ids: Vec<String>,
    pub assigned_to: Uuid,
}

/// 批量操作结果
#[derive(Debug, Serialize)]
pub struct BulkOperationResult {
    pub updated_count: usize,
    pub report_ids: Vec<Uuid>,
}

/// 对外的上报视图：实体 + 时间线 + 图片
#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: ReportCategory,
    pub priority: ReportPriority,
    pub status: ReportStatus,
    pub location: LocationResponse,
    pub submitted_by: Uuid,
    pub assigned_to: Option<Uuid>,
    pub feedback: Option<FeedbackResponse>,
    pub timeline: Vec<TimelineEntry>,
    pub images: Vec<ReportImage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct LocationResponse {
    pub coordinates: [f64; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
}

#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    pub rating: i16,
    pub comment: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

impl ReportResponse {
    pub fn from_parts(report: Report, timeline: Vec<TimelineEntry>, images: Vec<ReportImage>) -> Self {
        let address = if report.address_street.is_some()
            || report.address_city.is_some()
            || report.address_state.is_some()
            || report.address_zip.is_some()
        {
            Some(Address {
                street: report.address_street.clone(),
                city: report.address_city.clone(),
                state: report.address_state.clone(),
                zip: report.address_zip.clone(),
            })
        } else {
            None
        };

        let feedback = report.feedback_rating.map(|rating| FeedbackResponse {
            rating,
            comment: report.feedback_comment.clone(),
            submitted_at: report.feedback_at.unwrap_or(report.updated_at),
        });

        ReportResponse {
            id: report.id,
            title: report.title,
            description: report.description,
            category: report.category,
            priority: report.priority,
            status: report.status,
            location: LocationResponse {
                coordinates: [report.longitude, report.latitude],
                address,
            },
            submitted_by: report.submitted_by,
            assigned_to: report.assigned_to,
            feedback,
            timeline,
            images,
            created_at: report.created_at,
            updated_at: report.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            ReportStatus::Submitted,
            ReportStatus::InReview,
            ReportStatus::Assigned,
            ReportStatus::InProgress,
            ReportStatus::Resolved,
            ReportStatus::Closed,
        ] {
            let parsed: ReportStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert!("done".parse::<ReportStatus>().is_err());
    }

    #[test]
    fn test_priority_score() {
        assert_eq!(ReportPriority::Low.score(), 1);
        assert_eq!(ReportPriority::Medium.score(), 2);
        assert_eq!(ReportPriority::High.score(), 3);
        assert_eq!(ReportPriority::Critical.score(), 4);
    }

    #[test]
    fn test_coordinates_validation() {
        let ok = LocationInput {
            coordinates: vec![-74.0, 40.7],
            address: None,
        };
        assert_eq!(ok.validated().unwrap(), (-74.0, 40.7));

        let too_short = LocationInput {
            coordinates: vec![-74.0],
            address: None,
        };
        assert!(too_short.validated().is_err());

        let bad_lat = LocationInput {
            coordinates: vec![0.0, 91.0],
            address: None,
        };
        assert!(bad_lat.validated().is_err());

        let bad_lon = LocationInput {
            coordinates: vec![181.0, 0.0],
            address: None,
        };
        assert!(bad_lon.validated().is_err());
    }

    #[test]
    fn test_feedback_rating_range() {
        use validator::Validate;

        let out_of_range = FeedbackRequest {
            rating: 6,
            comment: None,
        };
        assert!(out_of_range.validate().is_err());

        let ok = FeedbackRequest {
            rating: 5,
            comment: Some("quick fix".to_string()),
        };
        assert!(ok.validate().is_ok());
    }
}
