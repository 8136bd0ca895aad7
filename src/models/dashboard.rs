//! 仪表盘与统计模型

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 统计时间窗口
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeframe {
    Days7,
    Days30,
    Days90,
    Year1,
}

impl Timeframe {
    /// 解析查询参数，未知取值回落到给定默认值
    pub fn parse_or(raw: Option<&str>, default: Timeframe) -> Timeframe {
        match raw {
            Some("7d") => Timeframe::Days7,
            Some("30d") => Timeframe::Days30,
            Some("90d") => Timeframe::Days90,
            Some("1y") => Timeframe::Year1,
            _ => default,
        }
    }

    pub fn days(&self) -> i64 {
        match self {
            Timeframe::Days7 => 7,
            Timeframe::Days30 => 30,
            Timeframe::Days90 => 90,
            Timeframe::Year1 => 365,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Days7 => "7d",
            Timeframe::Days30 => "30d",
            Timeframe::Days90 => "90d",
            Timeframe::Year1 => "1y",
        }
    }
}

/// 仪表盘查询参数
#[derive(Debug, Default, Deserialize)]
pub struct DashboardParams {
    pub timeframe: Option<String>,
}

/// 概览指标
#[derive(Debug, Serialize)]
pub struct OverviewMetrics {
    pub timeframe: String,
    pub total_users: i64,
    pub total_reports: i64,
    pub total_notifications: i64,
    pub active_users: i64,
    pub recent_reports: i64,
    /// 历史遗留口径：recent_reports / total_reports * 100，
    /// 字段名与实际含义不符，下游消费方依赖该数值，保持原样
    pub user_growth_rate: f64,
    pub resolution_rate: f64,
    pub avg_resolution_hours: Option<i64>,
}

/// (键, 计数) 对，按计数降序返回
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct KeyCount {
    pub key: String,
    pub count: i64,
}

/// 按天的创建数与解决数
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DailyResolution {
    pub day: NaiveDate,
    pub created: i64,
    pub resolved: i64,
}

/// 城市维度汇总
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CityStats {
    pub city: String,
    pub count: i64,
    pub categories: Vec<String>,
    pub avg_priority: f64,
}

/// 面向过滤结果集的统计（随搜索结果一起返回）
#[derive(Debug, Serialize)]
pub struct SearchStatistics {
    pub total_reports: i64,
    pub status_counts: Vec<KeyCount>,
    pub category_counts: Vec<KeyCount>,
    pub priority_counts: Vec<KeyCount>,
    pub avg_resolution_hours: Option<i64>,
}

/// 统计端点的完整输出
#[derive(Debug, Serialize)]
pub struct StatisticsReport {
    pub timeframe: String,
    pub status_counts: Vec<KeyCount>,
    pub category_counts: Vec<KeyCount>,
    pub priority_counts: Vec<KeyCount>,
    pub role_counts: Vec<KeyCount>,
    pub daily_series: Vec<DailyResolution>,
    pub top_cities: Vec<CityStats>,
    pub avg_resolution_hours: Option<i64>,
}
