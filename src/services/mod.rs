//! Business logic services layer

pub mod analytics_service;
pub mod auth_service;
pub mod bulk_service;
pub mod notification_service;
pub mod policy_service;
pub mod report_service;
pub mod search_service;
pub mod user_service;

pub use analytics_service::AnalyticsService;
pub use auth_service::AuthService;
pub use bulk_service::BulkService;
pub use notification_service::NotificationService;
pub use report_service::ReportService;
pub use search_service::SearchService;
pub use user_service::UserService;
