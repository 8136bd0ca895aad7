//! Database repository layer

pub mod notification_repo;
pub mod report_repo;
pub mod user_repo;

pub use notification_repo::NotificationRepository;
pub use report_repo::ReportRepository;
pub use user_repo::UserRepository;
