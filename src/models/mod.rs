//! 数据模型模块
//! 用户 / 上报 / 通知 领域模型与请求、响应 DTO

pub mod dashboard;
pub mod notification;
pub mod report;
pub mod search;
pub mod user;
