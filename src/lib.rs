//! 市政问题上报系统
//! 上报生命周期、授权策略、搜索与统计、批量操作、通知

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;
pub mod telemetry;
