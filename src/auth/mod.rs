//! 认证模块：JWT、密码哈希、认证中间件

pub mod jwt;
pub mod middleware;
pub mod password;

pub use jwt::JwtService;
