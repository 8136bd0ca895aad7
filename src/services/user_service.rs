//! 用户管理服务（管理员）
//! 自我保护规则（不能改自己的角色 / 停用自己）由策略引擎判定

use crate::{
    auth::{middleware::AuthContext, password::PasswordHasher},
    config::AppConfig,
    error::AppError,
    models::user::{
        AdminUpdateUserRequest, CreateUserRequest, Role, UserListFilters, UserResponse,
    },
    repository::UserRepository,
    services::policy_service,
};
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// 用户列表页
#[derive(Debug, Serialize)]
pub struct UserPage {
    pub users: Vec<UserResponse>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

pub struct UserService {
    users: UserRepository,
    config: Arc<AppConfig>,
}

impl UserService {
    pub fn new(db: PgPool, config: Arc<AppConfig>) -> Self {
        Self {
            users: UserRepository::new(db),
            config,
        }
    }

    fn require_admin(actor: &AuthContext) -> Result<(), AppError> {
        if actor.role != Role::Admin {
            return Err(AppError::Forbidden);
        }
        Ok(())
    }

    /// 列出用户（分页 + 角色/启用状态/名称邮箱过滤）
    pub async fn list(
        &self,
        actor: &AuthContext,
        filters: UserListFilters,
    ) -> Result<UserPage, AppError> {
        Self::require_admin(actor)?;

        let page = filters.page.unwrap_or(1).max(1);
        let limit = filters
            .limit
            .unwrap_or(self.config.app.default_page_size)
            .clamp(1, self.config.app.max_page_size);

        let (users, total) = self.users.list(&filters, limit, (page - 1) * limit).await?;

        Ok(UserPage {
            users: users.into_iter().map(|u| u.into()).collect(),
            total,
            page,
            limit,
        })
    }

    /// 创建用户（可信路径：允许任意角色，包括 admin）
    pub async fn create(
        &self,
        actor: &AuthContext,
        req: CreateUserRequest,
    ) -> Result<UserResponse, AppError> {
        Self::require_admin(actor)?;
        req.validate()?;

        if self.users.find_by_email(&req.email).await?.is_some() {
            return Err(AppError::Conflict("email is already registered".to_string()));
        }

        PasswordHasher::validate_password_policy(&req.password, &self.config)?;
        let password_hash = PasswordHasher::new().hash(&req.password)?;

        let user = self
            .users
            .create(&req.name, &req.email, &password_hash, req.role)
            .await?;

        tracing::info!(
            user_id = %user.id,
            role = user.role.as_str(),
            actor = %actor.user_id,
            "User created by admin"
        );

        Ok(user.into())
    }

    /// 用户详情
    pub async fn get(&self, actor: &AuthContext, id: Uuid) -> Result<UserResponse, AppError> {
        Self::require_admin(actor)?;

        let user = self.users.find_by_id(id).await?.ok_or(AppError::NotFound)?;

        Ok(user.into())
    }

    /// 更新用户（名称 / 角色 / 启用状态）
    pub async fn update(
        &self,
        actor: &AuthContext,
        id: Uuid,
        req: AdminUpdateUserRequest,
    ) -> Result<UserResponse, AppError> {
        policy_service::authorize_user_update(
            actor.role,
            actor.user_id,
            id,
            req.role.is_some(),
            req.is_active == Some(false),
        )?;

        let user = self
            .users
            .admin_update(id, req.name.as_deref(), req.role, req.is_active)
            .await?
            .ok_or(AppError::NotFound)?;

        tracing::info!(user_id = %id, actor = %actor.user_id, "User updated by admin");

        Ok(user.into())
    }
}
