//! 认证服务
//! 注册 / 登录 / 令牌刷新 / 密码重置
//! 注册只允许 user / employee；admin 账户仅能通过管理员路径创建

use crate::{
    auth::{jwt::JwtService, password::PasswordHasher},
    config::AppConfig,
    error::AppError,
    models::user::{
        ConfirmPasswordResetRequest, LoginRequest, LoginResponse, RegisterRequest, Role,
        UserResponse,
    },
    repository::UserRepository,
};
use chrono::{Duration, Utc};
use rand::{distributions::Alphanumeric, Rng};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

pub struct AuthService {
    users: UserRepository,
    jwt: Arc<JwtService>,
    config: Arc<AppConfig>,
}

impl AuthService {
    pub fn new(db: PgPool, jwt: Arc<JwtService>, config: Arc<AppConfig>) -> Self {
        Self {
            users: UserRepository::new(db),
            jwt,
            config,
        }
    }

    /// 注册：角色固定为 user 或 employee
    pub async fn register(&self, req: RegisterRequest) -> Result<LoginResponse, AppError> {
        req.validate()?;

        let role = match req.role.unwrap_or(Role::User) {
            Role::Admin => {
                return Err(AppError::BadRequest(
                    "admin accounts cannot be self-registered".to_string(),
                ))
            }
            role => role,
        };

        if self.users.find_by_email(&req.email).await?.is_some() {
            return Err(AppError::Conflict("email is already registered".to_string()));
        }

        PasswordHasher::validate_password_policy(&req.password, &self.config)?;
        let password_hash = PasswordHasher::new().hash(&req.password)?;

        let user = self
            .users
            .create(&req.name, &req.email, &password_hash, role)
            .await?;

        tracing::info!(user_id = %user.id, role = role.as_str(), "User registered");

        self.issue_tokens(user.into())
    }

    /// 登录：校验凭证、拒绝停用账户、更新最近登录时间
    pub async fn login(&self, req: LoginRequest) -> Result<LoginResponse, AppError> {
        let user = self
            .users
            .find_by_email(&req.email)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !user.is_active {
            return Err(AppError::Forbidden);
        }

        PasswordHasher::new().verify(&req.password, &user.password_hash)?;

        self.users.touch_last_login(user.id).await?;

        tracing::info!(user_id = %user.id, "User logged in");

        self.issue_tokens(user.into())
    }

    /// 用刷新令牌换新令牌对
    pub async fn refresh(&self, refresh_token: &str) -> Result<LoginResponse, AppError> {
        let claims = self.jwt.validate_refresh_token(refresh_token)?;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::Unauthorized)?;

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !user.is_active {
            return Err(AppError::Forbidden);
        }

        self.issue_tokens(user.into())
    }

    /// 当前用户信息
    pub async fn me(&self, user_id: Uuid) -> Result<UserResponse, AppError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::NotFound)?;

        Ok(user.into())
    }

    /// 申请密码重置。邮箱不存在时同样返回成功，不暴露账户存在性；
    /// 令牌的投递（邮件）在本核心之外
    pub async fn request_password_reset(&self, email: &str) -> Result<(), AppError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            tracing::debug!("Password reset requested for unknown email");
            return Ok(());
        };

        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(48)
            .map(char::from)
            .collect();
        let expires =
            Utc::now() + Duration::seconds(self.config.security.reset_token_exp_secs as i64);

        self.users.set_reset_token(user.id, &token, expires).await?;

        tracing::info!(user_id = %user.id, "Password reset token issued");
        Ok(())
    }

    /// 用重置令牌设置新密码
    pub async fn confirm_password_reset(
        &self,
        req: ConfirmPasswordResetRequest,
    ) -> Result<(), AppError> {
        let user = self
            .users
            .find_by_reset_token(&req.token)
            .await?
            .ok_or_else(|| {
                AppError::BadRequest("invalid or expired reset token".to_string())
            })?;

        PasswordHasher::validate_password_policy(&req.new_password, &self.config)?;
        let password_hash = PasswordHasher::new().hash(&req.new_password)?;

        self.users.reset_password(user.id, &password_hash).await?;

        tracing::info!(user_id = %user.id, "Password reset completed");
        Ok(())
    }

    fn issue_tokens(&self, user: UserResponse) -> Result<LoginResponse, AppError> {
        let access_token = self.jwt.issue_access_token(
            &user.id.to_string(),
            &user.email,
            user.role.as_str(),
        )?;
        let refresh_token = self.jwt.issue_refresh_token(
            &user.id.to_string(),
            &user.email,
            user.role.as_str(),
        )?;

        Ok(LoginResponse {
            access_token,
            refresh_token,
            user,
        })
    }
}
