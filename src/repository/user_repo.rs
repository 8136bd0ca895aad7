//! User repository (数据库访问层)

use crate::{
    error::AppError,
    models::dashboard::KeyCount,
    models::user::{Role, User, UserListFilters},
};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

pub struct UserRepository {
    db: PgPool,
}

impl UserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// 根据邮箱查找用户
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.db)
            .await?;

        Ok(user)
    }

    /// 根据 ID 查找用户
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(user)
    }

    /// 创建用户
    pub async fn create(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .fetch_one(&self.db)
        .await?;

        Ok(user)
    }

    /// 管理员更新用户（角色 / 启用状态 / 名称）
    pub async fn admin_update(
        &self,
        id: Uuid,
        name: Option<&str>,
        role: Option<Role>,
        is_active: Option<bool>,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET
                name = COALESCE($2, name),
                role = COALESCE($3, role),
                is_active = COALESCE($4, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(role)
        .bind(is_active)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    /// 登录成功后更新最近登录时间
    pub async fn touch_last_login(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET last_login = NOW(), updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    /// 写入密码重置令牌
    pub async fn set_reset_token(
        &self,
        id: Uuid,
        token: &str,
        expires: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE users
            SET reset_token = $2, reset_token_expires = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(token)
        .bind(expires)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// 根据未过期的重置令牌查找用户
    pub async fn find_by_reset_token(&self, token: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE reset_token = $1 AND reset_token_expires > NOW()",
        )
        .bind(token)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    /// 设置新密码并清空重置令牌
    pub async fn reset_password(&self, id: Uuid, password_hash: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE users
            SET
                password_hash = $2,
                reset_token = NULL,
                reset_token_expires = NULL,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// 列出用户（角色 / 启用状态 / 名称或邮箱子串）
    pub async fn list(
        &self,
        filters: &UserListFilters,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<User>, i64), AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM users");
        Self::push_filters(&mut qb, filters);
        qb.push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let users = qb.build_query_as::<User>().fetch_all(&self.db).await?;

        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users");
        Self::push_filters(&mut count_qb, filters);
        let total: i64 = count_qb.build_query_scalar().fetch_one(&self.db).await?;

        Ok((users, total))
    }

    fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filters: &UserListFilters) {
        qb.push(" WHERE 1=1");

        if let Some(role) = filters.role {
            qb.push(" AND role = ").push_bind(role);
        }
        if let Some(is_active) = filters.is_active {
            qb.push(" AND is_active = ").push_bind(is_active);
        }
        if let Some(search) = &filters.search {
            let pattern = format!("%{}%", search);
            qb.push(" AND (name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR email ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
    }

    /// 统计用户数量
    pub async fn count(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query("SELECT COUNT(*) FROM users")
            .fetch_one(&self.db)
            .await?
            .get(0);

        Ok(count)
    }

    /// 窗口内登录过且当前启用的用户数
    pub async fn count_active_since(&self, since: DateTime<Utc>) -> Result<i64, AppError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE is_active AND last_login >= $1")
                .bind(since)
                .fetch_one(&self.db)
                .await?;

        Ok(count)
    }

    /// 按角色分组计数，计数降序
    pub async fn counts_by_role(&self) -> Result<Vec<KeyCount>, AppError> {
        let counts = sqlx::query_as::<_, KeyCount>(
            r#"
            SELECT role::text AS key, COUNT(*) AS count
            FROM users
            GROUP BY 1
            ORDER BY count DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(counts)
    }

    /// 所有启用中的管理员（新上报通知的接收方）
    pub async fn find_active_admins(&self) -> Result<Vec<User>, AppError> {
        let admins =
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE role = 'admin' AND is_active")
                .fetch_all(&self.db)
                .await?;

        Ok(admins)
    }
}
