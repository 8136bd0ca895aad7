//! Report repository (数据库访问层)
//! 状态与时间线在同一事务内写入，保证二者始终一致

use crate::{
    error::AppError,
    models::dashboard::{CityStats, DailyResolution, KeyCount},
    models::report::{
        Address, ImageInput, Report, ReportCategory, ReportImage, ReportPriority, ReportStatus,
        TimelineEntry,
    },
    models::search::{AssigneeFilter, PageSpec, ReportFilter, SortSpec},
    services::policy_service::VisibilityScope,
};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

pub struct ReportRepository {
    db: PgPool,
}

/// 创建上报的输入
pub struct NewReport<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub category: ReportCategory,
    pub priority: ReportPriority,
    pub longitude: f64,
    pub latitude: f64,
    pub address: Option<&'a Address>,
    pub submitted_by: Uuid,
    pub images: &'a [ImageInput],
}

impl ReportRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// 根据 ID 查找上报
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Report>, AppError> {
        let report = sqlx::query_as::<_, Report>("SELECT * FROM reports WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(report)
    }

    /// 批量查找存在的上报；格式合法但不存在的 id 被静默排除
    pub async fn find_existing(&self, ids: &[Uuid]) -> Result<Vec<Report>, AppError> {
        let reports = sqlx::query_as::<_, Report>("SELECT * FROM reports WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.db)
            .await?;

        Ok(reports)
    }

    /// 创建上报：实体、初始 submitted 时间线条目与图片在同一事务内写入
    pub async fn create(&self, new: NewReport<'_>) -> Result<Report, AppError> {
        let mut tx = self.db.begin().await?;

        let report = sqlx::query_as::<_, Report>(
            r#"
            INSERT INTO reports (
                title, description, category, priority,
                longitude, latitude,
                address_street, address_city, address_state, address_zip,
                submitted_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(new.title)
        .bind(new.description)
        .bind(new.category)
        .bind(new.priority)
        .bind(new.longitude)
        .bind(new.latitude)
        .bind(new.address.and_then(|a| a.street.as_deref()))
        .bind(new.address.and_then(|a| a.city.as_deref()))
        .bind(new.address.and_then(|a| a.state.as_deref()))
        .bind(new.address.and_then(|a| a.zip.as_deref()))
        .bind(new.submitted_by)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO report_timeline (report_id, status, comment, actor_id)
            VALUES ($1, 'submitted', $2, $3)
            "#,
        )
        .bind(report.id)
        .bind("Report submitted")
        .bind(new.submitted_by)
        .execute(&mut *tx)
        .await?;

        for image in new.images {
            sqlx::query(
                "INSERT INTO report_images (report_id, url, caption) VALUES ($1, $2, $3)",
            )
            .bind(report.id)
            .bind(&image.url)
            .bind(&image.caption)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(report)
    }

    /// 状态变更的唯一落库路径：
    /// 时间线追加与状态写入要么一起生效，要么都不生效
    pub async fn append_transition(
        &self,
        report_id: Uuid,
        status: ReportStatus,
        comment: Option<&str>,
        actor_id: Uuid,
    ) -> Result<Report, AppError> {
        let mut tx = self.db.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO report_timeline (report_id, status, comment, actor_id)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(report_id)
        .bind(status)
        .bind(comment)
        .bind(actor_id)
        .execute(&mut *tx)
        .await?;

        let report = sqlx::query_as::<_, Report>(
            "UPDATE reports SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(report_id)
        .bind(status)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(report)
    }

    /// 指派：设置 assigned_to、状态置为 assigned 并追加时间线条目
    pub async fn assign(
        &self,
        report_id: Uuid,
        assignee: Uuid,
        comment: Option<&str>,
        actor_id: Uuid,
    ) -> Result<Report, AppError> {
        let mut tx = self.db.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO report_timeline (report_id, status, comment, actor_id)
            VALUES ($1, 'assigned', $2, $3)
            "#,
        )
        .bind(report_id)
        .bind(comment)
        .bind(actor_id)
        .execute(&mut *tx)
        .await?;

        let report = sqlx::query_as::<_, Report>(
            r#"
            UPDATE reports
            SET assigned_to = $2, status = 'assigned', updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(report_id)
        .bind(assignee)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(report)
    }

    /// 写入反馈；feedback_rating IS NULL 条件保证只写一次（并发下也成立）
    pub async fn set_feedback(
        &self,
        report_id: Uuid,
        rating: i16,
        comment: Option<&str>,
    ) -> Result<Option<Report>, AppError> {
        let report = sqlx::query_as::<_, Report>(
            r#"
            UPDATE reports
            SET feedback_rating = $2, feedback_comment = $3, feedback_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND feedback_rating IS NULL
            RETURNING *
            "#,
        )
        .bind(report_id)
        .bind(rating)
        .bind(comment)
        .fetch_optional(&self.db)
        .await?;

        Ok(report)
    }

    /// 上报的时间线，按追加顺序
    pub async fn timeline(&self, report_id: Uuid) -> Result<Vec<TimelineEntry>, AppError> {
        let entries = sqlx::query_as::<_, TimelineEntry>(
            "SELECT * FROM report_timeline WHERE report_id = $1 ORDER BY id ASC",
        )
        .bind(report_id)
        .fetch_all(&self.db)
        .await?;

        Ok(entries)
    }

    /// 上报的图片
    pub async fn images(&self, report_id: Uuid) -> Result<Vec<ReportImage>, AppError> {
        let images = sqlx::query_as::<_, ReportImage>(
            "SELECT * FROM report_images WHERE report_id = $1 ORDER BY uploaded_at ASC",
        )
        .bind(report_id)
        .fetch_all(&self.db)
        .await?;

        Ok(images)
    }

    /// 把可见范围与规范化过滤条件拼为 SQL 谓词
    /// 可见范围先生效，用户过滤条件在其上取交集
    fn push_predicates(
        qb: &mut QueryBuilder<'_, Postgres>,
        scope: &VisibilityScope,
        filter: &ReportFilter,
    ) {
        qb.push(" WHERE 1=1");

        match scope {
            VisibilityScope::All => {}
            VisibilityScope::Assignee(id) => {
                qb.push(" AND (assigned_to = ")
                    .push_bind(*id)
                    .push(" OR (assigned_to IS NULL AND status IN ('submitted', 'in_review')))");
            }
            VisibilityScope::Owner(id) => {
                qb.push(" AND submitted_by = ").push_bind(*id);
            }
        }

        if !filter.statuses.is_empty() {
            let values: Vec<String> = filter.statuses.iter().map(|s| s.as_str().to_string()).collect();
            qb.push(" AND status::text = ANY(").push_bind(values).push(")");
        }
        if !filter.categories.is_empty() {
            let values: Vec<String> =
                filter.categories.iter().map(|c| c.as_str().to_string()).collect();
            qb.push(" AND category::text = ANY(").push_bind(values).push(")");
        }
        if !filter.priorities.is_empty() {
            let values: Vec<String> =
                filter.priorities.iter().map(|p| p.as_str().to_string()).collect();
            qb.push(" AND priority::text = ANY(").push_bind(values).push(")");
        }

        match filter.assignee {
            Some(AssigneeFilter::Unassigned) => {
                qb.push(" AND assigned_to IS NULL");
            }
            Some(AssigneeFilter::Employee(id)) => {
                qb.push(" AND assigned_to = ").push_bind(id);
            }
            None => {}
        }

        if let Some(submitter) = filter.submitted_by {
            qb.push(" AND submitted_by = ").push_bind(submitter);
        }

        if let Some(search) = &filter.search {
            let pattern = format!("%{}%", search);
            qb.push(" AND (title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR description ILIKE ")
                .push_bind(pattern)
                .push(")");
        }

        if let Some(from) = filter.created_from {
            qb.push(" AND reports.created_at >= ").push_bind(from);
        }
        if let Some(to) = filter.created_to {
            qb.push(" AND reports.created_at <= ").push_bind(to);
        }

        if let Some(location) = &filter.location {
            let pattern = format!("%{}%", location);
            qb.push(" AND (address_city ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR address_street ILIKE ")
                .push_bind(pattern)
                .push(")");
        }

        match filter.has_images {
            Some(true) => {
                qb.push(" AND EXISTS (SELECT 1 FROM report_images i WHERE i.report_id = reports.id)");
            }
            Some(false) => {
                qb.push(
                    " AND NOT EXISTS (SELECT 1 FROM report_images i WHERE i.report_id = reports.id)",
                );
            }
            None => {}
        }

        match filter.has_feedback {
            Some(true) => {
                qb.push(" AND feedback_rating IS NOT NULL");
            }
            Some(false) => {
                qb.push(" AND feedback_rating IS NULL");
            }
            None => {}
        }
    }

    /// 过滤查询：返回当前页与总数
    pub async fn search(
        &self,
        scope: &VisibilityScope,
        filter: &ReportFilter,
        sort: &SortSpec,
        page: &PageSpec,
    ) -> Result<(Vec<Report>, i64), AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM reports");
        Self::push_predicates(&mut qb, scope, filter);
        qb.push(" ORDER BY ")
            .push(sort.field.column())
            .push(" ")
            .push(sort.order.keyword())
            .push(" LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset());

        let reports = qb.build_query_as::<Report>().fetch_all(&self.db).await?;

        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM reports");
        Self::push_predicates(&mut count_qb, scope, filter);
        let total: i64 = count_qb.build_query_scalar().fetch_one(&self.db).await?;

        Ok((reports, total))
    }

    /// 过滤结果集上的分面计数（status / category / priority）
    pub async fn facet_counts(
        &self,
        scope: &VisibilityScope,
        filter: &ReportFilter,
        facet: Facet,
    ) -> Result<Vec<KeyCount>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {}::text AS key, COUNT(*) AS count FROM reports",
            facet.column()
        ));
        Self::push_predicates(&mut qb, scope, filter);
        qb.push(" GROUP BY 1 ORDER BY count DESC");

        let counts = qb.build_query_as::<KeyCount>().fetch_all(&self.db).await?;

        Ok(counts)
    }

    /// 过滤结果集上的平均解决时长（小时）
    /// 解决时长 = 第一条 resolved 时间线条目时间 - 创建时间；
    /// 从未 resolved 的上报不计入
    pub async fn avg_resolution_hours(
        &self,
        scope: &VisibilityScope,
        filter: &ReportFilter,
    ) -> Result<Option<f64>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(
            r#"
            SELECT AVG(EXTRACT(EPOCH FROM (t.first_resolved - reports.created_at)) / 3600.0)::float8
            FROM reports
            JOIN LATERAL (
                SELECT MIN(created_at) AS first_resolved
                FROM report_timeline
                WHERE report_id = reports.id AND status = 'resolved'
            ) t ON TRUE
            "#,
        );
        Self::push_predicates(&mut qb, scope, filter);
        qb.push(" AND t.first_resolved IS NOT NULL");

        let avg: Option<f64> = qb.build_query_scalar().fetch_one(&self.db).await?;

        Ok(avg)
    }

    /// 统计上报数量
    pub async fn count(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reports")
            .fetch_one(&self.db)
            .await?;

        Ok(count)
    }

    /// 窗口内创建的上报数量
    pub async fn count_since(&self, since: DateTime<Utc>) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reports WHERE created_at >= $1")
            .bind(since)
            .fetch_one(&self.db)
            .await?;

        Ok(count)
    }

    /// 当前处于 resolved 状态的上报数量
    pub async fn count_resolved(&self) -> Result<i64, AppError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM reports WHERE status = 'resolved'")
                .fetch_one(&self.db)
                .await?;

        Ok(count)
    }

    /// 窗口内按天的创建数与解决数（解决按第一条 resolved 时间线条目归属）
    pub async fn daily_resolution(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<DailyResolution>, AppError> {
        let series = sqlx::query_as::<_, DailyResolution>(
            r#"
            WITH created AS (
                SELECT date_trunc('day', created_at)::date AS day, COUNT(*) AS created
                FROM reports
                WHERE created_at >= $1
                GROUP BY 1
            ),
            resolved AS (
                SELECT date_trunc('day', first_resolved)::date AS day, COUNT(*) AS resolved
                FROM (
                    SELECT report_id, MIN(created_at) AS first_resolved
                    FROM report_timeline
                    WHERE status = 'resolved'
                    GROUP BY report_id
                ) fr
                WHERE first_resolved >= $1
                GROUP BY 1
            )
            SELECT
                COALESCE(c.day, r.day) AS day,
                COALESCE(c.created, 0) AS created,
                COALESCE(r.resolved, 0) AS resolved
            FROM created c
            FULL OUTER JOIN resolved r ON c.day = r.day
            ORDER BY 1 ASC
            "#,
        )
        .bind(since)
        .fetch_all(&self.db)
        .await?;

        Ok(series)
    }

    /// 上报数前 10 的城市：去重类别集合 + 平均优先级分值
    /// 分值口径 low=1 medium=2 high=3 critical=4
    pub async fn top_cities(&self) -> Result<Vec<CityStats>, AppError> {
        let cities = sqlx::query_as::<_, CityStats>(
            r#"
            SELECT
                address_city AS city,
                COUNT(*) AS count,
                array_agg(DISTINCT category::text) AS categories,
                AVG(
                    CASE priority
                        WHEN 'low' THEN 1
                        WHEN 'medium' THEN 2
                        WHEN 'high' THEN 3
                        WHEN 'critical' THEN 4
                        ELSE 2
                    END
                )::float8 AS avg_priority
            FROM reports
            WHERE address_city IS NOT NULL
            GROUP BY address_city
            ORDER BY count DESC
            LIMIT 10
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(cities)
    }
}

/// 分面维度（白名单列）
#[derive(Debug, Clone, Copy)]
pub enum Facet {
    Status,
    Category,
    Priority,
}

impl Facet {
    fn column(&self) -> &'static str {
        match self {
            Facet::Status => "status",
            Facet::Category => "category",
            Facet::Priority => "priority",
        }
    }
}
