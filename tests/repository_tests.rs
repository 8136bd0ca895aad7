//! 仓库层集成测试
//!
//! 需要 PostgreSQL；设置 TEST_DATABASE_URL 后用 `cargo test -- --ignored` 运行

use report_system::models::report::{ReportCategory, ReportPriority, ReportStatus};
use report_system::models::search::ReportFilter;
use report_system::models::user::Role;
use report_system::repository::{report_repo::NewReport, ReportRepository};
use report_system::services::policy_service::VisibilityScope;

mod common;
use common::{create_test_config, create_test_user, setup_test_db};

async fn create_report(
    repo: &ReportRepository,
    submitter: uuid::Uuid,
) -> report_system::models::report::Report {
    repo.create(NewReport {
        title: "Pothole on Main St",
        description: "Deep pothole near the crosswalk",
        category: ReportCategory::RoadIssue,
        priority: ReportPriority::High,
        longitude: -122.4194,
        latitude: 37.7749,
        address: None,
        submitted_by: submitter,
        images: &[],
    })
    .await
    .expect("Failed to create report")
}

#[tokio::test]
#[ignore] // 需要数据库
async fn test_create_writes_initial_timeline_entry() {
    let config = create_test_config();
    let pool = setup_test_db(&config).await;
    let submitter = create_test_user(&pool, "citizen@example.com", Role::User).await;

    let repo = ReportRepository::new(pool);
    let report = create_report(&repo, submitter).await;

    assert_eq!(report.status, ReportStatus::Submitted);

    let timeline = repo.timeline(report.id).await.unwrap();
    assert_eq!(timeline.len(), 1);
    assert_eq!(timeline[0].status, ReportStatus::Submitted);
    assert_eq!(timeline[0].actor_id, submitter);
}

#[tokio::test]
#[ignore] // 需要数据库
async fn test_status_always_matches_newest_timeline_entry() {
    let config = create_test_config();
    let pool = setup_test_db(&config).await;
    let submitter = create_test_user(&pool, "citizen2@example.com", Role::User).await;
    let admin = create_test_user(&pool, "admin@example.com", Role::Admin).await;

    let repo = ReportRepository::new(pool);
    let report = create_report(&repo, submitter).await;

    let updated = repo
        .append_transition(report.id, ReportStatus::InReview, Some("Triaged"), admin)
        .await
        .unwrap();
    assert_eq!(updated.status, ReportStatus::InReview);

    let updated = repo
        .append_transition(report.id, ReportStatus::Resolved, None, admin)
        .await
        .unwrap();
    assert_eq!(updated.status, ReportStatus::Resolved);

    let timeline = repo.timeline(report.id).await.unwrap();
    assert_eq!(timeline.len(), 3);
    assert_eq!(timeline.last().unwrap().status, updated.status);
    // 追加顺序即时间顺序
    assert!(timeline.windows(2).all(|w| w[0].id < w[1].id));
}

#[tokio::test]
#[ignore] // 需要数据库
async fn test_feedback_written_at_most_once() {
    let config = create_test_config();
    let pool = setup_test_db(&config).await;
    let submitter = create_test_user(&pool, "citizen3@example.com", Role::User).await;

    let repo = ReportRepository::new(pool);
    let report = create_report(&repo, submitter).await;

    let first = repo.set_feedback(report.id, 4, Some("Fixed quickly")).await.unwrap();
    assert!(first.is_some());
    assert_eq!(first.unwrap().feedback_rating, Some(4));

    // 第二次写入不命中
    let second = repo.set_feedback(report.id, 1, None).await.unwrap();
    assert!(second.is_none());
}

#[tokio::test]
#[ignore] // 需要数据库
async fn test_resolution_hours_use_first_resolved_entry() {
    let config = create_test_config();
    let pool = setup_test_db(&config).await;
    let admin = create_test_user(&pool, "admin-res@example.com", Role::Admin).await;
    let repo = ReportRepository::new(pool.clone());

    // 第一份上报：48 小时前创建，现在解决一次
    let simple_submitter = create_test_user(&pool, "citizen-res1@example.com", Role::User).await;
    let simple = create_report(&repo, simple_submitter).await;
    sqlx::query("UPDATE reports SET created_at = NOW() - INTERVAL '48 hours' WHERE id = $1")
        .bind(simple.id)
        .execute(&pool)
        .await
        .unwrap();
    repo.append_transition(simple.id, ReportStatus::Resolved, None, admin)
        .await
        .unwrap();

    let filter = ReportFilter {
        submitted_by: Some(simple_submitter),
        ..ReportFilter::default()
    };
    let hours = repo
        .avg_resolution_hours(&VisibilityScope::All, &filter)
        .await
        .unwrap()
        .unwrap();
    assert!((hours - 48.0).abs() < 0.05, "expected ~48h, got {hours}");

    // 第二份上报：解决了两次（中间被重新打开），之后关闭。
    // 解决时长取第一次 resolved 的时间，而不是最后一次。
    let reopened_submitter = create_test_user(&pool, "citizen-res2@example.com", Role::User).await;
    let reopened = create_report(&repo, reopened_submitter).await;
    sqlx::query("UPDATE reports SET created_at = NOW() - INTERVAL '48 hours' WHERE id = $1")
        .bind(reopened.id)
        .execute(&pool)
        .await
        .unwrap();
    repo.append_transition(reopened.id, ReportStatus::Resolved, None, admin)
        .await
        .unwrap();
    sqlx::query(
        "UPDATE report_timeline SET created_at = NOW() - INTERVAL '24 hours' \
         WHERE report_id = $1 AND status = 'resolved'",
    )
    .bind(reopened.id)
    .execute(&pool)
    .await
    .unwrap();
    repo.append_transition(reopened.id, ReportStatus::InProgress, Some("Reopened"), admin)
        .await
        .unwrap();
    repo.append_transition(reopened.id, ReportStatus::Resolved, None, admin)
        .await
        .unwrap();
    repo.append_transition(reopened.id, ReportStatus::Closed, None, admin)
        .await
        .unwrap();

    let filter = ReportFilter {
        submitted_by: Some(reopened_submitter),
        ..ReportFilter::default()
    };
    let hours = repo
        .avg_resolution_hours(&VisibilityScope::All, &filter)
        .await
        .unwrap()
        .unwrap();
    assert!((hours - 24.0).abs() < 0.05, "expected ~24h, got {hours}");
}

#[tokio::test]
#[ignore] // 需要数据库
async fn test_find_existing_drops_unknown_ids() {
    let config = create_test_config();
    let pool = setup_test_db(&config).await;
    let submitter = create_test_user(&pool, "citizen4@example.com", Role::User).await;

    let repo = ReportRepository::new(pool);
    let report = create_report(&repo, submitter).await;

    let found = repo
        .find_existing(&[report.id, uuid::Uuid::new_v4()])
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, report.id);
}
