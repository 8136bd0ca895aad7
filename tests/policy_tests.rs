//! 授权策略端到端场景测试
//!
//! 沿一条上报的完整生命周期验证三种角色的权限边界

use report_system::error::AppError;
use report_system::models::report::ReportStatus;
use report_system::models::user::Role;
use report_system::services::policy_service::{
    authorize_bulk, authorize_report, visibility_scope, ReportAction, ReportFacts, VisibilityScope,
};
use uuid::Uuid;

struct Actors {
    citizen: Uuid,
    employee: Uuid,
    other_employee: Uuid,
    admin: Uuid,
}

fn actors() -> Actors {
    Actors {
        citizen: Uuid::new_v4(),
        employee: Uuid::new_v4(),
        other_employee: Uuid::new_v4(),
        admin: Uuid::new_v4(),
    }
}

fn facts(
    submitted_by: Uuid,
    assigned_to: Option<Uuid>,
    status: ReportStatus,
    has_feedback: bool,
) -> ReportFacts {
    ReportFacts {
        submitted_by,
        assigned_to,
        status,
        has_feedback,
    }
}

#[test]
fn test_full_lifecycle_permission_boundaries() {
    let a = actors();

    // 刚提交：未指派
    let submitted = facts(a.citizen, None, ReportStatus::Submitted, false);

    // 提交人可以查看，无法指派或推进状态
    assert!(authorize_report(Role::User, a.citizen, &submitted, ReportAction::View).is_ok());
    assert!(authorize_report(Role::User, a.citizen, &submitted, ReportAction::Assign).is_err());
    assert!(authorize_report(
        Role::User,
        a.citizen,
        &submitted,
        ReportAction::Transition(ReportStatus::InProgress)
    )
    .is_err());

    // 员工能看到待领取的上报，但在被指派前不能改
    assert!(authorize_report(Role::Employee, a.employee, &submitted, ReportAction::View).is_ok());
    assert!(authorize_report(
        Role::Employee,
        a.employee,
        &submitted,
        ReportAction::Transition(ReportStatus::InProgress)
    )
    .is_err());

    // 管理员指派给员工
    assert!(authorize_report(Role::Admin, a.admin, &submitted, ReportAction::Assign).is_ok());

    // 指派后：只有被指派的员工能推进
    let assigned = facts(a.citizen, Some(a.employee), ReportStatus::Assigned, false);
    assert!(authorize_report(
        Role::Employee,
        a.employee,
        &assigned,
        ReportAction::Transition(ReportStatus::InProgress)
    )
    .is_ok());
    assert!(authorize_report(
        Role::Employee,
        a.other_employee,
        &assigned,
        ReportAction::Transition(ReportStatus::InProgress)
    )
    .is_err());
    // 其他员工连查看都不行
    assert!(
        authorize_report(Role::Employee, a.other_employee, &assigned, ReportAction::View).is_err()
    );

    // 处理完成
    let resolved = facts(a.citizen, Some(a.employee), ReportStatus::Resolved, false);

    // 提交人可以提交反馈并关闭
    assert!(
        authorize_report(Role::User, a.citizen, &resolved, ReportAction::SubmitFeedback).is_ok()
    );
    assert!(authorize_report(
        Role::User,
        a.citizen,
        &resolved,
        ReportAction::Transition(ReportStatus::Closed)
    )
    .is_ok());

    // 员工不能替提交人关闭
    assert!(authorize_report(
        Role::Employee,
        a.employee,
        &resolved,
        ReportAction::Transition(ReportStatus::Closed)
    )
    .is_err());
}

#[test]
fn test_feedback_is_role_independent() {
    let a = actors();
    let resolved = facts(a.citizen, Some(a.employee), ReportStatus::Resolved, false);

    // 管理员也不能替提交人反馈
    assert!(matches!(
        authorize_report(Role::Admin, a.admin, &resolved, ReportAction::SubmitFeedback),
        Err(AppError::Forbidden)
    ));
    // 被指派的员工同样不行
    assert!(matches!(
        authorize_report(Role::Employee, a.employee, &resolved, ReportAction::SubmitFeedback),
        Err(AppError::Forbidden)
    ));
}

#[test]
fn test_feedback_error_kinds_are_distinct() {
    let a = actors();

    // 未解决 -> BadRequest
    let open = facts(a.citizen, Some(a.employee), ReportStatus::InProgress, false);
    assert!(matches!(
        authorize_report(Role::User, a.citizen, &open, ReportAction::SubmitFeedback),
        Err(AppError::BadRequest(_))
    ));

    // 已有反馈 -> Conflict
    let done = facts(a.citizen, Some(a.employee), ReportStatus::Resolved, true);
    assert!(matches!(
        authorize_report(Role::User, a.citizen, &done, ReportAction::SubmitFeedback),
        Err(AppError::Conflict(_))
    ));
}

#[test]
fn test_employee_cannot_see_closed_unassigned() {
    let a = actors();

    // 未指派但已关闭的上报不在员工可见范围内
    let closed = facts(a.citizen, None, ReportStatus::Closed, false);
    assert!(authorize_report(Role::Employee, a.employee, &closed, ReportAction::View).is_err());
}

#[test]
fn test_visibility_scope_matches_roles() {
    let a = actors();

    assert_eq!(visibility_scope(Role::Admin, a.admin), VisibilityScope::All);
    assert_eq!(
        visibility_scope(Role::Employee, a.employee),
        VisibilityScope::Assignee(a.employee)
    );
    assert_eq!(
        visibility_scope(Role::User, a.citizen),
        VisibilityScope::Owner(a.citizen)
    );
}

#[test]
fn test_bulk_operations_admin_only() {
    assert!(authorize_bulk(Role::Admin).is_ok());
    assert!(matches!(authorize_bulk(Role::Employee), Err(AppError::Forbidden)));
    assert!(matches!(authorize_bulk(Role::User), Err(AppError::Forbidden)));
}
