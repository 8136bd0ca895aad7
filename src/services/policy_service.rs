//! 授权策略引擎
//! (角色, 行为人, 上报事实, 请求动作) -> 允许/拒绝
//! 纯决策逻辑，不触库、不感知 HTTP，可独立单测
//! 角色按 admin -> employee -> user 的顺序求值，先匹配者生效

use crate::error::AppError;
use crate::models::report::{Report, ReportStatus};
use crate::models::user::Role;
use uuid::Uuid;

/// 做决策所需的上报事实
#[derive(Debug, Clone, Copy)]
pub struct ReportFacts {
    pub submitted_by: Uuid,
    pub assigned_to: Option<Uuid>,
    pub status: ReportStatus,
    pub has_feedback: bool,
}

impl ReportFacts {
    pub fn of(report: &Report) -> Self {
        ReportFacts {
            submitted_by: report.submitted_by,
            assigned_to: report.assigned_to,
            status: report.status,
            has_feedback: report.has_feedback(),
        }
    }
}

/// 请求的上报动作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportAction {
    View,
    Transition(ReportStatus),
    Assign,
    SubmitFeedback,
}

/// 角色的可见范围，在用户提供的过滤条件之前生效
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityScope {
    /// 管理员：全部
    All,
    /// 员工：指派给自己的 + 未指派且待处理的
    Assignee(Uuid),
    /// 市民：仅自己提交的
    Owner(Uuid),
}

/// 计算角色的可见范围
pub fn visibility_scope(role: Role, actor_id: Uuid) -> VisibilityScope {
    match role {
        Role::Admin => VisibilityScope::All,
        Role::Employee => VisibilityScope::Assignee(actor_id),
        Role::User => VisibilityScope::Owner(actor_id),
    }
}

/// 员工可设置的目标状态
const EMPLOYEE_TARGETS: [ReportStatus; 2] = [ReportStatus::InProgress, ReportStatus::Resolved];

/// 未指派时员工可见的状态
const PENDING_STATUSES: [ReportStatus; 2] = [ReportStatus::Submitted, ReportStatus::InReview];

/// 决定某动作是否允许。失败在任何变更前短路返回
pub fn authorize_report(
    role: Role,
    actor_id: Uuid,
    facts: &ReportFacts,
    action: ReportAction,
) -> Result<(), AppError> {
    // 反馈的约束与角色无关：仅提交人、仅 resolved、仅一次
    if action == ReportAction::SubmitFeedback {
        if facts.submitted_by != actor_id {
            return Err(AppError::Forbidden);
        }
        if facts.status != ReportStatus::Resolved {
            return Err(AppError::BadRequest(
                "feedback can only be submitted on resolved reports".to_string(),
            ));
        }
        if facts.has_feedback {
            return Err(AppError::Conflict(
                "feedback has already been submitted for this report".to_string(),
            ));
        }
        return Ok(());
    }

    match role {
        Role::Admin => Ok(()),

        Role::Employee => match action {
            ReportAction::View => {
                let assigned_to_me = facts.assigned_to == Some(actor_id);
                let pending_unassigned = facts.assigned_to.is_none()
                    && PENDING_STATUSES.contains(&facts.status);
                if assigned_to_me || pending_unassigned {
                    Ok(())
                } else {
                    Err(AppError::Forbidden)
                }
            }
            ReportAction::Transition(target) => {
                // 未指派或指派给他人的上报一律不可变更
                if facts.assigned_to != Some(actor_id) {
                    return Err(AppError::Forbidden);
                }
                if EMPLOYEE_TARGETS.contains(&target) {
                    Ok(())
                } else {
                    Err(AppError::Forbidden)
                }
            }
            ReportAction::Assign => Err(AppError::Forbidden),
            ReportAction::SubmitFeedback => unreachable!("handled above"),
        },

        Role::User => match action {
            ReportAction::View => {
                if facts.submitted_by == actor_id {
                    Ok(())
                } else {
                    Err(AppError::Forbidden)
                }
            }
            // 市民唯一允许的状态变更是接受处理结果：resolved -> closed
            ReportAction::Transition(target) => {
                if facts.submitted_by == actor_id
                    && facts.status == ReportStatus::Resolved
                    && target == ReportStatus::Closed
                {
                    Ok(())
                } else {
                    Err(AppError::Forbidden)
                }
            }
            ReportAction::Assign => Err(AppError::Forbidden),
            ReportAction::SubmitFeedback => unreachable!("handled above"),
        },
    }
}

/// 管理员用户管理的自我保护规则：
/// 不能停用自己的账户，不能修改自己的角色
pub fn authorize_user_update(
    actor_role: Role,
    actor_id: Uuid,
    target_id: Uuid,
    changes_role: bool,
    deactivates: bool,
) -> Result<(), AppError> {
    if actor_role != Role::Admin {
        return Err(AppError::Forbidden);
    }

    if target_id == actor_id {
        if changes_role {
            return Err(AppError::BadRequest(
                "cannot change your own role".to_string(),
            ));
        }
        if deactivates {
            return Err(AppError::BadRequest(
                "cannot deactivate your own account".to_string(),
            ));
        }
    }

    Ok(())
}

/// 批量操作仅限管理员
pub fn authorize_bulk(role: Role) -> Result<(), AppError> {
    if role == Role::Admin {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn test_admin_may_do_everything_on_reports() {
        let admin = Uuid::new_v4();
        let f = facts(Uuid::new_v4(), None, ReportStatus::Submitted, false);

        assert!(authorize_report(Role::Admin, admin, &f, ReportAction::View).is_ok());
        assert!(authorize_report(
            Role::Admin,
            admin,
            &f,
            ReportAction::Transition(ReportStatus::Closed)
        )
        .is_ok());
        assert!(authorize_report(Role::Admin, admin, &f, ReportAction::Assign).is_ok());
    }

    #[test]
    fn test_employee_assigned_may_progress_and_resolve() {
        let employee = Uuid::new_v4();
        let f = facts(Uuid::new_v4(), Some(employee), ReportStatus::Assigned, false);

        assert!(authorize_report(
            Role::Employee,
            employee,
            &f,
            ReportAction::Transition(ReportStatus::InProgress)
        )
        .is_ok());
        assert!(authorize_report(
            Role::Employee,
            employee,
            &f,
            ReportAction::Transition(ReportStatus::Resolved)
        )
        .is_ok());
        // closed 不在员工可设置的目标状态内
        assert!(authorize_report(
            Role::Employee,
            employee,
            &f,
            ReportAction::Transition(ReportStatus::Closed)
        )
        .is_err());
    }

    #[test]
    fn test_employee_not_assigned_cannot_mutate() {
        let employee = Uuid::new_v4();
        let other = Uuid::new_v4();
        let f = facts(Uuid::new_v4(), Some(other), ReportStatus::Assigned, false);

        let result = authorize_report(
            Role::Employee,
            employee,
            &f,
            ReportAction::Transition(ReportStatus::InProgress),
        );
        assert!(matches!(result, Err(AppError::Forbidden)));
    }

    #[test]
    fn test_employee_sees_unassigned_pending_but_cannot_mutate() {
        let employee = Uuid::new_v4();
        let pending = facts(Uuid::new_v4(), None, ReportStatus::InReview, false);

        assert!(authorize_report(Role::Employee, employee, &pending, ReportAction::View).is_ok());
        assert!(authorize_report(
            Role::Employee,
            employee,
            &pending,
            ReportAction::Transition(ReportStatus::InProgress)
        )
        .is_err());

        // 未指派但已进入处理后的状态对员工不可见
        let later = facts(Uuid::new_v4(), None, ReportStatus::Resolved, false);
        assert!(authorize_report(Role::Employee, employee, &later, ReportAction::View).is_err());
    }

    #[test]
    fn test_user_may_only_close_own_resolved_report() {
        let owner = Uuid::new_v4();
        let resolved = facts(owner, None, ReportStatus::Resolved, false);

        assert!(authorize_report(
            Role::User,
            owner,
            &resolved,
            ReportAction::Transition(ReportStatus::Closed)
        )
        .is_ok());

        // 其他任何目标状态都被拒绝
        for target in [
            ReportStatus::Submitted,
            ReportStatus::InReview,
            ReportStatus::Assigned,
            ReportStatus::InProgress,
            ReportStatus::Resolved,
        ] {
            assert!(authorize_report(
                Role::User,
                owner,
                &resolved,
                ReportAction::Transition(target)
            )
            .is_err());
        }

        // 未 resolved 的上报不能关闭
        let open = facts(owner, None, ReportStatus::InProgress, false);
        assert!(authorize_report(
            Role::User,
            owner,
            &open,
            ReportAction::Transition(ReportStatus::Closed)
        )
        .is_err());
    }

    #[test]
    fn test_user_cannot_view_others_reports() {
        let user = Uuid::new_v4();
        let f = facts(Uuid::new_v4(), None, ReportStatus::Submitted, false);
        assert!(matches!(
            authorize_report(Role::User, user, &f, ReportAction::View),
            Err(AppError::Forbidden)
        ));
    }

    #[test]
    fn test_feedback_rules() {
        let owner = Uuid::new_v4();

        // 正常路径
        let resolved = facts(owner, None, ReportStatus::Resolved, false);
        assert!(
            authorize_report(Role::User, owner, &resolved, ReportAction::SubmitFeedback).is_ok()
        );

        // 非提交人
        assert!(matches!(
            authorize_report(
                Role::User,
                Uuid::new_v4(),
                &resolved,
                ReportAction::SubmitFeedback
            ),
            Err(AppError::Forbidden)
        ));

        // 状态不是 resolved
        let open = facts(owner, None, ReportStatus::InProgress, false);
        assert!(matches!(
            authorize_report(Role::User, owner, &open, ReportAction::SubmitFeedback),
            Err(AppError::BadRequest(_))
        ));

        // 重复提交是 Conflict，不做幂等合并
        let done = facts(owner, None, ReportStatus::Resolved, true);
        assert!(matches!(
            authorize_report(Role::User, owner, &done, ReportAction::SubmitFeedback),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn test_admin_self_protection() {
        let admin = Uuid::new_v4();
        let other = Uuid::new_v4();

        // 改他人角色可以
        assert!(authorize_user_update(Role::Admin, admin, other, true, true).is_ok());
        // 改自己角色不行
        assert!(matches!(
            authorize_user_update(Role::Admin, admin, admin, true, false),
            Err(AppError::BadRequest(_))
        ));
        // 停用自己不行
        assert!(matches!(
            authorize_user_update(Role::Admin, admin, admin, false, true),
            Err(AppError::BadRequest(_))
        ));
        // 改自己的非敏感字段可以
        assert!(authorize_user_update(Role::Admin, admin, admin, false, false).is_ok());
        // 非管理员一律拒绝
        assert!(matches!(
            authorize_user_update(Role::User, admin, other, false, false),
            Err(AppError::Forbidden)
        ));
    }

    #[test]
    fn test_visibility_scope() {
        let id = Uuid::new_v4();
        assert_eq!(visibility_scope(Role::Admin, id), VisibilityScope::All);
        assert_eq!(
            visibility_scope(Role::Employee, id),
            VisibilityScope::Assignee(id)
        );
        assert_eq!(visibility_scope(Role::User, id), VisibilityScope::Owner(id));
    }

    #[test]
    fn test_bulk_admin_only() {
        assert!(authorize_bulk(Role::Admin).is_ok());
        assert!(authorize_bulk(Role::Employee).is_err());
        assert!(authorize_bulk(Role::User).is_err());
    }
}
