//! 邀请可执行操作的判断
//!
//! 仅用于界面展示，真正的权限校验由数据库的行级安全策略负责。

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::model::{Invitation, InvitationStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InvitationActions {
    pub can_cancel: bool,
    pub can_resend: bool,
    pub can_remove: bool,
}

/// 截止时刻本身不算过期
pub fn is_expired_at(invitation: &Invitation, now: DateTime<Utc>) -> bool {
    invitation.expires_at < now
}

pub fn is_expired(invitation: &Invitation) -> bool {
    is_expired_at(invitation, Utc::now())
}

/// 只有团主可以撤回仍然有效的待处理邀请
pub fn can_cancel_at(invitation: &Invitation, is_owner: bool, now: DateTime<Utc>) -> bool {
    is_owner
        && invitation.status == InvitationStatus::Pending
        && !is_expired_at(invitation, now)
}

pub fn can_cancel(invitation: &Invitation, is_owner: bool) -> bool {
    can_cancel_at(invitation, is_owner, Utc::now())
}

/// 已拒绝，或待处理但已过期
pub fn can_resend_at(invitation: &Invitation, is_owner: bool, now: DateTime<Utc>) -> bool {
    is_owner
        && match invitation.status {
            InvitationStatus::Declined => true,
            InvitationStatus::Pending => is_expired_at(invitation, now),
            InvitationStatus::Accepted => false,
        }
}

pub fn can_resend(invitation: &Invitation, is_owner: bool) -> bool {
    can_resend_at(invitation, is_owner, Utc::now())
}

// 删除与重新发送共用同一规则
pub fn can_remove_at(invitation: &Invitation, is_owner: bool, now: DateTime<Utc>) -> bool {
    can_resend_at(invitation, is_owner, now)
}

pub fn can_remove(invitation: &Invitation, is_owner: bool) -> bool {
    can_resend(invitation, is_owner)
}

pub fn available_actions_at(
    invitation: &Invitation,
    is_owner: bool,
    now: DateTime<Utc>,
) -> InvitationActions {
    InvitationActions {
        can_cancel: can_cancel_at(invitation, is_owner, now),
        can_resend: can_resend_at(invitation, is_owner, now),
        can_remove: can_remove_at(invitation, is_owner, now),
    }
}

pub fn available_actions(invitation: &Invitation, is_owner: bool) -> InvitationActions {
    available_actions_at(invitation, is_owner, Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn invitation(status: InvitationStatus, expires_at: DateTime<Utc>) -> Invitation {
        Invitation {
            id: Uuid::new_v4(),
            tour_id: Uuid::new_v4(),
            inviter_id: "owner".into(),
            email: "guest@example.com".into(),
            status,
            token: "t".into(),
            expires_at,
            created_at: expires_at - Duration::days(7),
        }
    }

    const ALL_STATUSES: [InvitationStatus; 3] = [
        InvitationStatus::Pending,
        InvitationStatus::Accepted,
        InvitationStatus::Declined,
    ];

    #[test]
    fn expiry_boundary_is_strict() {
        let now = Utc::now();
        let inv = invitation(InvitationStatus::Pending, now);
        assert!(!is_expired_at(&inv, now));
        assert!(is_expired_at(&inv, now + Duration::microseconds(1)));
        assert!(!is_expired_at(&inv, now - Duration::microseconds(1)));
    }

    #[test]
    fn live_pending_invitation_can_only_be_cancelled_by_owner() {
        let inv = invitation(InvitationStatus::Pending, Utc::now() + Duration::days(3));
        assert!(can_cancel(&inv, true));
        assert!(!can_cancel(&inv, false));
        assert!(!can_resend(&inv, true));
        assert!(!can_remove(&inv, true));
    }

    #[test]
    fn expired_pending_invitation_is_resendable() {
        let inv = invitation(InvitationStatus::Pending, Utc::now() - Duration::hours(1));
        assert!(is_expired(&inv));
        assert!(!can_cancel(&inv, true));
        assert!(can_resend(&inv, true));
        assert!(can_remove(&inv, true));
        assert!(!can_resend(&inv, false));
    }

    #[test]
    fn declined_invitation_is_resendable_regardless_of_expiry() {
        for offset in [Duration::days(-3), Duration::days(3)] {
            let inv = invitation(InvitationStatus::Declined, Utc::now() + offset);
            assert!(can_resend(&inv, true));
            assert!(!can_cancel(&inv, true));
        }
    }

    #[test]
    fn accepted_invitation_has_no_actions() {
        let now = Utc::now();
        for offset in [Duration::days(-3), Duration::days(3)] {
            let inv = invitation(InvitationStatus::Accepted, now + offset);
            let actions = available_actions_at(&inv, true, now);
            assert_eq!(
                actions,
                InvitationActions {
                    can_cancel: false,
                    can_resend: false,
                    can_remove: false,
                }
            );
        }
    }

    #[test]
    fn remove_always_matches_resend() {
        let now = Utc::now();
        for status in ALL_STATUSES {
            for offset in [Duration::days(-1), Duration::zero(), Duration::days(1)] {
                for is_owner in [true, false] {
                    let inv = invitation(status, now + offset);
                    assert_eq!(
                        can_remove_at(&inv, is_owner, now),
                        can_resend_at(&inv, is_owner, now)
                    );
                }
            }
        }
    }

    #[test]
    fn non_owner_never_gets_actions() {
        let now = Utc::now();
        for status in ALL_STATUSES {
            let inv = invitation(status, now - Duration::days(1));
            let actions = available_actions_at(&inv, false, now);
            assert!(!actions.can_cancel && !actions.can_resend && !actions.can_remove);
        }
    }

    #[test]
    fn available_actions_is_deterministic() {
        let now = Utc::now();
        let inv = invitation(InvitationStatus::Pending, now);
        let first = available_actions_at(&inv, true, now);
        let second = available_actions_at(&inv, true, now);
        assert_eq!(first, second);
        assert!(first.can_cancel);
    }
}
