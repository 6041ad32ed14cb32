use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::permissions::is_expired_at;

/// 邀请默认有效期，单位天
pub const DEFAULT_EXPIRATION_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Declined,
}

impl fmt::Display for InvitationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InvitationStatus::Pending => "pending",
            InvitationStatus::Accepted => "accepted",
            InvitationStatus::Declined => "declined",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invitation {
    pub id: Uuid,
    pub tour_id: Uuid,
    pub inviter_id: String,
    pub email: String,
    pub status: InvitationStatus,
    #[serde(default, skip_serializing)]
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvitationError {
    InvalidToken,
    Expired,
    NotPending(InvitationStatus),
    NotResendable(InvitationStatus),
}

impl fmt::Display for InvitationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvitationError::InvalidToken => write!(f, "邀请令牌无效"),
            InvitationError::Expired => write!(f, "邀请已过期"),
            InvitationError::NotPending(status) => write!(f, "邀请状态为 {}，无法处理", status),
            InvitationError::NotResendable(status) => {
                write!(f, "邀请状态为 {}，无法重新发送", status)
            }
        }
    }
}

impl std::error::Error for InvitationError {}

fn new_token() -> String {
    Uuid::new_v4().simple().to_string()
}

impl Invitation {
    /// 发送新邀请
    pub fn issue(tour_id: Uuid, inviter_id: &str, email: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tour_id,
            inviter_id: inviter_id.to_string(),
            email: email.trim().to_lowercase(),
            status: InvitationStatus::Pending,
            token: new_token(),
            expires_at: now + Duration::days(DEFAULT_EXPIRATION_DAYS),
            created_at: now,
        }
    }

    pub fn accept(&mut self, token: &str, now: DateTime<Utc>) -> Result<(), InvitationError> {
        self.respond(token, now, InvitationStatus::Accepted)
    }

    pub fn decline(&mut self, token: &str, now: DateTime<Utc>) -> Result<(), InvitationError> {
        self.respond(token, now, InvitationStatus::Declined)
    }

    fn respond(
        &mut self,
        token: &str,
        now: DateTime<Utc>,
        next: InvitationStatus,
    ) -> Result<(), InvitationError> {
        if self.token.is_empty() || self.token != token {
            return Err(InvitationError::InvalidToken);
        }
        if self.status != InvitationStatus::Pending {
            return Err(InvitationError::NotPending(self.status));
        }
        if is_expired_at(self, now) {
            return Err(InvitationError::Expired);
        }
        self.status = next;
        Ok(())
    }

    /// 已拒绝或已过期的待处理邀请可以重新发送，令牌和有效期都会更新
    pub fn resend(&mut self, now: DateTime<Utc>) -> Result<(), InvitationError> {
        let resendable = match self.status {
            InvitationStatus::Declined => true,
            InvitationStatus::Pending => is_expired_at(self, now),
            InvitationStatus::Accepted => false,
        };
        if !resendable {
            return Err(InvitationError::NotResendable(self.status));
        }

        self.status = InvitationStatus::Pending;
        self.token = new_token();
        self.expires_at = now + Duration::days(DEFAULT_EXPIRATION_DAYS);
        Ok(())
    }
}
