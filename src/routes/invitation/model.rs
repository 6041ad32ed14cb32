use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::invitation::{Invitation, InvitationActions, InvitationStatus};

#[derive(Debug, Deserialize)]
pub struct InvitationActionsRequest {
    pub tour_owner_id: String,
    pub invitations: Vec<Invitation>,
}

#[derive(Debug, Serialize)]
pub struct InvitationActionsView {
    pub invitation_id: Uuid,
    pub status: InvitationStatus,
    pub is_expired: bool,
    pub actions: InvitationActions,
}

/// 单次请求最多处理的邀请数量
pub const MAX_INVITATIONS_PER_REQUEST: usize = 200;
