use axum::{
    Extension,
    extract::{Json, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::Utc;

use crate::{
    AppState,
    error::{AppError, rate_limit_headers},
    invitation::{available_actions_at, permissions::is_expired_at},
    rate_limit::client_identifier,
    utils::{Claims, success_to_api_response},
};

use super::model::{InvitationActionsRequest, InvitationActionsView, MAX_INVITATIONS_PER_REQUEST};

/// 计算当前用户对每条邀请可执行的操作
#[axum::debug_handler]
pub async fn available_actions(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
    Json(req): Json<InvitationActionsRequest>,
) -> Result<Response, AppError> {
    let limit = &state.limits.invitation_action;
    let identifier = client_identifier(&headers, Some(&claims.sub));
    let result = state
        .rate_limiter
        .check_rate_limit(&limit.key_for(&identifier), limit)
        .await;
    if !result.allowed {
        return Err(AppError::rate_limited(&state.rate_limiter, result));
    }

    if req.tour_owner_id.trim().is_empty() {
        return Err(AppError::ValidationError("tour_owner_id 不能为空".into()));
    }
    if req.invitations.len() > MAX_INVITATIONS_PER_REQUEST {
        return Err(AppError::ValidationError(format!(
            "单次最多查询 {} 条邀请",
            MAX_INVITATIONS_PER_REQUEST
        )));
    }

    let is_owner = claims.sub == req.tour_owner_id;
    // 所有邀请使用同一时刻判断
    let now = Utc::now();
    let views = req
        .invitations
        .iter()
        .map(|invitation| InvitationActionsView {
            invitation_id: invitation.id,
            status: invitation.status,
            is_expired: is_expired_at(invitation, now),
            actions: available_actions_at(invitation, is_owner, now),
        })
        .collect::<Vec<_>>();

    tracing::debug!(
        "用户 {} 查询了 {} 条邀请的可用操作",
        claims.sub,
        views.len()
    );

    Ok((
        StatusCode::OK,
        rate_limit_headers(&result),
        success_to_api_response(views),
    )
        .into_response())
}
