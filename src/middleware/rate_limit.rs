use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::{
    AppState,
    error::{AppError, apply_rate_limit_headers},
    rate_limit::client_identifier,
    utils::verify_token,
};

use super::auth::bearer_token;

/// 全局接口限流
///
/// 携带有效令牌的请求按账号计数，其余按客户端 IP 计数。
/// 令牌无效时不在这里拒绝，交给认证中间件处理。
pub async fn rate_limit(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let limit = &state.limits.api;
    let user_id = bearer_token(req.headers())
        .and_then(|token| verify_token(token, &state.config).ok())
        .map(|claims| claims.sub);
    let identifier = client_identifier(req.headers(), user_id.as_deref());

    let result = state
        .rate_limiter
        .check_rate_limit(&limit.key_for(&identifier), limit)
        .await;
    if !result.allowed {
        return Err(AppError::rate_limited(&state.rate_limiter, result));
    }

    let mut response = next.run(req).await;
    apply_rate_limit_headers(response.headers_mut(), &result);
    Ok(response)
}
