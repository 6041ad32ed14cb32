use axum::{extract::State, http::StatusCode, response::IntoResponse};

use crate::{AppState, utils::success_to_api_response};

use super::model::{PingResponse, RateLimitStatusResponse};

/// 健康检查接口
pub async fn ping(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        success_to_api_response(PingResponse {
            status: "ok".to_string(),
            timestamp: chrono::Utc::now().timestamp(),
            rate_limit_mode: state.config.rate_limit_mode(),
        }),
    )
}

/// 限流运行状态，只返回按配置汇总的计数
pub async fn rate_limit_status(State(state): State<AppState>) -> impl IntoResponse {
    let limiter = &state.rate_limiter;
    (
        StatusCode::OK,
        success_to_api_response(RateLimitStatusResponse {
            mode: state.config.rate_limit_mode(),
            backend: limiter.backend().name(),
            violation_count: limiter.violation_count(),
            by_config: limiter.violation_summary(),
        }),
    )
}
