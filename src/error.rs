use axum::{
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::rate_limit::{RateLimitBackend, RateLimitResult, RateLimitStore};
use crate::utils::{error_codes, error_to_api_response};

#[derive(Debug)]
pub enum AppError {
    Unauthorized,
    ValidationError(String),
    RateLimited {
        result: RateLimitResult,
        retry_after_secs: u64,
    },
}

impl AppError {
    pub fn rate_limited<B: RateLimitBackend>(
        store: &RateLimitStore<B>,
        result: RateLimitResult,
    ) -> Self {
        AppError::RateLimited {
            retry_after_secs: store.retry_after_secs(&result),
            result,
        }
    }
}

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// 写入限流响应头，已存在的头不覆盖（内层限流优先）
pub fn apply_rate_limit_headers(headers: &mut HeaderMap, result: &RateLimitResult) {
    // 重置时间以秒级 Unix 时间戳返回
    let reset_secs = (result.reset_at.max(0) as u64).div_ceil(1000);
    headers
        .entry(X_RATELIMIT_LIMIT)
        .or_insert_with(|| HeaderValue::from(result.limit));
    headers
        .entry(X_RATELIMIT_REMAINING)
        .or_insert_with(|| HeaderValue::from(result.remaining));
    headers
        .entry(X_RATELIMIT_RESET)
        .or_insert_with(|| HeaderValue::from(reset_secs));
}

pub fn rate_limit_headers(result: &RateLimitResult) -> HeaderMap {
    let mut headers = HeaderMap::new();
    apply_rate_limit_headers(&mut headers, result);
    headers
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                error_to_api_response::<()>(error_codes::AUTH_FAILED, "未授权访问".into()),
            )
                .into_response(),
            AppError::ValidationError(msg) => (
                StatusCode::BAD_REQUEST,
                error_to_api_response::<()>(error_codes::VALIDATION_ERROR, msg),
            )
                .into_response(),
            AppError::RateLimited {
                result,
                retry_after_secs,
            } => {
                let mut headers = rate_limit_headers(&result);
                headers.insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    headers,
                    error_to_api_response::<()>(
                        error_codes::RATE_LIMIT,
                        format!("请求过于频繁，请在{}秒后重试", retry_after_secs),
                    ),
                )
                    .into_response()
            }
        }
    }
}
