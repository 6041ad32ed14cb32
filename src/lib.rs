use std::sync::Arc;

use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use config::{Config, RateLimitConfigs};
use rate_limit::RateLimitStore;
use tower::ServiceBuilder;

pub mod config;
pub mod error;
pub mod invitation;
pub mod middleware;
pub mod rate_limit;
pub mod routes;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub limits: RateLimitConfigs,
    pub rate_limiter: Arc<RateLimitStore>,
}

impl AppState {
    pub fn new(config: Config, rate_limiter: Arc<RateLimitStore>) -> Self {
        Self {
            limits: config.rate_limits(),
            config,
            rate_limiter,
        }
    }
}

/// 构建完整路由，包含认证、限流和错误日志中间件
pub fn app(state: AppState) -> Router {
    let public_routes = Router::new().route("/health", get(routes::system::ping));

    let protected_routes = Router::new()
        .route(
            "/invitations/actions",
            post(routes::invitation::available_actions),
        )
        .route(
            "/rate-limit/status",
            get(routes::system::rate_limit_status),
        )
        .layer(from_fn_with_state(state.clone(), middleware::auth_middleware));

    let api = Router::new().merge(public_routes).merge(protected_routes);

    // axum 不允许在根路径 nest，且前缀必须以 `/` 开头
    let base = state.config.api_base_uri.trim().trim_matches('/');
    let router = if base.is_empty() {
        api
    } else {
        Router::new().nest(&format!("/{}", base), api)
    };

    router
        .layer(
            ServiceBuilder::new()
                .layer(from_fn(middleware::log_errors))
                .layer(from_fn_with_state(state.clone(), middleware::rate_limit)),
        )
        .with_state(state)
}
