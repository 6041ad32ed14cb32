use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use tour_backend::{
    AppState, app,
    config::Config,
    rate_limit::{Backend, MemoryBackend, RateLimitStore, RedisBackend, SystemClock},
};
#[cfg(debug_assertions)]
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!("Rate limit mode: {}", config.rate_limit_mode().as_str());

    // 选择限流存储
    let backend = match &config.redis_url {
        Some(url) => {
            let client = redis::Client::open(url.as_str()).expect("Failed to create Redis client");
            Backend::Redis(RedisBackend::new(Arc::new(client)))
        }
        None => {
            tracing::warn!(
                "Using in-memory rate limit store; counters are not shared between instances"
            );
            Backend::Memory(MemoryBackend::new())
        }
    };

    let rate_limiter = Arc::new(RateLimitStore::new(backend, Arc::new(SystemClock)));
    rate_limiter.start_sweeper(config.rate_limit_sweep_interval());

    let state = AppState::new(config.clone(), rate_limiter.clone());
    let router = app(state);

    // 根据编译模式决定是否添加CORS
    #[cfg(debug_assertions)]
    let router = {
        tracing::debug!("Adding CORS layer for development mode");
        router.layer(CorsLayer::permissive())
    };

    let addr = SocketAddr::new(
        config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        config.server_port,
    );
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to start server");

    rate_limiter.destroy().await;
    tracing::info!("Server stopped");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
