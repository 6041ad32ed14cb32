//! Redis 限流后端的集成测试
//!
//! 需要本地 Redis：`redis://127.0.0.1/`
//! 默认忽略，运行方式：`cargo test --test redis_backend -- --ignored`

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use redis::AsyncCommands;
use tour_backend::{
    config::RateLimitConfig,
    rate_limit::{
        Backend, RateLimitBackend, RateLimitEntry, RateLimitStore, RedisBackend, SystemClock,
    },
};
use uuid::Uuid;

const REDIS_URL: &str = "redis://127.0.0.1/";

async fn redis_available() -> bool {
    match redis::Client::open(REDIS_URL) {
        Ok(client) => client.get_multiplexed_async_connection().await.is_ok(),
        Err(_) => false,
    }
}

fn client() -> Arc<redis::Client> {
    Arc::new(redis::Client::open(REDIS_URL).expect("Failed to create Redis client"))
}

fn store() -> RateLimitStore<RedisBackend> {
    RateLimitStore::new(RedisBackend::new(client()), Arc::new(SystemClock))
}

/// 每个用例使用独立的键，避免相互影响
fn unique_key(test_name: &str) -> String {
    format!("test:{}:{}", test_name, Uuid::new_v4().simple())
}

#[tokio::test]
#[ignore] // Requires Redis
async fn test_redis_allows_limit_then_denies() {
    if !redis_available().await {
        eprintln!("Skipping test: Redis not available at {}", REDIS_URL);
        return;
    }

    let store = store();
    let cfg = RateLimitConfig::new("TEST", 3, 60_000);
    let key = cfg.key_for(&unique_key("sequence"));

    for expected in [2, 1, 0] {
        let result = store.check_rate_limit(&key, &cfg).await;
        assert!(result.allowed);
        assert_eq!(result.remaining, expected);
    }

    let denied = store.check_rate_limit(&key, &cfg).await;
    assert!(!denied.allowed);
    assert_eq!(denied.remaining, 0);
    assert_eq!(store.violation_count(), 1);

    // 拒绝的请求不会增加计数
    let entry = store.backend().get(&key).await.unwrap().unwrap();
    assert_eq!(entry.count, 3);

    store.reset_rate_limit(&key).await;
}

#[tokio::test]
#[ignore] // Requires Redis
async fn test_redis_reset_restores_quota() {
    if !redis_available().await {
        eprintln!("Skipping test: Redis not available");
        return;
    }

    let store = store();
    let cfg = RateLimitConfig::new("TEST", 1, 60_000);
    let key = unique_key("reset");

    assert!(store.check_rate_limit(&key, &cfg).await.allowed);
    assert!(!store.check_rate_limit(&key, &cfg).await.allowed);

    store.reset_rate_limit(&key).await;
    assert!(store.backend().get(&key).await.unwrap().is_none());

    let result = store.check_rate_limit(&key, &cfg).await;
    assert!(result.allowed);
    assert_eq!(result.remaining, 0);

    store.reset_rate_limit(&key).await;
}

#[tokio::test]
#[ignore] // Requires Redis
async fn test_redis_key_expires_at_reset_at() {
    if !redis_available().await {
        eprintln!("Skipping test: Redis not available");
        return;
    }

    let backend = RedisBackend::new(client());
    let key = unique_key("expiry");
    let reset_at = Utc::now().timestamp_millis() + 300;

    backend
        .set(&key, RateLimitEntry { count: 2, reset_at })
        .await
        .unwrap();

    let mut conn = client().get_multiplexed_async_connection().await.unwrap();
    let ttl: i64 = conn.pttl(format!("rate_limit:{}", key)).await.unwrap();
    assert!(ttl > 0 && ttl <= 300, "unexpected ttl {}", ttl);

    let entry = backend.get(&key).await.unwrap().unwrap();
    assert_eq!(entry, RateLimitEntry { count: 2, reset_at });

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(backend.get(&key).await.unwrap().is_none());
}

#[tokio::test]
#[ignore] // Requires Redis
async fn test_redis_window_restarts_after_expiry() {
    if !redis_available().await {
        eprintln!("Skipping test: Redis not available");
        return;
    }

    let store = store();
    let cfg = RateLimitConfig::new("TEST", 2, 300);
    let key = unique_key("window");

    store.check_rate_limit(&key, &cfg).await;
    store.check_rate_limit(&key, &cfg).await;
    assert!(!store.check_rate_limit(&key, &cfg).await.allowed);

    tokio::time::sleep(Duration::from_millis(500)).await;

    let result = store.check_rate_limit(&key, &cfg).await;
    assert!(result.allowed);
    assert_eq!(result.remaining, 1);

    store.reset_rate_limit(&key).await;
}

#[tokio::test]
#[ignore] // Requires Redis
async fn test_redis_backend_through_dispatch() {
    if !redis_available().await {
        eprintln!("Skipping test: Redis not available");
        return;
    }

    let store = RateLimitStore::new(
        Backend::Redis(RedisBackend::new(client())),
        Arc::new(SystemClock),
    );
    assert_eq!(store.backend().name(), "redis");

    let cfg = RateLimitConfig::new("TEST", 2, 60_000);
    let key = unique_key("dispatch");

    assert_eq!(store.check_rate_limit(&key, &cfg).await.remaining, 1);
    assert_eq!(store.check_rate_limit(&key, &cfg).await.remaining, 0);
    assert!(!store.check_rate_limit(&key, &cfg).await.allowed);

    // 关闭时不清理共享计数
    store.destroy().await;
    let entry = store.backend().get(&key).await.unwrap().unwrap();
    assert_eq!(entry.count, 2);

    store.reset_rate_limit(&key).await;
}
