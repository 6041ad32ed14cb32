use std::sync::Arc;

use redis::{AsyncCommands, Client as RedisClient};

use super::backend::{BackendError, RateLimitBackend};
use super::models::RateLimitEntry;

/// 限流缓存键前缀
const RATE_LIMIT_PREFIX: &str = "rate_limit:";

/// Redis 后端，多实例共享计数
#[derive(Debug, Clone)]
pub struct RedisBackend {
    redis: Arc<RedisClient>,
}

impl RedisBackend {
    pub fn new(redis: Arc<RedisClient>) -> Self {
        Self { redis }
    }
}

fn rate_limit_key(key: &str) -> String {
    format!("{}{}", RATE_LIMIT_PREFIX, key)
}

impl RateLimitBackend for RedisBackend {
    async fn get(&self, key: &str) -> Result<Option<RateLimitEntry>, BackendError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;

        let result: Option<String> = conn.get(rate_limit_key(key)).await?;
        match result {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, entry: RateLimitEntry) -> Result<(), BackendError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;

        let json = serde_json::to_string(&entry)?;
        // 过期时间与窗口结束时间一致，由 Redis 负责清理
        let _: () = redis::cmd("SET")
            .arg(rate_limit_key(key))
            .arg(json)
            .arg("PXAT")
            .arg(entry.reset_at)
            .query_async(&mut conn)
            .await?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), BackendError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;
        let _: () = conn.del(rate_limit_key(key)).await?;
        Ok(())
    }

    async fn sweep(&self, _now_ms: i64) -> Result<usize, BackendError> {
        Ok(0)
    }

    async fn clear(&self) -> Result<(), BackendError> {
        // 计数由所有实例共享，单个实例关闭时不清理
        tracing::debug!("Skipping clear for shared redis rate limit state");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_share_the_rate_limit_prefix() {
        assert_eq!(rate_limit_key("API:ip:1.2.3.4"), "rate_limit:API:ip:1.2.3.4");
    }

    #[test]
    fn entries_round_trip_through_json() {
        let entry = RateLimitEntry {
            count: 4,
            reset_at: 1_700_000_060_000,
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(json, r#"{"count":4,"reset_at":1700000060000}"#);
        assert_eq!(serde_json::from_str::<RateLimitEntry>(&json).unwrap(), entry);
    }
}
