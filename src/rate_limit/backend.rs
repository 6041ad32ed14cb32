use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Mutex, PoisonError};

use super::models::RateLimitEntry;
use super::redis_backend::RedisBackend;

#[derive(Debug)]
pub enum BackendError {
    Redis(redis::RedisError),
    Serialization(serde_json::Error),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::Redis(e) => write!(f, "redis error: {}", e),
            BackendError::Serialization(e) => write!(f, "serialization error: {}", e),
        }
    }
}

impl std::error::Error for BackendError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BackendError::Redis(e) => Some(e),
            BackendError::Serialization(e) => Some(e),
        }
    }
}

impl From<redis::RedisError> for BackendError {
    fn from(e: redis::RedisError) -> Self {
        BackendError::Redis(e)
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(e: serde_json::Error) -> Self {
        BackendError::Serialization(e)
    }
}

/// 限流计数的存储后端，计数算法本身在 `RateLimitStore` 中
pub trait RateLimitBackend: Send + Sync + 'static {
    fn get(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<RateLimitEntry>, BackendError>> + Send;

    fn set(
        &self,
        key: &str,
        entry: RateLimitEntry,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    fn delete(&self, key: &str) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// 删除 `reset_at <= now_ms` 的条目，返回删除数量
    fn sweep(&self, now_ms: i64) -> impl Future<Output = Result<usize, BackendError>> + Send;

    /// 清空本进程持有的条目
    fn clear(&self) -> impl Future<Output = Result<(), BackendError>> + Send;
}

/// 进程内存后端，多实例部署时各实例计数互不共享
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, RateLimitEntry>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RateLimitBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<RateLimitEntry>, BackendError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).copied())
    }

    async fn set(&self, key: &str, entry: RateLimitEntry) -> Result<(), BackendError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), BackendError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }

    async fn sweep(&self, now_ms: i64) -> Result<usize, BackendError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now_ms));
        Ok(before - entries.len())
    }

    async fn clear(&self) -> Result<(), BackendError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        Ok(())
    }
}

/// 按配置选择的后端
#[derive(Debug)]
pub enum Backend {
    Memory(MemoryBackend),
    Redis(RedisBackend),
}

impl Backend {
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Memory(_) => "memory",
            Backend::Redis(_) => "redis",
        }
    }
}

impl RateLimitBackend for Backend {
    async fn get(&self, key: &str) -> Result<Option<RateLimitEntry>, BackendError> {
        match self {
            Backend::Memory(b) => b.get(key).await,
            Backend::Redis(b) => b.get(key).await,
        }
    }

    async fn set(&self, key: &str, entry: RateLimitEntry) -> Result<(), BackendError> {
        match self {
            Backend::Memory(b) => b.set(key, entry).await,
            Backend::Redis(b) => b.set(key, entry).await,
        }
    }

    async fn delete(&self, key: &str) -> Result<(), BackendError> {
        match self {
            Backend::Memory(b) => b.delete(key).await,
            Backend::Redis(b) => b.delete(key).await,
        }
    }

    async fn sweep(&self, now_ms: i64) -> Result<usize, BackendError> {
        match self {
            Backend::Memory(b) => b.sweep(now_ms).await,
            Backend::Redis(b) => b.sweep(now_ms).await,
        }
    }

    async fn clear(&self) -> Result<(), BackendError> {
        match self {
            Backend::Memory(b) => b.clear().await,
            Backend::Redis(b) => b.clear().await,
        }
    }
}
