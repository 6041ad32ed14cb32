use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::config::RateLimitConfig;

use super::backend::{Backend, RateLimitBackend};
use super::clock::Clock;
use super::metrics::ViolationLog;
use super::models::{RateLimitEntry, RateLimitResult, RateLimitViolation};

/// 过期条目的默认清理间隔
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// 固定窗口限流器
///
/// 过期判断在每次访问时进行，后台清理只用于回收内存。
/// 同一标识的读-改-写由该标识的锁串行化，不同标识互不等待。
pub struct RateLimitStore<B = Backend> {
    backend: B,
    clock: Arc<dyn Clock>,
    key_locks: KeyLocks,
    violations: ViolationLog,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl<B: RateLimitBackend> RateLimitStore<B> {
    pub fn new(backend: B, clock: Arc<dyn Clock>) -> Self {
        Self {
            backend,
            clock,
            key_locks: KeyLocks::default(),
            violations: ViolationLog::default(),
            sweeper: Mutex::new(None),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    /// 记录一次请求并返回是否放行
    pub async fn check_rate_limit(
        &self,
        identifier: &str,
        config: &RateLimitConfig,
    ) -> RateLimitResult {
        let key_lock = self.key_locks.lock_for(identifier);
        let guard = key_lock.lock().await;
        let now = self.clock.now_ms();

        let existing = match self.backend.get(identifier).await {
            Ok(entry) => entry.filter(|e| !e.is_expired(now)),
            Err(e) => {
                tracing::error!("读取限流计数失败 {}: {}", identifier, e);
                return fail_open(config, now);
            }
        };

        let (entry, allowed) = match existing {
            None => (
                RateLimitEntry {
                    count: 1,
                    reset_at: now + config.window_ms,
                },
                true,
            ),
            Some(entry) if entry.count >= config.max_requests => (entry, false),
            Some(entry) => (
                RateLimitEntry {
                    count: entry.count + 1,
                    ..entry
                },
                true,
            ),
        };

        if allowed {
            if let Err(e) = self.backend.set(identifier, entry).await {
                tracing::error!("写入限流计数失败 {}: {}", identifier, e);
            }
        }
        drop(guard);

        if !allowed {
            self.violations.record(RateLimitViolation {
                identifier: identifier.to_string(),
                config: config.name,
                timestamp: now,
            });
            tracing::warn!(
                identifier = %identifier,
                config = config.name,
                max_requests = config.max_requests,
                window_ms = config.window_ms,
                reset_at = entry.reset_at,
                "Rate limit exceeded"
            );
            return RateLimitResult {
                allowed: false,
                limit: config.max_requests,
                remaining: 0,
                reset_at: entry.reset_at,
            };
        }

        RateLimitResult {
            allowed: true,
            limit: config.max_requests,
            remaining: config.max_requests.saturating_sub(entry.count),
            reset_at: entry.reset_at,
        }
    }

    pub async fn reset_rate_limit(&self, identifier: &str) {
        let key_lock = self.key_locks.lock_for(identifier);
        let _guard = key_lock.lock().await;
        if let Err(e) = self.backend.delete(identifier).await {
            tracing::error!("重置限流计数失败 {}: {}", identifier, e);
        }
    }

    /// 清理已过期条目，返回清理数量
    pub async fn sweep_expired(&self) -> usize {
        let now = self.clock.now_ms();
        self.key_locks.prune();
        match self.backend.sweep(now).await {
            Ok(removed) => removed,
            Err(e) => {
                tracing::error!("清理过期限流计数失败: {}", e);
                0
            }
        }
    }

    /// 启动后台清理任务，重复调用会替换旧任务
    pub fn start_sweeper(self: &Arc<Self>, interval: Duration) {
        let store = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // 第一次 tick 立即返回
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(store) = store.upgrade() else {
                    break;
                };
                let removed = store.sweep_expired().await;
                if removed > 0 {
                    tracing::debug!("Swept {} expired rate limit entries", removed);
                }
            }
        });

        let mut slot = self.sweeper.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = slot.replace(handle) {
            previous.abort();
        }
    }

    pub fn is_sweeping(&self) -> bool {
        self.sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// 停止后台清理并清空所有状态，之后仍可继续使用
    pub async fn destroy(&self) {
        let handle = self
            .sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }

        if let Err(e) = self.backend.clear().await {
            tracing::error!("清空限流计数失败: {}", e);
        }
        self.key_locks.prune();
        self.violations.clear();
    }

    pub fn violations(&self) -> Vec<RateLimitViolation> {
        self.violations.snapshot()
    }

    pub fn violation_count(&self) -> usize {
        self.violations.len()
    }

    pub fn violation_summary(&self) -> BTreeMap<String, usize> {
        self.violations.summary()
    }

    /// 距离窗口重置的秒数，向上取整，至少为 1
    pub fn retry_after_secs(&self, result: &RateLimitResult) -> u64 {
        let remaining_ms = (result.reset_at - self.clock.now_ms()).max(0) as u64;
        remaining_ms.div_ceil(1000).max(1)
    }
}

impl<B> Drop for RateLimitStore<B> {
    fn drop(&mut self) {
        let slot = self.sweeper.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = slot.take() {
            handle.abort();
        }
    }
}

/// 按标识分配的异步锁
#[derive(Default)]
struct KeyLocks {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl KeyLocks {
    fn lock_for(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        match locks.get(key) {
            Some(lock) => lock.clone(),
            None => {
                let lock = Arc::new(tokio::sync::Mutex::new(()));
                locks.insert(key.to_string(), lock.clone());
                lock
            }
        }
    }

    /// 移除没有任务持有的锁
    fn prune(&self) {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

fn fail_open(config: &RateLimitConfig, now: i64) -> RateLimitResult {
    RateLimitResult {
        allowed: true,
        limit: config.max_requests,
        remaining: config.max_requests.saturating_sub(1),
        reset_at: now + config.window_ms,
    }
}
