use serde::{Deserialize, Serialize};

/// 单个标识符的固定窗口计数
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitEntry {
    pub count: u32,
    pub reset_at: i64, // Unix timestamp, 毫秒
}

impl RateLimitEntry {
    pub fn is_expired(&self, now_ms: i64) -> bool {
        self.reset_at <= now_ms
    }
}

/// 限流检查结果
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: i64,
}

/// 被拒绝请求的记录
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct RateLimitViolation {
    pub identifier: String,
    pub config: &'static str,
    pub timestamp: i64,
}
