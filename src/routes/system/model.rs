use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::RateLimitMode;

/// 健康检查响应
#[derive(Debug, Serialize)]
pub struct PingResponse {
    pub status: String,
    /// 服务器时间
    pub timestamp: i64,
    pub rate_limit_mode: RateLimitMode,
}

#[derive(Debug, Serialize)]
pub struct RateLimitStatusResponse {
    pub mode: RateLimitMode,
    pub backend: &'static str,
    pub violation_count: usize,
    pub by_config: BTreeMap<String, usize>,
}
