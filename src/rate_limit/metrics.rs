use std::collections::{BTreeMap, VecDeque};
use std::sync::{Mutex, PoisonError};

use super::models::RateLimitViolation;

/// 违规记录保留上限
pub const MAX_VIOLATIONS: usize = 1000;

/// 限流违规的环形缓冲区，超出容量时丢弃最旧记录
#[derive(Debug)]
pub struct ViolationLog {
    entries: Mutex<VecDeque<RateLimitViolation>>,
    capacity: usize,
}

impl Default for ViolationLog {
    fn default() -> Self {
        Self::with_capacity(MAX_VIOLATIONS)
    }
}

impl ViolationLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(MAX_VIOLATIONS))),
            capacity: capacity.max(1),
        }
    }

    pub fn record(&self, violation: RateLimitViolation) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.push_back(violation);
        while entries.len() > self.capacity {
            entries.pop_front();
        }
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

    /// 按时间先后返回全部记录
    pub fn snapshot(&self) -> Vec<RateLimitViolation> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// 按配置名统计
    pub fn summary(&self) -> BTreeMap<String, usize> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let mut by_config = BTreeMap::new();
        for violation in entries.iter() {
            *by_config.entry(violation.config.to_string()).or_insert(0) += 1;
        }
        by_config
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn violation(i: i64, config: &'static str) -> RateLimitViolation {
        RateLimitViolation {
            identifier: format!("ip:10.0.0.{}", i % 255),
            config,
            timestamp: i,
        }
    }

    #[test]
    fn evicts_oldest_first() {
        let log = ViolationLog::default();
        for i in 0..1500 {
            log.record(violation(i, "API"));
        }

        let entries = log.snapshot();
        assert_eq!(entries.len(), MAX_VIOLATIONS);
        assert_eq!(entries.first().map(|v| v.timestamp), Some(500));
        assert_eq!(entries.last().map(|v| v.timestamp), Some(1499));
    }

    #[test]
    fn summary_groups_by_config() {
        let log = ViolationLog::with_capacity(10);
        log.record(violation(1, "API"));
        log.record(violation(2, "AUTH"));
        log.record(violation(3, "API"));

        let summary = log.summary();
        assert_eq!(summary.get("API"), Some(&2));
        assert_eq!(summary.get("AUTH"), Some(&1));

        log.clear();
        assert!(log.is_empty());
    }
}
