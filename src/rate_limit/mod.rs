// 限流模块
// 固定窗口计数、存储后端、客户端标识与违规记录

pub mod backend;
pub mod clock;
pub mod identifier;
pub mod metrics;
pub mod models;
pub mod redis_backend;
pub mod store;

pub use backend::{Backend, BackendError, MemoryBackend, RateLimitBackend};
pub use clock::{Clock, MockClock, SystemClock};
pub use identifier::client_identifier;
pub use models::{RateLimitEntry, RateLimitResult, RateLimitViolation};
pub use redis_backend::RedisBackend;
pub use store::{RateLimitStore, SWEEP_INTERVAL};
