use std::env;
use std::time::Duration;

pub mod rate_limit;

pub use rate_limit::{RateLimitConfig, RateLimitConfigs, RateLimitMode};

#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub jwt_expiration_secs: u64,
    /// 未配置时使用进程内存存储限流计数
    pub redis_url: Option<String>,
    pub server_host: String,
    pub server_port: u16,
    pub api_base_uri: String,
    pub rate_limit_mode: RateLimitMode,
    pub rate_limit_dev_multiplier: u32,
    pub rate_limit_sweep_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenv::dotenv().ok();

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.trim_end_matches('h').parse::<u64>().ok())
            .unwrap_or(24);

        let test_mode = env_flag("RATE_LIMIT_TEST_MODE");
        // APP_ENV 未设置时按编译模式判断
        let production = match env::var("APP_ENV") {
            Ok(app_env) => app_env.eq_ignore_ascii_case("production"),
            Err(_) => !cfg!(debug_assertions),
        };

        Ok(Config {
            jwt_secret: env::var("JWT_SECRET")?,
            jwt_expiration_secs: jwt_expiration * 3600,
            redis_url: env::var("REDIS_URL").ok().filter(|url| !url.is_empty()),
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            server_port: parse_or("SERVER_PORT", 3000),
            api_base_uri: normalize_base_uri(
                &env::var("API_BASE_URI").unwrap_or_else(|_| "/api".into()),
            ),
            rate_limit_mode: RateLimitMode::resolve(test_mode, production),
            rate_limit_dev_multiplier: parse_or(
                "RATE_LIMIT_DEV_MULTIPLIER",
                rate_limit::DEFAULT_DEV_MULTIPLIER,
            ),
            rate_limit_sweep_interval_secs: parse_or("RATE_LIMIT_SWEEP_INTERVAL", 60),
        })
    }

    pub fn jwt_expiration(&self) -> Duration {
        Duration::from_secs(self.jwt_expiration_secs)
    }

    pub fn rate_limit_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.rate_limit_sweep_interval_secs.max(1))
    }

    pub fn rate_limit_mode(&self) -> RateLimitMode {
        self.rate_limit_mode
    }

    pub fn rate_limits(&self) -> RateLimitConfigs {
        RateLimitConfigs::for_mode(self.rate_limit_mode, self.rate_limit_dev_multiplier)
    }
}

/// 统一为 `/xxx` 形式，空值表示挂在根路径
fn normalize_base_uri(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}

fn env_flag(key: &str) -> bool {
    env::var(key)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
