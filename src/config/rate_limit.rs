use serde::{Deserialize, Serialize};

const MINUTE_MS: i64 = 60 * 1000;

/// 开发模式下的默认放宽倍数
pub const DEFAULT_DEV_MULTIPLIER: u32 = 10;

/// 限流运行模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateLimitMode {
    Production,
    /// 与生产环境相同的限额，CI 中使用
    Test,
    Development,
}

impl RateLimitMode {
    /// 显式测试标志优先，其次看是否为生产环境
    pub fn resolve(test_mode: bool, production: bool) -> Self {
        if test_mode {
            RateLimitMode::Test
        } else if production {
            RateLimitMode::Production
        } else {
            RateLimitMode::Development
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RateLimitMode::Production => "production",
            RateLimitMode::Test => "test",
            RateLimitMode::Development => "development",
        }
    }
}

/// 单个命名限流配置（固定窗口）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitConfig {
    pub name: &'static str,
    pub max_requests: u32,
    pub window_ms: i64,
}

impl RateLimitConfig {
    pub const fn new(name: &'static str, max_requests: u32, window_ms: i64) -> Self {
        Self {
            name,
            max_requests,
            window_ms,
        }
    }

    /// 按配置名隔离计数器，避免不同接口共用同一个窗口
    pub fn key_for(&self, identifier: &str) -> String {
        format!("{}:{}", self.name, identifier)
    }

    fn scaled(self, multiplier: u32) -> Self {
        Self {
            max_requests: self.max_requests.saturating_mul(multiplier.max(1)),
            ..self
        }
    }
}

pub const MAGIC_LINK: RateLimitConfig = RateLimitConfig::new("MAGIC_LINK", 3, 15 * MINUTE_MS);
pub const AUTH: RateLimitConfig = RateLimitConfig::new("AUTH", 5, MINUTE_MS);
pub const API: RateLimitConfig = RateLimitConfig::new("API", 100, MINUTE_MS);
pub const TOUR_INVITATIONS: RateLimitConfig =
    RateLimitConfig::new("TOUR_INVITATIONS", 20, 60 * MINUTE_MS);
pub const OTP_VERIFICATION: RateLimitConfig =
    RateLimitConfig::new("OTP_VERIFICATION", 5, MINUTE_MS);
pub const INVITATION_RESEND: RateLimitConfig =
    RateLimitConfig::new("INVITATION_RESEND", 5, 60 * MINUTE_MS);
pub const INVITATION_ACTION: RateLimitConfig =
    RateLimitConfig::new("INVITATION_ACTION", 30, MINUTE_MS);

/// 当前模式下生效的全部命名配置
#[derive(Debug, Clone, Serialize)]
pub struct RateLimitConfigs {
    pub magic_link: RateLimitConfig,
    pub auth: RateLimitConfig,
    pub api: RateLimitConfig,
    pub tour_invitations: RateLimitConfig,
    pub otp_verification: RateLimitConfig,
    pub invitation_resend: RateLimitConfig,
    pub invitation_action: RateLimitConfig,
}

impl RateLimitConfigs {
    pub fn production() -> Self {
        Self {
            magic_link: MAGIC_LINK,
            auth: AUTH,
            api: API,
            tour_invitations: TOUR_INVITATIONS,
            otp_verification: OTP_VERIFICATION,
            invitation_resend: INVITATION_RESEND,
            invitation_action: INVITATION_ACTION,
        }
    }

    pub fn for_mode(mode: RateLimitMode, dev_multiplier: u32) -> Self {
        let base = Self::production();
        match mode {
            RateLimitMode::Production | RateLimitMode::Test => base,
            RateLimitMode::Development => Self {
                magic_link: base.magic_link.scaled(dev_multiplier),
                auth: base.auth.scaled(dev_multiplier),
                api: base.api.scaled(dev_multiplier),
                tour_invitations: base.tour_invitations.scaled(dev_multiplier),
                otp_verification: base.otp_verification.scaled(dev_multiplier),
                invitation_resend: base.invitation_resend.scaled(dev_multiplier),
                invitation_action: base.invitation_action.scaled(dev_multiplier),
            },
        }
    }

    pub fn all(&self) -> [RateLimitConfig; 7] {
        [
            self.magic_link,
            self.auth,
            self.api,
            self.tour_invitations,
            self.otp_verification,
            self.invitation_resend,
            self.invitation_action,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_takes_precedence() {
        assert_eq!(RateLimitMode::resolve(true, false), RateLimitMode::Test);
        assert_eq!(RateLimitMode::resolve(true, true), RateLimitMode::Test);
        assert_eq!(RateLimitMode::resolve(false, true), RateLimitMode::Production);
        assert_eq!(RateLimitMode::resolve(false, false), RateLimitMode::Development);
    }

    #[test]
    fn test_mode_matches_production_limits() {
        let test = RateLimitConfigs::for_mode(RateLimitMode::Test, 10);
        let prod = RateLimitConfigs::for_mode(RateLimitMode::Production, 10);
        assert_eq!(test.all(), prod.all());
        assert_eq!(prod.magic_link.max_requests, 3);
        assert_eq!(prod.magic_link.window_ms, 15 * 60 * 1000);
        assert_eq!(prod.api.max_requests, 100);
    }

    #[test]
    fn development_relaxes_counts_but_not_windows() {
        let dev = RateLimitConfigs::for_mode(RateLimitMode::Development, 7);
        let prod = RateLimitConfigs::production();
        for (d, p) in dev.all().iter().zip(prod.all().iter()) {
            assert_eq!(d.name, p.name);
            assert_eq!(d.max_requests, p.max_requests * 7);
            assert_eq!(d.window_ms, p.window_ms);
        }
    }

    #[test]
    fn zero_multiplier_never_drops_below_production() {
        let dev = RateLimitConfigs::for_mode(RateLimitMode::Development, 0);
        assert_eq!(dev.auth.max_requests, AUTH.max_requests);
    }

    #[test]
    fn keys_are_scoped_by_config_name() {
        assert_eq!(AUTH.key_for("ip:1.2.3.4"), "AUTH:ip:1.2.3.4");
        assert_ne!(AUTH.key_for("user:a"), API.key_for("user:a"));
    }
}
