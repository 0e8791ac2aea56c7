use super::parse_bool_env;
use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRule {
    pub per_second: u64,
    pub burst_size: u32,
}

impl RateLimitRule {
    const fn new(per_second: u64, burst_size: u32) -> Self {
        Self {
            per_second,
            burst_size,
        }
    }
}

/// Limits per route group: `auth` covers login, `protected` everything
/// behind a bearer token.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub auth: RateLimitRule,
    pub protected: RateLimitRule,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            auth: RateLimitRule::new(5, 10),
            protected: RateLimitRule::new(20, 40),
        }
    }
}

impl RateLimitConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.enabled = parse_bool_env("RATE_LIMIT_ENABLED", cfg.enabled);

        if let Ok(raw) = env::var("RATE_LIMIT_CONFIG") {
            match parse_rate_limit_config(&raw) {
                Ok(overrides) => cfg = cfg.apply(overrides),
                Err(err) => {
                    tracing::warn!("Invalid RATE_LIMIT_CONFIG '{}': {}", raw, err);
                }
            }
        }

        cfg
    }

    fn apply(mut self, overrides: RuleOverrides) -> Self {
        if let Some(rule) = overrides.all {
            self.auth = rule;
            self.protected = rule;
        }
        self.auth = overrides.auth.unwrap_or(self.auth);
        self.protected = overrides.protected.unwrap_or(self.protected);
        self
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct RuleOverrides {
    all: Option<RateLimitRule>,
    auth: Option<RateLimitRule>,
    protected: Option<RateLimitRule>,
}

/// Accepts either `per:burst` for every group or
/// `auth=per:burst,protected=per:burst`.
fn parse_rate_limit_config(raw: &str) -> Result<RuleOverrides, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("empty value".to_string());
    }

    if !trimmed.contains('=') {
        return Ok(RuleOverrides {
            all: Some(parse_rule(trimmed)?),
            ..Default::default()
        });
    }

    let mut overrides = RuleOverrides::default();
    for item in trimmed.split(',').map(str::trim).filter(|i| !i.is_empty()) {
        let (name, raw_rule) = item
            .split_once('=')
            .ok_or_else(|| format!("invalid item '{}', expected name=per:burst", item))?;
        let rule = parse_rule(raw_rule.trim())?;
        match name.trim().to_ascii_lowercase().as_str() {
            "auth" | "login" => overrides.auth = Some(rule),
            "protected" | "api" => overrides.protected = Some(rule),
            other => {
                return Err(format!(
                    "unknown group '{}', expected auth/protected",
                    other
                ));
            }
        }
    }

    Ok(overrides)
}

fn parse_rule(raw: &str) -> Result<RateLimitRule, String> {
    let (per_second_raw, burst_raw) = raw
        .split_once(':')
        .ok_or_else(|| format!("invalid rule '{}', expected per:burst", raw))?;

    let per_second: u64 = per_second_raw
        .trim()
        .parse()
        .map_err(|_| format!("invalid per_second '{}'", per_second_raw.trim()))?;
    let burst_size: u32 = burst_raw
        .trim()
        .parse()
        .map_err(|_| format!("invalid burst_size '{}'", burst_raw.trim()))?;

    if per_second == 0 || burst_size == 0 {
        return Err("per_second and burst_size must be > 0".to_string());
    }

    Ok(RateLimitRule::new(per_second, burst_size))
}
