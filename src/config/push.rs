use super::parse_bool_env;
use std::env;
use std::time::Duration;

pub const DEFAULT_PUSH_ENDPOINT: &str = "https://exp.host/--/api/v2/push/send";

#[derive(Debug, Clone)]
pub struct PushConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub access_token: Option<String>,
    pub timeout: Duration,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: DEFAULT_PUSH_ENDPOINT.to_string(),
            access_token: None,
            timeout: Duration::from_secs(10),
        }
    }
}

impl PushConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.enabled = parse_bool_env("PUSH_ENABLED", cfg.enabled);

        if let Ok(endpoint) = env::var("PUSH_ENDPOINT") {
            if !endpoint.trim().is_empty() {
                cfg.endpoint = endpoint.trim().to_string();
            }
        }

        cfg.access_token = env::var("PUSH_ACCESS_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());

        if let Some(secs) = env::var("PUSH_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|s| *s > 0)
        {
            cfg.timeout = Duration::from_secs(secs);
        }

        cfg
    }
}
