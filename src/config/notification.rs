use crate::messages::Language;
use std::env;

#[derive(Debug, Clone, Copy)]
pub struct NotificationConfig {
    /// Used when a request carries no usable `Accept-Language` and for
    /// recipients without a stored preference.
    pub default_language: Language,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            default_language: Language::En,
        }
    }
}

impl NotificationConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(raw) = env::var("DEFAULT_LANGUAGE") {
            match Language::from_code(&raw) {
                Some(lang) => cfg.default_language = lang,
                None => tracing::warn!("Unsupported DEFAULT_LANGUAGE '{}', using en", raw),
            }
        }
        cfg
    }
}
