use anyhow::Result;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::config::jwt::JwtConfig;

static JWT_CONFIG: OnceLock<JwtConfig> = OnceLock::new();

/// Install the signing config. Later calls are rejected.
pub fn init_jwt_config(config: JwtConfig) -> Result<()> {
    JWT_CONFIG
        .set(config)
        .map_err(|_| anyhow::anyhow!("JWT config already initialized"))?;
    Ok(())
}

fn get_config() -> Result<&'static JwtConfig> {
    JWT_CONFIG
        .get()
        .ok_or_else(|| anyhow::anyhow!("JWT config not initialized"))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// OAuth user id.
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

pub fn encode_access_token(user_id: &str) -> Result<String> {
    let config = get_config()?;
    let now = chrono::Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: user_id.to_owned(),
        exp: now + config.access_token_expiry as usize,
        iat: now,
        token_type: Some("access".to_string()),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| anyhow::anyhow!("Failed to encode access token: {}", e))
}

pub fn decode_jwt(token: &str) -> Result<Claims> {
    let config = get_config()?;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| anyhow::anyhow!("Failed to decode JWT: {}", e))
}

pub fn is_access_token(claims: &Claims) -> bool {
    matches!(claims.token_type.as_deref(), Some("access"))
}

/// Decode and require an access token; returns the subject.
pub fn authenticate(token: &str) -> Result<String> {
    let claims = decode_jwt(token)?;
    if !is_access_token(&claims) {
        return Err(anyhow::anyhow!("not an access token"));
    }
    Ok(claims.sub)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Once;

    static INIT: Once = Once::new();

    fn ensure_config() {
        INIT.call_once(|| {
            let _ = init_jwt_config(JwtConfig {
                secret: "a_very_long_secret_key_that_is_at_least_32_chars".to_string(),
                access_token_expiry: 3600,
            });
        });
    }

    #[test]
    fn access_token_carries_oauth_id() {
        ensure_config();
        let token = encode_access_token("google-oauth2|1234").unwrap();
        assert_eq!(authenticate(&token).unwrap(), "google-oauth2|1234");
    }

    #[test]
    fn tampered_token_fails() {
        ensure_config();
        let token = encode_access_token("u1").unwrap();
        let mut chars: Vec<char> = token.chars().collect();
        let mid = chars.len() / 2;
        chars[mid] = if chars[mid] == 'A' { 'B' } else { 'A' };
        let tampered: String = chars.into_iter().collect();
        assert!(decode_jwt(&tampered).is_err());
    }

    #[test]
    fn expired_token_fails() {
        ensure_config();
        let config = get_config().unwrap();
        let now = chrono::Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: "u1".to_string(),
            exp: now - 3600,
            iat: now - 7200,
            token_type: Some("access".to_string()),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .unwrap();
        assert!(decode_jwt(&token).is_err());
    }

    #[test]
    fn token_without_type_is_not_access() {
        ensure_config();
        let config = get_config().unwrap();
        let now = chrono::Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: "u1".to_string(),
            exp: now + 60,
            iat: now,
            token_type: None,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .unwrap();
        assert!(authenticate(&token).is_err());
    }
}
