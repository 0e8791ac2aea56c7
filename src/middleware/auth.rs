use crate::{error::AppError, state::AppState, utils::jwt::authenticate};
use axum::{
    extract::{FromRequestParts, Request},
    http::HeaderMap,
    middleware::Next,
    response::Response,
    Extension,
};

/// Authenticated caller, inserted by [`auth_middleware`].
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
}

/// Require a valid bearer access token belonging to a known, non-banned
/// user.
pub async fn auth_middleware(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer_token(&headers).ok_or(AppError::Unauthorized)?;
    let user_id = authenticate(&token).map_err(|_| AppError::Unauthorized)?;

    let user = state
        .users
        .find_user(&user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if user.role == "banned" || user.status == "banned" {
        return Err(AppError::Forbidden);
    }

    request.extensions_mut().insert(AuthUser { user_id });

    Ok(next.run(request).await)
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())?;

    let token = auth_header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header::AUTHORIZATION, HeaderValue};

    fn headers(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        h
    }

    #[test]
    fn bearer_token_extracted() {
        assert_eq!(
            extract_bearer_token(&headers("Bearer abc.def")),
            Some("abc.def".to_string())
        );
    }

    #[test]
    fn other_schemes_ignored() {
        assert_eq!(extract_bearer_token(&headers("Basic Zm9v")), None);
        assert_eq!(extract_bearer_token(&headers("Bearer ")), None);
        assert_eq!(extract_bearer_token(&HeaderMap::new()), None);
    }
}
