use axum::{response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> axum::response::Response {
        Json(self).into_response()
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn with_message(data: T, message: String) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message),
        }
    }
}

/// A feed page: `stop` tells the client there is nothing more to load.
#[derive(Debug, Serialize, ToSchema)]
pub struct FeedResponse<T: Serialize> {
    pub items: Vec<T>,
    pub limit: u64,
    pub stop: bool,
}

impl<T: Serialize> FeedResponse<T> {
    pub fn new(items: Vec<T>, limit: u64) -> Self {
        let stop = (items.len() as u64) < limit;
        Self { items, limit, stop }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LimitQuery {
    pub limit: Option<u64>,
}

pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 100;

impl LimitQuery {
    /// Missing limit falls back to the default; zero is rejected.
    pub fn resolve(&self) -> AppResult<u64> {
        match self.limit {
            None => Ok(DEFAULT_LIMIT),
            Some(0) => Err(AppError::Validation(
                "limit must be greater than zero".to_string(),
            )),
            Some(limit) => Ok(limit.min(MAX_LIMIT)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_when_page_short() {
        let resp = FeedResponse::new(vec!["a".to_string()], 10);
        assert!(resp.stop);
    }

    #[test]
    fn no_stop_when_page_full() {
        let resp = FeedResponse::new(vec![1, 2, 3], 3);
        assert!(!resp.stop);
    }

    #[test]
    fn empty_page_stops() {
        let resp = FeedResponse::<String>::new(vec![], 10);
        assert!(resp.stop);
    }

    #[test]
    fn limit_defaults() {
        let q = LimitQuery { limit: None };
        assert_eq!(q.resolve().unwrap(), DEFAULT_LIMIT);
    }

    #[test]
    fn limit_zero_rejected() {
        let q = LimitQuery { limit: Some(0) };
        assert!(matches!(q.resolve(), Err(AppError::Validation(_))));
    }

    #[test]
    fn limit_capped() {
        let q = LimitQuery { limit: Some(5000) };
        assert_eq!(q.resolve().unwrap(), MAX_LIMIT);
    }
}
