use crate::error::AppResult;
use crate::messages::Language;
use crate::middleware::AuthUser;
use crate::response::{ApiResponse, FeedResponse, LimitQuery};
use crate::services::notification::NotificationView;
use crate::state::AppState;
use axum::{
    extract::{Path, Query},
    http::{header::ACCEPT_LANGUAGE, HeaderMap},
    response::IntoResponse,
    Extension,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct UnreadCountResponse {
    pub count: u64,
}

fn request_language(headers: &HeaderMap, fallback: Language) -> Language {
    let raw = headers.get(ACCEPT_LANGUAGE).and_then(|v| v.to_str().ok());
    Language::resolve(raw, fallback)
}

#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    security(("jwt_token" = [])),
    params(
        ("limit" = Option<u64>, Query, description = "Page size, default 10"),
        ("Accept-Language" = Option<String>, Header, description = "Message language"),
    ),
    responses(
        (status = 200, description = "Most recently updated first", body = FeedResponse<NotificationView>),
        (status = 401, description = "Unauthorized", body = crate::error::AppError),
    ),
    tag = "notifications"
)]
pub async fn list_notifications(
    Extension(state): Extension<AppState>,
    auth_user: AuthUser,
    headers: HeaderMap,
    Query(query): Query<LimitQuery>,
) -> AppResult<impl IntoResponse> {
    let limit = query.resolve()?;
    let language = request_language(&headers, state.notifications.default_language());

    let items = state
        .notifications
        .list_for_user(&auth_user.user_id, limit, language)
        .await?;

    Ok(ApiResponse::ok(FeedResponse::new(items, limit)))
}

#[utoipa::path(
    get,
    path = "/api/v1/notifications/unread-count",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Unread notification count", body = UnreadCountResponse),
        (status = 401, description = "Unauthorized", body = crate::error::AppError),
    ),
    tag = "notifications"
)]
pub async fn unread_count(
    Extension(state): Extension<AppState>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let count = state.notifications.unread_count(&auth_user.user_id).await?;
    Ok(ApiResponse::ok(UnreadCountResponse { count }))
}

#[utoipa::path(
    put,
    path = "/api/v1/notifications/{id}/read",
    security(("jwt_token" = [])),
    params(("id" = Uuid, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Marked as read"),
        (status = 403, description = "Not your notification", body = crate::error::AppError),
        (status = 404, description = "Notification not found", body = crate::error::AppError),
    ),
    tag = "notifications"
)]
pub async fn mark_read(
    Extension(state): Extension<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    state
        .notifications
        .mark_read(id, &auth_user.user_id)
        .await?;
    Ok(ApiResponse::with_message((), "Notification marked as read".to_string()))
}

#[utoipa::path(
    delete,
    path = "/api/v1/notifications/{id}",
    security(("jwt_token" = [])),
    params(("id" = Uuid, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Notification deleted"),
        (status = 403, description = "Neither owner nor admin", body = crate::error::AppError),
        (status = 404, description = "Notification not found", body = crate::error::AppError),
    ),
    tag = "notifications"
)]
pub async fn delete_notification(
    Extension(state): Extension<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    state.notifications.delete(id, &auth_user.user_id).await?;
    Ok(ApiResponse::with_message((), "Notification deleted".to_string()))
}
