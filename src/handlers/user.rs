use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::UserModel;
use crate::response::ApiResponse;
use crate::services::user::UserService;
use crate::state::AppState;
use axum::{extract::Path, response::IntoResponse, Extension, Json};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PushTokenRequest {
    /// Expo push token; empty to unregister
    #[validate(length(max = 255))]
    pub push_token: String,
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    security(("jwt_token" = [])),
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User profile", body = UserModel),
        (status = 404, description = "User not found", body = AppError),
    ),
    tag = "users"
)]
pub async fn get_user(
    Extension(state): Extension<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let user = UserService::new(&state).get(&id).await?;
    Ok(ApiResponse::ok(user))
}

#[utoipa::path(
    put,
    path = "/api/v1/push-token",
    security(("jwt_token" = [])),
    request_body = PushTokenRequest,
    responses(
        (status = 200, description = "Push token stored", body = UserModel),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "users"
)]
pub async fn update_push_token(
    Extension(state): Extension<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<PushTokenRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(format!("Validation error: {e}")))?;

    let user = UserService::new(&state)
        .update_push_token(&auth_user.user_id, &payload.push_token)
        .await?;
    Ok(ApiResponse::with_message(
        user,
        "Push token updated".to_string(),
    ))
}
