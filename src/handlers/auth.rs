use crate::error::{AppError, AppResult};
use crate::models::UserModel;
use crate::response::ApiResponse;
use crate::services::user::{LoginOutcome, OAuthProfile, UserService};
use crate::state::AppState;
use crate::utils::jwt::encode_access_token;
use axum::{http::StatusCode, response::IntoResponse, Extension, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// OAuth profile forwarded by the client after sign-in.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    /// Provider user id
    #[validate(length(min = 1, max = 255))]
    pub id: String,
    #[validate(length(min = 1, max = 100))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    pub profile_avatar: String,
    /// Expo device token
    pub push_token: Option<String>,
    /// Preferred language, e.g. `ar` or `en`
    pub user_lang: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub user: UserModel,
    /// JWT access token
    pub token: String,
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 201, description = "User created", body = LoginResponse),
        (status = 200, description = "Existing user logged in", body = LoginResponse),
        (status = 400, description = "Validation error", body = AppError),
    ),
    tag = "auth"
)]
pub async fn login(
    Extension(state): Extension<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(format!("Validation error: {e}")))?;

    let profile = OAuthProfile {
        id: payload.id,
        username: payload.username,
        email: payload.email,
        profile_avatar: payload.profile_avatar,
        push_token: payload.push_token,
        user_lang: payload.user_lang,
    };

    let (user, outcome) = UserService::new(&state).login(profile).await?;
    let token = encode_access_token(&user.id)?;

    let status = match outcome {
        LoginOutcome::Created => StatusCode::CREATED,
        LoginOutcome::Updated | LoginOutcome::Unchanged => StatusCode::OK,
    };

    Ok((status, ApiResponse::ok(LoginResponse { user, token })))
}
