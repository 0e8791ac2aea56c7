use crate::error::AppResult;
use crate::middleware::AuthUser;
use crate::response::ApiResponse;
use crate::services::like::{LikeService, LikeToggle};
use crate::state::AppState;
use axum::{extract::Path, response::IntoResponse, Extension};
use uuid::Uuid;

#[utoipa::path(
    post,
    path = "/api/v1/posts/{id}/like",
    security(("jwt_token" = [])),
    params(("id" = Uuid, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Like toggled", body = LikeToggle),
        (status = 404, description = "Post not found", body = crate::error::AppError),
    ),
    tag = "likes"
)]
pub async fn toggle_like(
    Extension(state): Extension<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let result = LikeService::new(&state)
        .toggle(id, &auth_user.user_id)
        .await?;
    Ok(ApiResponse::ok(result))
}
