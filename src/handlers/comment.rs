use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::{comment::MentionedUser, CommentModel};
use crate::response::{ApiResponse, FeedResponse, LimitQuery};
use crate::services::comment::CommentService;
use crate::state::AppState;
use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, max = 5000))]
    pub content: String,
    /// Only the first entry with a user id is notified
    #[serde(default)]
    pub mentioned_users: Vec<MentionedUser>,
}

#[utoipa::path(
    post,
    path = "/api/v1/posts/{id}/comments",
    security(("jwt_token" = [])),
    params(("id" = Uuid, Path, description = "Post ID")),
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment created", body = CommentModel),
        (status = 400, description = "Empty content", body = AppError),
        (status = 404, description = "Post or mentioned user not found", body = AppError),
    ),
    tag = "comments"
)]
pub async fn create_comment(
    Extension(state): Extension<AppState>,
    auth_user: AuthUser,
    Path(post_id): Path<Uuid>,
    Json(payload): Json<CreateCommentRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(format!("Validation error: {e}")))?;

    let comment = CommentService::new(&state)
        .create(
            post_id,
            &auth_user.user_id,
            &payload.content,
            payload.mentioned_users,
        )
        .await?;

    Ok((StatusCode::CREATED, ApiResponse::ok(comment)))
}

#[utoipa::path(
    get,
    path = "/api/v1/posts/{id}/comments",
    security(("jwt_token" = [])),
    params(
        ("id" = Uuid, Path, description = "Post ID"),
        ("limit" = Option<u64>, Query, description = "Page size, default 10"),
    ),
    responses(
        (status = 200, description = "Comments, oldest first", body = FeedResponse<CommentModel>),
        (status = 404, description = "Post not found", body = AppError),
    ),
    tag = "comments"
)]
pub async fn list_comments(
    Extension(state): Extension<AppState>,
    _auth_user: AuthUser,
    Path(post_id): Path<Uuid>,
    Query(query): Query<LimitQuery>,
) -> AppResult<impl IntoResponse> {
    let limit = query.resolve()?;
    let items = CommentService::new(&state)
        .list_by_post(post_id, limit)
        .await?;
    Ok(ApiResponse::ok(FeedResponse::new(items, limit)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/comments/{id}",
    security(("jwt_token" = [])),
    params(("id" = Uuid, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Comment deleted"),
        (status = 403, description = "Not the author", body = AppError),
        (status = 404, description = "Comment not found", body = AppError),
    ),
    tag = "comments"
)]
pub async fn delete_comment(
    Extension(state): Extension<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    CommentService::new(&state)
        .delete(id, &auth_user.user_id)
        .await?;
    Ok(ApiResponse::with_message((), "Comment deleted".to_string()))
}
