use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::PostModel;
use crate::response::{ApiResponse, FeedResponse, LimitQuery};
use crate::services::post::{NewPost, PostService, PostView};
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
pub struct CreatePostRequest {
    #[serde(default)]
    #[validate(length(max = 10000))]
    pub body: String,
    #[serde(default)]
    #[validate(length(max = 2048))]
    pub image_url: String,
    /// Defaults to `public`
    #[validate(length(max = 32))]
    pub share_state: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/v1/posts",
    security(("jwt_token" = [])),
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Post created", body = PostModel),
        (status = 400, description = "Neither body nor image given", body = AppError),
    ),
    tag = "posts"
)]
pub async fn create_post(
    Extension(state): Extension<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<CreatePostRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(format!("Validation error: {e}")))?;

    let post = PostService::new(&state)
        .create(
            &auth_user.user_id,
            NewPost {
                body: payload.body,
                image_url: payload.image_url,
                share_state: payload.share_state,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, ApiResponse::ok(post)))
}

#[utoipa::path(
    get,
    path = "/api/v1/posts",
    security(("jwt_token" = [])),
    params(("limit" = Option<u64>, Query, description = "Page size, default 10")),
    responses(
        (status = 200, description = "Newest posts", body = FeedResponse<PostView>),
        (status = 400, description = "Invalid limit", body = AppError),
    ),
    tag = "posts"
)]
pub async fn list_posts(
    Extension(state): Extension<AppState>,
    auth_user: AuthUser,
    Query(query): Query<LimitQuery>,
) -> AppResult<impl IntoResponse> {
    let limit = query.resolve()?;
    let items = PostService::new(&state)
        .list(&auth_user.user_id, limit)
        .await?;
    Ok(ApiResponse::ok(FeedResponse::new(items, limit)))
}

#[utoipa::path(
    get,
    path = "/api/v1/posts/{id}",
    security(("jwt_token" = [])),
    params(("id" = Uuid, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post", body = PostView),
        (status = 404, description = "Post not found", body = AppError),
    ),
    tag = "posts"
)]
pub async fn get_post(
    Extension(state): Extension<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let post = PostService::new(&state).get(id, &auth_user.user_id).await?;
    Ok(ApiResponse::ok(post))
}

#[utoipa::path(
    delete,
    path = "/api/v1/posts/{id}",
    security(("jwt_token" = [])),
    params(("id" = Uuid, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post deleted"),
        (status = 403, description = "Not the author", body = AppError),
        (status = 404, description = "Post not found", body = AppError),
    ),
    tag = "posts"
)]
pub async fn delete_post(
    Extension(state): Extension<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    PostService::new(&state)
        .delete(id, &auth_user.user_id)
        .await?;
    Ok(ApiResponse::with_message((), "Post deleted".to_string()))
}
