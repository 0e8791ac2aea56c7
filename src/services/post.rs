use crate::{
    error::{AppError, AppResult},
    models::PostModel,
    state::AppState,
    store::{CommentStore, LikeStore, PostStore, UserDirectory},
};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

pub const DEFAULT_SHARE_STATE: &str = "public";

#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub body: String,
    pub image_url: String,
    pub share_state: Option<String>,
}

/// A post plus whether the requesting user liked it.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PostView {
    #[serde(flatten)]
    pub post: PostModel,
    pub your_like: bool,
}

pub struct PostService {
    users: Arc<dyn UserDirectory>,
    posts: Arc<dyn PostStore>,
    likes: Arc<dyn LikeStore>,
    comments: Arc<dyn CommentStore>,
}

impl PostService {
    pub fn new(state: &AppState) -> Self {
        Self {
            users: state.users.clone(),
            posts: state.posts.clone(),
            likes: state.likes.clone(),
            comments: state.comments.clone(),
        }
    }

    pub async fn create(&self, author_id: &str, input: NewPost) -> AppResult<PostModel> {
        let body = input.body.trim().to_string();
        let image_url = input.image_url.trim().to_string();
        if body.is_empty() && image_url.is_empty() {
            return Err(AppError::Validation(
                "A post needs a body or an image".to_string(),
            ));
        }

        let author = self.users.resolve_user(author_id).await?;
        let share_state = input
            .share_state
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_SHARE_STATE.to_string());

        let now = chrono::Utc::now().naive_utc();
        let post = self
            .posts
            .save_post(PostModel {
                id: Uuid::new_v4(),
                author_id: author.id,
                author_name: author.username,
                author_avatar: author.profile_avatar,
                body,
                image_url,
                share_state,
                likes_count: 0,
                comments_count: 0,
                created_at: now,
                updated_at: now,
            })
            .await?;

        tracing::info!(post_id = %post.id, author = %author_id, "Post created");
        Ok(post)
    }

    /// Newest first, flagged with the viewer's likes.
    pub async fn list(&self, viewer_id: &str, limit: u64) -> AppResult<Vec<PostView>> {
        let posts = self.posts.list_posts(limit).await?;
        let liked = self.likes.liked_post_ids(viewer_id).await?;
        Ok(posts
            .into_iter()
            .map(|post| PostView {
                your_like: liked.contains(&post.id),
                post,
            })
            .collect())
    }

    pub async fn get(&self, id: Uuid, viewer_id: &str) -> AppResult<PostView> {
        let post = self.posts.get_post(id).await?;
        let your_like = self.likes.find_like(id, viewer_id).await?.is_some();
        Ok(PostView { post, your_like })
    }

    /// Author only. Likes and comments go with the post.
    pub async fn delete(&self, id: Uuid, user_id: &str) -> AppResult<()> {
        let post = self.posts.get_post(id).await?;
        if post.author_id != user_id {
            return Err(AppError::Forbidden);
        }

        let likes = self.likes.delete_by_post(id).await?;
        let comments = self.comments.delete_by_post(id).await?;
        self.posts.delete_post(id).await?;

        tracing::info!(post_id = %id, likes, comments, "Post deleted");
        Ok(())
    }
}
