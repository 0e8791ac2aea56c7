//! Persistence seams.
//!
//! Services talk to storage only through these traits so the same code runs
//! against Postgres (`postgres::PgStore`) in production and against the
//! in-process `memory::MemoryStore` in tests and local runs.

pub mod keyed_lock;
pub mod memory;
pub mod postgres;

use crate::error::{AppError, AppResult};
use crate::models::{CommentModel, LikeModel, NotificationModel, PostModel, UserModel};
use async_trait::async_trait;
use std::collections::HashSet;
use uuid::Uuid;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_user(&self, id: &str) -> AppResult<Option<UserModel>>;

    async fn create_user(&self, user: UserModel) -> AppResult<UserModel>;

    async fn save_user(&self, user: UserModel) -> AppResult<UserModel>;

    /// Like `find_user`, but a missing user is an error.
    async fn resolve_user(&self, id: &str) -> AppResult<UserModel> {
        self.find_user(id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }
}

#[async_trait]
pub trait PostStore: Send + Sync {
    async fn find_post(&self, id: Uuid) -> AppResult<Option<PostModel>>;

    /// Persist a new post.
    async fn save_post(&self, post: PostModel) -> AppResult<PostModel>;

    /// Apply counter deltas atomically; counters never drop below zero.
    async fn adjust_counts(
        &self,
        id: Uuid,
        likes_delta: i32,
        comments_delta: i32,
    ) -> AppResult<PostModel>;

    /// Newest first.
    async fn list_posts(&self, limit: u64) -> AppResult<Vec<PostModel>>;

    async fn delete_post(&self, id: Uuid) -> AppResult<()>;

    /// Rewrite the author name/avatar snapshot on every post by `author_id`.
    async fn sync_author(&self, author_id: &str, name: &str, avatar: &str) -> AppResult<u64>;

    async fn get_post(&self, id: Uuid) -> AppResult<PostModel> {
        self.find_post(id)
            .await?
            .ok_or_else(|| AppError::not_found("Post"))
    }
}

#[async_trait]
pub trait LikeStore: Send + Sync {
    async fn find_like(&self, post_id: Uuid, user_id: &str) -> AppResult<Option<LikeModel>>;

    async fn create_like(&self, like: LikeModel) -> AppResult<LikeModel>;

    async fn delete_like(&self, id: Uuid) -> AppResult<()>;

    async fn liked_post_ids(&self, user_id: &str) -> AppResult<HashSet<Uuid>>;

    async fn delete_by_post(&self, post_id: Uuid) -> AppResult<u64>;
}

#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn create_comment(&self, comment: CommentModel) -> AppResult<CommentModel>;

    async fn find_comment(&self, id: Uuid) -> AppResult<Option<CommentModel>>;

    /// Oldest first.
    async fn list_by_post(&self, post_id: Uuid, limit: u64) -> AppResult<Vec<CommentModel>>;

    async fn delete_comment(&self, id: Uuid) -> AppResult<()>;

    async fn delete_by_post(&self, post_id: Uuid) -> AppResult<u64>;
}

/// Turns the stored row for a key (if any) into the row to write.
pub type MergeFn<'a> =
    Box<dyn FnOnce(Option<NotificationModel>) -> NotificationModel + Send + 'a>;

#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Lookup by aggregation key. Absence is not an error.
    async fn find_by_recipient_and_reference(
        &self,
        recipient_id: &str,
        reference_id: Uuid,
    ) -> AppResult<Option<NotificationModel>>;

    /// Insert or replace the whole row in one write.
    async fn upsert(&self, notification: NotificationModel) -> AppResult<NotificationModel>;

    /// Read the row for `(recipient_id, reference_id)`, apply `merge` and
    /// write the result. No other writer touches the key in between, across
    /// every process sharing the store. Two first writers racing on a new
    /// key end with one of them getting `Conflict`.
    async fn merge_and_save(
        &self,
        recipient_id: &str,
        reference_id: Uuid,
        merge: MergeFn<'_>,
    ) -> AppResult<NotificationModel>;

    async fn find_notification(&self, id: Uuid) -> AppResult<Option<NotificationModel>>;

    /// Most recently updated first.
    async fn list_by_recipient(
        &self,
        recipient_id: &str,
        limit: u64,
    ) -> AppResult<Vec<NotificationModel>>;

    async fn count_unread(&self, recipient_id: &str) -> AppResult<u64>;

    async fn mark_read(&self, id: Uuid) -> AppResult<()>;

    async fn delete_notification(&self, id: Uuid) -> AppResult<()>;
}
