use super::{CommentStore, LikeStore, MergeFn, NotificationStore, PostStore, UserDirectory};
use crate::{
    error::{AppError, AppResult},
    models::{
        comment, like, notification, post, user, Comment, CommentModel, Like, LikeModel,
        Notification, NotificationModel, Post, PostModel, User, UserModel,
    },
};
use async_trait::async_trait;
use sea_orm::{
    sea_query::{Expr, OnConflict},
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, SqlErr, Statement,
    TransactionTrait,
};
use std::collections::HashSet;
use uuid::Uuid;

/// sea-orm backed store. One connection pool serves every trait.
#[derive(Clone)]
pub struct PgStore {
    db: DatabaseConnection,
}

impl PgStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn user_active(u: UserModel) -> user::ActiveModel {
    user::ActiveModel {
        id: sea_orm::ActiveValue::Set(u.id),
        username: sea_orm::ActiveValue::Set(u.username),
        email: sea_orm::ActiveValue::Set(u.email),
        profile_avatar: sea_orm::ActiveValue::Set(u.profile_avatar),
        profile_cover: sea_orm::ActiveValue::Set(u.profile_cover),
        bio: sea_orm::ActiveValue::Set(u.bio),
        push_token: sea_orm::ActiveValue::Set(u.push_token),
        user_lang: sea_orm::ActiveValue::Set(u.user_lang),
        status: sea_orm::ActiveValue::Set(u.status),
        role: sea_orm::ActiveValue::Set(u.role),
        created_at: sea_orm::ActiveValue::Set(u.created_at),
        updated_at: sea_orm::ActiveValue::Set(u.updated_at),
    }
}

fn notification_active(n: NotificationModel) -> notification::ActiveModel {
    notification::ActiveModel {
        id: sea_orm::ActiveValue::Set(n.id),
        user_id: sea_orm::ActiveValue::Set(n.user_id),
        actors: sea_orm::ActiveValue::Set(n.actors),
        action_types: sea_orm::ActiveValue::Set(n.action_types),
        reference_id: sea_orm::ActiveValue::Set(n.reference_id),
        reference_content: sea_orm::ActiveValue::Set(n.reference_content),
        is_read: sea_orm::ActiveValue::Set(n.is_read),
        created_at: sea_orm::ActiveValue::Set(n.created_at),
        updated_at: sea_orm::ActiveValue::Set(n.updated_at),
    }
}

fn unique_as_conflict(err: DbErr, message: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::Conflict(message.to_string()),
        _ => AppError::Database(err),
    }
}

/// Single statement: the row is either fully old or fully new.
async fn write_notification<C>(db: &C, n: NotificationModel) -> AppResult<NotificationModel>
where
    C: ConnectionTrait,
{
    Notification::insert(notification_active(n.clone()))
        .on_conflict(
            OnConflict::column(notification::Column::Id)
                .update_columns([
                    notification::Column::Actors,
                    notification::Column::ActionTypes,
                    notification::Column::ReferenceContent,
                    notification::Column::IsRead,
                    notification::Column::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec_without_returning(db)
        .await
        .map_err(|e| unique_as_conflict(e, "Notification key already taken"))?;
    Ok(n)
}

#[async_trait]
impl UserDirectory for PgStore {
    async fn find_user(&self, id: &str) -> AppResult<Option<UserModel>> {
        Ok(User::find_by_id(id.to_string()).one(&self.db).await?)
    }

    async fn create_user(&self, u: UserModel) -> AppResult<UserModel> {
        user_active(u)
            .insert(&self.db)
            .await
            .map_err(|e| unique_as_conflict(e, "User already exists"))
    }

    async fn save_user(&self, u: UserModel) -> AppResult<UserModel> {
        Ok(user_active(u).update(&self.db).await?)
    }
}

#[async_trait]
impl PostStore for PgStore {
    async fn find_post(&self, id: Uuid) -> AppResult<Option<PostModel>> {
        Ok(Post::find_by_id(id).one(&self.db).await?)
    }

    async fn save_post(&self, p: PostModel) -> AppResult<PostModel> {
        let model = post::ActiveModel {
            id: sea_orm::ActiveValue::Set(p.id),
            author_id: sea_orm::ActiveValue::Set(p.author_id),
            author_name: sea_orm::ActiveValue::Set(p.author_name),
            author_avatar: sea_orm::ActiveValue::Set(p.author_avatar),
            body: sea_orm::ActiveValue::Set(p.body),
            image_url: sea_orm::ActiveValue::Set(p.image_url),
            share_state: sea_orm::ActiveValue::Set(p.share_state),
            likes_count: sea_orm::ActiveValue::Set(p.likes_count),
            comments_count: sea_orm::ActiveValue::Set(p.comments_count),
            created_at: sea_orm::ActiveValue::Set(p.created_at),
            updated_at: sea_orm::ActiveValue::Set(p.updated_at),
        };
        Ok(model.insert(&self.db).await?)
    }

    async fn adjust_counts(
        &self,
        id: Uuid,
        likes_delta: i32,
        comments_delta: i32,
    ) -> AppResult<PostModel> {
        PostModel::find_by_statement(Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            "UPDATE posts
             SET likes_count = GREATEST(likes_count + $1, 0),
                 comments_count = GREATEST(comments_count + $2, 0),
                 updated_at = NOW()
             WHERE id = $3
             RETURNING *",
            vec![likes_delta.into(), comments_delta.into(), id.into()],
        ))
        .one(&self.db)
        .await?
        .ok_or_else(|| AppError::not_found("Post"))
    }

    async fn list_posts(&self, limit: u64) -> AppResult<Vec<PostModel>> {
        let posts = Post::find()
            .order_by_desc(post::Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await?;
        Ok(posts)
    }

    async fn delete_post(&self, id: Uuid) -> AppResult<()> {
        Post::delete_by_id(id).exec(&self.db).await?;
        Ok(())
    }

    async fn sync_author(&self, author_id: &str, name: &str, avatar: &str) -> AppResult<u64> {
        let result = Post::update_many()
            .col_expr(post::Column::AuthorName, Expr::value(name))
            .col_expr(post::Column::AuthorAvatar, Expr::value(avatar))
            .filter(post::Column::AuthorId.eq(author_id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }
}

#[async_trait]
impl LikeStore for PgStore {
    async fn find_like(&self, post_id: Uuid, user_id: &str) -> AppResult<Option<LikeModel>> {
        let existing = Like::find()
            .filter(like::Column::PostId.eq(post_id))
            .filter(like::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;
        Ok(existing)
    }

    async fn create_like(&self, l: LikeModel) -> AppResult<LikeModel> {
        let model = like::ActiveModel {
            id: sea_orm::ActiveValue::Set(l.id),
            post_id: sea_orm::ActiveValue::Set(l.post_id),
            user_id: sea_orm::ActiveValue::Set(l.user_id),
            created_at: sea_orm::ActiveValue::Set(l.created_at),
        };
        model
            .insert(&self.db)
            .await
            .map_err(|e| unique_as_conflict(e, "Post already liked"))
    }

    async fn delete_like(&self, id: Uuid) -> AppResult<()> {
        Like::delete_by_id(id).exec(&self.db).await?;
        Ok(())
    }

    async fn liked_post_ids(&self, user_id: &str) -> AppResult<HashSet<Uuid>> {
        let likes = Like::find()
            .filter(like::Column::UserId.eq(user_id))
            .all(&self.db)
            .await?;
        Ok(likes.into_iter().map(|l| l.post_id).collect())
    }

    async fn delete_by_post(&self, post_id: Uuid) -> AppResult<u64> {
        let result = Like::delete_many()
            .filter(like::Column::PostId.eq(post_id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }
}

#[async_trait]
impl CommentStore for PgStore {
    async fn create_comment(&self, c: CommentModel) -> AppResult<CommentModel> {
        let model = comment::ActiveModel {
            id: sea_orm::ActiveValue::Set(c.id),
            post_id: sea_orm::ActiveValue::Set(c.post_id),
            user_id: sea_orm::ActiveValue::Set(c.user_id),
            author_name: sea_orm::ActiveValue::Set(c.author_name),
            author_avatar: sea_orm::ActiveValue::Set(c.author_avatar),
            content: sea_orm::ActiveValue::Set(c.content),
            mentioned_users: sea_orm::ActiveValue::Set(c.mentioned_users),
            created_at: sea_orm::ActiveValue::Set(c.created_at),
            updated_at: sea_orm::ActiveValue::Set(c.updated_at),
        };
        Ok(model.insert(&self.db).await?)
    }

    async fn find_comment(&self, id: Uuid) -> AppResult<Option<CommentModel>> {
        Ok(Comment::find_by_id(id).one(&self.db).await?)
    }

    async fn list_by_post(&self, post_id: Uuid, limit: u64) -> AppResult<Vec<CommentModel>> {
        let comments = Comment::find()
            .filter(comment::Column::PostId.eq(post_id))
            .order_by_asc(comment::Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await?;
        Ok(comments)
    }

    async fn delete_comment(&self, id: Uuid) -> AppResult<()> {
        Comment::delete_by_id(id).exec(&self.db).await?;
        Ok(())
    }

    async fn delete_by_post(&self, post_id: Uuid) -> AppResult<u64> {
        let result = Comment::delete_many()
            .filter(comment::Column::PostId.eq(post_id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }
}

#[async_trait]
impl NotificationStore for PgStore {
    async fn find_by_recipient_and_reference(
        &self,
        recipient_id: &str,
        reference_id: Uuid,
    ) -> AppResult<Option<NotificationModel>> {
        let existing = Notification::find()
            .filter(notification::Column::UserId.eq(recipient_id))
            .filter(notification::Column::ReferenceId.eq(reference_id))
            .one(&self.db)
            .await?;
        Ok(existing)
    }

    async fn upsert(&self, n: NotificationModel) -> AppResult<NotificationModel> {
        write_notification(&self.db, n).await
    }

    async fn merge_and_save(
        &self,
        recipient_id: &str,
        reference_id: Uuid,
        merge: MergeFn<'_>,
    ) -> AppResult<NotificationModel> {
        let txn = self.db.begin().await?;

        // SELECT .. FOR UPDATE: a concurrent merge on this key waits here.
        let existing = Notification::find()
            .filter(notification::Column::UserId.eq(recipient_id))
            .filter(notification::Column::ReferenceId.eq(reference_id))
            .lock_exclusive()
            .one(&txn)
            .await?;

        let merged = write_notification(&txn, merge(existing)).await?;
        txn.commit().await?;
        Ok(merged)
    }

    async fn find_notification(&self, id: Uuid) -> AppResult<Option<NotificationModel>> {
        Ok(Notification::find_by_id(id).one(&self.db).await?)
    }

    async fn list_by_recipient(
        &self,
        recipient_id: &str,
        limit: u64,
    ) -> AppResult<Vec<NotificationModel>> {
        let items = Notification::find()
            .filter(notification::Column::UserId.eq(recipient_id))
            .order_by_desc(notification::Column::UpdatedAt)
            .limit(limit)
            .all(&self.db)
            .await?;
        Ok(items)
    }

    async fn count_unread(&self, recipient_id: &str) -> AppResult<u64> {
        let count = Notification::find()
            .filter(notification::Column::UserId.eq(recipient_id))
            .filter(notification::Column::IsRead.eq(false))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    async fn mark_read(&self, id: Uuid) -> AppResult<()> {
        Notification::update_many()
            .col_expr(notification::Column::IsRead, Expr::value(true))
            .filter(notification::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    async fn delete_notification(&self, id: Uuid) -> AppResult<()> {
        Notification::delete_by_id(id).exec(&self.db).await?;
        Ok(())
    }
}
