use super::{
    keyed_lock::KeyedLocks, CommentStore, LikeStore, MergeFn, NotificationStore, PostStore,
    UserDirectory,
};
use crate::{
    error::{AppError, AppResult},
    models::{CommentModel, LikeModel, NotificationModel, PostModel, UserModel},
};
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

/// In-process store, one instance per app. Cloning shares the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    users: Arc<DashMap<String, UserModel>>,
    posts: Arc<DashMap<Uuid, PostModel>>,
    likes: Arc<DashMap<Uuid, LikeModel>>,
    comments: Arc<DashMap<Uuid, CommentModel>>,
    notifications: Arc<DashMap<Uuid, NotificationModel>>,
    notification_locks: KeyedLocks<(String, Uuid)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn find_user(&self, id: &str) -> AppResult<Option<UserModel>> {
        Ok(self.users.get(id).map(|u| u.clone()))
    }

    async fn create_user(&self, user: UserModel) -> AppResult<UserModel> {
        if self.users.contains_key(&user.id) {
            return Err(AppError::Conflict("User already exists".to_string()));
        }
        if self.users.iter().any(|u| u.email == user.email) {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }
        self.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn save_user(&self, user: UserModel) -> AppResult<UserModel> {
        match self.users.get_mut(&user.id) {
            Some(mut existing) => {
                *existing = user.clone();
                Ok(user)
            }
            None => Err(AppError::not_found("User")),
        }
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn find_post(&self, id: Uuid) -> AppResult<Option<PostModel>> {
        Ok(self.posts.get(&id).map(|p| p.clone()))
    }

    async fn save_post(&self, post: PostModel) -> AppResult<PostModel> {
        self.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn adjust_counts(
        &self,
        id: Uuid,
        likes_delta: i32,
        comments_delta: i32,
    ) -> AppResult<PostModel> {
        let mut post = self
            .posts
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("Post"))?;
        post.likes_count = (post.likes_count + likes_delta).max(0);
        post.comments_count = (post.comments_count + comments_delta).max(0);
        post.updated_at = chrono::Utc::now().naive_utc();
        Ok(post.clone())
    }

    async fn list_posts(&self, limit: u64) -> AppResult<Vec<PostModel>> {
        let mut posts: Vec<PostModel> = self.posts.iter().map(|p| p.clone()).collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        posts.truncate(limit as usize);
        Ok(posts)
    }

    async fn delete_post(&self, id: Uuid) -> AppResult<()> {
        self.posts.remove(&id);
        Ok(())
    }

    async fn sync_author(&self, author_id: &str, name: &str, avatar: &str) -> AppResult<u64> {
        let mut touched = 0;
        for mut post in self.posts.iter_mut() {
            if post.author_id == author_id {
                post.author_name = name.to_string();
                post.author_avatar = avatar.to_string();
                touched += 1;
            }
        }
        Ok(touched)
    }
}

#[async_trait]
impl LikeStore for MemoryStore {
    async fn find_like(&self, post_id: Uuid, user_id: &str) -> AppResult<Option<LikeModel>> {
        Ok(self
            .likes
            .iter()
            .find(|l| l.post_id == post_id && l.user_id == user_id)
            .map(|l| l.clone()))
    }

    async fn create_like(&self, like: LikeModel) -> AppResult<LikeModel> {
        if self
            .likes
            .iter()
            .any(|l| l.post_id == like.post_id && l.user_id == like.user_id)
        {
            return Err(AppError::Conflict("Post already liked".to_string()));
        }
        self.likes.insert(like.id, like.clone());
        Ok(like)
    }

    async fn delete_like(&self, id: Uuid) -> AppResult<()> {
        self.likes.remove(&id);
        Ok(())
    }

    async fn liked_post_ids(&self, user_id: &str) -> AppResult<HashSet<Uuid>> {
        Ok(self
            .likes
            .iter()
            .filter(|l| l.user_id == user_id)
            .map(|l| l.post_id)
            .collect())
    }

    async fn delete_by_post(&self, post_id: Uuid) -> AppResult<u64> {
        let before = self.likes.len();
        self.likes.retain(|_, l| l.post_id != post_id);
        Ok((before - self.likes.len()) as u64)
    }
}

#[async_trait]
impl CommentStore for MemoryStore {
    async fn create_comment(&self, comment: CommentModel) -> AppResult<CommentModel> {
        self.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn find_comment(&self, id: Uuid) -> AppResult<Option<CommentModel>> {
        Ok(self.comments.get(&id).map(|c| c.clone()))
    }

    async fn list_by_post(&self, post_id: Uuid, limit: u64) -> AppResult<Vec<CommentModel>> {
        let mut comments: Vec<CommentModel> = self
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .map(|c| c.clone())
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        comments.truncate(limit as usize);
        Ok(comments)
    }

    async fn delete_comment(&self, id: Uuid) -> AppResult<()> {
        self.comments.remove(&id);
        Ok(())
    }

    async fn delete_by_post(&self, post_id: Uuid) -> AppResult<u64> {
        let before = self.comments.len();
        self.comments.retain(|_, c| c.post_id != post_id);
        Ok((before - self.comments.len()) as u64)
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn find_by_recipient_and_reference(
        &self,
        recipient_id: &str,
        reference_id: Uuid,
    ) -> AppResult<Option<NotificationModel>> {
        Ok(self
            .notifications
            .iter()
            .find(|n| n.user_id == recipient_id && n.reference_id == reference_id)
            .map(|n| n.clone()))
    }

    async fn upsert(&self, notification: NotificationModel) -> AppResult<NotificationModel> {
        let duplicate_key = self.notifications.iter().any(|n| {
            n.id != notification.id
                && n.user_id == notification.user_id
                && n.reference_id == notification.reference_id
        });
        if duplicate_key {
            return Err(AppError::Conflict(
                "Notification already exists for this reference".to_string(),
            ));
        }
        self.notifications
            .insert(notification.id, notification.clone());
        Ok(notification)
    }

    async fn merge_and_save(
        &self,
        recipient_id: &str,
        reference_id: Uuid,
        merge: MergeFn<'_>,
    ) -> AppResult<NotificationModel> {
        let _guard = self
            .notification_locks
            .lock((recipient_id.to_string(), reference_id))
            .await;
        let existing = self
            .find_by_recipient_and_reference(recipient_id, reference_id)
            .await?;
        self.upsert(merge(existing)).await
    }

    async fn find_notification(&self, id: Uuid) -> AppResult<Option<NotificationModel>> {
        Ok(self.notifications.get(&id).map(|n| n.clone()))
    }

    async fn list_by_recipient(
        &self,
        recipient_id: &str,
        limit: u64,
    ) -> AppResult<Vec<NotificationModel>> {
        let mut items: Vec<NotificationModel> = self
            .notifications
            .iter()
            .filter(|n| n.user_id == recipient_id)
            .map(|n| n.clone())
            .collect();
        items.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        items.truncate(limit as usize);
        Ok(items)
    }

    async fn count_unread(&self, recipient_id: &str) -> AppResult<u64> {
        Ok(self
            .notifications
            .iter()
            .filter(|n| n.user_id == recipient_id && !n.is_read)
            .count() as u64)
    }

    async fn mark_read(&self, id: Uuid) -> AppResult<()> {
        if let Some(mut n) = self.notifications.get_mut(&id) {
            n.is_read = true;
        }
        Ok(())
    }

    async fn delete_notification(&self, id: Uuid) -> AppResult<()> {
        self.notifications.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::notification::{ActionTypeList, ActorList};

    fn post(author: &str) -> PostModel {
        let now = chrono::Utc::now().naive_utc();
        PostModel {
            id: Uuid::new_v4(),
            author_id: author.to_string(),
            author_name: author.to_string(),
            author_avatar: String::new(),
            body: "Hello".to_string(),
            image_url: String::new(),
            share_state: "public".to_string(),
            likes_count: 0,
            comments_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn notification(recipient: &str, reference_id: Uuid) -> NotificationModel {
        let now = chrono::Utc::now().naive_utc();
        NotificationModel {
            id: Uuid::new_v4(),
            user_id: recipient.to_string(),
            actors: ActorList::default(),
            action_types: ActionTypeList(vec!["like".to_string()]),
            reference_id,
            reference_content: String::new(),
            is_read: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn counters_never_go_negative() {
        let store = MemoryStore::new();
        let p = store.save_post(post("u1")).await.unwrap();
        let updated = store.adjust_counts(p.id, -1, -3).await.unwrap();
        assert_eq!(updated.likes_count, 0);
        assert_eq!(updated.comments_count, 0);
        let updated = store.adjust_counts(p.id, 2, 1).await.unwrap();
        assert_eq!(updated.likes_count, 2);
        assert_eq!(updated.comments_count, 1);
    }

    #[tokio::test]
    async fn adjust_counts_on_missing_post_is_not_found() {
        let store = MemoryStore::new();
        let err = store.adjust_counts(Uuid::new_v4(), 1, 0).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn duplicate_like_conflicts() {
        let store = MemoryStore::new();
        let post_id = Uuid::new_v4();
        let like = LikeModel {
            id: Uuid::new_v4(),
            post_id,
            user_id: "u1".to_string(),
            created_at: chrono::Utc::now().naive_utc(),
        };
        store.create_like(like.clone()).await.unwrap();
        let again = LikeModel {
            id: Uuid::new_v4(),
            ..like
        };
        assert!(matches!(
            store.create_like(again).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn upsert_rejects_second_row_for_same_key() {
        let store = MemoryStore::new();
        let reference = Uuid::new_v4();
        let first = store.upsert(notification("u1", reference)).await.unwrap();

        let mut replaced = first.clone();
        replaced.reference_content = "updated".to_string();
        store.upsert(replaced).await.unwrap();

        assert!(store.upsert(notification("u1", reference)).await.is_err());
        let found = store
            .find_by_recipient_and_reference("u1", reference)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, first.id);
        assert_eq!(found.reference_content, "updated");
    }

    #[tokio::test]
    async fn sync_author_touches_only_that_author() {
        let store = MemoryStore::new();
        store.save_post(post("u1")).await.unwrap();
        store.save_post(post("u1")).await.unwrap();
        store.save_post(post("u2")).await.unwrap();

        let touched = store.sync_author("u1", "Renamed", "a.png").await.unwrap();
        assert_eq!(touched, 2);
        let posts = store.list_posts(10).await.unwrap();
        for p in posts {
            if p.author_id == "u1" {
                assert_eq!(p.author_name, "Renamed");
            } else {
                assert_eq!(p.author_name, "u2");
            }
        }
    }
}
