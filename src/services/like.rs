use crate::{
    error::{AppError, AppResult},
    models::{notification::ActionType, LikeModel},
    services::notification::NotificationService,
    state::AppState,
    store::{LikeStore, PostStore, UserDirectory},
};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct LikeToggle {
    pub liked: bool,
    pub likes_count: i32,
}

pub struct LikeService {
    users: Arc<dyn UserDirectory>,
    posts: Arc<dyn PostStore>,
    likes: Arc<dyn LikeStore>,
    notifications: NotificationService,
}

impl LikeService {
    pub fn new(state: &AppState) -> Self {
        Self {
            users: state.users.clone(),
            posts: state.posts.clone(),
            likes: state.likes.clone(),
            notifications: state.notifications.clone(),
        }
    }

    /// Like the post, or remove an existing like.
    ///
    /// Unliking leaves the author's notification untouched.
    pub async fn toggle(&self, post_id: Uuid, user_id: &str) -> AppResult<LikeToggle> {
        let post = self.posts.get_post(post_id).await?;

        if let Some(existing) = self.likes.find_like(post_id, user_id).await? {
            self.likes.delete_like(existing.id).await?;
            let updated = self.posts.adjust_counts(post_id, -1, 0).await?;
            return Ok(LikeToggle {
                liked: false,
                likes_count: updated.likes_count,
            });
        }

        let notify = post.author_id != user_id;
        if notify {
            // Both ends of the notification must exist before the like is stored.
            self.users.resolve_user(&post.author_id).await?;
            self.users.resolve_user(user_id).await?;
        }

        let like = LikeModel {
            id: Uuid::new_v4(),
            post_id,
            user_id: user_id.to_string(),
            created_at: chrono::Utc::now().naive_utc(),
        };
        match self.likes.create_like(like).await {
            Ok(_) => {}
            // A concurrent request from the same user won the insert.
            Err(AppError::Conflict(_)) => {
                return Ok(LikeToggle {
                    liked: true,
                    likes_count: self.posts.get_post(post_id).await?.likes_count,
                })
            }
            Err(e) => return Err(e),
        }
        let updated = self.posts.adjust_counts(post_id, 1, 0).await?;

        if notify {
            self.notifications
                .aggregate(
                    &post.author_id,
                    user_id,
                    &[ActionType::Like],
                    post.id,
                    &post.body,
                )
                .await?;
        }

        Ok(LikeToggle {
            liked: true,
            likes_count: updated.likes_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::notification::NotificationConfig;
    use crate::models::{PostModel, UserModel};
    use crate::services::push::DisabledTransport;

    fn user(id: &str) -> UserModel {
        let now = chrono::Utc::now().naive_utc();
        UserModel {
            id: id.to_string(),
            username: id.to_string(),
            email: format!("{id}@example.com"),
            profile_avatar: String::new(),
            profile_cover: String::new(),
            bio: String::new(),
            push_token: String::new(),
            user_lang: "en".to_string(),
            status: "active".to_string(),
            role: "user".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    async fn setup() -> (AppState, PostModel) {
        let state =
            AppState::in_memory(Arc::new(DisabledTransport), NotificationConfig::default());
        for id in ["author", "fan"] {
            state.users.create_user(user(id)).await.unwrap();
        }
        let now = chrono::Utc::now().naive_utc();
        let post = state
            .posts
            .save_post(PostModel {
                id: Uuid::new_v4(),
                author_id: "author".to_string(),
                author_name: "author".to_string(),
                author_avatar: String::new(),
                body: "Hello".to_string(),
                image_url: String::new(),
                share_state: "public".to_string(),
                likes_count: 0,
                comments_count: 0,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
        (state, post)
    }

    #[tokio::test]
    async fn like_notifies_author() {
        let (state, post) = setup().await;
        let result = LikeService::new(&state).toggle(post.id, "fan").await.unwrap();
        assert!(result.liked);
        assert_eq!(result.likes_count, 1);

        let items = state
            .notifications
            .list_for_user("author", 10, Default::default())
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].action_types, ["like"]);
        assert_eq!(items[0].reference_content, "Hello");
    }

    #[tokio::test]
    async fn unlike_keeps_notification_history() {
        let (state, post) = setup().await;
        let service = LikeService::new(&state);
        service.toggle(post.id, "fan").await.unwrap();
        let result = service.toggle(post.id, "fan").await.unwrap();

        assert!(!result.liked);
        assert_eq!(result.likes_count, 0);
        let items = state
            .notifications
            .list_for_user("author", 10, Default::default())
            .await
            .unwrap();
        assert_eq!(items[0].action_types, ["like"]);
    }

    #[tokio::test]
    async fn self_like_does_not_notify() {
        let (state, post) = setup().await;
        let result = LikeService::new(&state).toggle(post.id, "author").await.unwrap();
        assert!(result.liked);
        assert_eq!(state.notifications.unread_count("author").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn deleted_author_rejects_like_without_writing() {
        let (state, _) = setup().await;
        let now = chrono::Utc::now().naive_utc();
        let orphan = state
            .posts
            .save_post(PostModel {
                id: Uuid::new_v4(),
                author_id: "gone".to_string(),
                author_name: "gone".to_string(),
                author_avatar: String::new(),
                body: "Orphan".to_string(),
                image_url: String::new(),
                share_state: "public".to_string(),
                likes_count: 0,
                comments_count: 0,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();

        let err = LikeService::new(&state)
            .toggle(orphan.id, "fan")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(state.likes.find_like(orphan.id, "fan").await.unwrap().is_none());
        assert_eq!(state.posts.get_post(orphan.id).await.unwrap().likes_count, 0);
    }

    #[tokio::test]
    async fn missing_post() {
        let (state, _) = setup().await;
        let err = LikeService::new(&state)
            .toggle(Uuid::new_v4(), "fan")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
