use crate::{
    error::{AppError, AppResult},
    models::{
        comment::{MentionedUser, MentionedUsers},
        notification::ActionType,
        CommentModel,
    },
    services::notification::NotificationService,
    state::AppState,
    store::{CommentStore, PostStore, UserDirectory},
};
use std::sync::Arc;
use uuid::Uuid;

pub struct CommentService {
    users: Arc<dyn UserDirectory>,
    posts: Arc<dyn PostStore>,
    comments: Arc<dyn CommentStore>,
    notifications: NotificationService,
}

impl CommentService {
    pub fn new(state: &AppState) -> Self {
        Self {
            users: state.users.clone(),
            posts: state.posts.clone(),
            comments: state.comments.clone(),
            notifications: state.notifications.clone(),
        }
    }

    /// Store a comment and notify.
    ///
    /// With a mention, only the mentioned user is notified, even when that
    /// leaves the post author without a comment notification. Without one,
    /// the post author is notified.
    pub async fn create(
        &self,
        post_id: Uuid,
        user_id: &str,
        content: &str,
        mentioned_users: Vec<MentionedUser>,
    ) -> AppResult<CommentModel> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::Validation(
                "Comment content cannot be empty".to_string(),
            ));
        }

        let post = self.posts.get_post(post_id).await?;
        let author = self.users.resolve_user(user_id).await?;

        let mentions = MentionedUsers(
            mentioned_users
                .into_iter()
                .filter(|m| !m.user_id.trim().is_empty())
                .collect(),
        );
        let target = match mentions.primary() {
            Some(m) => Some((m.user_id.clone(), ActionType::Mention)),
            None => Some((post.author_id.clone(), ActionType::Comment)),
        }
        .filter(|(recipient, _)| recipient != user_id);

        // An unknown recipient must fail the request before anything is written.
        if let Some((recipient, _)) = &target {
            self.users.resolve_user(recipient).await?;
        }

        let now = chrono::Utc::now().naive_utc();
        let comment = self
            .comments
            .create_comment(CommentModel {
                id: Uuid::new_v4(),
                post_id,
                user_id: user_id.to_string(),
                author_name: author.username,
                author_avatar: author.profile_avatar,
                content: content.to_string(),
                mentioned_users: mentions,
                created_at: now,
                updated_at: now,
            })
            .await?;

        self.posts.adjust_counts(post_id, 0, 1).await?;

        if let Some((recipient, action)) = target {
            self.notifications
                .aggregate(&recipient, user_id, &[action], post_id, &comment.content)
                .await?;
        }

        tracing::debug!(comment_id = %comment.id, post_id = %post_id, "Comment created");
        Ok(comment)
    }

    /// Oldest first.
    pub async fn list_by_post(&self, post_id: Uuid, limit: u64) -> AppResult<Vec<CommentModel>> {
        if limit == 0 {
            return Err(AppError::Validation(
                "limit must be greater than zero".to_string(),
            ));
        }
        self.posts.get_post(post_id).await?;
        self.comments.list_by_post(post_id, limit).await
    }

    /// Only the comment's author may delete it.
    pub async fn delete(&self, comment_id: Uuid, user_id: &str) -> AppResult<()> {
        let comment = self
            .comments
            .find_comment(comment_id)
            .await?
            .ok_or_else(|| AppError::not_found("Comment"))?;

        if comment.user_id != user_id {
            return Err(AppError::Forbidden);
        }

        self.comments.delete_comment(comment_id).await?;
        match self.posts.adjust_counts(comment.post_id, 0, -1).await {
            Ok(_) | Err(AppError::NotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }
}
