use crate::{
    error::{AppError, AppResult},
    models::UserModel,
    state::AppState,
    store::{PostStore, UserDirectory},
};
use std::sync::Arc;

/// Profile as delivered by the OAuth provider on login.
#[derive(Debug, Clone, Default)]
pub struct OAuthProfile {
    pub id: String,
    pub username: String,
    pub email: String,
    pub profile_avatar: String,
    pub push_token: Option<String>,
    pub user_lang: Option<String>,
}

/// Fields of a stored user that differ from a fresh login profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub username: Option<String>,
    pub profile_avatar: Option<String>,
}

impl UserChanges {
    pub fn between(existing: &UserModel, profile: &OAuthProfile) -> Self {
        Self {
            username: (existing.username != profile.username).then(|| profile.username.clone()),
            profile_avatar: (existing.profile_avatar != profile.profile_avatar)
                .then(|| profile.profile_avatar.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.profile_avatar.is_none()
    }

    pub fn apply(self, user: &mut UserModel) {
        if let Some(username) = self.username {
            user.username = username;
        }
        if let Some(avatar) = self.profile_avatar {
            user.profile_avatar = avatar;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    Created,
    Updated,
    Unchanged,
}

pub struct UserService {
    users: Arc<dyn UserDirectory>,
    posts: Arc<dyn PostStore>,
}

impl UserService {
    pub fn new(state: &AppState) -> Self {
        Self {
            users: state.users.clone(),
            posts: state.posts.clone(),
        }
    }

    /// Create the user on first login; afterwards keep name and avatar in
    /// sync with the provider, including the copies on the user's posts.
    pub async fn login(&self, profile: OAuthProfile) -> AppResult<(UserModel, LoginOutcome)> {
        if profile.id.trim().is_empty() {
            return Err(AppError::Validation("id is required".to_string()));
        }

        let now = chrono::Utc::now().naive_utc();

        let Some(mut user) = self.users.find_user(&profile.id).await? else {
            let user = self
                .users
                .create_user(UserModel {
                    id: profile.id,
                    username: profile.username,
                    email: profile.email,
                    profile_avatar: profile.profile_avatar,
                    profile_cover: String::new(),
                    bio: String::new(),
                    push_token: profile.push_token.unwrap_or_default(),
                    user_lang: profile.user_lang.unwrap_or_default(),
                    status: "active".to_string(),
                    role: "user".to_string(),
                    created_at: now,
                    updated_at: now,
                })
                .await?;
            tracing::info!(user_id = %user.id, "User registered");
            return Ok((user, LoginOutcome::Created));
        };

        let changes = UserChanges::between(&user, &profile);
        let profile_changed = !changes.is_empty();
        changes.apply(&mut user);

        let mut dirty = profile_changed;
        if let Some(token) = profile.push_token.filter(|t| *t != user.push_token) {
            user.push_token = token;
            dirty = true;
        }
        if let Some(lang) = profile.user_lang.filter(|l| *l != user.user_lang) {
            user.user_lang = lang;
            dirty = true;
        }

        if !dirty {
            return Ok((user, LoginOutcome::Unchanged));
        }

        user.updated_at = now;
        let user = self.users.save_user(user).await?;

        if profile_changed {
            let touched = self
                .posts
                .sync_author(&user.id, &user.username, &user.profile_avatar)
                .await?;
            tracing::info!(user_id = %user.id, posts = touched, "Author snapshot synced");
        }

        Ok((user, LoginOutcome::Updated))
    }

    pub async fn get(&self, id: &str) -> AppResult<UserModel> {
        self.users.resolve_user(id).await
    }

    /// An empty token unregisters the device.
    pub async fn update_push_token(&self, id: &str, push_token: &str) -> AppResult<UserModel> {
        let mut user = self.users.resolve_user(id).await?;
        user.push_token = push_token.trim().to_string();
        user.updated_at = chrono::Utc::now().naive_utc();
        self.users.save_user(user).await
    }
}
