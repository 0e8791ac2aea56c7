use crate::{
    error::{AppError, AppResult},
    messages::{self, Language},
    models::{
        notification::{ActionType, ActionTypeList, Actor, ActorList},
        NotificationModel, UserModel,
    },
    services::push::{PushDispatcher, PushError},
    store::{MergeFn, NotificationStore, UserDirectory},
    websocket::hub::NotificationHub,
};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

/// Attempts at a key whose first row another writer created concurrently.
const KEY_CONFLICT_RETRIES: usize = 3;

/// Outcome of one contribution to a notification.
#[derive(Debug)]
pub struct Aggregation {
    pub notification: NotificationModel,
    /// Rendered in the recipient's language.
    pub message: String,
    /// Push outcome. An error here never undoes the stored notification.
    pub delivery: Result<(), PushError>,
}

/// A notification as clients see it, with the message rendered for the
/// requester.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct NotificationView {
    pub id: Uuid,
    pub user_id: String,
    pub actors: Vec<Actor>,
    pub action_types: Vec<String>,
    pub reference_id: Uuid,
    pub reference_content: String,
    pub notification_content: String,
    pub is_read: bool,
    #[schema(value_type = String)]
    pub created_at: NaiveDateTime,
    #[schema(value_type = String)]
    pub updated_at: NaiveDateTime,
}

impl NotificationView {
    pub fn new(model: NotificationModel, notification_content: String) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            actors: model.actors.0,
            action_types: model.action_types.0,
            reference_id: model.reference_id,
            reference_content: model.reference_content,
            notification_content,
            is_read: model.is_read,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Clone)]
pub struct NotificationService {
    users: Arc<dyn UserDirectory>,
    store: Arc<dyn NotificationStore>,
    hub: NotificationHub,
    push: PushDispatcher,
    default_language: Language,
}

impl NotificationService {
    pub fn new(
        users: Arc<dyn UserDirectory>,
        store: Arc<dyn NotificationStore>,
        hub: NotificationHub,
        push: PushDispatcher,
        default_language: Language,
    ) -> Self {
        Self {
            users,
            store,
            hub,
            push,
            default_language,
        }
    }

    /// Fold one action into the recipient's notification for `reference_id`.
    ///
    /// Returns `None` when the actor is the recipient. Lookup and storage
    /// errors abort with nothing written; push errors are reported in
    /// [`Aggregation::delivery`].
    pub async fn aggregate(
        &self,
        recipient_id: &str,
        actor_id: &str,
        action_types: &[ActionType],
        reference_id: Uuid,
        reference_content: &str,
    ) -> AppResult<Option<Aggregation>> {
        if recipient_id == actor_id {
            return Ok(None);
        }
        if action_types.is_empty() {
            return Err(AppError::Validation(
                "at least one action type is required".to_string(),
            ));
        }

        let recipient = self.users.resolve_user(recipient_id).await?;
        let actor = snapshot(&self.users.resolve_user(actor_id).await?);

        let mut attempt = 1;
        let saved = loop {
            let actor = actor.clone();
            let fold: MergeFn<'_> = Box::new(move |existing: Option<NotificationModel>| {
                let now = chrono::Utc::now().naive_utc();
                match existing {
                    Some(current) => merge(current, actor, action_types, reference_content, now),
                    None => create(
                        recipient_id,
                        actor,
                        action_types,
                        reference_id,
                        reference_content,
                        now,
                    ),
                }
            });

            match self
                .store
                .merge_and_save(recipient_id, reference_id, fold)
                .await
            {
                Err(AppError::Conflict(reason)) if attempt < KEY_CONFLICT_RETRIES => {
                    tracing::debug!(
                        recipient = %recipient_id,
                        %reference_id,
                        attempt,
                        "Retrying notification merge: {}",
                        reason
                    );
                    attempt += 1;
                }
                result => break result?,
            }
        };

        tracing::debug!(
            notification_id = %saved.id,
            recipient = %recipient_id,
            actor = %actor_id,
            actors = saved.actor_count(),
            "Notification aggregated"
        );

        let language =
            Language::resolve(Some(recipient.user_lang.as_str()), self.default_language);
        let message = messages::render(&saved, language);

        let view = NotificationView::new(saved.clone(), message.clone());
        match serde_json::to_value(&view) {
            Ok(data) => {
                self.hub.publish(recipient_id, "notification", data);
            }
            Err(e) => tracing::warn!("Failed to serialize notification for hub: {}", e),
        }

        let delivery = self.push.dispatch(&recipient, &saved, &message).await;
        if let Err(e) = &delivery {
            tracing::warn!(
                notification_id = %saved.id,
                recipient = %recipient_id,
                "Push not delivered: {}",
                e
            );
        }

        Ok(Some(Aggregation {
            notification: saved,
            message,
            delivery,
        }))
    }

    pub async fn list_for_user(
        &self,
        user_id: &str,
        limit: u64,
        language: Language,
    ) -> AppResult<Vec<NotificationView>> {
        let items = self.store.list_by_recipient(user_id, limit).await?;
        Ok(items
            .into_iter()
            .map(|n| {
                let content = messages::render(&n, language);
                NotificationView::new(n, content)
            })
            .collect())
    }

    pub async fn unread_count(&self, user_id: &str) -> AppResult<u64> {
        self.store.count_unread(user_id).await
    }

    pub async fn mark_read(&self, id: Uuid, user_id: &str) -> AppResult<()> {
        let existing = self
            .store
            .find_notification(id)
            .await?
            .ok_or_else(|| AppError::not_found("Notification"))?;

        if existing.user_id != user_id {
            return Err(AppError::Forbidden);
        }

        self.store.mark_read(id).await
    }

    /// Owners may delete their own notifications, admins any.
    pub async fn delete(&self, id: Uuid, user_id: &str) -> AppResult<()> {
        let existing = self
            .store
            .find_notification(id)
            .await?
            .ok_or_else(|| AppError::not_found("Notification"))?;

        if existing.user_id != user_id {
            let requester = self.users.resolve_user(user_id).await?;
            if !requester.is_admin() {
                return Err(AppError::Forbidden);
            }
        }

        self.store.delete_notification(id).await?;
        tracing::info!(notification_id = %id, by = %user_id, "Notification deleted");
        Ok(())
    }

    pub fn default_language(&self) -> Language {
        self.default_language
    }
}

fn snapshot(user: &UserModel) -> Actor {
    Actor {
        id: user.id.clone(),
        name: user.username.clone(),
        avatar: user.profile_avatar.clone(),
    }
}

/// Move a matching entry to the end, or append `item` if none matches.
/// A moved entry keeps its original value.
fn move_to_end<T>(list: &mut Vec<T>, item: T, same: impl Fn(&T, &T) -> bool) {
    match list.iter().position(|existing| same(existing, &item)) {
        Some(pos) => {
            let existing = list.remove(pos);
            list.push(existing);
        }
        None => list.push(item),
    }
}

fn apply_actions(list: &mut Vec<String>, action_types: &[ActionType]) {
    for action in action_types {
        move_to_end(list, action.as_str().to_string(), |a, b| a == b);
    }
}

fn create(
    recipient_id: &str,
    actor: Actor,
    action_types: &[ActionType],
    reference_id: Uuid,
    reference_content: &str,
    now: NaiveDateTime,
) -> NotificationModel {
    let mut actions = Vec::with_capacity(action_types.len());
    apply_actions(&mut actions, action_types);

    NotificationModel {
        id: Uuid::new_v4(),
        user_id: recipient_id.to_string(),
        actors: ActorList(vec![actor]),
        action_types: ActionTypeList(actions),
        reference_id,
        reference_content: reference_content.to_string(),
        is_read: false,
        created_at: now,
        updated_at: now,
    }
}

fn merge(
    mut current: NotificationModel,
    actor: Actor,
    action_types: &[ActionType],
    reference_content: &str,
    now: NaiveDateTime,
) -> NotificationModel {
    move_to_end(&mut current.actors.0, actor, |a, b| a.id == b.id);
    apply_actions(&mut current.action_types.0, action_types);
    current.reference_content = reference_content.to_string();
    current.updated_at = now.max(current.created_at);
    current
}
