use crate::{
    config::notification::NotificationConfig,
    services::{
        notification::NotificationService,
        push::{PushDispatcher, PushTransport},
    },
    store::{
        CommentStore, LikeStore, MemoryStore, NotificationStore, PgStore, PostStore,
        UserDirectory,
    },
    websocket::hub::NotificationHub,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// Shared handles passed to every handler as an `Extension`.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserDirectory>,
    pub posts: Arc<dyn PostStore>,
    pub likes: Arc<dyn LikeStore>,
    pub comments: Arc<dyn CommentStore>,
    pub notifications: NotificationService,
    pub hub: NotificationHub,
    /// Present only with the Postgres backend.
    pub db: Option<DatabaseConnection>,
}

impl AppState {
    pub fn with_store<S>(
        store: S,
        transport: Arc<dyn PushTransport>,
        config: NotificationConfig,
    ) -> Self
    where
        S: UserDirectory + PostStore + LikeStore + CommentStore + NotificationStore + Clone + 'static,
    {
        let users: Arc<dyn UserDirectory> = Arc::new(store.clone());
        let notification_store: Arc<dyn NotificationStore> = Arc::new(store.clone());
        let hub = NotificationHub::new();
        let notifications = NotificationService::new(
            users.clone(),
            notification_store,
            hub.clone(),
            PushDispatcher::new(transport),
            config.default_language,
        );

        Self {
            users,
            posts: Arc::new(store.clone()),
            likes: Arc::new(store.clone()),
            comments: Arc::new(store),
            notifications,
            hub,
            db: None,
        }
    }

    pub fn in_memory(transport: Arc<dyn PushTransport>, config: NotificationConfig) -> Self {
        Self::with_store(MemoryStore::new(), transport, config)
    }

    pub fn postgres(
        db: DatabaseConnection,
        transport: Arc<dyn PushTransport>,
        config: NotificationConfig,
    ) -> Self {
        let mut state = Self::with_store(PgStore::new(db.clone()), transport, config);
        state.db = Some(db);
        state
    }
}
