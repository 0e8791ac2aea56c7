use crate::{
    config::push::PushConfig,
    models::{NotificationModel, UserModel},
};
use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client,
};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PushError {
    #[error("recipient has no registered device token")]
    NoDeviceToken,

    #[error("push transport failed: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PushData {
    pub reference_id: Uuid,
}

/// Expo push message body.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PushPayload {
    pub to: String,
    pub title: String,
    pub body: String,
    pub data: PushData,
    pub sound: String,
}

#[async_trait]
pub trait PushTransport: Send + Sync {
    async fn send(&self, token: &str, payload: &PushPayload) -> Result<(), PushError>;
}

/// Sends through the Expo push HTTP API.
pub struct ExpoTransport {
    client: Client,
    endpoint: String,
}

impl ExpoTransport {
    pub fn new(config: &PushConfig) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = &config.access_token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| anyhow::anyhow!("invalid PUSH_ACCESS_TOKEN: {}", e))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[async_trait]
impl PushTransport for ExpoTransport {
    async fn send(&self, _token: &str, payload: &PushPayload) -> Result<(), PushError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(payload)
            .send()
            .await
            .map_err(|e| PushError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PushError::Transport(format!("{}: {}", status, body)));
        }

        Ok(())
    }
}

/// Used when `PUSH_ENABLED=false`. Accepts everything.
pub struct DisabledTransport;

#[async_trait]
impl PushTransport for DisabledTransport {
    async fn send(&self, token: &str, payload: &PushPayload) -> Result<(), PushError> {
        tracing::debug!(
            token_len = token.len(),
            reference_id = %payload.data.reference_id,
            "Push disabled, dropping message"
        );
        Ok(())
    }
}

pub fn transport_from_config(config: &PushConfig) -> anyhow::Result<Arc<dyn PushTransport>> {
    if config.enabled {
        Ok(Arc::new(ExpoTransport::new(config)?))
    } else {
        Ok(Arc::new(DisabledTransport))
    }
}

#[derive(Clone)]
pub struct PushDispatcher {
    transport: Arc<dyn PushTransport>,
}

impl PushDispatcher {
    pub fn new(transport: Arc<dyn PushTransport>) -> Self {
        Self { transport }
    }

    /// Send `message` to the recipient's device. The caller has already
    /// loaded the recipient, so no storage is touched here.
    pub async fn dispatch(
        &self,
        recipient: &UserModel,
        notification: &NotificationModel,
        message: &str,
    ) -> Result<(), PushError> {
        if !recipient.has_push_token() {
            return Err(PushError::NoDeviceToken);
        }

        let payload = build_payload(&recipient.push_token, notification, message);
        self.transport.send(&recipient.push_token, &payload).await
    }
}

fn build_payload(token: &str, notification: &NotificationModel, message: &str) -> PushPayload {
    PushPayload {
        to: token.to_string(),
        title: notification
            .last_actor()
            .map(|a| a.name.clone())
            .unwrap_or_default(),
        body: message.to_string(),
        data: PushData {
            reference_id: notification.reference_id,
        },
        sound: "default".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::notification::{ActionTypeList, Actor, ActorList};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording {
        sent: Mutex<Vec<PushPayload>>,
    }

    #[async_trait]
    impl PushTransport for Recording {
        async fn send(&self, _token: &str, payload: &PushPayload) -> Result<(), PushError> {
            self.sent.lock().unwrap().push(payload.clone());
            Ok(())
        }
    }

    fn user(id: &str, push_token: &str) -> UserModel {
        let now = chrono::Utc::now().naive_utc();
        UserModel {
            id: id.to_string(),
            username: id.to_string(),
            email: format!("{id}@example.com"),
            profile_avatar: String::new(),
            profile_cover: String::new(),
            bio: String::new(),
            push_token: push_token.to_string(),
            user_lang: "en".to_string(),
            status: "active".to_string(),
            role: "user".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    fn notification() -> NotificationModel {
        let now = chrono::Utc::now().naive_utc();
        NotificationModel {
            id: Uuid::new_v4(),
            user_id: "u".to_string(),
            actors: ActorList(vec![
                Actor {
                    id: "a".to_string(),
                    name: "Ann".to_string(),
                    avatar: String::new(),
                },
                Actor {
                    id: "b".to_string(),
                    name: "Bob".to_string(),
                    avatar: String::new(),
                },
            ]),
            action_types: ActionTypeList(vec!["like".to_string()]),
            reference_id: Uuid::new_v4(),
            reference_content: "Hello".to_string(),
            is_read: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn payload_uses_last_actor_as_title() {
        let transport = Arc::new(Recording::default());
        let dispatcher = PushDispatcher::new(transport.clone());

        let n = notification();
        dispatcher
            .dispatch(&user("u", "ExponentPushToken[x]"), &n, "msg")
            .await
            .unwrap();

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ExponentPushToken[x]");
        assert_eq!(sent[0].title, "Bob");
        assert_eq!(sent[0].body, "msg");
        assert_eq!(sent[0].data.reference_id, n.reference_id);
    }

    #[tokio::test]
    async fn missing_token_fails_fast() {
        let transport = Arc::new(Recording::default());
        let dispatcher = PushDispatcher::new(transport.clone());

        let err = dispatcher
            .dispatch(&user("u", "  "), &notification(), "m")
            .await
            .unwrap_err();
        assert_eq!(err, PushError::NoDeviceToken);
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn disabled_transport_accepts() {
        let dispatcher = PushDispatcher::new(Arc::new(DisabledTransport));
        dispatcher
            .dispatch(&user("u", "ExponentPushToken[x]"), &notification(), "m")
            .await
            .unwrap();
    }

    #[test]
    fn payload_serializes_for_expo() {
        let n = notification();
        let json = serde_json::to_value(build_payload("tok", &n, "body")).unwrap();
        assert_eq!(json["to"], "tok");
        assert_eq!(json["sound"], "default");
        assert_eq!(json["data"]["reference_id"], n.reference_id.to_string());
    }
}
