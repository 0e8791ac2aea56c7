use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt::authenticate;
use crate::websocket::hub::NotificationHub;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, WebSocketUpgrade,
    },
    response::IntoResponse,
    Extension,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;

#[derive(Deserialize)]
pub struct WsQuery {
    pub token: String,
}

/// `GET /ws?token=<access token>`.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    Extension(state): Extension<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = authenticate(&query.token).map_err(|_| AppError::Unauthorized)?;
    state.users.resolve_user(&user_id).await?;

    let hub = state.hub.clone();
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, user_id, hub)))
}

async fn handle_socket(socket: WebSocket, user_id: String, hub: NotificationHub) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (conn_id, mut rx) = hub.subscribe(&user_id);

    tracing::info!(user_id = %user_id, conn_id, "WebSocket connected");

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if ws_sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = ws_receiver.next().await {
            if let Message::Close(_) = msg {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    hub.unsubscribe(&user_id, conn_id);
    tracing::info!(user_id = %user_id, conn_id, "WebSocket disconnected");
}
