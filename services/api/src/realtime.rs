//! Realtime push channel: connection registry and websocket endpoint
//!
//! Each connected client gets a bounded mpsc queue; the registry maps a
//! user identity to that queue's sender. Pushes are best-effort: a full
//! queue or a gone client just drops the event, the durable notification
//! row remains for pull.

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tracing::info;
use uuid::Uuid;

use crate::models::notification::{Notification, NotificationKind};
use crate::state::AppState;

/// Outbound queue depth per connected client
const PUSH_BUFFER: usize = 32;

/// Server → client push events
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum PushEvent {
    /// A new notification for the connected user. Broadcast pushes are
    /// synthesized before per-user rows exist, so the id may be absent.
    Notification {
        id: Option<Uuid>,
        #[serde(rename = "type")]
        kind: NotificationKind,
        title: String,
        message: String,
        resource_id: Option<Uuid>,
        read: bool,
        created_at: DateTime<Utc>,
    },
}

impl From<Notification> for PushEvent {
    fn from(notification: Notification) -> Self {
        Self::Notification {
            id: Some(notification.id),
            kind: notification.kind,
            title: notification.title,
            message: notification.message,
            resource_id: notification.resource_id,
            read: notification.read,
            created_at: notification.created_at,
        }
    }
}

/// Client → server events on the push channel
#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
enum ClientEvent {
    /// First message after connect: announces the caller's bearer token
    Identify { token: String },
}

/// Registry of currently-connected users and their push handles
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    entries: Arc<Mutex<HashMap<Uuid, mpsc::Sender<PushEvent>>>>,
}

impl ConnectionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a user's push handle; an existing handle is replaced, so the
    /// most recent connection wins
    pub async fn bind(&self, user_id: Uuid, sender: mpsc::Sender<PushEvent>) {
        self.entries.lock().await.insert(user_id, sender);
    }

    /// Remove the entry holding this handle, wherever it is bound
    pub async fn unbind(&self, sender: &mpsc::Sender<PushEvent>) {
        self.entries
            .lock()
            .await
            .retain(|_, bound| !bound.same_channel(sender));
    }

    /// Push handle for a user, if one is connected
    pub async fn lookup(&self, user_id: Uuid) -> Option<mpsc::Sender<PushEvent>> {
        self.entries.lock().await.get(&user_id).cloned()
    }

    /// Snapshot of currently-connected identities and their handles
    pub async fn connected(&self) -> Vec<(Uuid, mpsc::Sender<PushEvent>)> {
        self.entries
            .lock()
            .await
            .iter()
            .map(|(user_id, sender)| (*user_id, sender.clone()))
            .collect()
    }
}

/// Websocket endpoint for the realtime notification feed
pub async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sink, mut stream) = socket.split();

    // The client must identify itself before any pushes flow. A raw token
    // is tolerated alongside the structured identify event.
    let user_id = loop {
        match stream.next().await {
            Some(Ok(Message::Text(text))) => {
                let token = match serde_json::from_str::<ClientEvent>(&text) {
                    Ok(ClientEvent::Identify { token }) => token,
                    Err(_) => text.trim().to_string(),
                };
                match state.sessions.resolve(&token).await {
                    Some(id) => break id,
                    None => {
                        let _ = sink.send(Message::Close(None)).await;
                        return;
                    }
                }
            }
            Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return,
            Some(Ok(_)) => continue,
        }
    };

    let (tx, mut rx) = mpsc::channel::<PushEvent>(PUSH_BUFFER);
    state.registry.bind(user_id, tx.clone()).await;
    info!("User {} connected to the push channel", user_id);

    // Forward queued events until either side goes away
    let forward = async {
        while let Some(event) = rx.recv().await {
            let Ok(payload) = serde_json::to_string(&event) else {
                continue;
            };
            if sink.send(Message::Text(payload)).await.is_err() {
                break;
            }
        }
    };

    // Drain the client side so close frames are observed
    let drain = async {
        while let Some(Ok(message)) = stream.next().await {
            if matches!(message, Message::Close(_)) {
                break;
            }
        }
    };

    tokio::select! {
        () = forward => {}
        () = drain => {}
    }

    state.registry.unbind(&tx).await;
    info!("User {} disconnected from the push channel", user_id);
}
