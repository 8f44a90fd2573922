//! WebSocket streaming API.
//!
//! One authenticated socket joins its account's room in the dispatcher and
//! receives every notification pushed to that account. Clients can also
//! drive read state over the socket.

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade, rejection::WebSocketUpgradeRejection},
    },
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt, stream::SplitSink};
use inkwell_common::AppError;
use inkwell_core::DispatchMessage;
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{extractors::bearer_token, middleware::AppState};

/// Streaming query parameters.
#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    /// Bearer credential, for clients that cannot set headers on the upgrade.
    pub token: Option<String>,
}

/// Client-to-server message.
#[derive(Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", content = "body", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Mark one notification as read.
    MarkRead { id: String },
    /// Mark every notification as read.
    MarkAllRead,
    /// Ask for the current unread count.
    RequestCount,
    /// Keepalive, answered with `pong`.
    Ping,
}

/// WebSocket handler for streaming.
///
/// The credential is checked before the upgrade, so a bad token gets a
/// plain 401 and never joins a room.
pub async fn streaming_handler(
    Query(query): Query<StreamQuery>,
    headers: HeaderMap,
    State(state): State<AppState>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let Some(token) = bearer_token(&headers).or(query.token.as_deref()) else {
        return AppError::Unauthorized.into_response();
    };

    let user = match state.account_service.authenticate_by_token(token).await {
        Ok(user) => user,
        Err(e) => return e.into_response(),
    };

    match ws {
        Ok(ws) => {
            info!(user_id = %user.id, "New streaming connection");
            ws.on_upgrade(move |socket| handle_socket(socket, user.id, state))
        }
        Err(rejection) => rejection.into_response(),
    }
}

/// Handle a WebSocket connection.
async fn handle_socket(socket: WebSocket, user_id: String, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let connection_id = state.dispatcher.register(&user_id, tx).await;

    // Start the client off with the current badge
    if let Ok(count) = state.notification_service.unread_count(&user_id).await
        && send(&mut sender, &DispatchMessage::NotificationCountUpdate { count })
            .await
            .is_err()
    {
        state.dispatcher.unregister(&user_id, connection_id).await;
        return;
    }

    loop {
        tokio::select! {
            // Handle incoming messages from client
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(reply) = handle_client_message(&state, &user_id, &text).await
                            && send(&mut sender, &reply).await.is_err()
                        {
                            break;
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(user_id = %user_id, "Client closed connection");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(error = %e, "WebSocket error");
                        break;
                    }
                }
            }

            // Pushes from the dispatcher
            Some(message) = rx.recv() => {
                if send(&mut sender, &message).await.is_err() {
                    break;
                }
            }
        }
    }

    state.dispatcher.unregister(&user_id, connection_id).await;
    info!(user_id = %user_id, "Streaming connection closed");
}

/// Handle a client message. The reply goes to this connection only.
async fn handle_client_message(
    state: &AppState,
    user_id: &str,
    text: &str,
) -> Option<DispatchMessage> {
    let msg = match serde_json::from_str::<ClientMessage>(text) {
        Ok(msg) => msg,
        Err(e) => {
            debug!(error = %e, "Failed to parse client message");
            return Some(DispatchMessage::Error {
                message: "Unrecognized message".to_string(),
            });
        }
    };

    let service = &state.notification_service;
    let result = match msg {
        ClientMessage::MarkRead { id } => service
            .mark_as_read(user_id, &id)
            .await
            .map(|n| Some(DispatchMessage::NotificationRead { id: n.id })),
        ClientMessage::MarkAllRead => service.mark_all_as_read(user_id).await.map(|updated| {
            // Nothing changed, so no count was pushed to the room
            (updated == 0).then_some(DispatchMessage::NotificationCountUpdate { count: 0 })
        }),
        ClientMessage::RequestCount => service
            .unread_count(user_id)
            .await
            .map(|count| Some(DispatchMessage::NotificationCountUpdate { count })),
        ClientMessage::Ping => Ok(Some(DispatchMessage::Pong)),
    };

    result.unwrap_or_else(|e| {
        Some(DispatchMessage::Error {
            message: e.to_string(),
        })
    })
}

/// Text frame for a message; `None` if it cannot be serialized.
fn encode(message: &DispatchMessage) -> Option<Message> {
    match serde_json::to_string(message) {
        Ok(json) => Some(Message::Text(json.into())),
        Err(e) => {
            tracing::warn!(error = %e, "Dropping unserializable streaming frame");
            None
        }
    }
}

async fn send(
    sender: &mut SplitSink<WebSocket, Message>,
    message: &DispatchMessage,
) -> Result<(), axum::Error> {
    match encode(message) {
        Some(frame) => sender.send(frame).await,
        None => Ok(()),
    }
}
