//! Persistent-connection registry and event fan-out.
//!
//! Each accepted WebSocket is bound 1:1 to a participant token after a single
//! handshake message. Deliveries are best-effort and at-most-once: a missing
//! or dead connection drops the event with a warning, there is no queue and
//! no retry.

use std::future::Future;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::{sync::mpsc, task::JoinHandle, time::timeout};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dto::ws::{EventFrame, GameOverEvent, PlayerJoinedEvent, QuestionSentEvent, RoundFinishedEvent},
    state::{ClientConnection, SharedState},
};

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Handle the full lifecycle of one participant connection.
///
/// Waits for exactly one inbound handshake frame and passes its raw payload
/// to `resolver`, which returns the token to trust or `None` to reject. On
/// rejection the socket is closed without registering anything. On acceptance
/// the token maps to this connection until the peer goes away; a later
/// handshake for the same token supersedes this registration.
pub async fn register_participant<F, Fut>(state: SharedState, socket: WebSocket, resolver: F)
where
    F: FnOnce(String) -> Fut + Send,
    Fut: Future<Output = Option<String>> + Send,
{
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound events flowing even while we await
    // inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let handshake = match timeout(HANDSHAKE_TIMEOUT, receiver.next()).await {
        Ok(Some(Ok(Message::Text(text)))) => text.to_string(),
        Ok(Some(Ok(Message::Close(_)))) => {
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(Some(Ok(_))) => {
            warn!("first frame was not a text handshake");
            let _ = outbound_tx.send(Message::Close(None));
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(Some(Err(err))) => {
            warn!(error = %err, "websocket receive error during handshake");
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(None) | Err(_) => {
            warn!("websocket handshake timed out");
            finalize(writer_task, outbound_tx).await;
            return;
        }
    };

    let Some(token) = resolver(handshake).await else {
        warn!("handshake rejected, closing connection");
        let _ = outbound_tx.send(Message::Close(None));
        finalize(writer_task, outbound_tx).await;
        return;
    };

    let conn_id = Uuid::new_v4();
    state.connections().insert(
        token.clone(),
        ClientConnection {
            conn_id,
            token: token.clone(),
            tx: outbound_tx.clone(),
        },
    );
    info!(token = %token, "participant registered");

    // Registered connections only receive server events; inbound frames are
    // drained until the peer goes away.
    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Ping(payload)) => {
                let _ = outbound_tx.send(Message::Pong(payload));
            }
            Ok(Message::Close(frame)) => {
                info!(token = %token, "participant closed connection");
                let _ = outbound_tx.send(Message::Close(frame));
                break;
            }
            Ok(_) => {}
            Err(err) => {
                warn!(token = %token, error = %err, "websocket error");
                break;
            }
        }
    }

    unregister(&state, &token, conn_id);
    finalize(writer_task, outbound_tx).await;
}

/// Remove a registration on teardown; idempotent.
///
/// Removal is keyed on the connection id so that a connection superseded by a
/// later handshake never evicts its successor.
fn unregister(state: &SharedState, token: &str, conn_id: Uuid) {
    match state
        .connections()
        .remove_if(token, |_, connection| connection.conn_id == conn_id)
    {
        Some(_) => info!(token = %token, "participant disconnected"),
        None => warn!(token = %token, "connection already unregistered"),
    }
}

/// Tell the game admin that a player joined.
pub fn notify_player_joined(state: &SharedState, admin_token: &str, username: &str) {
    send_event(
        state,
        admin_token,
        &EventFrame::PlayerJoined(PlayerJoinedEvent {
            username: username.to_string(),
        }),
    );
}

/// Push a freshly published question to one player.
pub fn notify_question(state: &SharedState, token: &str, event: QuestionSentEvent) {
    send_event(state, token, &EventFrame::QuestionSent(event));
}

/// Push a round outcome to one surviving player.
pub fn notify_round_finished(state: &SharedState, token: &str, event: RoundFinishedEvent) {
    send_event(state, token, &EventFrame::RoundFinished(event));
}

/// Push a final standing to a player whose game is over.
pub fn notify_game_over(state: &SharedState, token: &str, event: GameOverEvent) {
    send_event(state, token, &EventFrame::GameOver(event));
}

/// Serialize an event frame and push it to the token's connection, if any.
///
/// Failures are logged and swallowed: delivery is not guaranteed, and an
/// offline participant simply misses the event.
fn send_event(state: &SharedState, token: &str, frame: &EventFrame) {
    let Some(connection) = state.connections().get(token) else {
        warn!(token = %token, "no live connection for token, dropping event");
        return;
    };
    let tx = connection.tx.clone();
    drop(connection);

    let payload = match serde_json::to_string(frame) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(error = %err, "failed to serialize event frame");
            return;
        }
    };

    if tx.send(Message::Text(payload.into())).is_err() {
        warn!(token = %token, "event send failed, connection writer gone");
    }
}

/// Ensure the writer task winds down before we return from the socket handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}
