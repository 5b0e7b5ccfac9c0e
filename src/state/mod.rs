use std::sync::Arc;

use axum::extract::ws::Message;
use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::dao::game_store::GameStore;

/// Cheaply clonable handle to the process-wide application state.
pub type SharedState = Arc<AppState>;

#[derive(Clone)]
/// Handle used to push event frames to one connected participant.
pub struct ClientConnection {
    /// Distinguishes this registration from an earlier one for the same
    /// token, so teardown of a superseded connection cannot evict a newer
    /// registration.
    pub conn_id: Uuid,
    /// Participant token the connection authenticated as.
    pub token: String,
    /// Writer-task channel for outbound frames.
    pub tx: mpsc::UnboundedSender<Message>,
}

/// Central application state storing the persistent-connection registry and
/// the storage handle. Constructed once in `main` and passed by reference to
/// every handler that needs it.
pub struct AppState {
    store: Arc<dyn GameStore>,
    connections: DashMap<String, ClientConnection>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned
    /// cheaply.
    pub fn new(store: Arc<dyn GameStore>) -> SharedState {
        Arc::new(Self {
            store,
            connections: DashMap::new(),
        })
    }

    /// Obtain a handle to the game store.
    pub fn store(&self) -> Arc<dyn GameStore> {
        self.store.clone()
    }

    /// Registry of live participant connections keyed by token.
    pub fn connections(&self) -> &DashMap<String, ClientConnection> {
        &self.connections
    }
}
