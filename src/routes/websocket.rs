use axum::{
    Router,
    extract::{State, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{services::event_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/connect",
    tag = "events",
    responses((status = 101, description = "Switching protocols to WebSocket"))
)]
/// Upgrade the HTTP connection into a participant event stream.
pub async fn ws_handler(
    State(state): State<SharedState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| {
        let resolver_state = state.clone();
        event_service::register_participant(state, socket, move |handshake| {
            resolve_handshake(resolver_state, handshake)
        })
    })
}

/// Parse and validate the two-line `"<token>\n<game_id>"` handshake.
///
/// Accepts the token only when the game exists and the token is either the
/// game's admin token or one of its roster player tokens.
async fn resolve_handshake(state: SharedState, handshake: String) -> Option<String> {
    let mut lines = handshake.lines();
    let token = lines.next().unwrap_or_default();
    let game_id = lines.next().unwrap_or_default();
    if token.is_empty() || game_id.is_empty() {
        warn!("handshake missing token or game id");
        return None;
    }

    let Ok(game_id) = Uuid::parse_str(game_id) else {
        warn!("handshake game id is not a valid uuid");
        return None;
    };

    let game = match state.store().find_game(game_id).await {
        Ok(Some(game)) => game,
        Ok(None) => {
            warn!(%game_id, "handshake for unknown game");
            return None;
        }
        Err(err) => {
            warn!(%game_id, error = %err, "storage error while resolving handshake");
            return None;
        }
    };

    if game.admin_token == token {
        info!(%game_id, "registering admin connection");
        return Some(token.to_string());
    }

    if game.players.iter().any(|player| player.token == token) {
        info!(%game_id, "registering player connection");
        return Some(token.to_string());
    }

    warn!(%game_id, "handshake token matches no participant");
    None
}

/// Configure the WebSocket endpoint.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/connect", get(ws_handler))
}
