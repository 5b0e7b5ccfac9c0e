//! Game bootstrap operations: creation by an admin and joining by code.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::Rng;
use tracing::info;
use uuid::Uuid;

use crate::{
    dao::models::{GameEntity, PlayerEntity},
    dto::game::{CreateGameRequest, CreateGameResponse, JoinGameRequest, JoinGameResponse},
    error::ServiceError,
    services::event_service,
    state::SharedState,
};

const JOIN_CODE_DIGITS: usize = 6;
const JOIN_CODE_ATTEMPTS: usize = 16;
const TOKEN_BYTES: usize = 64;

/// Create a fresh game owned by `creator` and hand back its admin token.
pub async fn create_game(
    state: &SharedState,
    creator: &str,
    request: CreateGameRequest,
) -> Result<CreateGameResponse, ServiceError> {
    let store = state.store();

    let code = allocate_join_code(state).await?;
    let admin_token = issue_token();

    let game = GameEntity {
        id: Uuid::new_v4(),
        code,
        template_id: request.template_id,
        admin_token: admin_token.clone(),
        sign_up_blocked: false,
        players: Vec::new(),
        created_by: creator.to_string(),
    };

    info!(game_id = %game.id, code = %game.code, "creating game");
    store.create_game(game.clone()).await?;

    Ok(CreateGameResponse {
        game_id: game.id,
        token: admin_token,
    })
}

/// Enter a game by join code, reserving a username on its roster.
pub async fn join_game(
    state: &SharedState,
    request: JoinGameRequest,
) -> Result<JoinGameResponse, ServiceError> {
    let store = state.store();

    let Some(game) = store.find_game_by_code(&request.code).await? else {
        return Err(ServiceError::NotFound("Game not found".into()));
    };

    if game.sign_up_blocked {
        return Err(ServiceError::Forbidden("Sign up blocked".into()));
    }

    let wanted = normalized_username(&request.username);
    if game
        .players
        .iter()
        .any(|player| normalized_username(&player.username) == wanted)
    {
        return Err(ServiceError::Forbidden("Username already taken".into()));
    }

    let token = issue_token();
    store
        .add_player(
            game.id,
            PlayerEntity {
                username: request.username.clone(),
                token: token.clone(),
            },
        )
        .await?;

    info!(game_id = %game.id, username = %request.username, "player joined game");
    event_service::notify_player_joined(state, &game.admin_token, &request.username);

    Ok(JoinGameResponse {
        game_id: game.id,
        token,
    })
}

/// Draw a join code that no stored game currently uses.
async fn allocate_join_code(state: &SharedState) -> Result<String, ServiceError> {
    let store = state.store();
    for _ in 0..JOIN_CODE_ATTEMPTS {
        let code = random_join_code();
        if store.find_game_by_code(&code).await?.is_none() {
            return Ok(code);
        }
    }

    Err(ServiceError::Internal(
        "could not allocate an unused join code".into(),
    ))
}

fn random_join_code() -> String {
    let mut rng = rand::rng();
    (0..JOIN_CODE_DIGITS)
        .map(|_| char::from(b'0' + rng.random_range(0..10)))
        .collect()
}

/// Mint an opaque participant secret.
fn issue_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill(&mut bytes[..]);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Usernames collide case- and surrounding-whitespace-insensitively.
fn normalized_username(username: &str) -> String {
    username.trim().to_lowercase()
}
