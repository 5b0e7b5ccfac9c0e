use axum::{Json, Router, extract::State, routing::post};
use validator::Validate;

use crate::{
    dto::game::{CreateGameRequest, CreateGameResponse, JoinGameRequest, JoinGameResponse},
    error::AppError,
    routes::auth::AdminIdentity,
    services::game_service,
    state::SharedState,
};

/// Routes handling game bootstrap operations (creation & joining).
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/create_game", post(create_game))
        .route("/join_game", post(join_game))
}

/// Create a fresh game owned by the calling admin.
#[utoipa::path(
    post,
    path = "/create_game",
    tag = "game",
    request_body = CreateGameRequest,
    responses(
        (status = 200, description = "Game created", body = CreateGameResponse)
    )
)]
pub async fn create_game(
    State(state): State<SharedState>,
    AdminIdentity(creator): AdminIdentity,
    Json(payload): Json<CreateGameRequest>,
) -> Result<Json<CreateGameResponse>, AppError> {
    payload.validate()?;
    let response = game_service::create_game(&state, &creator, payload).await?;
    Ok(Json(response))
}

/// Enter a game by join code.
#[utoipa::path(
    post,
    path = "/join_game",
    tag = "game",
    request_body = JoinGameRequest,
    responses(
        (status = 200, description = "Joined the game", body = JoinGameResponse)
    )
)]
pub async fn join_game(
    State(state): State<SharedState>,
    Json(payload): Json<JoinGameRequest>,
) -> Result<Json<JoinGameResponse>, AppError> {
    payload.validate()?;
    let response = game_service::join_game(&state, payload).await?;
    Ok(Json(response))
}
