use axum::{Json, Router, extract::State, routing::post};
use validator::Validate;

use crate::{
    dto::round::{
        FinishGameRequest, FinishGameResponse, FinishRoundRequest, FinishRoundResponse,
        SendAnswerRequest, SendAnswerResponse, SendQuestionRequest, SendQuestionResponse,
    },
    error::AppError,
    routes::auth::AdminIdentity,
    services::round_service,
    state::SharedState,
};

/// Routes handling the round lifecycle and the two finalisation operations.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/send_question", post(send_question))
        .route("/send_answer", post(send_answer))
        .route("/finish_round", post(finish_round))
        .route("/finish_game", post(finish_game))
}

/// Publish a question, opening a new round.
#[utoipa::path(
    post,
    path = "/send_question",
    tag = "round",
    request_body = SendQuestionRequest,
    responses(
        (status = 200, description = "Question published", body = SendQuestionResponse)
    )
)]
pub async fn send_question(
    State(state): State<SharedState>,
    AdminIdentity(caller): AdminIdentity,
    Json(payload): Json<SendQuestionRequest>,
) -> Result<Json<SendQuestionResponse>, AppError> {
    payload.validate()?;
    let response = round_service::send_question(&state, &caller, payload).await?;
    Ok(Json(response))
}

/// Record a player's answer to the open round.
#[utoipa::path(
    post,
    path = "/send_answer",
    tag = "round",
    request_body = SendAnswerRequest,
    responses(
        (status = 200, description = "Answer recorded", body = SendAnswerResponse)
    )
)]
pub async fn send_answer(
    State(state): State<SharedState>,
    Json(payload): Json<SendAnswerRequest>,
) -> Result<Json<SendAnswerResponse>, AppError> {
    payload.validate()?;
    round_service::send_answer(&state, payload).await?;
    Ok(Json(SendAnswerResponse {}))
}

/// Close the open round and return the refreshed leaderboard.
#[utoipa::path(
    post,
    path = "/finish_round",
    tag = "round",
    request_body = FinishRoundRequest,
    responses(
        (status = 200, description = "Round closed and scored", body = FinishRoundResponse)
    )
)]
pub async fn finish_round(
    State(state): State<SharedState>,
    AdminIdentity(caller): AdminIdentity,
    Json(payload): Json<FinishRoundRequest>,
) -> Result<Json<FinishRoundResponse>, AppError> {
    payload.validate()?;
    let response = round_service::finish_round(&state, &caller, payload).await?;
    Ok(Json(response))
}

/// End the game and return the final per-player results.
#[utoipa::path(
    post,
    path = "/finish_game",
    tag = "round",
    request_body = FinishGameRequest,
    responses(
        (status = 200, description = "Game ended", body = FinishGameResponse)
    )
)]
pub async fn finish_game(
    State(state): State<SharedState>,
    AdminIdentity(caller): AdminIdentity,
    Json(payload): Json<FinishGameRequest>,
) -> Result<Json<FinishGameResponse>, AppError> {
    payload.validate()?;
    let response = round_service::finish_game(&state, &caller, payload).await?;
    Ok(Json(response))
}
