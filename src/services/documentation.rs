use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Trivia Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::game::create_game,
        crate::routes::game::join_game,
        crate::routes::round::send_question,
        crate::routes::round::send_answer,
        crate::routes::round::finish_round,
        crate::routes::round::finish_game,
        crate::routes::websocket::ws_handler,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::game::CreateGameRequest,
            crate::dto::game::CreateGameResponse,
            crate::dto::game::JoinGameRequest,
            crate::dto::game::JoinGameResponse,
            crate::dto::round::SendQuestionRequest,
            crate::dto::round::SendQuestionResponse,
            crate::dto::round::SendAnswerRequest,
            crate::dto::round::SendAnswerResponse,
            crate::dto::round::RankingPlayerDto,
            crate::dto::round::FinishRoundRequest,
            crate::dto::round::FinishRoundResponse,
            crate::dto::round::FinishGameRequest,
            crate::dto::round::FinishGameResponse,
            crate::dto::round::EndGameResultDto,
            crate::dto::ws::EventFrame,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "game", description = "Game creation and joining"),
        (name = "round", description = "Round lifecycle and ranking"),
        (name = "events", description = "WebSocket event stream for participants"),
    )
)]
pub struct ApiDoc;
