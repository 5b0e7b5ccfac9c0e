//! DTO definitions for the round lifecycle endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::dto::validation::{validate_answer_options, validate_not_blank};

/// Admin payload publishing a new question to the roster.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SendQuestionRequest {
    pub game_id: Uuid,
    #[validate(custom(function = validate_not_blank))]
    pub question: String,
    /// Optional hint; revealing it halves the round points.
    #[serde(default)]
    #[validate(custom(function = validate_not_blank))]
    pub hint: Option<String>,
    #[serde(default)]
    pub is_double: bool,
    #[validate(length(min = 2), custom(function = validate_answer_options))]
    pub answers: Vec<String>,
    /// Requested question duration; the server extends it by the delay
    /// compensation before storing.
    #[validate(range(min = 1))]
    pub time_in_seconds: u32,
    pub is_hardcore: bool,
}

/// Absolute deadline returned when a question was published.
#[derive(Debug, Serialize, ToSchema)]
pub struct SendQuestionResponse {
    /// RFC 3339 timestamp after which answers no longer count at full value.
    pub finish_when: String,
}

/// Player payload submitting an answer to the open round.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SendAnswerRequest {
    pub game_id: Uuid,
    #[validate(custom(function = validate_not_blank))]
    pub token: String,
    pub answer_index: u32,
    #[serde(default)]
    pub was_hint_used: bool,
    /// Client-reported submission timestamp (RFC 3339).
    #[validate(custom(function = validate_not_blank))]
    pub timestamp: String,
}

/// Empty acknowledgement returned when an answer was recorded.
#[derive(Debug, Serialize, ToSchema)]
pub struct SendAnswerResponse {}

/// Leaderboard row exchanged with the admin client.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct RankingPlayerDto {
    #[validate(custom(function = validate_not_blank))]
    pub token: String,
    #[validate(custom(function = validate_not_blank))]
    pub username: String,
    #[validate(range(min = 0))]
    pub points: i64,
    /// Round at which the player was eliminated, `None` for active players.
    #[serde(default)]
    pub round_lost: Option<u32>,
}

/// Admin payload locking in the correct answer and closing the round.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct FinishRoundRequest {
    pub game_id: Uuid,
    pub correct_answer_index: u32,
    #[validate(range(min = 1))]
    pub max_points: i64,
    /// Cumulative standings as the admin client currently sees them.
    #[validate(nested)]
    pub current_ranking: Vec<RankingPlayerDto>,
}

/// Refreshed leaderboard returned after a round was closed.
#[derive(Debug, Serialize, ToSchema)]
pub struct FinishRoundResponse {
    pub ranking: Vec<RankingPlayerDto>,
}

/// Admin payload ending the game after its last finished round.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct FinishGameRequest {
    pub game_id: Uuid,
    /// Cumulative standings as the admin client currently sees them.
    #[validate(nested)]
    pub current_ranking: Vec<RankingPlayerDto>,
}

/// Final per-player summary returned when the game ends.
#[derive(Debug, Serialize, ToSchema)]
pub struct EndGameResultDto {
    pub player_token: String,
    pub player_username: String,
    pub points: i64,
    pub questions_answered: usize,
    pub questions_answered_correctly: usize,
    /// Mean response latency in milliseconds, 0 when the player never
    /// answered.
    pub average_answer_time: i64,
}

/// Results list returned by the finish-game operation.
#[derive(Debug, Serialize, ToSchema)]
pub struct FinishGameResponse {
    pub results: Vec<EndGameResultDto>,
}
