use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Aggregate game entity persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameEntity {
    /// Primary key of the game.
    pub id: Uuid,
    /// Short numeric join code handed out to players.
    pub code: String,
    /// Identifier of the question template the game was created from.
    pub template_id: String,
    /// Secret token identifying the game administrator.
    pub admin_token: String,
    /// Whether new players are still allowed to join.
    pub sign_up_blocked: bool,
    /// Participating players. Insertion order is significant: it is the
    /// stable iteration order used by the ranking engine.
    pub players: Vec<PlayerEntity>,
    /// Identity of the administrator who created the game.
    pub created_by: String,
}

/// Roster entry for a single player.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerEntity {
    /// Display name, unique within a game (case/whitespace-insensitive).
    pub username: String,
    /// Secret token issued at join time, unique within a game.
    pub token: String,
}

/// One timed question cycle within a game.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoundEntity {
    /// Game this round belongs to.
    pub game_id: Uuid,
    /// 1-based index; round indices for a game form a contiguous ascending
    /// sequence.
    pub round_index: u32,
    /// Server timestamp taken when the question was published.
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    /// Question duration in seconds, already extended by the delay
    /// compensation.
    pub time_in_seconds: u32,
    /// Whether an incorrect answer eliminates the player.
    pub is_hardcore: bool,
    /// Flipped exactly once when the round is finalised.
    pub is_finished: bool,
    /// Set together with `is_finished`; `None` while the round is open.
    pub correct_answer_index: Option<u32>,
}

/// A player's answer to one round; write-once per (game, round, player).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnswerEntity {
    /// Game the answer belongs to.
    pub game_id: Uuid,
    /// Round the answer was submitted for.
    pub round_index: u32,
    /// Token of the answering player.
    pub player_token: String,
    /// Index of the chosen answer option.
    pub answer_index: u32,
    /// Whether the player revealed the hint before answering.
    pub was_hint_used: bool,
    /// Client-reported submission timestamp.
    #[serde(with = "time::serde::rfc3339")]
    pub answer_time: OffsetDateTime,
}
