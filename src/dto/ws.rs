use serde::Serialize;
use utoipa::ToSchema;

/// Server-to-client frames pushed over a registered connection.
///
/// Every frame serialises as `{ "type": "...", "data": {...} }`.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "type", content = "data")]
pub enum EventFrame {
    /// Sent to the game admin when a player enters the game.
    #[serde(rename = "PLAYER_JOINED")]
    PlayerJoined(PlayerJoinedEvent),
    /// Sent to every roster player when a question is published.
    #[serde(rename = "QUESTION_SENT")]
    QuestionSent(QuestionSentEvent),
    /// Sent to surviving players after a round was scored.
    #[serde(rename = "ROUND_FINISHED")]
    RoundFinished(RoundFinishedEvent),
    /// Sent to eliminated players and to everyone at game end.
    #[serde(rename = "GAME_OVER")]
    GameOver(GameOverEvent),
}

/// Notification that a player joined the game.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlayerJoinedEvent {
    pub username: String,
}

/// A freshly published question with its absolute deadline.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QuestionSentEvent {
    pub question: String,
    pub is_double: bool,
    pub answers: Vec<String>,
    /// Absolute RFC 3339 deadline, jitter-tolerant across clock skew.
    pub finish_when: String,
    pub hint: Option<String>,
}

/// Per-player round outcome pushed after a round was scored.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoundFinishedEvent {
    /// `Some(true)` when the answer scored; `None` when the player did not
    /// score this round.
    pub was_answer_correct: Option<bool>,
    pub points_for_this_round: i64,
    pub total_points: i64,
    pub current_position: usize,
    pub answered_nth: Option<usize>,
}

/// Final standing pushed to a player whose game is over.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GameOverEvent {
    pub did_player_lost: bool,
    pub total_points: i64,
    pub final_position: usize,
    pub questions_answered: usize,
    pub questions_answered_correctly: usize,
    pub average_answer_time: i64,
}
