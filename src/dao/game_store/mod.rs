pub mod memory;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::models::{AnswerEntity, GameEntity, PlayerEntity, RoundEntity};
use crate::dao::storage::StorageResult;

/// Abstraction over the persistence layer for games, rounds, and answers.
///
/// The write-once and compare-and-swap operations (`create_answer`,
/// `finish_round`) are the only ordering guarantees the service layer relies
/// on: the first committed write for a key wins, concurrent writers observe
/// the loss through the returned flag.
pub trait GameStore: Send + Sync {
    fn create_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    fn find_game_by_code(&self, code: &str)
    -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    fn add_player(
        &self,
        game_id: Uuid,
        player: PlayerEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;
    fn remove_player(&self, game_id: Uuid, token: &str) -> BoxFuture<'static, StorageResult<()>>;
    fn create_round(&self, round: RoundEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn last_round(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<Option<RoundEntity>>>;
    fn rounds_for_game(&self, game_id: Uuid)
    -> BoxFuture<'static, StorageResult<Vec<RoundEntity>>>;
    /// Flip `is_finished` and record the correct answer index, only if the
    /// round was still open. Returns whether this call committed the swap;
    /// `false` means another caller already finalised the round.
    fn finish_round(
        &self,
        game_id: Uuid,
        round_index: u32,
        correct_answer_index: u32,
    ) -> BoxFuture<'static, StorageResult<bool>>;
    /// Insert an answer only if none exists for its (round, player) key.
    /// Returns whether the insert happened; `false` means the slot was taken.
    fn create_answer(&self, answer: AnswerEntity) -> BoxFuture<'static, StorageResult<bool>>;
    fn round_answers(
        &self,
        game_id: Uuid,
        round_index: u32,
    ) -> BoxFuture<'static, StorageResult<Vec<AnswerEntity>>>;
    fn answers_for_player(
        &self,
        game_id: Uuid,
        token: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<AnswerEntity>>>;
}
