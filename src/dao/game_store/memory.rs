//! In-memory storage backend keyed by `DashMap`s.
//!
//! Per-entry locks double as the write-once / compare-and-swap critical
//! sections promised by the [`GameStore`] contract: an answer insert and a
//! round finalisation each happen under the lock of the entry they mutate.

use dashmap::DashMap;
use futures::FutureExt;
use futures::future::{BoxFuture, ready};
use uuid::Uuid;

use crate::dao::game_store::GameStore;
use crate::dao::models::{AnswerEntity, GameEntity, PlayerEntity, RoundEntity};
use crate::dao::storage::StorageResult;

/// Process-local [`GameStore`] implementation.
#[derive(Debug, Default)]
pub struct MemoryStore {
    games: DashMap<Uuid, GameEntity>,
    /// Rounds per game, ascending by `round_index`.
    rounds: DashMap<Uuid, Vec<RoundEntity>>,
    /// Answers per (game, round), in submission commit order.
    answers: DashMap<(Uuid, u32), Vec<AnswerEntity>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl GameStore for MemoryStore {
    fn create_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.games.insert(game.id, game);
        ready(Ok(())).boxed()
    }

    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let game = self.games.get(&id).map(|entry| entry.clone());
        ready(Ok(game)).boxed()
    }

    fn find_game_by_code(
        &self,
        code: &str,
    ) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let game = self
            .games
            .iter()
            .find(|entry| entry.code == code)
            .map(|entry| entry.clone());
        ready(Ok(game)).boxed()
    }

    fn add_player(
        &self,
        game_id: Uuid,
        player: PlayerEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        if let Some(mut game) = self.games.get_mut(&game_id) {
            game.players.push(player);
        }
        ready(Ok(())).boxed()
    }

    fn remove_player(&self, game_id: Uuid, token: &str) -> BoxFuture<'static, StorageResult<()>> {
        if let Some(mut game) = self.games.get_mut(&game_id) {
            game.players.retain(|player| player.token != token);
        }
        ready(Ok(())).boxed()
    }

    fn create_round(&self, round: RoundEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.rounds.entry(round.game_id).or_default().push(round);
        ready(Ok(())).boxed()
    }

    fn last_round(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<Option<RoundEntity>>> {
        let round = self
            .rounds
            .get(&game_id)
            .and_then(|rounds| rounds.last().cloned());
        ready(Ok(round)).boxed()
    }

    fn rounds_for_game(
        &self,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<RoundEntity>>> {
        let rounds = self
            .rounds
            .get(&game_id)
            .map(|rounds| rounds.clone())
            .unwrap_or_default();
        ready(Ok(rounds)).boxed()
    }

    fn finish_round(
        &self,
        game_id: Uuid,
        round_index: u32,
        correct_answer_index: u32,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let committed = match self.rounds.get_mut(&game_id) {
            Some(mut rounds) => match rounds
                .iter_mut()
                .find(|round| round.round_index == round_index)
            {
                Some(round) if !round.is_finished => {
                    round.is_finished = true;
                    round.correct_answer_index = Some(correct_answer_index);
                    true
                }
                _ => false,
            },
            None => false,
        };
        ready(Ok(committed)).boxed()
    }

    fn create_answer(&self, answer: AnswerEntity) -> BoxFuture<'static, StorageResult<bool>> {
        let mut slot = self
            .answers
            .entry((answer.game_id, answer.round_index))
            .or_default();
        let inserted = if slot
            .iter()
            .any(|existing| existing.player_token == answer.player_token)
        {
            false
        } else {
            slot.push(answer);
            true
        };
        drop(slot);
        ready(Ok(inserted)).boxed()
    }

    fn round_answers(
        &self,
        game_id: Uuid,
        round_index: u32,
    ) -> BoxFuture<'static, StorageResult<Vec<AnswerEntity>>> {
        let answers = self
            .answers
            .get(&(game_id, round_index))
            .map(|answers| answers.clone())
            .unwrap_or_default();
        ready(Ok(answers)).boxed()
    }

    fn answers_for_player(
        &self,
        game_id: Uuid,
        token: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<AnswerEntity>>> {
        let mut answers: Vec<AnswerEntity> = self
            .answers
            .iter()
            .filter(|entry| entry.key().0 == game_id)
            .flat_map(|entry| {
                entry
                    .value()
                    .iter()
                    .filter(|answer| answer.player_token == token)
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .collect();
        answers.sort_by_key(|answer| answer.round_index);
        ready(Ok(answers)).boxed()
    }
}
