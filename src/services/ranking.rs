//! Scoring engine for finished rounds and end-of-game summaries.
//!
//! Everything in this module is a pure function of its inputs; the service
//! layer performs the storage reads and hands the data in. Final positions at
//! game end are supplied by the admin client and are deliberately not
//! recomputed here, only the per-player answer statistics are derived.

use std::collections::HashMap;

use tracing::debug;

use crate::dao::models::{AnswerEntity, PlayerEntity, RoundEntity};

/// Outcome of scoring one finished round.
#[derive(Debug)]
pub struct RoundRanking {
    /// Players knocked out by this round (hardcore rounds only), in answer
    /// submission order.
    pub eliminations: Vec<EliminatedPlayer>,
    /// Per-player outcomes for the surviving roster, sorted by cumulative
    /// points descending.
    pub round_results: Vec<RoundResult>,
}

/// A player eliminated by an incorrect answer in a hardcore round.
#[derive(Debug)]
pub struct EliminatedPlayer {
    pub token: String,
    /// Final score: cumulative points from before this round.
    pub total_points: i64,
}

/// One surviving player's outcome for the round.
#[derive(Debug)]
pub struct RoundResult {
    pub token: String,
    /// `Some(true)` when the player scored this round, `None` otherwise.
    pub was_answer_correct: Option<bool>,
    pub points_for_this_round: i64,
    pub total_points: i64,
    /// 1-based rank among this round's scores, 0 for players without a score
    /// entry.
    pub current_position: usize,
    /// 1-based submission rank by answer time, `None` for players without an
    /// entry.
    pub answered_nth: Option<usize>,
}

/// Answer-quality statistics aggregated over a whole game.
#[derive(Debug, PartialEq, Eq)]
pub struct AnswerStats {
    pub questions_answered: usize,
    pub questions_answered_correctly: usize,
    /// Mean response latency in milliseconds, 0 when the player never
    /// answered.
    pub average_answer_time_ms: i64,
}

/// Score a finished round against the recorded answers.
///
/// `players` is the active roster in join order; that order is the stable
/// tie-break for equal scores. `current_points` are the cumulative standings
/// before this round, keyed by player token.
pub fn score_round(
    players: &[PlayerEntity],
    round: &RoundEntity,
    answers: &[AnswerEntity],
    correct_answer_index: u32,
    max_points: i64,
    current_points: &HashMap<String, i64>,
) -> RoundRanking {
    let mut eliminations = Vec::new();
    let mut round_points: Vec<(String, i64)> = Vec::new();
    let mut answer_times: Vec<(String, i64)> = Vec::new();

    for answer in answers {
        if answer.answer_index != correct_answer_index {
            if !round.is_hardcore {
                debug!(token = %answer.player_token, "incorrect answer in non-hardcore round");
                continue;
            }

            // Hardcore: the incorrect answer ends the player's game, but it
            // still occupies a slot in the score and submission orderings.
            eliminations.push(EliminatedPlayer {
                token: answer.player_token.clone(),
                total_points: current_points
                    .get(&answer.player_token)
                    .copied()
                    .unwrap_or(0),
            });
        }

        let (points, elapsed_ms) = points_for_answer(round, answer, correct_answer_index, max_points);
        round_points.push((answer.player_token.clone(), points));
        answer_times.push((answer.player_token.clone(), elapsed_ms));
    }

    round_points.sort_by(|a, b| b.1.cmp(&a.1));
    answer_times.sort_by(|a, b| a.1.cmp(&b.1));

    let mut round_results = Vec::new();
    for player in players {
        if eliminations
            .iter()
            .any(|eliminated| eliminated.token == player.token)
        {
            continue;
        }

        let scored = round_points
            .iter()
            .find(|(token, _)| *token == player.token)
            .map(|(_, points)| *points);
        let prior = current_points.get(&player.token).copied().unwrap_or(0);

        round_results.push(RoundResult {
            token: player.token.clone(),
            was_answer_correct: scored.map(|_| true),
            points_for_this_round: scored.unwrap_or(0),
            total_points: prior + scored.unwrap_or(0),
            current_position: round_points
                .iter()
                .position(|(token, _)| *token == player.token)
                .map(|index| index + 1)
                .unwrap_or(0),
            answered_nth: answer_times
                .iter()
                .position(|(token, _)| *token == player.token)
                .map(|index| index + 1),
        });
    }

    round_results.sort_by(|a, b| b.total_points.cmp(&a.total_points));

    RoundRanking {
        eliminations,
        round_results,
    }
}

/// Points for a single answer plus its latency relative to the round start.
///
/// A correct answer earns 100% of `max_points` when instantaneous, falling
/// linearly to 50% at the deadline (and below when submitted late); revealing
/// the hint halves the result. An incorrect answer earns 0.
fn points_for_answer(
    round: &RoundEntity,
    answer: &AnswerEntity,
    correct_answer_index: u32,
    max_points: i64,
) -> (i64, i64) {
    let elapsed_ms = (answer.answer_time - round.started_at).whole_milliseconds() as i64;
    if answer.answer_index != correct_answer_index {
        return (0, elapsed_ms);
    }

    let elapsed_frac = elapsed_ms as f64 / (f64::from(round.time_in_seconds) * 1000.0);
    let points_frac = 1.0 - elapsed_frac * 0.5;
    let points = (max_points as f64 * points_frac).round() as i64;

    let points = if answer.was_hint_used {
        (points as f64 / 2.0).round() as i64
    } else {
        points
    };

    (points, elapsed_ms)
}

/// Aggregate a player's answer statistics across the whole game.
///
/// Correctness is cross-checked against each round's stored correct answer
/// index. Answers whose round is unknown count toward `questions_answered`
/// (and the mean divisor) but contribute neither correctness nor latency.
pub fn answer_statistics(answers: &[AnswerEntity], rounds: &[RoundEntity]) -> AnswerStats {
    let mut answered_correctly = 0;
    let mut total_answer_time_ms = 0i64;

    for answer in answers {
        let Some(round) = rounds
            .iter()
            .find(|round| round.round_index == answer.round_index)
        else {
            continue;
        };

        if round.correct_answer_index == Some(answer.answer_index) {
            answered_correctly += 1;
        }

        total_answer_time_ms += (answer.answer_time - round.started_at).whole_milliseconds() as i64;
    }

    let questions_answered = answers.len();
    let average_answer_time_ms = if questions_answered == 0 {
        0
    } else {
        (total_answer_time_ms as f64 / questions_answered as f64).round() as i64
    };

    AnswerStats {
        questions_answered,
        questions_answered_correctly: answered_correctly,
        average_answer_time_ms,
    }
}
