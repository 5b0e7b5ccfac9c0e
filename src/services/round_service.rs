//! Round lifecycle: question publication, answer intake, and the two
//! finalisation operations that drive the ranking engine.

use std::collections::HashMap;

use time::{Duration, OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    dao::{
        game_store::GameStore,
        models::{AnswerEntity, GameEntity, RoundEntity},
    },
    dto::{
        format_timestamp,
        round::{
            EndGameResultDto, FinishGameRequest, FinishGameResponse, FinishRoundRequest,
            FinishRoundResponse, RankingPlayerDto, SendAnswerRequest, SendQuestionRequest,
            SendQuestionResponse,
        },
        ws::{GameOverEvent, QuestionSentEvent, RoundFinishedEvent},
    },
    error::ServiceError,
    services::{event_service, ranking},
    state::SharedState,
};

/// Extra seconds added to the requested duration so the published deadline
/// stays reachable after network and server startup latency.
const DELAY_COMPENSATION_S: u32 = 1;

/// Open a new round and push the question to every roster player.
///
/// Refused while the latest round is still open; round indices are assigned
/// contiguously starting at 1.
pub async fn send_question(
    state: &SharedState,
    caller: &str,
    request: SendQuestionRequest,
) -> Result<SendQuestionResponse, ServiceError> {
    let store = state.store();
    let game = find_game(store.as_ref(), request.game_id).await?;
    ensure_owner(&game, caller)?;

    let last_round = store.last_round(game.id).await?;
    if let Some(last) = &last_round {
        if !last.is_finished {
            return Err(ServiceError::Forbidden(
                "Previous round is not finished".into(),
            ));
        }
    }

    let round_index = last_round.map(|round| round.round_index).unwrap_or(0) + 1;
    let time_in_seconds = request.time_in_seconds + DELAY_COMPENSATION_S;
    let started_at = OffsetDateTime::now_utc();

    store
        .create_round(RoundEntity {
            game_id: game.id,
            round_index,
            started_at,
            time_in_seconds,
            is_hardcore: request.is_hardcore,
            is_finished: false,
            correct_answer_index: None,
        })
        .await?;

    let finish_when = format_timestamp(started_at + Duration::seconds(i64::from(time_in_seconds)));
    info!(game_id = %game.id, round_index, finish_when = %finish_when, "round opened");

    for player in &game.players {
        event_service::notify_question(
            state,
            &player.token,
            QuestionSentEvent {
                question: request.question.clone(),
                is_double: request.is_double,
                answers: request.answers.clone(),
                finish_when: finish_when.clone(),
                hint: request.hint.clone(),
            },
        );
    }

    Ok(SendQuestionResponse { finish_when })
}

/// Record a player's answer for the open round; write-once per player.
pub async fn send_answer(
    state: &SharedState,
    request: SendAnswerRequest,
) -> Result<(), ServiceError> {
    let store = state.store();
    let game = find_game(store.as_ref(), request.game_id).await?;

    let Some(round) = store.last_round(game.id).await? else {
        return Err(ServiceError::Forbidden("Game not started".into()));
    };
    if round.is_finished {
        return Err(ServiceError::Forbidden("Round finished".into()));
    }

    let Some(player) = game
        .players
        .iter()
        .find(|player| player.token == request.token)
    else {
        return Err(ServiceError::Forbidden("Player not found".into()));
    };

    let answer_time = OffsetDateTime::parse(&request.timestamp, &Rfc3339)
        .map_err(|_| ServiceError::InvalidInput("timestamp must be an RFC 3339 datetime".into()))?;

    let inserted = store
        .create_answer(AnswerEntity {
            game_id: game.id,
            round_index: round.round_index,
            player_token: player.token.clone(),
            answer_index: request.answer_index,
            was_hint_used: request.was_hint_used,
            answer_time,
        })
        .await?;

    if !inserted {
        return Err(ServiceError::Forbidden("Already answered".into()));
    }

    Ok(())
}

/// Lock in the correct answer, score the round, drop eliminated players, and
/// fan out the per-player outcomes.
pub async fn finish_round(
    state: &SharedState,
    caller: &str,
    request: FinishRoundRequest,
) -> Result<FinishRoundResponse, ServiceError> {
    let store = state.store();
    let game = find_game(store.as_ref(), request.game_id).await?;
    ensure_owner(&game, caller)?;

    let Some(round) = store.last_round(game.id).await? else {
        return Err(ServiceError::NotFound("Round not found".into()));
    };

    // The store flips `is_finished` at most once, making this call the single
    // committed writer for the round even under concurrent finalisation.
    let committed = store
        .finish_round(game.id, round.round_index, request.correct_answer_index)
        .await?;
    if !committed {
        return Err(ServiceError::Forbidden("Round already finished".into()));
    }

    let answers = store.round_answers(game.id, round.round_index).await?;
    let current_points: HashMap<String, i64> = request
        .current_ranking
        .iter()
        .map(|entry| (entry.token.clone(), entry.points))
        .collect();

    let outcome = ranking::score_round(
        &game.players,
        &round,
        &answers,
        request.correct_answer_index,
        request.max_points,
        &current_points,
    );
    info!(
        game_id = %game.id,
        round_index = round.round_index,
        eliminated = outcome.eliminations.len(),
        "round finished"
    );

    let rounds = store.rounds_for_game(game.id).await?;
    let mut final_ranking = Vec::new();

    for eliminated in &outcome.eliminations {
        let player_answers = store.answers_for_player(game.id, &eliminated.token).await?;
        let stats = ranking::answer_statistics(&player_answers, &rounds);

        event_service::notify_game_over(
            state,
            &eliminated.token,
            GameOverEvent {
                did_player_lost: true,
                total_points: eliminated.total_points,
                final_position: 0,
                questions_answered: stats.questions_answered,
                questions_answered_correctly: stats.questions_answered_correctly,
                average_answer_time: stats.average_answer_time_ms,
            },
        );

        let Some(player) = game
            .players
            .iter()
            .find(|player| player.token == eliminated.token)
        else {
            error!(token = %eliminated.token, "eliminated player missing from roster");
            continue;
        };

        store.remove_player(game.id, &eliminated.token).await?;
        final_ranking.push(RankingPlayerDto {
            token: eliminated.token.clone(),
            username: player.username.clone(),
            points: eliminated.total_points,
            round_lost: Some(round.round_index),
        });
    }

    for result in &outcome.round_results {
        event_service::notify_round_finished(
            state,
            &result.token,
            RoundFinishedEvent {
                was_answer_correct: result.was_answer_correct,
                points_for_this_round: result.points_for_this_round,
                total_points: result.total_points,
                current_position: result.current_position,
                answered_nth: result.answered_nth,
            },
        );

        let Some(player) = game
            .players
            .iter()
            .find(|player| player.token == result.token)
        else {
            error!(token = %result.token, "ranked player missing from roster");
            continue;
        };

        final_ranking.push(RankingPlayerDto {
            token: result.token.clone(),
            username: player.username.clone(),
            points: result.total_points,
            round_lost: None,
        });
    }

    Ok(FinishRoundResponse {
        ranking: final_ranking,
    })
}

/// Close the game after its last finished round and push final standings.
///
/// Final positions come from the admin-supplied standings; only the
/// answer-quality statistics are derived from storage.
pub async fn finish_game(
    state: &SharedState,
    caller: &str,
    request: FinishGameRequest,
) -> Result<FinishGameResponse, ServiceError> {
    let store = state.store();
    let game = find_game(store.as_ref(), request.game_id).await?;
    ensure_owner(&game, caller)?;

    let Some(round) = store.last_round(game.id).await? else {
        return Err(ServiceError::NotFound("Round not found".into()));
    };
    if !round.is_finished {
        return Err(ServiceError::Forbidden("Round is not finished".into()));
    }

    let mut standings = request.current_ranking;
    standings.sort_by(|a, b| b.points.cmp(&a.points));

    let rounds = store.rounds_for_game(game.id).await?;
    let mut results = Vec::new();

    for player in &game.players {
        let Some(position) = standings
            .iter()
            .position(|entry| entry.token == player.token)
        else {
            return Err(ServiceError::InvalidInput(format!(
                "player `{}` missing from current ranking",
                player.username
            )));
        };
        let points = standings[position].points;

        let player_answers = store.answers_for_player(game.id, &player.token).await?;
        let stats = ranking::answer_statistics(&player_answers, &rounds);

        event_service::notify_game_over(
            state,
            &player.token,
            GameOverEvent {
                did_player_lost: false,
                total_points: points,
                final_position: position + 1,
                questions_answered: stats.questions_answered,
                questions_answered_correctly: stats.questions_answered_correctly,
                average_answer_time: stats.average_answer_time_ms,
            },
        );

        results.push(EndGameResultDto {
            player_token: player.token.clone(),
            player_username: player.username.clone(),
            points,
            questions_answered: stats.questions_answered,
            questions_answered_correctly: stats.questions_answered_correctly,
            average_answer_time: stats.average_answer_time_ms,
        });
    }

    results.sort_by(|a, b| b.points.cmp(&a.points));
    info!(game_id = %game.id, players = results.len(), "game finished");

    Ok(FinishGameResponse { results })
}

async fn find_game(store: &dyn GameStore, game_id: Uuid) -> Result<GameEntity, ServiceError> {
    match store.find_game(game_id).await? {
        Some(game) => Ok(game),
        None => Err(ServiceError::NotFound("Game not found".into())),
    }
}

fn ensure_owner(game: &GameEntity, caller: &str) -> Result<(), ServiceError> {
    if game.created_by != caller {
        return Err(ServiceError::Forbidden(
            "You are not the owner of this game".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{
        dao::{game_store::memory::MemoryStore, models::PlayerEntity},
        dto::game::{CreateGameRequest, JoinGameRequest},
        services::game_service,
        state::AppState,
    };

    use super::*;

    const ADMIN: &str = "admin-uid";

    struct Fixture {
        state: SharedState,
        game_id: Uuid,
        tokens: Vec<String>,
    }

    async fn fixture(usernames: &[&str]) -> Fixture {
        let state = AppState::new(Arc::new(MemoryStore::new()));
        let created = game_service::create_game(
            &state,
            ADMIN,
            CreateGameRequest {
                template_id: "template-1".into(),
            },
        )
        .await
        .unwrap();

        let code = state
            .store()
            .find_game(created.game_id)
            .await
            .unwrap()
            .unwrap()
            .code;

        let mut tokens = Vec::new();
        for username in usernames {
            let joined = game_service::join_game(
                &state,
                JoinGameRequest {
                    code: code.clone(),
                    username: (*username).into(),
                },
            )
            .await
            .unwrap();
            tokens.push(joined.token);
        }

        Fixture {
            state,
            game_id: created.game_id,
            tokens,
        }
    }

    fn question(game_id: Uuid, is_hardcore: bool) -> SendQuestionRequest {
        SendQuestionRequest {
            game_id,
            question: "Largest planet?".into(),
            hint: None,
            is_double: false,
            answers: vec!["Jupiter".into(), "Mars".into()],
            time_in_seconds: 10,
            is_hardcore,
        }
    }

    fn answer_at(game_id: Uuid, token: &str, answer_index: u32, timestamp: &str) -> SendAnswerRequest {
        SendAnswerRequest {
            game_id,
            token: token.into(),
            answer_index,
            was_hint_used: false,
            timestamp: timestamp.into(),
        }
    }

    fn ranking_entry(token: &str, points: i64) -> RankingPlayerDto {
        RankingPlayerDto {
            token: token.into(),
            username: token.to_uppercase(),
            points,
            round_lost: None,
        }
    }

    fn now_rfc3339() -> String {
        format_timestamp(OffsetDateTime::now_utc())
    }

    #[tokio::test]
    async fn send_question_opens_contiguous_rounds() {
        let fx = fixture(&["ada"]).await;

        send_question(&fx.state, ADMIN, question(fx.game_id, false))
            .await
            .unwrap();
        let round = fx
            .state
            .store()
            .last_round(fx.game_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(round.round_index, 1);
        // Requested duration plus the delay compensation.
        assert_eq!(round.time_in_seconds, 11);
        assert!(!round.is_finished);

        finish_round(
            &fx.state,
            ADMIN,
            FinishRoundRequest {
                game_id: fx.game_id,
                correct_answer_index: 0,
                max_points: 1000,
                current_ranking: vec![],
            },
        )
        .await
        .unwrap();

        send_question(&fx.state, ADMIN, question(fx.game_id, false))
            .await
            .unwrap();
        let round = fx
            .state
            .store()
            .last_round(fx.game_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(round.round_index, 2);
    }

    #[tokio::test]
    async fn send_question_refused_while_round_open() {
        let fx = fixture(&["ada"]).await;
        send_question(&fx.state, ADMIN, question(fx.game_id, false))
            .await
            .unwrap();

        let err = send_question(&fx.state, ADMIN, question(fx.game_id, false))
            .await
            .unwrap_err();
        match err {
            ServiceError::Forbidden(message) => {
                assert_eq!(message, "Previous round is not finished")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn send_question_requires_the_owner() {
        let fx = fixture(&["ada"]).await;
        let err = send_question(&fx.state, "someone-else", question(fx.game_id, false))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }

    #[tokio::test]
    async fn send_answer_requires_an_open_round() {
        let fx = fixture(&["ada"]).await;
        let err = send_answer(
            &fx.state,
            answer_at(fx.game_id, &fx.tokens[0], 0, &now_rfc3339()),
        )
        .await
        .unwrap_err();
        match err {
            ServiceError::Forbidden(message) => assert_eq!(message, "Game not started"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn send_answer_rejects_unknown_players_and_bad_timestamps() {
        let fx = fixture(&["ada"]).await;
        send_question(&fx.state, ADMIN, question(fx.game_id, false))
            .await
            .unwrap();

        let err = send_answer(&fx.state, answer_at(fx.game_id, "bogus", 0, &now_rfc3339()))
            .await
            .unwrap_err();
        match err {
            ServiceError::Forbidden(message) => assert_eq!(message, "Player not found"),
            other => panic!("unexpected error: {other:?}"),
        }

        let err = send_answer(
            &fx.state,
            answer_at(fx.game_id, &fx.tokens[0], 0, "yesterday at noon"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn send_answer_is_write_once() {
        let fx = fixture(&["ada"]).await;
        send_question(&fx.state, ADMIN, question(fx.game_id, false))
            .await
            .unwrap();

        send_answer(
            &fx.state,
            answer_at(fx.game_id, &fx.tokens[0], 0, &now_rfc3339()),
        )
        .await
        .unwrap();

        let err = send_answer(
            &fx.state,
            answer_at(fx.game_id, &fx.tokens[0], 1, &now_rfc3339()),
        )
        .await
        .unwrap_err();
        match err {
            ServiceError::Forbidden(message) => assert_eq!(message, "Already answered"),
            other => panic!("unexpected error: {other:?}"),
        }

        // Storage reflects only the first write.
        let answers = fx
            .state
            .store()
            .round_answers(fx.game_id, 1)
            .await
            .unwrap();
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].answer_index, 0);
    }

    #[tokio::test]
    async fn send_answer_rejected_after_round_finished() {
        let fx = fixture(&["ada"]).await;
        send_question(&fx.state, ADMIN, question(fx.game_id, false))
            .await
            .unwrap();
        finish_round(
            &fx.state,
            ADMIN,
            FinishRoundRequest {
                game_id: fx.game_id,
                correct_answer_index: 0,
                max_points: 1000,
                current_ranking: vec![],
            },
        )
        .await
        .unwrap();

        let err = send_answer(
            &fx.state,
            answer_at(fx.game_id, &fx.tokens[0], 0, &now_rfc3339()),
        )
        .await
        .unwrap_err();
        match err {
            ServiceError::Forbidden(message) => assert_eq!(message, "Round finished"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn finish_round_is_single_use() {
        let fx = fixture(&["ada"]).await;
        send_question(&fx.state, ADMIN, question(fx.game_id, false))
            .await
            .unwrap();

        let request = || FinishRoundRequest {
            game_id: fx.game_id,
            correct_answer_index: 0,
            max_points: 1000,
            current_ranking: vec![],
        };

        finish_round(&fx.state, ADMIN, request()).await.unwrap();
        let err = finish_round(&fx.state, ADMIN, request()).await.unwrap_err();
        match err {
            ServiceError::Forbidden(message) => assert_eq!(message, "Round already finished"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn finish_round_reports_and_removes_eliminated_players() {
        let fx = fixture(&["ada", "bob"]).await;
        send_question(&fx.state, ADMIN, question(fx.game_id, true))
            .await
            .unwrap();

        send_answer(
            &fx.state,
            answer_at(fx.game_id, &fx.tokens[0], 1, &now_rfc3339()),
        )
        .await
        .unwrap();
        send_answer(
            &fx.state,
            answer_at(fx.game_id, &fx.tokens[1], 0, &now_rfc3339()),
        )
        .await
        .unwrap();

        let response = finish_round(
            &fx.state,
            ADMIN,
            FinishRoundRequest {
                game_id: fx.game_id,
                correct_answer_index: 0,
                max_points: 1000,
                current_ranking: vec![
                    ranking_entry(&fx.tokens[0], 200),
                    ranking_entry(&fx.tokens[1], 100),
                ],
            },
        )
        .await
        .unwrap();

        let eliminated = response
            .ranking
            .iter()
            .find(|entry| entry.token == fx.tokens[0])
            .unwrap();
        assert_eq!(eliminated.round_lost, Some(1));
        assert_eq!(eliminated.points, 200, "final score is the prior cumulative");

        let survivor = response
            .ranking
            .iter()
            .find(|entry| entry.token == fx.tokens[1])
            .unwrap();
        assert_eq!(survivor.round_lost, None);
        assert!(survivor.points > 100, "survivor gains round points");

        // Eliminated players leave the stored roster for subsequent rounds.
        let game = fx
            .state
            .store()
            .find_game(fx.game_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(game.players.len(), 1);
        assert_eq!(game.players[0].token, fx.tokens[1]);
    }

    #[tokio::test]
    async fn finish_game_requires_a_finished_round() {
        let fx = fixture(&["ada"]).await;
        send_question(&fx.state, ADMIN, question(fx.game_id, false))
            .await
            .unwrap();

        let err = finish_game(
            &fx.state,
            ADMIN,
            FinishGameRequest {
                game_id: fx.game_id,
                current_ranking: vec![ranking_entry(&fx.tokens[0], 0)],
            },
        )
        .await
        .unwrap_err();
        match err {
            ServiceError::Forbidden(message) => assert_eq!(message, "Round is not finished"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn finish_game_ranks_by_supplied_points() {
        let fx = fixture(&["ada", "bob"]).await;
        send_question(&fx.state, ADMIN, question(fx.game_id, false))
            .await
            .unwrap();
        send_answer(
            &fx.state,
            answer_at(fx.game_id, &fx.tokens[1], 0, &now_rfc3339()),
        )
        .await
        .unwrap();
        finish_round(
            &fx.state,
            ADMIN,
            FinishRoundRequest {
                game_id: fx.game_id,
                correct_answer_index: 0,
                max_points: 1000,
                current_ranking: vec![],
            },
        )
        .await
        .unwrap();

        let response = finish_game(
            &fx.state,
            ADMIN,
            FinishGameRequest {
                game_id: fx.game_id,
                current_ranking: vec![
                    ranking_entry(&fx.tokens[0], 100),
                    ranking_entry(&fx.tokens[1], 900),
                ],
            },
        )
        .await
        .unwrap();

        assert_eq!(response.results.len(), 2);
        assert_eq!(response.results[0].player_token, fx.tokens[1]);
        assert_eq!(response.results[0].points, 900);
        assert_eq!(response.results[0].questions_answered, 1);
        assert_eq!(response.results[0].questions_answered_correctly, 1);
        // "ada" never answered anything.
        assert_eq!(response.results[1].questions_answered, 0);
        assert_eq!(response.results[1].average_answer_time, 0);
    }

    #[tokio::test]
    async fn finish_game_rejects_rosters_missing_from_the_ranking() {
        let fx = fixture(&["ada", "bob"]).await;
        send_question(&fx.state, ADMIN, question(fx.game_id, false))
            .await
            .unwrap();
        finish_round(
            &fx.state,
            ADMIN,
            FinishRoundRequest {
                game_id: fx.game_id,
                correct_answer_index: 0,
                max_points: 1000,
                current_ranking: vec![],
            },
        )
        .await
        .unwrap();

        let err = finish_game(
            &fx.state,
            ADMIN,
            FinishGameRequest {
                game_id: fx.game_id,
                current_ranking: vec![ranking_entry(&fx.tokens[0], 100)],
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn roster_order_survives_eliminations() {
        // Sanity check that removals keep the join order of the remaining
        // players, which the ranking engine relies on for tie-breaks.
        let fx = fixture(&["ada", "bob", "eve"]).await;
        fx.state
            .store()
            .remove_player(fx.game_id, &fx.tokens[1])
            .await
            .unwrap();

        let game = fx
            .state
            .store()
            .find_game(fx.game_id)
            .await
            .unwrap()
            .unwrap();
        let usernames: Vec<_> = game
            .players
            .iter()
            .map(|PlayerEntity { username, .. }| username.as_str())
            .collect();
        assert_eq!(usernames, ["ada", "eve"]);
    }
}
