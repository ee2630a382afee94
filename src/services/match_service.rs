//! Game recording and match saving.
//!
//! Games live in the event session until the series is decided and the match is saved.
//! Saving inserts the match result first; member statistics are only written once that
//! insert succeeded, and a failed member write never undoes the others.

use std::{sync::Arc, time::SystemTime};

use futures::future::join_all;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    dao::{
        club_store::ClubStore,
        models::{GameResultEntity, MatchResultEntity, MemberStatsEntity, team_rosters},
    },
    dto::matches::{
        GameResultSummary, MatchResultSummary, MatchSavedResponse, RecordGameRequest,
        SeriesSummary,
    },
    error::ServiceError,
    services::session_service::open_session,
    state::{
        SharedState,
        scoring::{GameResult, resolve_game, score_series, tally},
        session::EventSession,
        state_machine::MatchEvent,
        stats::{StatsDelta, deltas_for},
    },
};

fn series_summary(session: &EventSession) -> SeriesSummary {
    let games = session.games();
    let wins = session
        .mode()
        .map(|mode| tally(&games, mode).wins)
        .unwrap_or_default();
    SeriesSummary {
        phase: session.phase().into(),
        games: games.iter().map(GameResultSummary::from).collect(),
        wins,
        series_winner: session.series_winner().to_string(),
    }
}

// ---------------------------------------------------------------------------
// Game recording
// ---------------------------------------------------------------------------

/// Record (or replace) one game of the series.
pub async fn record_game(
    state: &SharedState,
    event_id: &str,
    request: RecordGameRequest,
) -> Result<SeriesSummary, ServiceError> {
    let mut session = open_session(state, event_id).await?;
    let mode = session.require_assignment()?.mode();

    let game = resolve_game(
        request.game_number,
        &request.scores,
        mode,
        request.winner,
        state.config().max_games,
    )?;
    let winner = game.winner;
    let games = session.games_with(game);
    let ordered: Vec<GameResult> = games.values().cloned().collect();
    let series = score_series(&ordered, mode);

    session
        .run_transition(
            MatchEvent::GameRecorded {
                recorded: games.len() as u32,
                series,
            },
            || async { Ok(()) },
        )
        .await?;
    session.set_games(games);
    debug!(
        event_id,
        game_number = request.game_number,
        winner = %winner,
        series = %series,
        "game recorded"
    );

    Ok(series_summary(&session))
}

/// Delete a recorded game; the series steps back accordingly.
pub async fn remove_game(
    state: &SharedState,
    event_id: &str,
    game_number: u32,
) -> Result<SeriesSummary, ServiceError> {
    let mut session = open_session(state, event_id).await?;
    let mode = session.require_assignment()?.mode();
    if !session.has_game(game_number) {
        return Err(ServiceError::NotFound(format!(
            "game {game_number} of event `{event_id}` not found"
        )));
    }

    let games = session.games_without(game_number);
    let ordered: Vec<GameResult> = games.values().cloned().collect();
    let series = score_series(&ordered, mode);

    session
        .run_transition(
            MatchEvent::GameRemoved {
                recorded: games.len() as u32,
                series,
            },
            || async { Ok(()) },
        )
        .await?;
    session.set_games(games);
    debug!(event_id, game_number, series = %series, "game removed");

    Ok(series_summary(&session))
}

// ---------------------------------------------------------------------------
// Saving
// ---------------------------------------------------------------------------

/// Outcome of the member statistics batch.
#[derive(Debug, Default)]
struct StatisticsBatch {
    updated: usize,
    failed: Vec<String>,
}

/// Store the match result and fold it into every rostered member's statistics.
pub async fn save_match_result(
    state: &SharedState,
    event_id: &str,
) -> Result<MatchSavedResponse, ServiceError> {
    let mut session = open_session(state, event_id).await?;
    let assignment = session.require_assignment()?.clone();
    let games = session.games();
    let series_winner = session.series_winner();

    let result = MatchResultEntity {
        id: Uuid::new_v4(),
        event_id: event_id.to_owned(),
        team_mode: assignment.mode(),
        teams: team_rosters(&assignment),
        game_results: games.iter().cloned().map(GameResultEntity::from).collect(),
        series_winner,
        created_at: SystemTime::now(),
    };
    let result_id = result.id;
    let deltas = deltas_for(&assignment, &games, series_winner);
    let recent_len = state.config().recent_results_len;
    let store = state.require_club_store().await?;

    let (batch, _) = session
        .run_transition(MatchEvent::MatchSaved, move || async move {
            store.insert_match_result(result).await?;
            Ok(apply_statistics(store, deltas, recent_len).await)
        })
        .await?;

    if !batch.failed.is_empty() {
        error!(
            event_id,
            match_id = %result_id,
            failed = ?batch.failed,
            updated = batch.updated,
            "match saved but some member statistics were not written"
        );
        return Err(ServiceError::PartialStatisticsUpdate {
            failed: batch.failed,
        });
    }

    info!(
        event_id,
        match_id = %result_id,
        winner = %series_winner,
        updated = batch.updated,
        "match saved"
    );
    Ok(MatchSavedResponse {
        id: result_id,
        event_id: event_id.to_owned(),
        series_winner: series_winner.to_string(),
        updated_members: batch.updated,
    })
}

/// Write every member update concurrently and report the ones that failed.
async fn apply_statistics(
    store: Arc<dyn ClubStore>,
    deltas: Vec<StatsDelta>,
    recent_len: usize,
) -> StatisticsBatch {
    let members = match store.list_members().await {
        Ok(members) => members,
        Err(err) => {
            warn!(error = %err, "failed to load members for statistics update");
            return StatisticsBatch {
                updated: 0,
                failed: deltas.into_iter().map(|d| d.member_identity).collect(),
            };
        }
    };

    let mut updates = Vec::with_capacity(deltas.len());
    for delta in deltas {
        let Some(member) = members.iter().find(|m| m.id == delta.member_identity) else {
            debug!(
                member_id = %delta.member_identity,
                "no directory entry; statistics skipped"
            );
            continue;
        };
        let mut stats = member.stats();
        stats.apply(&delta, recent_len);
        let store = store.clone();
        let member_id = delta.member_identity;
        updates.push(async move {
            let outcome = store
                .update_member_stats(MemberStatsEntity::new(member_id.clone(), stats))
                .await;
            (member_id, outcome)
        });
    }

    let mut batch = StatisticsBatch::default();
    for (member_id, outcome) in join_all(updates).await {
        match outcome {
            Ok(()) => batch.updated += 1,
            Err(err) => {
                warn!(member_id = %member_id, error = %err, "member statistics update failed");
                batch.failed.push(member_id);
            }
        }
    }
    batch
}

// ---------------------------------------------------------------------------
// Read-only projections
// ---------------------------------------------------------------------------

/// Stored match results, most recent first.
pub async fn list_match_results(
    state: &SharedState,
) -> Result<Vec<MatchResultSummary>, ServiceError> {
    let store = state.require_club_store().await?;
    let mut results = store.list_match_results().await?;
    results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(results.into_iter().map(MatchResultSummary::from).collect())
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            club_store::memory::MemoryClubStore,
            models::{AttendanceEntity, AttendanceStatus, EventEntity, MemberEntity},
        },
        dto::{phase::VisibleMatchPhase, team::BalanceRequest},
        services::team_service,
        state::{AppState, roster::TeamLabel, state_machine::MatchPhase, stats::SeriesMark},
    };

    async fn balanced(attendees: usize) -> (SharedState, MemoryClubStore) {
        let store = MemoryClubStore::new();
        store
            .insert_event(EventEntity {
                id: "e1".into(),
                title: "Friday scrimmage".into(),
                date: "2026-11-06".into(),
            })
            .await;
        for index in 0..attendees {
            let name = format!("player{index}");
            store
                .insert_member(MemberEntity {
                    id: format!("m{index}"),
                    name: name.clone(),
                    position: "guard".into(),
                    detail_position: String::new(),
                    wins: 1,
                    losses: 1,
                    winning_series: 0,
                    recent_results: vec![SeriesMark::L; 5],
                })
                .await;
            store
                .insert_attendance(AttendanceEntity {
                    event_id: "e1".into(),
                    member_name: name,
                    status: AttendanceStatus::Attending,
                })
                .await;
        }
        let state = AppState::with_seed(AppConfig::default(), 9);
        state.set_club_store(Arc::new(store.clone())).await;
        team_service::balance_event(&state, "e1", BalanceRequest::default())
            .await
            .unwrap();
        (state, store)
    }

    fn scores(a: u32, b: u32) -> IndexMap<TeamLabel, u32> {
        IndexMap::from([(TeamLabel::A, a), (TeamLabel::B, b)])
    }

    fn game(game_number: u32, a: u32, b: u32) -> RecordGameRequest {
        RecordGameRequest {
            game_number,
            scores: scores(a, b),
            winner: None,
        }
    }

    async fn team_members(state: &SharedState, label: TeamLabel) -> Vec<String> {
        let session = state.session("e1");
        let session = session.lock().await;
        session
            .assignment()
            .unwrap()
            .team(label)
            .unwrap()
            .iter()
            .map(|entry| entry.identity.clone())
            .collect()
    }

    #[tokio::test]
    async fn two_to_one_series_is_decided_and_saved() {
        let (state, store) = balanced(6).await;
        let winners = team_members(&state, TeamLabel::A).await;
        let losers = team_members(&state, TeamLabel::B).await;

        record_game(&state, "e1", game(1, 21, 15)).await.unwrap();
        let summary = record_game(&state, "e1", game(2, 18, 21)).await.unwrap();
        assert_eq!(summary.phase.phase, VisibleMatchPhase::GamesInProgress);
        assert_eq!(summary.series_winner, "draw");

        let summary = record_game(&state, "e1", game(3, 21, 19)).await.unwrap();
        assert_eq!(summary.phase.phase, VisibleMatchPhase::SeriesDecided);
        assert_eq!(summary.phase.leader, Some(TeamLabel::A));
        assert_eq!(summary.wins.get(&TeamLabel::A), Some(&2));

        let saved = save_match_result(&state, "e1").await.unwrap();
        assert_eq!(saved.series_winner, "A");
        assert_eq!(saved.updated_members, 6);

        let winner = store.member(&winners[0]).await.unwrap();
        assert_eq!((winner.wins, winner.losses, winner.winning_series), (3, 2, 1));
        assert_eq!(winner.recent_results.len(), 5);
        assert_eq!(winner.recent_results[0], SeriesMark::W);

        let loser = store.member(&losers[0]).await.unwrap();
        assert_eq!((loser.wins, loser.losses, loser.winning_series), (2, 3, 0));
        assert_eq!(loser.recent_results[0], SeriesMark::L);

        let results = list_match_results(&state).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].game_results.len(), 3);
    }

    #[tokio::test]
    async fn drawn_game_needs_resolution() {
        let (state, _) = balanced(4).await;
        let err = record_game(&state, "e1", game(1, 20, 20)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Undetermined(_)));

        let summary = record_game(
            &state,
            "e1",
            RecordGameRequest {
                game_number: 1,
                scores: scores(20, 20),
                winner: Some(TeamLabel::B),
            },
        )
        .await
        .unwrap();
        assert_eq!(summary.series_winner, "B");
    }

    #[tokio::test]
    async fn game_number_beyond_limit_is_rejected() {
        let (state, _) = balanced(4).await;
        let err = record_game(&state, "e1", game(5, 1, 0)).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn rerecording_a_game_replaces_it() {
        let (state, _) = balanced(4).await;
        record_game(&state, "e1", game(1, 21, 10)).await.unwrap();
        let summary = record_game(&state, "e1", game(1, 10, 21)).await.unwrap();
        assert_eq!(summary.games.len(), 1);
        assert_eq!(summary.phase.leader, Some(TeamLabel::B));
    }

    #[tokio::test]
    async fn removing_games_steps_back_to_editable_teams() {
        let (state, _) = balanced(4).await;
        record_game(&state, "e1", game(1, 21, 10)).await.unwrap();

        let err = team_service::reset_teams(&state, "e1").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        let missing = remove_game(&state, "e1", 2).await.unwrap_err();
        assert!(matches!(missing, ServiceError::NotFound(_)));

        let summary = remove_game(&state, "e1", 1).await.unwrap();
        assert_eq!(summary.phase.phase, VisibleMatchPhase::TeamsAssigned);
        assert_eq!(summary.series_winner, "no_game");
    }

    #[tokio::test]
    async fn tied_series_cannot_be_saved() {
        let (state, _) = balanced(4).await;
        record_game(&state, "e1", game(1, 21, 10)).await.unwrap();
        record_game(&state, "e1", game(2, 10, 21)).await.unwrap();
        let err = save_match_result(&state, "e1").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn saved_match_rejects_further_edits() {
        let (state, _) = balanced(4).await;
        record_game(&state, "e1", game(1, 21, 10)).await.unwrap();
        save_match_result(&state, "e1").await.unwrap();

        let err = record_game(&state, "e1", game(2, 21, 10)).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
        let err = save_match_result(&state, "e1").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn partial_statistics_failure_is_reported_without_rollback() {
        let (state, store) = balanced(6).await;
        let team_a = team_members(&state, TeamLabel::A).await;
        store.reject_member_writes(team_a[0].clone()).await;

        record_game(&state, "e1", game(1, 21, 10)).await.unwrap();
        let err = save_match_result(&state, "e1").await.unwrap_err();
        match err {
            ServiceError::PartialStatisticsUpdate { failed } => {
                assert_eq!(failed, vec![team_a[0].clone()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let untouched = store.member(&team_a[0]).await.unwrap();
        assert_eq!(untouched.wins, 1);
        let updated = store.member(&team_a[1]).await.unwrap();
        assert_eq!(updated.wins, 2);

        assert_eq!(list_match_results(&state).await.unwrap().len(), 1);
        let session = state.session("e1");
        assert_eq!(session.lock().await.phase(), MatchPhase::Saved);
    }

    #[tokio::test]
    async fn failed_insert_keeps_series_decided() {
        let (state, store) = balanced(4).await;
        record_game(&state, "e1", game(1, 21, 10)).await.unwrap();
        store.set_offline(true);
        let err = save_match_result(&state, "e1").await.unwrap_err();
        assert!(matches!(err, ServiceError::Unavailable(_)));

        store.set_offline(false);
        let saved = save_match_result(&state, "e1").await.unwrap();
        assert_eq!(saved.updated_members, 4);
    }
}
