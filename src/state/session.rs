//! In-memory working copy of one event's match.

use std::{collections::BTreeMap, future::Future};

use tracing::{info, warn};

use crate::{
    error::ServiceError,
    state::{
        assignment::TeamAssignment,
        roster::TeamMode,
        scoring::{GameResult, Outcome, score_series},
        state_machine::{MatchEvent, MatchPhase, MatchStateMachine, Snapshot},
    },
};

/// Teams, recorded games and lifecycle phase of one event.
///
/// Sessions start empty and are filled from storage on first use.
#[derive(Debug)]
pub struct EventSession {
    event_id: String,
    hydrated: bool,
    machine: MatchStateMachine,
    assignment: Option<TeamAssignment>,
    games: BTreeMap<u32, GameResult>,
}

impl EventSession {
    /// Empty, unhydrated session.
    pub fn new(event_id: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            hydrated: false,
            machine: MatchStateMachine::new(),
            assignment: None,
            games: BTreeMap::new(),
        }
    }

    /// Install state recovered from storage. Later calls are ignored.
    pub fn hydrate(
        &mut self,
        phase: MatchPhase,
        assignment: Option<TeamAssignment>,
        games: Vec<GameResult>,
    ) {
        if self.hydrated {
            return;
        }
        self.machine = MatchStateMachine::starting_at(phase);
        self.assignment = assignment;
        self.games = games.into_iter().map(|game| (game.game_number, game)).collect();
        self.hydrated = true;
    }

    /// Whether storage has been read.
    pub fn is_hydrated(&self) -> bool {
        self.hydrated
    }

    /// Event identifier.
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> MatchPhase {
        self.machine.phase()
    }

    /// Lifecycle snapshot.
    pub fn snapshot(&self) -> Snapshot {
        self.machine.snapshot()
    }

    /// Current teams, if any.
    pub fn assignment(&self) -> Option<&TeamAssignment> {
        self.assignment.as_ref()
    }

    /// Current assignment or an invalid-state error naming the event.
    pub fn require_assignment(&self) -> Result<&TeamAssignment, ServiceError> {
        self.assignment.as_ref().ok_or_else(|| {
            ServiceError::InvalidState(format!("event `{}` has no team assignment", self.event_id))
        })
    }

    /// Replace the current teams.
    pub fn set_assignment(&mut self, assignment: Option<TeamAssignment>) {
        self.assignment = assignment;
    }

    /// Team count of the current teams.
    pub fn mode(&self) -> Option<TeamMode> {
        self.assignment.as_ref().map(TeamAssignment::mode)
    }

    /// Recorded games ordered by game number.
    pub fn games(&self) -> Vec<GameResult> {
        self.games.values().cloned().collect()
    }

    /// Number of recorded games.
    pub fn game_count(&self) -> u32 {
        self.games.len() as u32
    }

    /// Whether `game_number` is recorded.
    pub fn has_game(&self, game_number: u32) -> bool {
        self.games.contains_key(&game_number)
    }

    /// Games as they would be after inserting `game`, replacing one with the same number.
    pub fn games_with(&self, game: GameResult) -> BTreeMap<u32, GameResult> {
        let mut games = self.games.clone();
        games.insert(game.game_number, game);
        games
    }

    /// Games as they would be after dropping `game_number`.
    pub fn games_without(&self, game_number: u32) -> BTreeMap<u32, GameResult> {
        let mut games = self.games.clone();
        games.remove(&game_number);
        games
    }

    /// Replace the recorded games.
    pub fn set_games(&mut self, games: BTreeMap<u32, GameResult>) {
        self.games = games;
    }

    /// Series winner of the recorded games; `NoGame` without an assignment.
    pub fn series_winner(&self) -> Outcome {
        match self.mode() {
            Some(mode) => score_series(&self.games(), mode),
            None => Outcome::NoGame,
        }
    }

    /// Plan `event`, run `work`, then apply the plan on success or abort it on failure.
    ///
    /// `work` must not touch the session; callers commit their changes after this returns.
    pub async fn run_transition<F, Fut, T>(
        &mut self,
        event: MatchEvent,
        work: F,
    ) -> Result<(T, MatchPhase), ServiceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let plan = self.machine.plan(event)?;

        match work().await {
            Ok(value) => {
                let next = self.machine.apply(plan.id)?;
                if plan.from != next {
                    info!(
                        event_id = %self.event_id,
                        from = ?plan.from,
                        phase = ?next,
                        "match phase changed"
                    );
                }
                Ok((value, next))
            }
            Err(err) => {
                if let Err(abort_err) = self.machine.abort(plan.id) {
                    warn!(
                        event_id = %self.event_id,
                        event = ?event,
                        plan_id = %plan.id,
                        error = ?abort_err,
                        "failed to abort transition after work error"
                    );
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::*;
    use crate::state::roster::TeamLabel;

    fn game(number: u32, winner: Outcome) -> GameResult {
        GameResult {
            game_number: number,
            scores: IndexMap::new(),
            winner,
        }
    }

    #[tokio::test]
    async fn failed_work_leaves_phase_and_allows_retry() {
        let mut session = EventSession::new("e1");

        let err = session
            .run_transition(MatchEvent::TeamsBalanced, || async {
                Err::<(), _>(ServiceError::Degraded)
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Degraded));
        assert_eq!(session.phase(), MatchPhase::NoTeams);
        assert_eq!(session.snapshot().pending, None);

        let ((), next) = session
            .run_transition(MatchEvent::TeamsBalanced, || async { Ok(()) })
            .await
            .unwrap();
        assert_eq!(next, MatchPhase::TeamsAssigned);
    }

    #[tokio::test]
    async fn invalid_event_skips_work() {
        let mut session = EventSession::new("e1");
        let mut ran = false;
        let result = session
            .run_transition(MatchEvent::MatchSaved, || {
                ran = true;
                async { Ok(()) }
            })
            .await;
        assert!(matches!(result, Err(ServiceError::InvalidState(_))));
        assert!(!ran);
    }

    #[test]
    fn recording_same_number_replaces_game() {
        let mut session = EventSession::new("e1");
        session.hydrate(
            MatchPhase::GamesInProgress { recorded: 1 },
            Some(TeamAssignment::new(TeamMode::Two)),
            vec![game(1, Outcome::Team(TeamLabel::A))],
        );

        let games = session.games_with(game(1, Outcome::Team(TeamLabel::B)));
        assert_eq!(games.len(), 1);
        session.set_games(games);
        assert_eq!(session.series_winner(), Outcome::Team(TeamLabel::B));
    }

    #[test]
    fn hydrate_only_applies_once() {
        let mut session = EventSession::new("e1");
        session.hydrate(MatchPhase::Saved, None, Vec::new());
        session.hydrate(MatchPhase::NoTeams, None, Vec::new());
        assert!(session.is_hydrated());
        assert_eq!(session.phase(), MatchPhase::Saved);
    }
}
