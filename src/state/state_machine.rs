use thiserror::Error;
use uuid::Uuid;

use crate::state::{roster::TeamLabel, scoring::Outcome};

/// Lifecycle of one event's match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPhase {
    /// No team assignment exists yet.
    NoTeams,
    /// Teams are set; overrides are allowed until the first game is recorded.
    TeamsAssigned,
    /// Games are being recorded but no team leads the series outright.
    GamesInProgress {
        /// Number of recorded games.
        recorded: u32,
    },
    /// One team leads the series; the match can be saved.
    SeriesDecided(TeamLabel),
    /// Match result persisted. Terminal.
    Saved,
}

/// Events that can be applied to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchEvent {
    /// A fresh balance replaced the current assignment.
    TeamsBalanced,
    /// A manual override changed the assignment.
    TeamsEdited,
    /// The assignment was cleared.
    TeamsReset,
    /// The assignment was written to the team configuration collection.
    ConfigurationSaved,
    /// A game was added or replaced; carries the resulting tally.
    GameRecorded {
        /// Games recorded after the change.
        recorded: u32,
        /// Series winner after the change.
        series: Outcome,
    },
    /// A game was deleted; carries the resulting tally.
    GameRemoved {
        /// Games recorded after the change.
        recorded: u32,
        /// Series winner after the change.
        series: Outcome,
    },
    /// The match result was inserted.
    MatchSaved,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the state machine was in when the invalid event was received.
    pub from: MatchPhase,
    /// The event that cannot be applied from this phase.
    pub event: MatchEvent,
}

/// Errors that can occur when planning a state machine transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// A transition is already pending and must be applied or aborted.
    #[error("a transition is already pending")]
    AlreadyPending,
    /// The requested transition is not valid from the current phase.
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
}

/// Errors that can occur when applying a planned state machine transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    /// No transition is currently pending.
    #[error("no transition is pending")]
    NoPending,
    /// Plan ID does not match the pending plan.
    #[error("plan {got} does not match pending plan {expected}")]
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
    /// State machine phase changed since the plan was created.
    #[error("phase moved from {expected:?} to {actual:?} since planning")]
    PhaseMismatch {
        /// Phase when plan was created.
        expected: MatchPhase,
        /// Current phase.
        actual: MatchPhase,
    },
    /// State machine version changed since the plan was created.
    #[error("version moved from {expected} to {actual} since planning")]
    VersionMismatch {
        /// Version when plan was created.
        expected: usize,
        /// Current version.
        actual: usize,
    },
}

/// Errors that can occur when aborting a planned state machine transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbortError {
    /// No transition is currently pending.
    #[error("no transition is pending")]
    NoPending,
    /// Plan ID does not match the pending plan.
    #[error("plan {got} does not match pending plan {expected}")]
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
}

/// Unique identifier for a planned state transition.
pub type PlanId = Uuid;

/// A planned state machine transition that has been validated but not yet applied.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Unique identifier for this plan.
    pub id: PlanId,
    /// Phase the state machine is currently in.
    pub from: MatchPhase,
    /// Phase the state machine will transition to.
    pub to: MatchPhase,
    /// Event that triggered this transition.
    pub event: MatchEvent,
    /// Version number after applying this transition.
    pub version_next: usize,
}

/// Snapshot of the current state machine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    /// Current phase of the state machine.
    pub phase: MatchPhase,
    /// Version number of the state machine (increments on each transition).
    pub version: usize,
    /// Pending transition phase, if a transition is planned but not yet applied.
    pub pending: Option<MatchPhase>,
}

/// State machine guarding which edits an event's match accepts.
#[derive(Debug, Clone)]
pub struct MatchStateMachine {
    phase: MatchPhase,
    version: usize,
    pending: Option<Plan>,
}

impl Default for MatchStateMachine {
    fn default() -> Self {
        Self::starting_at(MatchPhase::NoTeams)
    }
}

impl MatchStateMachine {
    /// Create a new state machine with no teams.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume at a phase recovered from storage.
    pub fn starting_at(phase: MatchPhase) -> Self {
        Self {
            phase,
            version: 0,
            pending: None,
        }
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    /// Create a snapshot of the current state machine state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            version: self.version,
            pending: self.pending.as_ref().map(|plan| plan.to),
        }
    }

    /// Validate an event against the current phase and park it as the pending plan.
    pub fn plan(&mut self, event: MatchEvent) -> Result<Plan, PlanError> {
        if self.pending.is_some() {
            return Err(PlanError::AlreadyPending);
        }

        let next = self.compute_transition(event)?;

        let plan = Plan {
            id: Uuid::new_v4(),
            from: self.phase,
            to: next,
            event,
            version_next: self.version + 1,
        };

        self.pending = Some(plan.clone());

        Ok(plan)
    }

    /// Apply a planned transition, moving the state machine to the next phase.
    pub fn apply(&mut self, plan_id: PlanId) -> Result<MatchPhase, ApplyError> {
        let plan = self.pending.take().ok_or(ApplyError::NoPending)?;

        if plan.id != plan_id {
            let expected = plan.id;
            self.pending = Some(plan);
            return Err(ApplyError::IdMismatch {
                expected,
                got: plan_id,
            });
        }

        if self.phase != plan.from {
            return Err(ApplyError::PhaseMismatch {
                expected: plan.from,
                actual: self.phase,
            });
        }

        if self.version + 1 != plan.version_next {
            return Err(ApplyError::VersionMismatch {
                expected: plan.version_next,
                actual: self.version + 1,
            });
        }

        self.phase = plan.to;
        self.version = plan.version_next;

        Ok(self.phase)
    }

    /// Drop the pending plan, leaving the phase untouched.
    pub fn abort(&mut self, plan_id: PlanId) -> Result<(), AbortError> {
        let plan = self.pending.as_ref().ok_or(AbortError::NoPending)?;

        if plan.id != plan_id {
            return Err(AbortError::IdMismatch {
                expected: plan.id,
                got: plan_id,
            });
        }

        self.pending = None;
        Ok(())
    }

    fn compute_transition(&self, event: MatchEvent) -> Result<MatchPhase, InvalidTransition> {
        use MatchPhase::*;

        let next = match (self.phase, event) {
            (NoTeams | TeamsAssigned, MatchEvent::TeamsBalanced) => TeamsAssigned,
            (TeamsAssigned, MatchEvent::TeamsEdited) => TeamsAssigned,
            (TeamsAssigned, MatchEvent::TeamsReset) => NoTeams,
            (
                phase @ (TeamsAssigned | GamesInProgress { .. } | SeriesDecided(_)),
                MatchEvent::ConfigurationSaved,
            ) => phase,
            (
                TeamsAssigned | GamesInProgress { .. } | SeriesDecided(_),
                MatchEvent::GameRecorded { recorded, series },
            ) if recorded > 0 => after_games(recorded, series),
            (
                GamesInProgress { .. } | SeriesDecided(_),
                MatchEvent::GameRemoved { recorded, series },
            ) => after_games(recorded, series),
            (SeriesDecided(_), MatchEvent::MatchSaved) => Saved,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}

fn after_games(recorded: u32, series: Outcome) -> MatchPhase {
    match (recorded, series) {
        (0, _) => MatchPhase::TeamsAssigned,
        (_, Outcome::Team(label)) => MatchPhase::SeriesDecided(label),
        (recorded, Outcome::Draw | Outcome::NoGame) => MatchPhase::GamesInProgress { recorded },
    }
}
