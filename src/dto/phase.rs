use serde::Serialize;
use utoipa::ToSchema;

use crate::state::{roster::TeamLabel, state_machine::MatchPhase};

/// Match phase as exposed to clients.
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisibleMatchPhase {
    /// Nobody has been split into teams yet.
    NoTeams,
    /// Teams are set and can still be edited.
    TeamsAssigned,
    /// Games recorded, no outright series leader.
    GamesInProgress,
    /// One team leads the series; the match can be saved.
    SeriesDecided,
    /// Match stored; the event is read-only.
    Saved,
}

impl From<MatchPhase> for VisibleMatchPhase {
    fn from(value: MatchPhase) -> Self {
        match value {
            MatchPhase::NoTeams => VisibleMatchPhase::NoTeams,
            MatchPhase::TeamsAssigned => VisibleMatchPhase::TeamsAssigned,
            MatchPhase::GamesInProgress { .. } => VisibleMatchPhase::GamesInProgress,
            MatchPhase::SeriesDecided(_) => VisibleMatchPhase::SeriesDecided,
            MatchPhase::Saved => VisibleMatchPhase::Saved,
        }
    }
}

/// Phase plus the series leader, when there is one.
#[derive(Debug, Serialize, ToSchema, Clone, Copy)]
pub struct PhaseSummary {
    /// Current lifecycle phase.
    pub phase: VisibleMatchPhase,
    /// Team leading the series, when there is a single leader.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leader: Option<TeamLabel>,
}

impl From<MatchPhase> for PhaseSummary {
    fn from(value: MatchPhase) -> Self {
        let leader = match value {
            MatchPhase::SeriesDecided(label) => Some(label),
            _ => None,
        };
        Self {
            phase: value.into(),
            leader,
        }
    }
}
