//! DTO definitions for team balancing and the manual override routes.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dto::{matches::GameResultSummary, phase::PhaseSummary, validation::validate_identity},
    state::{
        assignment::{Direction, TeamAssignment},
        roster::{Position, PositionCounts, RosterEntry, TeamLabel},
        session::EventSession,
    },
};

/// Request to split the event's attendees into fresh teams.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct BalanceRequest {
    /// Number of teams (2, 3 or 4). Falls back to the configured default.
    #[serde(default)]
    #[validate(range(min = 2, max = 4))]
    pub team_mode: Option<u8>,
}

/// Move a member from one team to the end of another.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct MoveMemberRequest {
    /// Member to move.
    #[validate(custom(function = "validate_identity"))]
    pub member_id: String,
    /// Team the member is in.
    pub from: TeamLabel,
    /// Destination team.
    pub to: TeamLabel,
}

/// Take a member out of a team without removing them from the event.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ExcludeMemberRequest {
    /// Member to exclude.
    #[validate(custom(function = "validate_identity"))]
    pub member_id: String,
    /// Team the member is in.
    pub from: TeamLabel,
}

/// Put an excluded member back into the smallest team.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct RestoreMemberRequest {
    /// Excluded member to bring back.
    #[validate(custom(function = "validate_identity"))]
    pub member_id: String,
}

/// Swap a member with its neighbour inside one team.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ReorderMemberRequest {
    /// Team to reorder.
    pub team: TeamLabel,
    /// Zero-based position of the member to move.
    pub index: usize,
    /// Direction of the swap.
    pub direction: Direction,
}

/// Shuffle the order of one team.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ShuffleTeamRequest {
    /// Team to shuffle.
    pub team: TeamLabel,
}

/// Member as displayed inside a team.
#[derive(Debug, Serialize, ToSchema)]
pub struct RosterMemberSummary {
    /// Member identity.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Resolved position.
    pub position: Position,
    /// Free-text position detail.
    pub detail_position: String,
}

impl From<&RosterEntry> for RosterMemberSummary {
    fn from(value: &RosterEntry) -> Self {
        Self {
            id: value.identity.clone(),
            name: value.name.clone(),
            position: value.position,
            detail_position: value.detail_position.clone(),
        }
    }
}

/// One team with its members in display order.
#[derive(Debug, Serialize, ToSchema)]
pub struct TeamSummary {
    /// Team label.
    pub label: TeamLabel,
    /// Members in display order.
    pub members: Vec<RosterMemberSummary>,
    /// Headcount per position.
    pub counts: PositionCounts,
}

/// Teams and excluded members of an event.
#[derive(Debug, Serialize, ToSchema)]
pub struct AssignmentSummary {
    /// Number of active teams.
    pub team_mode: u8,
    /// Active teams in label order.
    pub teams: Vec<TeamSummary>,
    /// Members kept out of every team.
    pub excluded: Vec<RosterMemberSummary>,
}

impl From<&TeamAssignment> for AssignmentSummary {
    fn from(value: &TeamAssignment) -> Self {
        Self {
            team_mode: value.mode().into(),
            teams: value
                .teams()
                .map(|(label, members)| TeamSummary {
                    label,
                    members: members.iter().map(RosterMemberSummary::from).collect(),
                    counts: PositionCounts::of(members),
                })
                .collect(),
            excluded: value
                .excluded()
                .iter()
                .map(RosterMemberSummary::from)
                .collect(),
        }
    }
}

/// Everything the admin screen needs to render an event.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionSummary {
    /// Event identifier.
    pub event_id: String,
    /// Lifecycle phase and series leader.
    #[serde(flatten)]
    pub phase: PhaseSummary,
    /// Absent while no teams exist.
    pub assignment: Option<AssignmentSummary>,
    /// Recorded games in number order.
    pub games: Vec<GameResultSummary>,
    /// `A`..`D`, `draw` or `no_game`.
    pub series_winner: String,
}

impl From<&EventSession> for SessionSummary {
    fn from(value: &EventSession) -> Self {
        Self {
            event_id: value.event_id().to_owned(),
            phase: value.phase().into(),
            assignment: value.assignment().map(AssignmentSummary::from),
            games: value.games().iter().map(GameResultSummary::from).collect(),
            series_winner: value.series_winner().to_string(),
        }
    }
}
