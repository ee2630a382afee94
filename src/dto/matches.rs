//! DTO definitions for game recording and saved match results.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{GameResultEntity, MatchResultEntity, TeamRosterEntity},
    dto::{format_system_time, phase::PhaseSummary},
    state::{roster::TeamLabel, scoring::GameResult},
};

/// Scores of one game. `winner` settles a tie at the top.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct RecordGameRequest {
    /// Game number, starting at 1.
    #[validate(range(min = 1))]
    pub game_number: u32,
    /// Points per team label; missing active teams count as zero.
    #[schema(value_type = Object)]
    pub scores: IndexMap<TeamLabel, u32>,
    /// Team chosen by the admin when the score is drawn.
    #[serde(default)]
    pub winner: Option<TeamLabel>,
}

/// Accepted game as displayed.
#[derive(Debug, Serialize, ToSchema)]
pub struct GameResultSummary {
    /// Game number.
    pub game_number: u32,
    /// Points per team.
    #[schema(value_type = Object)]
    pub scores: IndexMap<TeamLabel, u32>,
    /// `A`..`D` or `no_game`.
    pub winner: String,
}

impl From<&GameResult> for GameResultSummary {
    fn from(value: &GameResult) -> Self {
        Self {
            game_number: value.game_number,
            scores: value.scores.clone(),
            winner: value.winner.to_string(),
        }
    }
}

impl From<GameResultEntity> for GameResultSummary {
    fn from(value: GameResultEntity) -> Self {
        Self {
            game_number: value.game_number,
            scores: value.scores,
            winner: value.winner.to_string(),
        }
    }
}

/// Series state after a game was recorded or removed.
#[derive(Debug, Serialize, ToSchema)]
pub struct SeriesSummary {
    /// Lifecycle phase and series leader.
    #[serde(flatten)]
    pub phase: PhaseSummary,
    /// Recorded games in number order.
    pub games: Vec<GameResultSummary>,
    /// Game wins per active team.
    #[schema(value_type = Object)]
    pub wins: IndexMap<TeamLabel, u32>,
    /// `A`..`D`, `draw` or `no_game`.
    pub series_winner: String,
}

/// Acknowledgement of a stored match.
#[derive(Debug, Serialize, ToSchema)]
pub struct MatchSavedResponse {
    /// Identifier of the stored match.
    pub id: Uuid,
    /// Event the match belongs to.
    pub event_id: String,
    /// Winning team label.
    pub series_winner: String,
    /// Members whose statistics were updated.
    pub updated_members: usize,
}

/// Team line-up stored with a match.
#[derive(Debug, Serialize, ToSchema)]
pub struct SavedTeamSummary {
    /// Team label.
    pub label: TeamLabel,
    /// Display names in team order.
    pub member_names: Vec<String>,
}

impl From<TeamRosterEntity> for SavedTeamSummary {
    fn from(value: TeamRosterEntity) -> Self {
        Self {
            label: value.label,
            member_names: value.members.into_iter().map(|member| member.name).collect(),
        }
    }
}

/// Stored match result.
#[derive(Debug, Serialize, ToSchema)]
pub struct MatchResultSummary {
    /// Identifier of the stored match.
    pub id: Uuid,
    /// Event the match was played at.
    pub event_id: String,
    /// Number of teams.
    pub team_mode: u8,
    /// Teams as they played.
    pub teams: Vec<SavedTeamSummary>,
    /// Games in number order.
    pub game_results: Vec<GameResultSummary>,
    /// Series winner label.
    pub series_winner: String,
    /// RFC 3339 timestamp.
    pub created_at: String,
}

impl From<MatchResultEntity> for MatchResultSummary {
    fn from(value: MatchResultEntity) -> Self {
        Self {
            id: value.id,
            event_id: value.event_id,
            team_mode: value.team_mode.into(),
            teams: value.teams.into_iter().map(SavedTeamSummary::from).collect(),
            game_results: value
                .game_results
                .into_iter()
                .map(GameResultSummary::from)
                .collect(),
            series_winner: value.series_winner.to_string(),
            created_at: format_system_time(value.created_at),
        }
    }
}
