use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

use crate::state::{
    assignment::TeamAssignment,
    roster::{Position, RosterEntry, TeamLabel, TeamMode},
    scoring::{GameResult, Outcome},
    stats::{MemberStats, SeriesMark},
};

/// Club member as stored in the `users` collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MemberEntity {
    /// Document key.
    pub id: String,
    /// Display name, also the key attendance entries refer to.
    pub name: String,
    /// Raw position label as typed in the directory (e.g. "가드").
    #[serde(default)]
    pub position: String,
    /// Free-text position detail shown next to the position.
    #[serde(default)]
    pub detail_position: String,
    /// Games won across all saved matches.
    #[serde(default)]
    pub wins: u32,
    /// Decisive games lost across all saved matches.
    #[serde(default)]
    pub losses: u32,
    /// Series won.
    #[serde(default)]
    pub winning_series: u32,
    /// Most recent first.
    #[serde(default)]
    pub recent_results: Vec<SeriesMark>,
}

impl MemberEntity {
    /// Statistics columns as a core value.
    pub fn stats(&self) -> MemberStats {
        MemberStats {
            wins: self.wins,
            losses: self.losses,
            winning_series: self.winning_series,
            recent_results: self.recent_results.clone(),
        }
    }
}

/// Statistics columns written back after a match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MemberStatsEntity {
    /// Member document key.
    pub member_id: String,
    /// New win total.
    pub wins: u32,
    /// New loss total.
    pub losses: u32,
    /// New series win total.
    pub winning_series: u32,
    /// New recent form, most recent first.
    pub recent_results: Vec<SeriesMark>,
}

impl MemberStatsEntity {
    /// Statistics of `member_id` ready to be written.
    pub fn new(member_id: String, stats: MemberStats) -> Self {
        Self {
            member_id,
            wins: stats.wins,
            losses: stats.losses,
            winning_series: stats.winning_series,
            recent_results: stats.recent_results,
        }
    }
}

/// Club event (practice or game day).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventEntity {
    /// Document key.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Calendar day, `YYYY-MM-DD`.
    pub date: String,
}

/// Answer a member gave for an event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AttendanceStatus {
    /// The member plays.
    #[serde(rename = "attending", alias = "참석")]
    Attending,
    /// The member sits out.
    #[serde(rename = "not_attending", alias = "불참석")]
    NotAttending,
}

/// One attendance answer. Entries refer to members by display name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AttendanceEntity {
    /// Event the answer belongs to.
    pub event_id: String,
    /// Display name of the member.
    pub member_name: String,
    /// The answer.
    pub status: AttendanceStatus,
}

/// Members of one team inside a persisted configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamRosterEntity {
    /// Team label.
    pub label: TeamLabel,
    /// Member identities in display order.
    pub members: Vec<RosterMemberEntity>,
}

/// Snapshot of a rostered member, kept so a configuration survives directory edits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RosterMemberEntity {
    /// Member identity at save time.
    pub id: String,
    /// Display name at save time.
    pub name: String,
    /// Position resolved when the team was built.
    #[serde(default = "unknown_position")]
    pub position: Position,
    /// Position detail at save time.
    #[serde(default)]
    pub detail_position: String,
}

fn unknown_position() -> Position {
    Position::Unknown
}

impl From<&RosterEntry> for RosterMemberEntity {
    fn from(value: &RosterEntry) -> Self {
        Self {
            id: value.identity.clone(),
            name: value.name.clone(),
            position: value.position,
            detail_position: value.detail_position.clone(),
        }
    }
}

impl From<RosterMemberEntity> for RosterEntry {
    fn from(value: RosterMemberEntity) -> Self {
        Self {
            identity: value.id,
            name: value.name,
            position: value.position,
            detail_position: value.detail_position,
        }
    }
}

/// Persisted line-up of every active team, in label order.
pub fn team_rosters(assignment: &TeamAssignment) -> Vec<TeamRosterEntity> {
    assignment
        .teams()
        .map(|(label, members)| TeamRosterEntity {
            label,
            members: members.iter().map(RosterMemberEntity::from).collect(),
        })
        .collect()
}

/// Rebuild an assignment from persisted line-ups.
pub fn assignment_from_rosters(
    mode: TeamMode,
    teams: Vec<TeamRosterEntity>,
    excluded: Vec<RosterMemberEntity>,
) -> TeamAssignment {
    TeamAssignment::from_parts(
        mode,
        teams.into_iter().map(|team| {
            (
                team.label,
                team.members.into_iter().map(RosterEntry::from).collect(),
            )
        }),
        excluded.into_iter().map(RosterEntry::from).collect(),
    )
}

/// Saved team split of one event, upserted by `event_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamConfigurationEntity {
    /// Event the configuration belongs to.
    pub event_id: String,
    /// Number of teams.
    pub team_mode: TeamMode,
    /// Active teams in label order.
    pub teams: Vec<TeamRosterEntity>,
    /// Members kept out of every team.
    #[serde(default)]
    pub excluded: Vec<RosterMemberEntity>,
    /// Time of the last save.
    pub created_at: SystemTime,
}

/// Score line of one game in a saved match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameResultEntity {
    /// Game number within the series, starting at 1.
    pub game_number: u32,
    /// Points per active team.
    pub scores: IndexMap<TeamLabel, u32>,
    /// Winner after any manual resolution.
    pub winner: Outcome,
}

impl From<GameResult> for GameResultEntity {
    fn from(value: GameResult) -> Self {
        Self {
            game_number: value.game_number,
            scores: value.scores,
            winner: value.winner,
        }
    }
}

impl From<GameResultEntity> for GameResult {
    fn from(value: GameResultEntity) -> Self {
        Self {
            game_number: value.game_number,
            scores: value.scores,
            winner: value.winner,
        }
    }
}

/// Final record of a played match. Insert-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchResultEntity {
    /// Document key.
    pub id: Uuid,
    /// Event the match was played at.
    pub event_id: String,
    /// Number of teams.
    pub team_mode: TeamMode,
    /// Teams as they played.
    pub teams: Vec<TeamRosterEntity>,
    /// Games in number order.
    pub game_results: Vec<GameResultEntity>,
    /// Series winner.
    pub series_winner: Outcome,
    /// Insertion time.
    pub created_at: SystemTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rosters_round_trip_through_assignment() {
        let assignment = TeamAssignment::from_parts(
            TeamMode::Two,
            [
                (TeamLabel::A, vec![RosterEntry::new("g1", "Kim", Position::Guard)]),
                (TeamLabel::B, vec![RosterEntry::new("c1", "Lee", Position::Center)]),
            ],
            Vec::new(),
        );
        let rosters = team_rosters(&assignment);
        assert_eq!(rosters[1].members[0].position, Position::Center);

        let rebuilt = assignment_from_rosters(TeamMode::Two, rosters, Vec::new());
        assert_eq!(rebuilt, assignment);
    }

    #[test]
    fn legacy_roster_member_without_position_is_unknown() {
        let member: RosterMemberEntity =
            serde_json::from_str(r#"{"id":"m1","name":"Park"}"#).unwrap();
        assert_eq!(member.position, Position::Unknown);
    }

    #[test]
    fn attendance_accepts_directory_labels() {
        let entry: AttendanceEntity = serde_json::from_str(
            r#"{"event_id":"e1","member_name":"Kim","status":"참석"}"#,
        )
        .unwrap();
        assert_eq!(entry.status, AttendanceStatus::Attending);
    }
}
