//! Roster vocabulary shared by the balancer, the override layer and the scorer.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Playing position a member is tagged with in the member directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    /// Ball handlers.
    Guard,
    /// Wings.
    Forward,
    /// Bigs.
    Center,
    /// Untagged or unrecognised label, grouped under "other".
    Unknown,
}

/// Label of a team slot. The active subset depends on the [`TeamMode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
pub enum TeamLabel {
    /// First team.
    A,
    /// Second team.
    B,
    /// Third team, active from three teams.
    C,
    /// Fourth team, active with four teams.
    D,
}

impl TeamLabel {
    /// Every label in display order.
    pub const ALL: [TeamLabel; 4] = [TeamLabel::A, TeamLabel::B, TeamLabel::C, TeamLabel::D];

    /// Zero-based slot index of the label.
    pub fn index(self) -> usize {
        match self {
            TeamLabel::A => 0,
            TeamLabel::B => 1,
            TeamLabel::C => 2,
            TeamLabel::D => 3,
        }
    }
}

impl fmt::Display for TeamLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TeamLabel::A => "A",
            TeamLabel::B => "B",
            TeamLabel::C => "C",
            TeamLabel::D => "D",
        };
        f.write_str(label)
    }
}

/// Number of teams an event is split into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TeamMode {
    /// Two teams.
    #[default]
    Two,
    /// Three teams.
    Three,
    /// Four teams.
    Four,
}

/// Raised when a caller asks for an unsupported number of teams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TeamModeError {
    /// Only 2, 3 and 4 are supported.
    #[error("unsupported team mode {0}: expected 2, 3 or 4 teams")]
    InvalidTeamMode(u8),
}

impl TeamMode {
    /// Number of active teams.
    pub fn count(self) -> usize {
        match self {
            TeamMode::Two => 2,
            TeamMode::Three => 3,
            TeamMode::Four => 4,
        }
    }

    /// Active labels in order (`A..`).
    pub fn labels(self) -> &'static [TeamLabel] {
        &TeamLabel::ALL[..self.count()]
    }

    /// Whether the label belongs to the active set.
    pub fn is_active(self, label: TeamLabel) -> bool {
        label.index() < self.count()
    }
}

impl TryFrom<u8> for TeamMode {
    type Error = TeamModeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(TeamMode::Two),
            3 => Ok(TeamMode::Three),
            4 => Ok(TeamMode::Four),
            other => Err(TeamModeError::InvalidTeamMode(other)),
        }
    }
}

impl From<TeamMode> for u8 {
    fn from(value: TeamMode) -> Self {
        value.count() as u8
    }
}

/// Attendee as seen by the balancer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    /// Member document key, unique within the club.
    pub identity: String,
    /// Display name.
    pub name: String,
    /// Resolved position.
    pub position: Position,
    /// Free-form sub-tag such as "point guard"; may be empty.
    #[serde(default)]
    pub detail_position: String,
}

impl RosterEntry {
    /// Entry with an empty position detail.
    pub fn new(identity: impl Into<String>, name: impl Into<String>, position: Position) -> Self {
        Self {
            identity: identity.into(),
            name: name.into(),
            position,
            detail_position: String::new(),
        }
    }
}

/// Attendees split by position, each bucket keeping the input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionGroups {
    /// Guards in input order.
    pub guards: Vec<RosterEntry>,
    /// Forwards in input order.
    pub forwards: Vec<RosterEntry>,
    /// Centers in input order.
    pub centers: Vec<RosterEntry>,
    /// Everyone else in input order.
    pub others: Vec<RosterEntry>,
}

impl PositionGroups {
    /// Buckets in distribution order.
    pub fn into_buckets(self) -> [Vec<RosterEntry>; 4] {
        [self.guards, self.forwards, self.centers, self.others]
    }
}

/// Partition a roster into position buckets.
pub fn group_by_position(attendees: &[RosterEntry]) -> PositionGroups {
    let mut groups = PositionGroups::default();
    for entry in attendees {
        let bucket = match entry.position {
            Position::Guard => &mut groups.guards,
            Position::Forward => &mut groups.forwards,
            Position::Center => &mut groups.centers,
            Position::Unknown => &mut groups.others,
        };
        bucket.push(entry.clone());
    }
    groups
}

/// Per-position headcount of a team.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct PositionCounts {
    /// Guards in the team.
    pub guards: usize,
    /// Forwards in the team.
    pub forwards: usize,
    /// Centers in the team.
    pub centers: usize,
    /// Members without a known position.
    pub others: usize,
}

impl PositionCounts {
    /// Count the positions of `team`.
    pub fn of(team: &[RosterEntry]) -> Self {
        team.iter().fold(Self::default(), |mut counts, entry| {
            match entry.position {
                Position::Guard => counts.guards += 1,
                Position::Forward => counts.forwards += 1,
                Position::Center => counts.centers += 1,
                Position::Unknown => counts.others += 1,
            }
            counts
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, position: Position) -> RosterEntry {
        RosterEntry::new(id, id, position)
    }

    #[test]
    fn team_mode_accepts_two_to_four() {
        assert_eq!(TeamMode::try_from(2), Ok(TeamMode::Two));
        assert_eq!(TeamMode::try_from(3), Ok(TeamMode::Three));
        assert_eq!(TeamMode::try_from(4), Ok(TeamMode::Four));
    }

    #[test]
    fn team_mode_rejects_out_of_range() {
        assert_eq!(
            TeamMode::try_from(1),
            Err(TeamModeError::InvalidTeamMode(1))
        );
        assert_eq!(
            TeamMode::try_from(5),
            Err(TeamModeError::InvalidTeamMode(5))
        );
        assert!(serde_json::from_str::<TeamMode>("0").is_err());
    }

    #[test]
    fn team_mode_labels_follow_count() {
        assert_eq!(TeamMode::Three.labels(), &[TeamLabel::A, TeamLabel::B, TeamLabel::C]);
        assert!(!TeamMode::Two.is_active(TeamLabel::C));
        assert!(TeamMode::Four.is_active(TeamLabel::D));
    }

    #[test]
    fn grouping_keeps_input_order_per_bucket() {
        let roster = vec![
            entry("g1", Position::Guard),
            entry("c1", Position::Center),
            entry("x1", Position::Unknown),
            entry("g2", Position::Guard),
            entry("f1", Position::Forward),
        ];

        let groups = group_by_position(&roster);

        let ids = |bucket: &[RosterEntry]| {
            bucket.iter().map(|e| e.identity.clone()).collect::<Vec<_>>()
        };
        assert_eq!(ids(&groups.guards), vec!["g1", "g2"]);
        assert_eq!(ids(&groups.forwards), vec!["f1"]);
        assert_eq!(ids(&groups.centers), vec!["c1"]);
        assert_eq!(ids(&groups.others), vec!["x1"]);
    }

    #[test]
    fn grouping_empty_roster_yields_empty_buckets() {
        assert_eq!(group_by_position(&[]), PositionGroups::default());
    }

    #[test]
    fn position_counts_tally_each_bucket() {
        let team = vec![
            entry("g1", Position::Guard),
            entry("g2", Position::Guard),
            entry("x", Position::Unknown),
        ];
        let counts = PositionCounts::of(&team);
        assert_eq!(counts.guards, 2);
        assert_eq!(counts.others, 1);
        assert_eq!(counts.centers, 0);
    }
}
