//! DTO definitions for the public member and event listings.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    dao::models::{EventEntity, MemberEntity},
    state::{roster::Position, stats::SeriesMark},
};

/// Event shown in the upcoming list.
#[derive(Debug, Serialize, ToSchema)]
pub struct EventSummary {
    /// Event identifier.
    pub id: String,
    /// Display title.
    pub title: String,
    /// `YYYY-MM-DD`.
    pub date: String,
}

impl From<EventEntity> for EventSummary {
    fn from(value: EventEntity) -> Self {
        Self {
            id: value.id,
            title: value.title,
            date: value.date,
        }
    }
}

/// Ordering of the standings table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StandingsSort {
    /// Alphabetical by display name.
    #[default]
    Name,
    /// Most wins first.
    Wins,
    /// Most losses first.
    Losses,
    /// Highest win rate first.
    WinRate,
}

/// Query string of `/members/standings`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StandingsQuery {
    /// `name` (default), `wins`, `losses` or `win_rate`.
    #[serde(default)]
    #[param(value_type = Option<String>)]
    pub sort: StandingsSort,
}

/// One row of the standings table.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MemberStanding {
    /// Member identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Position resolved from the directory label.
    pub position: Position,
    /// Free-text position detail.
    pub detail_position: String,
    /// Games won.
    pub wins: u32,
    /// Decisive games lost.
    pub losses: u32,
    /// Series won.
    pub winning_series: u32,
    /// Percentage rounded to two decimals.
    pub win_rate: f64,
    /// Most recent first.
    pub recent_results: Vec<SeriesMark>,
}

impl MemberStanding {
    /// Build a standings row, with `position` already resolved.
    pub fn new(member: MemberEntity, position: Position) -> Self {
        let win_rate = (member.stats().win_rate() * 10_000.0).round() / 100.0;
        Self {
            id: member.id,
            name: member.name,
            position,
            detail_position: member.detail_position,
            wins: member.wins,
            losses: member.losses,
            winning_series: member.winning_series,
            win_rate,
            recent_results: member.recent_results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn win_rate_is_a_rounded_percentage() {
        let member = MemberEntity {
            id: "m1".into(),
            name: "Kim".into(),
            position: "가드".into(),
            detail_position: String::new(),
            wins: 2,
            losses: 1,
            winning_series: 1,
            recent_results: vec![SeriesMark::W],
        };
        let standing = MemberStanding::new(member, Position::Guard);
        assert_eq!(standing.win_rate, 66.67);
    }

    #[test]
    fn sort_defaults_to_name() {
        let query: StandingsQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.sort, StandingsSort::Name);
    }
}
