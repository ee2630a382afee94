//! Per-member win/loss bookkeeping folded in when a match is saved.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::{
    assignment::TeamAssignment,
    roster::TeamLabel,
    scoring::{GameResult, Outcome, tally},
};

/// Series mark kept in a member's recent form, most recent first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum SeriesMark {
    /// Series won.
    W,
    /// Series lost.
    L,
}

impl SeriesMark {
    /// Single-letter label.
    pub fn as_str(self) -> &'static str {
        match self {
            SeriesMark::W => "W",
            SeriesMark::L => "L",
        }
    }
}

/// Accumulated statistics of one member.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MemberStats {
    /// Games won.
    pub wins: u32,
    /// Decisive games lost.
    pub losses: u32,
    /// Series won.
    pub winning_series: u32,
    /// Most recent first.
    #[serde(default)]
    pub recent_results: Vec<SeriesMark>,
}

impl MemberStats {
    /// Fold one saved series into the totals.
    pub fn apply(&mut self, delta: &StatsDelta, recent_len: usize) {
        self.wins += delta.wins;
        self.losses += delta.losses;
        if delta.won_series {
            self.winning_series += 1;
        }
        let mark = if delta.won_series {
            SeriesMark::W
        } else {
            SeriesMark::L
        };
        self.recent_results.insert(0, mark);
        self.recent_results.truncate(recent_len);
    }

    /// `wins / (wins + losses)`, zero before the first decisive game.
    pub fn win_rate(&self) -> f64 {
        let played = self.wins + self.losses;
        if played == 0 {
            0.0
        } else {
            f64::from(self.wins) / f64::from(played)
        }
    }
}

/// Change to apply to one member after a series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsDelta {
    /// Member the delta applies to.
    pub member_identity: String,
    /// Team the member played for.
    pub team: TeamLabel,
    /// Games the team won.
    pub wins: u32,
    /// Decisive games the member's team did not win.
    pub losses: u32,
    /// Whether the team won the series.
    pub won_series: bool,
}

/// One delta per member of every active team. Excluded members get nothing.
pub fn deltas_for(
    assignment: &TeamAssignment,
    games: &[GameResult],
    series_winner: Outcome,
) -> Vec<StatsDelta> {
    let counted = tally(games, assignment.mode());
    assignment
        .teams()
        .flat_map(|(label, members)| {
            let wins = counted.wins_of(label);
            let won_series = series_winner == Outcome::Team(label);
            members.iter().map(move |member| StatsDelta {
                member_identity: member.identity.clone(),
                team: label,
                wins,
                losses: counted.decisive - wins,
                won_series,
            })
        })
        .collect()
}
