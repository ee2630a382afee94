//! Per-game and per-series winner computation.
//!
//! Ties are never broken automatically: a drawn game needs an explicit human resolution
//! before it is accepted, and a drawn series blocks the match from being saved.

use std::{fmt, str::FromStr};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::roster::{TeamLabel, TeamMode};

/// Winner of a game or a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Outcome {
    /// A single team won.
    Team(TeamLabel),
    /// Several teams share the top score or win count.
    Draw,
    /// Nothing was scored (every score zero, or no decisive game).
    NoGame,
}

impl Outcome {
    /// The winning team, if any.
    pub fn team(self) -> Option<TeamLabel> {
        match self {
            Outcome::Team(label) => Some(label),
            Outcome::Draw | Outcome::NoGame => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Team(label) => write!(f, "{label}"),
            Outcome::Draw => f.write_str("draw"),
            Outcome::NoGame => f.write_str("no_game"),
        }
    }
}

/// Unrecognised outcome label.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown outcome `{0}`")]
pub struct ParseOutcomeError(String);

impl FromStr for Outcome {
    type Err = ParseOutcomeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "A" => Ok(Outcome::Team(TeamLabel::A)),
            "B" => Ok(Outcome::Team(TeamLabel::B)),
            "C" => Ok(Outcome::Team(TeamLabel::C)),
            "D" => Ok(Outcome::Team(TeamLabel::D)),
            "draw" => Ok(Outcome::Draw),
            "no_game" => Ok(Outcome::NoGame),
            other => Err(ParseOutcomeError(other.to_owned())),
        }
    }
}

impl From<Outcome> for String {
    fn from(value: Outcome) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for Outcome {
    type Error = ParseOutcomeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Reasons a game cannot be accepted as entered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoringError {
    /// The game is drawn and no winner was chosen.
    #[error("game {game_number} is drawn; a winner must be chosen among {leaders:?}")]
    UndeterminedWinner {
        game_number: u32,
        leaders: Vec<TeamLabel>,
    },
    /// The chosen winner is not one of the tied leaders.
    #[error("team {label} cannot win game {game_number}: only {leaders:?} share the top score")]
    InvalidResolution {
        game_number: u32,
        label: TeamLabel,
        leaders: Vec<TeamLabel>,
    },
    /// The game number is zero or above the series limit.
    #[error("game number {game_number} is outside 1..={max}")]
    InvalidGameNumber { game_number: u32, max: u32 },
    /// A score names a team outside the active mode.
    #[error("score given for team {label}, which is not playing with {teams} teams")]
    InactiveTeam { label: TeamLabel, teams: usize },
}

/// Accepted result of one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    /// Game number within the series.
    pub game_number: u32,
    /// Score of every active team in label order.
    pub scores: IndexMap<TeamLabel, u32>,
    /// Never [`Outcome::Draw`] once accepted.
    pub winner: Outcome,
}

/// Win counts accumulated over a series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesTally {
    /// Decisive game wins per active team.
    pub wins: IndexMap<TeamLabel, u32>,
    /// Games with a team winner.
    pub decisive: u32,
    /// Every recorded game, decisive or not.
    pub played: u32,
}

impl SeriesTally {
    /// Wins of `label`, zero when absent.
    pub fn wins_of(&self, label: TeamLabel) -> u32 {
        self.wins.get(&label).copied().unwrap_or(0)
    }
}

/// Winner of a single game from raw scores. Missing teams count as zero.
pub fn score_game(scores: &IndexMap<TeamLabel, u32>, mode: TeamMode) -> Outcome {
    let active = active_scores(scores, mode);
    leader(&active).map_or(Outcome::NoGame, |leaders| match leaders.as_slice() {
        [single] => Outcome::Team(*single),
        _ => Outcome::Draw,
    })
}

/// Validate a game entry and fold in the human resolution of a draw.
///
/// `resolution` is only consulted when the scores are tied at the top; it must name one of
/// the tied teams.
pub fn resolve_game(
    game_number: u32,
    scores: &IndexMap<TeamLabel, u32>,
    mode: TeamMode,
    resolution: Option<TeamLabel>,
    max_games: u32,
) -> Result<GameResult, ScoringError> {
    if game_number == 0 || game_number > max_games {
        return Err(ScoringError::InvalidGameNumber {
            game_number,
            max: max_games,
        });
    }
    if let Some(label) = scores.keys().copied().find(|label| !mode.is_active(*label)) {
        return Err(ScoringError::InactiveTeam {
            label,
            teams: mode.count(),
        });
    }

    let active = active_scores(scores, mode);
    let winner = match score_game(&active, mode) {
        Outcome::Draw => {
            let leaders = leader(&active).unwrap_or_default();
            match resolution {
                Some(label) if leaders.contains(&label) => Outcome::Team(label),
                Some(label) => {
                    return Err(ScoringError::InvalidResolution {
                        game_number,
                        label,
                        leaders,
                    });
                }
                None => {
                    return Err(ScoringError::UndeterminedWinner {
                        game_number,
                        leaders,
                    });
                }
            }
        }
        decided => decided,
    };

    Ok(GameResult {
        game_number,
        scores: active,
        winner,
    })
}

/// Count game wins per active team.
pub fn tally(games: &[GameResult], mode: TeamMode) -> SeriesTally {
    let mut wins: IndexMap<TeamLabel, u32> =
        mode.labels().iter().map(|label| (*label, 0)).collect();
    let mut decisive = 0;
    for game in games {
        if let Some(count) = game.winner.team().and_then(|label| wins.get_mut(&label)) {
            *count += 1;
            decisive += 1;
        }
    }
    SeriesTally {
        wins,
        decisive,
        played: games.len() as u32,
    }
}

/// Series winner by majority of game wins. Draws and no-games only count as played.
pub fn score_series(games: &[GameResult], mode: TeamMode) -> Outcome {
    let tally = tally(games, mode);
    if tally.decisive == 0 {
        return Outcome::NoGame;
    }
    match leader(&tally.wins).as_deref() {
        Some([single]) => Outcome::Team(*single),
        _ => Outcome::Draw,
    }
}

fn active_scores(scores: &IndexMap<TeamLabel, u32>, mode: TeamMode) -> IndexMap<TeamLabel, u32> {
    mode.labels()
        .iter()
        .map(|label| (*label, scores.get(label).copied().unwrap_or(0)))
        .collect()
}

/// Labels sharing the strictly highest non-zero value, or `None` when every value is zero.
fn leader(values: &IndexMap<TeamLabel, u32>) -> Option<Vec<TeamLabel>> {
    let max = values.values().copied().max().filter(|max| *max > 0)?;
    Some(
        values
            .iter()
            .filter(|(_, value)| **value == max)
            .map(|(label, _)| *label)
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(pairs: &[(TeamLabel, u32)]) -> IndexMap<TeamLabel, u32> {
        pairs.iter().copied().collect()
    }

    fn game(number: u32, winner: Outcome) -> GameResult {
        GameResult {
            game_number: number,
            scores: IndexMap::new(),
            winner,
        }
    }

    use TeamLabel::{A, B, C};

    #[test]
    fn all_zero_is_no_game() {
        assert_eq!(score_game(&scores(&[(A, 0), (B, 0)]), TeamMode::Two), Outcome::NoGame);
        assert_eq!(score_game(&IndexMap::new(), TeamMode::Three), Outcome::NoGame);
    }

    #[test]
    fn highest_score_wins() {
        assert_eq!(
            score_game(&scores(&[(A, 10), (B, 7)]), TeamMode::Two),
            Outcome::Team(A)
        );
        assert_eq!(
            score_game(&scores(&[(A, 3), (B, 7), (C, 11)]), TeamMode::Three),
            Outcome::Team(C)
        );
    }

    #[test]
    fn tied_top_is_draw() {
        assert_eq!(score_game(&scores(&[(A, 5), (B, 5)]), TeamMode::Two), Outcome::Draw);
        // Tie below the top does not matter.
        assert_eq!(
            score_game(&scores(&[(A, 9), (B, 5), (C, 5)]), TeamMode::Three),
            Outcome::Team(A)
        );
    }

    #[test]
    fn inactive_scores_are_ignored_by_score_game() {
        assert_eq!(
            score_game(&scores(&[(A, 1), (B, 0), (C, 50)]), TeamMode::Two),
            Outcome::Team(A)
        );
    }

    #[test]
    fn unresolved_draw_is_rejected() {
        let err = resolve_game(1, &scores(&[(A, 5), (B, 5)]), TeamMode::Two, None, 4).unwrap_err();
        assert_eq!(
            err,
            ScoringError::UndeterminedWinner {
                game_number: 1,
                leaders: vec![A, B]
            }
        );
    }

    #[test]
    fn draw_resolution_must_name_a_leader() {
        let entered = scores(&[(A, 5), (B, 5), (C, 2)]);
        let err = resolve_game(2, &entered, TeamMode::Three, Some(C), 4).unwrap_err();
        assert!(matches!(err, ScoringError::InvalidResolution { label: C, .. }));

        let result = resolve_game(2, &entered, TeamMode::Three, Some(B), 4).unwrap();
        assert_eq!(result.winner, Outcome::Team(B));
    }

    #[test]
    fn resolution_is_ignored_for_decided_games() {
        let result = resolve_game(1, &scores(&[(A, 3), (B, 1)]), TeamMode::Two, Some(B), 4).unwrap();
        assert_eq!(result.winner, Outcome::Team(A));
    }

    #[test]
    fn resolved_scores_fill_missing_teams() {
        let result = resolve_game(1, &scores(&[(B, 4)]), TeamMode::Three, None, 4).unwrap();
        assert_eq!(result.scores, scores(&[(A, 0), (B, 4), (C, 0)]));
    }

    #[test]
    fn game_number_must_be_in_range() {
        let entered = scores(&[(A, 1)]);
        assert!(matches!(
            resolve_game(0, &entered, TeamMode::Two, None, 4),
            Err(ScoringError::InvalidGameNumber { .. })
        ));
        assert!(matches!(
            resolve_game(5, &entered, TeamMode::Two, None, 4),
            Err(ScoringError::InvalidGameNumber { game_number: 5, max: 4 })
        ));
    }

    #[test]
    fn inactive_team_score_is_rejected() {
        let err = resolve_game(1, &scores(&[(A, 1), (C, 2)]), TeamMode::Two, None, 4).unwrap_err();
        assert_eq!(err, ScoringError::InactiveTeam { label: C, teams: 2 });
    }

    #[test]
    fn series_majority_wins() {
        let games = [
            game(1, Outcome::Team(A)),
            game(2, Outcome::Team(A)),
            game(3, Outcome::Team(B)),
        ];
        assert_eq!(score_series(&games, TeamMode::Two), Outcome::Team(A));
    }

    #[test]
    fn series_even_split_is_draw() {
        let games = [game(1, Outcome::Team(A)), game(2, Outcome::Team(B))];
        assert_eq!(score_series(&games, TeamMode::Two), Outcome::Draw);
    }

    #[test]
    fn series_without_decisive_game_is_no_game() {
        assert_eq!(score_series(&[], TeamMode::Two), Outcome::NoGame);
        let games = [game(1, Outcome::NoGame), game(2, Outcome::NoGame)];
        assert_eq!(score_series(&games, TeamMode::Two), Outcome::NoGame);
    }

    #[test]
    fn no_games_count_as_played_only() {
        let games = [
            game(1, Outcome::NoGame),
            game(2, Outcome::Team(C)),
            game(3, Outcome::Team(A)),
            game(4, Outcome::Team(C)),
        ];
        let counted = tally(&games, TeamMode::Three);
        assert_eq!(counted.played, 4);
        assert_eq!(counted.decisive, 3);
        assert_eq!(counted.wins_of(C), 2);
        assert_eq!(score_series(&games, TeamMode::Three), Outcome::Team(C));
    }

    #[test]
    fn outcome_round_trips_through_its_label() {
        for outcome in [Outcome::Team(A), Outcome::Team(TeamLabel::D), Outcome::Draw, Outcome::NoGame] {
            assert_eq!(outcome.to_string().parse::<Outcome>(), Ok(outcome));
        }
        assert!("E".parse::<Outcome>().is_err());
    }
}
