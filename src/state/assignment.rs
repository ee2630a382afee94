//! Team assignment value and the manual override operations an admin applies to it.
//!
//! Every operation is a plain synchronous mutation of one [`TeamAssignment`]. Nothing
//! renormalises team sizes behind the caller's back; a failed operation leaves the value
//! exactly as it was.

use std::fmt;

use rand::Rng;
use serde::Deserialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::state::{
    roster::{RosterEntry, TeamLabel, TeamMode},
    shuffle::shuffle,
};

/// Where a member was expected to be found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// An active team.
    Team(TeamLabel),
    /// The excluded list.
    Excluded,
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Team(label) => write!(f, "team {label}"),
            Slot::Excluded => f.write_str("excluded set"),
        }
    }
}

/// Failures of the override layer. Both leave the assignment untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssignmentError {
    /// The member is not where the caller said.
    #[error("member `{member}` not found in {slot}")]
    NotFound { member: String, slot: Slot },
    /// The label is outside the active mode.
    #[error("team {label} is not active with {teams} teams")]
    InactiveTeam { label: TeamLabel, teams: usize },
}

/// Direction of an adjacent swap inside a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Towards the front of the team.
    Up,
    /// Towards the back of the team.
    Down,
}

/// Partition of an event's attendees into ordered teams plus an excluded set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamAssignment {
    mode: TeamMode,
    teams: Vec<Vec<RosterEntry>>,
    excluded: Vec<RosterEntry>,
}

impl TeamAssignment {
    /// Empty assignment with one slot per active team.
    pub fn new(mode: TeamMode) -> Self {
        Self {
            mode,
            teams: vec![Vec::new(); mode.count()],
            excluded: Vec::new(),
        }
    }

    /// Rebuild an assignment from persisted parts.
    ///
    /// Missing team slots are filled with empty teams; members stored under a label that is
    /// not active for `mode` are appended to the excluded set so nobody is silently dropped.
    pub fn from_parts(
        mode: TeamMode,
        teams: impl IntoIterator<Item = (TeamLabel, Vec<RosterEntry>)>,
        excluded: Vec<RosterEntry>,
    ) -> Self {
        let mut assignment = Self::new(mode);
        assignment.excluded = excluded;
        for (label, members) in teams {
            if mode.is_active(label) {
                assignment.teams[label.index()].extend(members);
            } else {
                assignment.excluded.extend(members);
            }
        }
        assignment
    }

    /// Number of active teams.
    pub fn mode(&self) -> TeamMode {
        self.mode
    }

    /// Members of an active team in display order.
    pub fn team(&self, label: TeamLabel) -> Result<&[RosterEntry], AssignmentError> {
        self.ensure_active(label)?;
        Ok(&self.teams[label.index()])
    }

    /// Active teams paired with their label.
    pub fn teams(&self) -> impl Iterator<Item = (TeamLabel, &[RosterEntry])> {
        self.mode
            .labels()
            .iter()
            .copied()
            .zip(self.teams.iter().map(Vec::as_slice))
    }

    /// Members kept out of every team.
    pub fn excluded(&self) -> &[RosterEntry] {
        &self.excluded
    }

    /// Team sizes in label order.
    pub fn sizes(&self) -> Vec<usize> {
        self.teams.iter().map(Vec::len).collect()
    }

    /// Number of members placed in a team (excluded members are not counted).
    pub fn assigned_count(&self) -> usize {
        self.teams.iter().map(Vec::len).sum()
    }

    /// True when no team holds a member and nobody is excluded.
    pub fn is_empty(&self) -> bool {
        self.assigned_count() == 0 && self.excluded.is_empty()
    }

    /// Label of the team a member currently plays for.
    pub fn team_of(&self, identity: &str) -> Option<TeamLabel> {
        self.teams()
            .find(|(_, members)| members.iter().any(|m| m.identity == identity))
            .map(|(label, _)| label)
    }

    /// Move a member from one team to the end of another.
    pub fn move_member(
        &mut self,
        identity: &str,
        from: TeamLabel,
        to: TeamLabel,
    ) -> Result<(), AssignmentError> {
        self.ensure_active(from)?;
        self.ensure_active(to)?;
        let member = self.take_from_team(identity, from)?;
        self.teams[to.index()].push(member);
        Ok(())
    }

    /// Pull a member out of a team into the excluded set.
    pub fn exclude(&mut self, identity: &str, from: TeamLabel) -> Result<(), AssignmentError> {
        self.ensure_active(from)?;
        let member = self.take_from_team(identity, from)?;
        self.excluded.push(member);
        Ok(())
    }

    /// Put an excluded member back into the currently smallest team.
    ///
    /// Ties go to the lowest label. Returns the team the member joined.
    pub fn restore(&mut self, identity: &str) -> Result<TeamLabel, AssignmentError> {
        let position = self
            .excluded
            .iter()
            .position(|m| m.identity == identity)
            .ok_or_else(|| AssignmentError::NotFound {
                member: identity.to_owned(),
                slot: Slot::Excluded,
            })?;
        let member = self.excluded.remove(position);
        let target = self.smallest_team();
        self.teams[target.index()].push(member);
        Ok(target)
    }

    /// Swap the member at `index` with its neighbour. Out-of-range moves are no-ops.
    pub fn reorder(
        &mut self,
        label: TeamLabel,
        index: usize,
        direction: Direction,
    ) -> Result<(), AssignmentError> {
        self.ensure_active(label)?;
        let team = &mut self.teams[label.index()];
        match direction {
            Direction::Up if index > 0 && index < team.len() => team.swap(index - 1, index),
            Direction::Down if index + 1 < team.len() => team.swap(index, index + 1),
            _ => {}
        }
        Ok(())
    }

    /// Shuffle the order of a single team.
    pub fn shuffle_team<R>(&mut self, label: TeamLabel, rng: &mut R) -> Result<(), AssignmentError>
    where
        R: Rng + ?Sized,
    {
        self.ensure_active(label)?;
        shuffle(&mut self.teams[label.index()], rng);
        Ok(())
    }

    /// Lowest-labelled team among those with the fewest members.
    pub fn smallest_team(&self) -> TeamLabel {
        self.teams()
            .min_by_key(|(label, members)| (members.len(), *label))
            .map(|(label, _)| label)
            .unwrap_or(TeamLabel::A)
    }

    /// Lowest-labelled team among those with the most members.
    pub fn largest_team(&self) -> TeamLabel {
        self.teams()
            .min_by_key(|(label, members)| (std::cmp::Reverse(members.len()), *label))
            .map(|(label, _)| label)
            .unwrap_or(TeamLabel::A)
    }

    pub(crate) fn team_slots_mut(&mut self) -> &mut [Vec<RosterEntry>] {
        &mut self.teams
    }

    fn take_from_team(
        &mut self,
        identity: &str,
        label: TeamLabel,
    ) -> Result<RosterEntry, AssignmentError> {
        let team = &mut self.teams[label.index()];
        let position = team
            .iter()
            .position(|m| m.identity == identity)
            .ok_or_else(|| AssignmentError::NotFound {
                member: identity.to_owned(),
                slot: Slot::Team(label),
            })?;
        Ok(team.remove(position))
    }

    fn ensure_active(&self, label: TeamLabel) -> Result<(), AssignmentError> {
        if self.mode.is_active(label) {
            Ok(())
        } else {
            Err(AssignmentError::InactiveTeam {
                label,
                teams: self.mode.count(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::roster::Position;
    use rand::{SeedableRng, rngs::StdRng};

    fn member(id: &str) -> RosterEntry {
        RosterEntry::new(id, id.to_uppercase(), Position::Unknown)
    }

    fn ids(members: &[RosterEntry]) -> Vec<&str> {
        members.iter().map(|m| m.identity.as_str()).collect()
    }

    fn sample() -> TeamAssignment {
        TeamAssignment::from_parts(
            TeamMode::Two,
            [
                (TeamLabel::A, vec![member("a1"), member("a2"), member("a3")]),
                (TeamLabel::B, vec![member("b1"), member("b2")]),
            ],
            Vec::new(),
        )
    }

    #[test]
    fn move_appends_to_destination() {
        let mut assignment = sample();
        assignment
            .move_member("a1", TeamLabel::A, TeamLabel::B)
            .unwrap();

        assert_eq!(ids(assignment.team(TeamLabel::A).unwrap()), vec!["a2", "a3"]);
        assert_eq!(
            ids(assignment.team(TeamLabel::B).unwrap()),
            vec!["b1", "b2", "a1"]
        );
    }

    #[test]
    fn move_round_trip_restores_contents() {
        let original = sample();
        let mut assignment = original.clone();

        assignment
            .move_member("a2", TeamLabel::A, TeamLabel::B)
            .unwrap();
        assignment
            .move_member("a2", TeamLabel::B, TeamLabel::A)
            .unwrap();

        let mut before = ids(original.team(TeamLabel::A).unwrap());
        let mut after = ids(assignment.team(TeamLabel::A).unwrap());
        before.sort_unstable();
        after.sort_unstable();
        assert_eq!(before, after);
        assert_eq!(
            assignment.team(TeamLabel::B).unwrap(),
            original.team(TeamLabel::B).unwrap()
        );
    }

    #[test]
    fn move_missing_member_is_not_found_and_changes_nothing() {
        let mut assignment = sample();
        let err = assignment
            .move_member("b1", TeamLabel::A, TeamLabel::B)
            .unwrap_err();

        assert_eq!(
            err,
            AssignmentError::NotFound {
                member: "b1".into(),
                slot: Slot::Team(TeamLabel::A),
            }
        );
        assert_eq!(assignment, sample());
    }

    #[test]
    fn inactive_team_is_rejected() {
        let mut assignment = sample();
        let err = assignment
            .move_member("a1", TeamLabel::A, TeamLabel::C)
            .unwrap_err();
        assert_eq!(
            err,
            AssignmentError::InactiveTeam {
                label: TeamLabel::C,
                teams: 2
            }
        );
        assert_eq!(assignment, sample());
    }

    #[test]
    fn exclude_then_restore_conserves_members() {
        let mut assignment = sample();
        let total = assignment.assigned_count();

        assignment.exclude("a3", TeamLabel::A).unwrap();
        assert_eq!(ids(assignment.excluded()), vec!["a3"]);
        assert_eq!(assignment.assigned_count(), total - 1);
        assert_eq!(assignment.team_of("a3"), None);

        assignment.restore("a3").unwrap();
        assert!(assignment.excluded().is_empty());
        assert_eq!(assignment.assigned_count(), total);
        assert!(assignment.team_of("a3").is_some());
    }

    #[test]
    fn restore_targets_smallest_team_with_label_tiebreak() {
        let mut assignment = sample();
        assignment.exclude("a1", TeamLabel::A).unwrap();
        // A and B now both hold two members; the tie goes to A.
        assert_eq!(assignment.restore("a1").unwrap(), TeamLabel::A);

        assignment.exclude("b1", TeamLabel::B).unwrap();
        assert_eq!(assignment.restore("b1").unwrap(), TeamLabel::B);
    }

    #[test]
    fn restore_unknown_member_reports_excluded_slot() {
        let mut assignment = sample();
        let err = assignment.restore("ghost").unwrap_err();
        assert_eq!(
            err,
            AssignmentError::NotFound {
                member: "ghost".into(),
                slot: Slot::Excluded,
            }
        );
    }

    #[test]
    fn reorder_swaps_neighbours() {
        let mut assignment = sample();
        assignment.reorder(TeamLabel::A, 1, Direction::Up).unwrap();
        assert_eq!(
            ids(assignment.team(TeamLabel::A).unwrap()),
            vec!["a2", "a1", "a3"]
        );
        assignment.reorder(TeamLabel::A, 1, Direction::Down).unwrap();
        assert_eq!(
            ids(assignment.team(TeamLabel::A).unwrap()),
            vec!["a2", "a3", "a1"]
        );
    }

    #[test]
    fn reorder_at_boundaries_is_noop() {
        let mut assignment = sample();
        assignment.reorder(TeamLabel::A, 0, Direction::Up).unwrap();
        assignment.reorder(TeamLabel::A, 2, Direction::Down).unwrap();
        assignment.reorder(TeamLabel::A, 9, Direction::Up).unwrap();
        assert_eq!(assignment, sample());
    }

    #[test]
    fn shuffle_team_only_touches_that_team() {
        let mut assignment = sample();
        let mut rng = StdRng::seed_from_u64(3);
        assignment.shuffle_team(TeamLabel::A, &mut rng).unwrap();

        let mut shuffled = ids(assignment.team(TeamLabel::A).unwrap());
        shuffled.sort_unstable();
        assert_eq!(shuffled, vec!["a1", "a2", "a3"]);
        assert_eq!(
            assignment.team(TeamLabel::B).unwrap(),
            sample().team(TeamLabel::B).unwrap()
        );
    }

    #[test]
    fn from_parts_moves_inactive_labels_to_excluded() {
        let assignment = TeamAssignment::from_parts(
            TeamMode::Two,
            [
                (TeamLabel::A, vec![member("a1")]),
                (TeamLabel::C, vec![member("c1")]),
            ],
            Vec::new(),
        );
        assert_eq!(assignment.sizes(), vec![1, 0]);
        assert_eq!(ids(assignment.excluded()), vec!["c1"]);
    }
}
