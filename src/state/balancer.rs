//! Position-aware team balancing.

use rand::Rng;
use tracing::debug;

use crate::state::{
    assignment::TeamAssignment,
    roster::{RosterEntry, TeamMode, group_by_position},
    shuffle::shuffle,
};

/// Split attendees into `mode.count()` teams of near-equal size.
///
/// Each position bucket is shuffled and cut into contiguous slices so every team receives
/// roughly the same share of guards, forwards, centers and untagged players. The size pass
/// afterwards keeps moving a random member from the largest team to the smallest one until
/// the spread is at most one, which may bend the per-position proportions. Finally every
/// team's order is shuffled.
///
/// The output depends on `rng` only; two calls with differently seeded generators are
/// independent.
pub fn balance<R>(attendees: &[RosterEntry], mode: TeamMode, rng: &mut R) -> TeamAssignment
where
    R: Rng + ?Sized,
{
    let mut assignment = TeamAssignment::new(mode);
    let team_count = mode.count();

    for mut bucket in group_by_position(attendees).into_buckets() {
        if bucket.is_empty() {
            continue;
        }
        shuffle(&mut bucket, rng);
        let size = bucket.len();
        let slots = assignment.team_slots_mut();
        let mut members = bucket.into_iter();
        for (index, slot) in slots.iter_mut().enumerate() {
            let take = slice_end(size, index + 1, team_count) - slice_end(size, index, team_count);
            slot.extend(members.by_ref().take(take));
        }
    }

    even_out_sizes(&mut assignment, rng);

    for slot in assignment.team_slots_mut() {
        shuffle(slot, rng);
    }

    debug!(
        attendees = attendees.len(),
        teams = team_count,
        sizes = ?assignment.sizes(),
        "balanced teams"
    );

    assignment
}

/// `ceil(size * index / teams)`, the exclusive end of slice `index - 1`.
fn slice_end(size: usize, index: usize, teams: usize) -> usize {
    (size * index).div_ceil(teams)
}

fn even_out_sizes<R>(assignment: &mut TeamAssignment, rng: &mut R)
where
    R: Rng + ?Sized,
{
    loop {
        let largest = assignment.largest_team();
        let smallest = assignment.smallest_team();
        let slots = assignment.team_slots_mut();
        let (max, min) = (slots[largest.index()].len(), slots[smallest.index()].len());
        if max - min <= 1 {
            break;
        }
        let pick = rng.random_range(0..max);
        let member = slots[largest.index()].remove(pick);
        slots[smallest.index()].push(member);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::state::roster::{Position, PositionCounts, TeamLabel};
    use rand::{SeedableRng, rngs::StdRng};

    fn roster(guards: usize, forwards: usize, centers: usize, others: usize) -> Vec<RosterEntry> {
        let mut entries = Vec::new();
        let mut push = |prefix: &str, count: usize, position: Position| {
            for i in 0..count {
                let id = format!("{prefix}{i}");
                entries.push(RosterEntry::new(id.clone(), id, position));
            }
        };
        push("g", guards, Position::Guard);
        push("f", forwards, Position::Forward);
        push("c", centers, Position::Center);
        push("x", others, Position::Unknown);
        entries
    }

    fn assert_partition(input: &[RosterEntry], assignment: &TeamAssignment) {
        let mut seen = HashSet::new();
        for (_, team) in assignment.teams() {
            for member in team {
                assert!(seen.insert(member.identity.clone()), "duplicate {}", member.identity);
            }
        }
        assert!(assignment.excluded().is_empty());
        let expected = input.iter().map(|e| e.identity.clone()).collect::<HashSet<_>>();
        assert_eq!(seen, expected);
    }

    #[test]
    fn slice_bounds_follow_ceiling_division() {
        // 5 players over 2 teams: [0, 3), [3, 5)
        assert_eq!(slice_end(5, 0, 2), 0);
        assert_eq!(slice_end(5, 1, 2), 3);
        assert_eq!(slice_end(5, 2, 2), 5);
        // 4 players over 3 teams: [0, 2), [2, 3), [3, 4)
        assert_eq!(slice_end(4, 1, 3), 2);
        assert_eq!(slice_end(4, 2, 3), 3);
        assert_eq!(slice_end(4, 3, 3), 4);
    }

    #[test]
    fn sizes_differ_by_at_most_one_and_partition_is_exact() {
        let mut rng = StdRng::seed_from_u64(11);
        for mode in [TeamMode::Two, TeamMode::Three, TeamMode::Four] {
            for (g, f, c, x) in [
                (1, 0, 0, 0),
                (3, 3, 3, 0),
                (5, 1, 0, 2),
                (1, 1, 1, 1),
                (7, 0, 0, 0),
                (2, 5, 1, 4),
                (0, 0, 0, 13),
            ] {
                let input = roster(g, f, c, x);
                let assignment = balance(&input, mode, &mut rng);
                let sizes = assignment.sizes();
                let max = sizes.iter().max().copied().unwrap_or(0);
                let min = sizes.iter().min().copied().unwrap_or(0);
                assert!(max - min <= 1, "{mode:?} {sizes:?}");
                assert_eq!(sizes.len(), mode.count());
                assert_partition(&input, &assignment);
            }
        }
    }

    #[test]
    fn single_position_buckets_pile_onto_first_team_before_rebalancing() {
        // One guard, one forward, one center over two teams: every bucket's single member
        // lands in team A and the size pass has to move one of them to B.
        let mut rng = StdRng::seed_from_u64(5);
        let input = roster(1, 1, 1, 0);
        let assignment = balance(&input, TeamMode::Two, &mut rng);
        assert_eq!(assignment.sizes(), vec![2, 1]);
    }

    #[test]
    fn positions_are_spread_when_counts_divide_evenly() {
        let mut rng = StdRng::seed_from_u64(9);
        let input = roster(4, 4, 2, 0);
        let assignment = balance(&input, TeamMode::Two, &mut rng);
        for label in [TeamLabel::A, TeamLabel::B] {
            let counts = PositionCounts::of(assignment.team(label).unwrap());
            assert_eq!(counts.guards, 2);
            assert_eq!(counts.forwards, 2);
            assert_eq!(counts.centers, 1);
        }
    }

    #[test]
    fn empty_roster_gives_empty_teams() {
        let mut rng = StdRng::seed_from_u64(1);
        let assignment = balance(&[], TeamMode::Four, &mut rng);
        assert_eq!(assignment.sizes(), vec![0, 0, 0, 0]);
        assert!(assignment.is_empty());
    }

    #[test]
    fn seeded_generator_makes_balancing_reproducible() {
        let input = roster(3, 2, 2, 1);
        let first = balance(&input, TeamMode::Three, &mut StdRng::seed_from_u64(21));
        let second = balance(&input, TeamMode::Three, &mut StdRng::seed_from_u64(21));
        assert_eq!(first, second);
    }
}
