// Snake draft order: pick number <-> (round, draft position).
//
// Round 1 runs draft position 1..=N, round 2 runs N..=1, and so on.

use serde::{Deserialize, Serialize};

/// Where a given overall pick falls in a snake draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickSlot {
    /// 1-based overall pick number.
    pub pick_number: u32,
    /// 1-based round.
    pub round: u32,
    /// 1-based index of the pick within its round.
    pub position_in_round: u32,
    /// The draft position (1..=N) on the clock for this pick.
    pub draft_position: u32,
}

/// Total number of picks in a draft.
pub fn total_picks(participant_count: u32, total_rounds: u32) -> u32 {
    participant_count.saturating_mul(total_rounds)
}

/// Map a 1-based overall pick number to its snake slot.
///
/// Returns `None` for pick 0 or an empty draft. Callers are responsible for
/// treating pick numbers past the last pick as a completed draft.
pub fn slot_for_pick(participant_count: u32, pick_number: u32) -> Option<PickSlot> {
    if participant_count == 0 || pick_number == 0 {
        return None;
    }
    let round = pick_number.div_ceil(participant_count);
    let position_in_round = (pick_number - 1) % participant_count + 1;
    let draft_position = if round % 2 == 1 {
        position_in_round
    } else {
        participant_count - position_in_round + 1
    };
    Some(PickSlot {
        pick_number,
        round,
        position_in_round,
        draft_position,
    })
}

/// The first pick number `>= start_pick` at which `draft_position` is on the
/// clock, or `None` if there is none within `participant_count * total_rounds`.
pub fn next_pick_for_position(
    participant_count: u32,
    total_rounds: u32,
    draft_position: u32,
    start_pick: u32,
) -> Option<u32> {
    let last = total_picks(participant_count, total_rounds);
    (start_pick.max(1)..=last).find(|&p| {
        slot_for_pick(participant_count, p).is_some_and(|s| s.draft_position == draft_position)
    })
}

/// Every slot of a draft, in pick order.
pub fn full_order(participant_count: u32, total_rounds: u32) -> Vec<PickSlot> {
    (1..=total_picks(participant_count, total_rounds))
        .filter_map(|p| slot_for_pick(participant_count, p))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn six_team_round_two_reverses() {
        let first = slot_for_pick(6, 7).unwrap();
        assert_eq!(first.round, 2);
        assert_eq!(first.draft_position, 6);

        let last = slot_for_pick(6, 12).unwrap();
        assert_eq!(last.round, 2);
        assert_eq!(last.position_in_round, 6);
        assert_eq!(last.draft_position, 1);
    }

    #[test]
    fn round_one_runs_forward() {
        let positions: Vec<u32> = (1..=4)
            .map(|p| slot_for_pick(4, p).unwrap().draft_position)
            .collect();
        assert_eq!(positions, vec![1, 2, 3, 4]);
        let positions: Vec<u32> = (5..=8)
            .map(|p| slot_for_pick(4, p).unwrap().draft_position)
            .collect();
        assert_eq!(positions, vec![4, 3, 2, 1]);
    }

    #[test]
    fn single_participant_is_always_position_one() {
        for p in 1..=10 {
            let slot = slot_for_pick(1, p).unwrap();
            assert_eq!(slot.draft_position, 1);
            assert_eq!(slot.round, p);
        }
    }

    #[test]
    fn zero_inputs_yield_none() {
        assert!(slot_for_pick(0, 1).is_none());
        assert!(slot_for_pick(4, 0).is_none());
    }

    #[test]
    fn every_round_position_pair_visited_once() {
        for n in 2..=20u32 {
            for rounds in 1..=10u32 {
                let order = full_order(n, rounds);
                assert_eq!(order.len() as u32, n * rounds);

                let pairs: HashSet<(u32, u32)> =
                    order.iter().map(|s| (s.round, s.draft_position)).collect();
                assert_eq!(pairs.len() as u32, n * rounds, "n={n} rounds={rounds}");

                for round in 1..=rounds {
                    let seq: Vec<u32> = order
                        .iter()
                        .filter(|s| s.round == round)
                        .map(|s| s.draft_position)
                        .collect();
                    assert_eq!(seq.len() as u32, n);
                    if round % 2 == 1 {
                        assert!(seq.windows(2).all(|w| w[0] < w[1]), "round {round} n={n}");
                    } else {
                        assert!(seq.windows(2).all(|w| w[0] > w[1]), "round {round} n={n}");
                    }
                }
            }
        }
    }

    #[test]
    fn next_pick_inverse_law() {
        for n in 2..=20u32 {
            for rounds in 1..=10u32 {
                for p in 1..=n * rounds {
                    let slot = slot_for_pick(n, p).unwrap();
                    assert_eq!(
                        next_pick_for_position(n, rounds, slot.draft_position, p),
                        Some(p),
                        "n={n} rounds={rounds} p={p}"
                    );
                }
            }
        }
    }

    #[test]
    fn next_pick_scans_forward() {
        // Position 1 in a 6-team draft picks at 1, 12, 13, 24.
        assert_eq!(next_pick_for_position(6, 4, 1, 2), Some(12));
        assert_eq!(next_pick_for_position(6, 4, 1, 13), Some(13));
        assert_eq!(next_pick_for_position(6, 4, 1, 14), Some(24));
    }

    #[test]
    fn next_pick_none_past_the_end() {
        assert_eq!(next_pick_for_position(6, 4, 1, 25), None);
        // Position 3 last picks at 22 in round 4.
        assert_eq!(next_pick_for_position(6, 4, 3, 23), None);
        assert_eq!(next_pick_for_position(6, 4, 7, 1), None);
    }
}
