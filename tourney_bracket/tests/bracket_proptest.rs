//! Property-based tests for bracket construction using proptest

use std::collections::HashSet;

use chrono::Utc;
use proptest::prelude::*;
use tourney_bracket::tournament::bracket::{apply_result, build_bracket, seed_order};
use tourney_bracket::tournament::{EntrantId, rounds};
use uuid::Uuid;

fn entrants(n: usize) -> Vec<EntrantId> {
    (0..n).map(|_| Uuid::new_v4()).collect()
}

proptest! {
    #[test]
    fn test_bracket_shape(n in 2usize..=64) {
        let list = entrants(n);
        let plan = build_bracket(Uuid::new_v4(), &list, Utc::now()).unwrap();

        let expected_rounds = (n as f64).log2().ceil() as u32;
        prop_assert_eq!(plan.total_rounds, expected_rounds);
        prop_assert_eq!(plan.bracket_size as usize, 1 << expected_rounds);
        prop_assert_eq!(plan.bye_count as usize, plan.bracket_size as usize - n);
        prop_assert_eq!(plan.bracket.bye_count(), plan.bye_count as usize);
        prop_assert_eq!(plan.bracket.matches().count(), plan.bracket_size as usize - 1);

        for round in 1..=plan.total_rounds {
            prop_assert_eq!(
                plan.bracket.round(round).len() as u32,
                rounds::matches_in_round(plan.bracket_size, round)
            );
        }
    }

    #[test]
    fn test_every_entrant_placed_once(n in 2usize..=64) {
        let list = entrants(n);
        let plan = build_bracket(Uuid::new_v4(), &list, Utc::now()).unwrap();

        let mut seen = HashSet::new();
        for m in plan.bracket.round(1) {
            for contestant in [m.contestant1, m.contestant2].into_iter().flatten() {
                prop_assert!(seen.insert(contestant));
            }
        }
        prop_assert_eq!(seen.len(), n);
    }

    #[test]
    fn test_byes_advance_immediately(n in 2usize..=64) {
        let list = entrants(n);
        let plan = build_bracket(Uuid::new_v4(), &list, Utc::now()).unwrap();

        for bye in plan.bracket.round(1).iter().filter(|m| m.is_bye) {
            prop_assert!(bye.is_completed());
            prop_assert_eq!(bye.winner, bye.contestant1);
            prop_assert!(bye.contestant2.is_none());

            let next = plan.bracket.get(2, bye.next_match_number()).unwrap();
            let slot = if bye.feeds_first_slot() { next.contestant1 } else { next.contestant2 };
            prop_assert_eq!(slot, bye.winner);
        }
    }

    #[test]
    fn test_seed_order_is_permutation(exponent in 0u32..=8) {
        let size = 1u32 << exponent;
        let order = seed_order(size);
        let mut sorted = order.clone();
        sorted.sort_unstable();
        prop_assert_eq!(sorted, (1..=size).collect::<Vec<_>>());

        // Paired seeds always sum to size + 1
        if size >= 2 {
            for pair in order.chunks(2) {
                prop_assert_eq!(pair[0] + pair[1], size + 1);
            }
        }
    }

    #[test]
    fn test_playing_out_crowns_one_champion(n in 2usize..=32, picks in prop::collection::vec(any::<bool>(), 64)) {
        let list = entrants(n);
        let mut bracket = build_bracket(Uuid::new_v4(), &list, Utc::now()).unwrap().bracket;
        let mut current_round = 1;
        let mut pick = picks.into_iter().cycle();

        for round in 1..=bracket.total_rounds {
            let ready: Vec<_> = bracket.round(round).iter().filter(|m| m.is_ready()).map(|m| m.id).collect();
            for match_id in ready {
                let scores = if pick.next().unwrap_or(true) { (2, 1) } else { (0, 3) };
                let outcome = apply_result(&mut bracket, match_id, scores, current_round, Utc::now()).unwrap();
                current_round = outcome.current_round;
                if round == bracket.total_rounds {
                    prop_assert!(outcome.completes_tournament());
                    prop_assert_eq!(outcome.placements[0].0, outcome.winner);
                }
            }
            prop_assert!(bracket.is_round_complete(round));
        }

        let champion = bracket.champion();
        prop_assert!(champion.is_some());
        prop_assert!(list.contains(&champion.unwrap()));
        prop_assert_eq!(current_round, bracket.total_rounds);
    }
}
