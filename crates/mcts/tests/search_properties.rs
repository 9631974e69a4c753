//! Property tests for the search engine.

use std::collections::VecDeque;

use alphazero_chess::Position;
use alphazero_mcts::{Mcts, MctsConfig, UniformEvaluator};
use proptest::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// A position reached by a short random playout from the start
/// position, filtered to non-terminal states.
fn arb_search_root() -> impl Strategy<Value = Position> {
    (0u64..10_000, 0usize..24).prop_map(|(seed, plies)| {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut pos = Position::startpos();
        let mut history: VecDeque<Position> = VecDeque::new();
        for _ in 0..plies {
            if pos.is_terminal() {
                break;
            }
            history.push_front(pos.clone());
            let moves = pos.legal_moves();
            let idx = rng.gen_range(0..moves.len());
            pos = pos.apply(moves[idx]);
        }
        while pos.is_terminal() {
            // Back off to the last non-terminal state on the playout.
            pos = history.pop_front().expect("start position is not terminal");
        }
        pos
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Every simulation lands its visit on exactly one root move.
    #[test]
    fn prop_root_visits_sum_to_simulations(root in arb_search_root(), seed in 0u64..1000) {
        let mut mcts = Mcts::new(
            MctsConfig::with_simulations(48),
            UniformEvaluator::default(),
            ChaCha8Rng::seed_from_u64(seed),
        );
        let dist = mcts.search(&root).unwrap();

        let total: u32 = dist.moves.iter().map(|m| m.visits).sum();
        prop_assert_eq!(total, 48);
    }

    /// At every expanded node the children's visit counts sum to one
    /// less than the node's own count.
    #[test]
    fn prop_visit_conservation_holds_everywhere(root in arb_search_root(), seed in 0u64..1000) {
        let mut mcts = Mcts::new(
            MctsConfig::with_simulations(64),
            UniformEvaluator::default(),
            ChaCha8Rng::seed_from_u64(seed),
        );
        mcts.search(&root).unwrap();

        for node in mcts.tree().nodes() {
            if node.expanded {
                let edge_sum: u32 = node.edges.iter().map(|e| e.visits).sum();
                prop_assert_eq!(edge_sum, node.visits - 1);
            }
        }
    }

    /// The same seed reproduces the same distribution exactly.
    #[test]
    fn prop_search_is_deterministic(root in arb_search_root(), seed in 0u64..1000) {
        let run = |seed: u64| {
            let mut mcts = Mcts::new(
                MctsConfig::with_simulations(32),
                UniformEvaluator::default(),
                ChaCha8Rng::seed_from_u64(seed),
            );
            mcts.search(&root).unwrap()
        };
        let a = run(seed);
        let b = run(seed);

        prop_assert_eq!(a.moves.len(), b.moves.len());
        for (x, y) in a.moves.iter().zip(&b.moves) {
            prop_assert_eq!(x.mv, y.mv);
            prop_assert_eq!(x.visits, y.visits);
        }
        prop_assert_eq!(a.root_value, b.root_value);
    }

    /// Root value is the mean of backed-up values, always in range.
    #[test]
    fn prop_root_value_in_bounds(root in arb_search_root(), seed in 0u64..1000) {
        let mut mcts = Mcts::new(
            MctsConfig::with_simulations(32),
            UniformEvaluator::default(),
            ChaCha8Rng::seed_from_u64(seed),
        );
        let dist = mcts.search(&root).unwrap();

        prop_assert!(dist.root_value.is_finite());
        prop_assert!((-1.0..=1.0).contains(&dist.root_value));
    }
}

/// Without noise a search over a forced mate concentrates visits on
/// the mating move regardless of the seed.
#[test]
fn test_noiseless_search_finds_back_rank_mate() {
    let pos = Position::from_fen("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1").unwrap();
    for seed in 0..3u64 {
        let mut mcts = Mcts::new(
            MctsConfig::for_evaluation(400),
            UniformEvaluator::default(),
            ChaCha8Rng::seed_from_u64(seed),
        );
        let dist = mcts.search(&pos).unwrap();
        let best = dist.moves.iter().max_by_key(|m| m.visits).unwrap();
        assert_eq!(alphazero_chess::codec::to_uci(best.mv), "a1a8");
    }
}
