//! Evaluation boundary for the search engine.
//!
//! The `Evaluator` trait is the seam where a learned model plugs in:
//! anything that maps a position to (priors over policy indices, value
//! estimate) drives the search. The stubs here keep the engine testable
//! without any model.

use std::cell::RefCell;

use alphazero_chess::{codec, Position};
use alphazero_core::Result;
use rand::Rng;

/// Evaluation result: prior distribution plus value estimate.
#[derive(Clone, Debug)]
pub struct Evaluation {
    /// Prior probability per policy index. Length must equal
    /// [`codec::POLICY_SIZE`]; mass outside the legal moves is masked
    /// away at expansion.
    pub priors: Vec<f32>,

    /// Value estimate in [-1, 1] from the perspective of the side to
    /// move.
    pub value: f32,
}

/// A position evaluator. Inference is read-only; implementations are
/// expected to be safe to share across concurrently running games.
pub trait Evaluator {
    fn evaluate(&self, pos: &Position) -> Result<Evaluation>;
}

impl<E: Evaluator + ?Sized> Evaluator for &E {
    fn evaluate(&self, pos: &Position) -> Result<Evaluation> {
        (**self).evaluate(pos)
    }
}

/// Uniform prior over legal moves with a fixed value estimate.
///
/// The simplest contract-conforming evaluator; search guided by it
/// degenerates to exploration driven purely by visit counts.
#[derive(Clone, Debug)]
pub struct UniformEvaluator {
    value: f32,
}

impl UniformEvaluator {
    pub fn new(value: f32) -> Self {
        Self { value }
    }
}

impl Default for UniformEvaluator {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl Evaluator for UniformEvaluator {
    fn evaluate(&self, pos: &Position) -> Result<Evaluation> {
        let moves = pos.legal_moves();
        let mut priors = vec![0.0; codec::POLICY_SIZE];
        if !moves.is_empty() {
            let p = 1.0 / moves.len() as f32;
            for mv in moves {
                priors[codec::encode(mv)?] = p;
            }
        }
        Ok(Evaluation {
            priors,
            value: self.value,
        })
    }
}

/// Uniform prior with a value estimated by a random playout.
pub struct RolloutEvaluator<R: Rng> {
    rng: RefCell<R>,
    max_depth: usize,
}

impl<R: Rng> RolloutEvaluator<R> {
    /// # Arguments
    /// * `rng` - seeded generator for the playouts
    /// * `max_depth` - maximum plies per playout; games still running
    ///   at the cutoff count as draws
    pub fn new(rng: R, max_depth: usize) -> Self {
        Self {
            rng: RefCell::new(rng),
            max_depth,
        }
    }

    /// Random playout value from the perspective of the side to move
    /// at `pos`.
    fn rollout(&self, pos: &Position) -> f32 {
        let mut state = pos.clone();
        let mut depth = 0;

        while !state.is_terminal() && depth < self.max_depth {
            let moves = state.legal_moves();
            let idx = self.rng.borrow_mut().gen_range(0..moves.len());
            state = state.apply(moves[idx]);
            depth += 1;
        }

        let value = state.terminal_value_for_mover().unwrap_or(0.0);
        // terminal_value_for_mover is for the player to move at the end
        // of the playout; flip back to the initial mover's perspective.
        if depth % 2 == 0 {
            value
        } else {
            -value
        }
    }
}

impl<R: Rng> Evaluator for RolloutEvaluator<R> {
    fn evaluate(&self, pos: &Position) -> Result<Evaluation> {
        let moves = pos.legal_moves();
        let mut priors = vec![0.0; codec::POLICY_SIZE];
        if !moves.is_empty() {
            let p = 1.0 / moves.len() as f32;
            for mv in moves {
                priors[codec::encode(mv)?] = p;
            }
        }
        Ok(Evaluation {
            priors,
            value: self.rollout(pos),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_uniform_evaluator_priors() {
        let evaluator = UniformEvaluator::default();
        let eval = evaluator.evaluate(&Position::startpos()).unwrap();

        assert_eq!(eval.priors.len(), codec::POLICY_SIZE);
        assert_eq!(eval.value, 0.0);

        let nonzero: Vec<f32> = eval.priors.iter().copied().filter(|&p| p > 0.0).collect();
        assert_eq!(nonzero.len(), 20);
        for p in nonzero {
            assert!((p - 0.05).abs() < 1e-6);
        }
    }

    #[test]
    fn test_rollout_evaluator_value_range() {
        let rng = ChaCha8Rng::seed_from_u64(42);
        let evaluator = RolloutEvaluator::new(rng, 30);
        let eval = evaluator.evaluate(&Position::startpos()).unwrap();

        assert!(eval.value >= -1.0 && eval.value <= 1.0);
        let sum: f32 = eval.priors.iter().sum();
        assert!((sum - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_rollout_evaluator_sees_immediate_mate() {
        // White to move, mate in one (Qh5-f7 style position).
        let pos = Position::from_fen(
            "rnbqkbnr/ppppp2p/5p2/6pQ/4P3/8/PPPP1PPP/RNB1KBNR w KQkq - 0 3",
        )
        .unwrap();
        let rng = ChaCha8Rng::seed_from_u64(7);
        let evaluator = RolloutEvaluator::new(rng, 1);
        // Depth-1 playouts: some playouts mate immediately, giving +1
        // for the initial mover; none can lose in one ply.
        let eval = evaluator.evaluate(&pos).unwrap();
        assert!(eval.value >= 0.0);
    }
}
