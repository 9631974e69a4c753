//! Monte Carlo tree search over chess positions.
//!
//! The search is AlphaZero-shaped: an [`Evaluator`] supplies move
//! priors and a value estimate at each leaf, PUCT balances those
//! priors against accumulated visit statistics, and backpropagation
//! flips the value sign at every ply so each node scores positions
//! for its own mover.

pub mod config;
pub mod evaluator;
pub mod search;
pub mod tree;

pub use config::MctsConfig;
pub use evaluator::{Evaluation, Evaluator, RolloutEvaluator, UniformEvaluator};
pub use search::{Mcts, MctsDist, MoveVisits};
