//! Self-play data generation: games of search against itself, policy
//! targets derived from visit counts, and a bounded replay buffer the
//! training loop samples from.

pub mod game;
pub mod policy;
pub mod replay;

pub use game::{play_game, GameRecord, SelfPlayConfig};
pub use policy::PolicyTargetEncoder;
pub use replay::{ReplayBuffer, Snapshot, TrainingExample};
