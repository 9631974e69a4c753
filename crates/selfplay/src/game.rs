//! Playing complete games of search against itself.

use alphazero_chess::{codec, observation::Encoder, ChessMove, Color, Position};
use alphazero_core::{Policy, Result};
use alphazero_mcts::{Evaluator, Mcts, MctsConfig};
use rand::Rng;

use crate::policy::PolicyTargetEncoder;
use crate::replay::TrainingExample;

/// Knobs for a single self-play game.
#[derive(Clone, Debug)]
pub struct SelfPlayConfig {
    /// Temperature for the policy targets and early move sampling.
    pub temperature: f32,
    /// Ply after which move selection turns greedy.
    pub temperature_drop: usize,
    /// Hard cap on game length; games still running count as draws.
    pub max_plies: usize,
    /// Board history frames in each observation.
    pub history: usize,
}

impl Default for SelfPlayConfig {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            temperature_drop: 30,
            max_plies: 512,
            history: 8,
        }
    }
}

/// One finished game: its training examples plus the result.
#[derive(Clone, Debug)]
pub struct GameRecord {
    pub examples: Vec<TrainingExample>,
    /// Final result from White's perspective: +1, 0 or -1.
    pub outcome_white: f32,
    pub plies: usize,
    pub final_fen: String,
}

/// Play one game from `start`, searching every position and recording
/// a training example per ply. Value targets are back-filled once the
/// outcome is known, signed for the player who was to move.
pub fn play_game<E, R>(
    evaluator: E,
    mcts_config: &MctsConfig,
    config: &SelfPlayConfig,
    start: Position,
    mut rng: R,
) -> Result<GameRecord>
where
    E: Evaluator,
    R: Rng + Clone,
{
    let encoder = Encoder::new(config.history);
    let target_encoder = PolicyTargetEncoder::new(config.temperature);
    let mut mcts = Mcts::new(mcts_config.clone(), evaluator, rng.clone());

    let mut pos = start;
    let mut pending: Vec<(Vec<f32>, Vec<f32>, Color)> = Vec::new();

    while !pos.is_terminal() && pending.len() < config.max_plies {
        let dist = mcts.search(&pos)?;
        let target = target_encoder.encode(&dist)?;

        let greedy = pending.len() >= config.temperature_drop || config.temperature <= 0.0;
        let mv = select_move(&dist.moves, &target, greedy, &mut rng)?;

        pending.push((encoder.encode(&pos), target.into_inner(), pos.side_to_move()));
        pos = pos.apply(mv);
    }

    // A game stopped by the ply cap never reached a terminal state and
    // scores as a draw.
    let outcome_white = pos.outcome_white().unwrap_or(0.0);

    let plies = pending.len();
    let examples = pending
        .into_iter()
        .map(|(observation, policy, mover)| TrainingExample {
            observation,
            policy,
            value: match mover {
                Color::White => outcome_white,
                Color::Black => -outcome_white,
            },
        })
        .collect();

    Ok(GameRecord {
        examples,
        outcome_white,
        plies,
        final_fen: pos.fen(),
    })
}

/// Draw a move from the encoded target, or take the most-visited move
/// when playing greedily.
fn select_move<R: Rng>(
    moves: &[alphazero_mcts::MoveVisits],
    target: &Policy,
    greedy: bool,
    rng: &mut R,
) -> Result<ChessMove> {
    debug_assert!(!moves.is_empty());

    if greedy {
        let mut best = &moves[0];
        for m in &moves[1..] {
            if m.visits > best.visits {
                best = m;
            }
        }
        return Ok(best.mv);
    }

    let weights: Vec<f32> = moves
        .iter()
        .map(|m| Ok(target[codec::encode(m.mv)?]))
        .collect::<Result<_>>()?;
    let total: f32 = weights.iter().sum();

    let threshold = rng.gen::<f32>() * total;
    let mut cumulative = 0.0;
    for (m, w) in moves.iter().zip(&weights) {
        cumulative += w;
        if cumulative >= threshold {
            return Ok(m.mv);
        }
    }
    // Floating point slack can leave the threshold above the last
    // cumulative sum.
    Ok(moves[moves.len() - 1].mv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alphazero_mcts::UniformEvaluator;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn short_config() -> (MctsConfig, SelfPlayConfig) {
        (
            MctsConfig::with_simulations(24),
            SelfPlayConfig {
                max_plies: 20,
                history: 2,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_game_produces_one_example_per_ply() {
        let (mcts_config, config) = short_config();
        let record = play_game(
            UniformEvaluator::default(),
            &mcts_config,
            &config,
            Position::startpos(),
            ChaCha8Rng::seed_from_u64(11),
        )
        .unwrap();

        assert!(!record.examples.is_empty());
        assert!(record.examples.len() <= config.max_plies);
        let encoder = Encoder::new(config.history);
        for example in &record.examples {
            assert_eq!(example.observation.len(), encoder.encoding_len());
            assert_eq!(example.policy.len(), codec::POLICY_SIZE);
            let sum: f32 = example.policy.iter().sum();
            assert!((sum - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_ply_capped_game_scores_as_draw() {
        let (mcts_config, config) = short_config();
        let record = play_game(
            UniformEvaluator::default(),
            &mcts_config,
            &config,
            Position::startpos(),
            ChaCha8Rng::seed_from_u64(2),
        )
        .unwrap();

        // 20 random-ish plies from the start position never end a game.
        assert_eq!(record.examples.len(), config.max_plies);
        assert_eq!(record.outcome_white, 0.0);
        for example in &record.examples {
            assert_eq!(example.value, 0.0);
        }
    }

    #[test]
    fn test_mate_outcome_is_backfilled_per_mover() {
        // Black to move with Qd8-h4 mate available.
        let start = Position::from_fen(
            "rnb1kbnr/pppp1ppp/8/4p3/6P1/5P2/PPPPP2P/RNBQKBNR b KQkq - 0 2",
        )
        .unwrap();
        let mcts_config = MctsConfig::for_evaluation(400);
        let config = SelfPlayConfig {
            temperature_drop: 0, // greedy from ply one
            history: 2,
            ..Default::default()
        };
        let record = play_game(
            UniformEvaluator::default(),
            &mcts_config,
            &config,
            start,
            ChaCha8Rng::seed_from_u64(1),
        )
        .unwrap();

        assert_eq!(record.examples.len(), 1);
        assert_eq!(record.outcome_white, -1.0);
        // The single example belongs to Black, the winner.
        assert_eq!(record.examples[0].value, 1.0);
    }

    #[test]
    fn test_same_seed_reproduces_the_game() {
        let (mcts_config, config) = short_config();
        let play = |seed: u64| {
            play_game(
                UniformEvaluator::default(),
                &mcts_config,
                &config,
                Position::startpos(),
                ChaCha8Rng::seed_from_u64(seed),
            )
            .unwrap()
        };
        let a = play(77);
        let b = play(77);

        assert_eq!(a.final_fen, b.final_fen);
        assert_eq!(a.outcome_white, b.outcome_white);
        assert_eq!(a.examples.len(), b.examples.len());
    }
}
