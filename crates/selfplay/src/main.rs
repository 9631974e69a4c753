//! Self-play data generation for AlphaZero-style training.
//!
//! Plays games of MCTS against itself, fills a replay buffer with
//! (observation, policy, value) training examples and persists the
//! buffer as a MessagePack snapshot the training pipeline can resume
//! from.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use std::time::Instant;

use alphazero_chess::Position;
use alphazero_mcts::{MctsConfig, RolloutEvaluator, UniformEvaluator};
use alphazero_selfplay::{play_game, GameRecord, ReplayBuffer, SelfPlayConfig, Snapshot};

/// AlphaZero chess self-play tool.
#[derive(Parser)]
#[command(name = "alphazero-selfplay")]
#[command(about = "Generate self-play games and manage replay snapshots")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate self-play games into a replay snapshot.
    Generate {
        /// Number of games to generate.
        #[arg(short, long, default_value = "10")]
        games: usize,

        /// Output path for the replay snapshot.
        #[arg(short, long, default_value = "data/replay.msgpack")]
        output: PathBuf,

        /// Existing snapshot to extend instead of starting fresh.
        #[arg(long)]
        resume: Option<PathBuf>,

        /// Number of MCTS simulations per move.
        #[arg(short, long, default_value = "50")]
        simulations: usize,

        /// Random seed for reproducibility.
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Temperature for policy targets and early move selection.
        #[arg(short, long, default_value = "1.0")]
        temperature: f32,

        /// Ply after which move selection turns greedy.
        #[arg(long, default_value = "30")]
        temperature_drop: usize,

        /// Hard cap on game length in plies; capped games score as draws.
        #[arg(long, default_value = "512")]
        max_plies: usize,

        /// Board history frames per observation.
        #[arg(long, default_value = "8")]
        history: usize,

        /// Leaf evaluator to drive the search with.
        #[arg(long, value_enum, default_value = "rollout")]
        evaluator: EvaluatorKind,

        /// Maximum rollout depth for the playout evaluator.
        #[arg(long, default_value = "50")]
        rollout_depth: usize,

        /// Replay buffer capacity in examples.
        #[arg(long, default_value = "100000")]
        capacity: usize,

        /// FEN of the starting position (standard start if omitted).
        #[arg(long)]
        start_fen: Option<String>,
    },

    /// Print summary statistics for a replay snapshot.
    Inspect {
        /// Path to the snapshot file.
        snapshot: PathBuf,
    },
}

/// Stub evaluator used when no learned model is wired in.
#[derive(Clone, Copy, ValueEnum)]
enum EvaluatorKind {
    /// Uniform priors plus a seeded random playout value.
    Rollout,
    /// Uniform priors with a neutral value estimate.
    Uniform,
}

fn load_snapshot(path: &PathBuf) -> Result<Snapshot> {
    let file =
        File::open(path).with_context(|| format!("Failed to open snapshot: {:?}", path))?;
    let reader = BufReader::new(file);
    rmp_serde::from_read(reader).with_context(|| format!("Failed to decode snapshot: {:?}", path))
}

fn save_snapshot(path: &PathBuf, snapshot: &Snapshot) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create output directory: {:?}", parent))?;
        }
    }
    let file =
        File::create(path).with_context(|| format!("Failed to create file: {:?}", path))?;
    let mut writer = BufWriter::new(file);
    // Named fields keep the snapshot readable from Python as a map.
    rmp_serde::encode::write_named(&mut writer, snapshot)
        .with_context(|| format!("Failed to serialize snapshot: {:?}", path))?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_generate(
    games: usize,
    output: PathBuf,
    resume: Option<PathBuf>,
    simulations: usize,
    seed: u64,
    temperature: f32,
    temperature_drop: usize,
    max_plies: usize,
    history: usize,
    evaluator: EvaluatorKind,
    rollout_depth: usize,
    capacity: usize,
    start_fen: Option<String>,
) -> Result<()> {
    let start_pos = match &start_fen {
        Some(fen) => Position::from_fen(fen)
            .with_context(|| format!("Invalid starting FEN: {}", fen))?,
        None => Position::startpos(),
    };

    let mut buffer = match &resume {
        Some(path) => {
            let snapshot = load_snapshot(path)?;
            let buffer = ReplayBuffer::restore(snapshot)
                .with_context(|| format!("Failed to restore snapshot: {:?}", path))?;
            println!(
                "Resuming from {:?}: {} examples, {} games",
                path,
                buffer.len(),
                buffer.games_completed()
            );
            buffer
        }
        None => ReplayBuffer::new(capacity),
    };

    println!("Generating {} games with {} simulations/move", games, simulations);
    println!("Seed: {}", seed);

    let start = Instant::now();
    let mcts_config = MctsConfig::with_simulations(simulations);
    let selfplay_config = SelfPlayConfig {
        temperature,
        temperature_drop,
        max_plies,
        history,
    };

    let results: Vec<(u64, alphazero_core::Result<GameRecord>)> = (0..games)
        .into_par_iter()
        .map(|i| {
            let game_seed = seed.wrapping_add(i as u64 * 1000);
            let rng = ChaCha8Rng::seed_from_u64(game_seed);
            let record = match evaluator {
                EvaluatorKind::Rollout => {
                    let evaluator = RolloutEvaluator::new(
                        ChaCha8Rng::seed_from_u64(game_seed.wrapping_add(1)),
                        rollout_depth,
                    );
                    play_game(evaluator, &mcts_config, &selfplay_config, start_pos.clone(), rng)
                }
                EvaluatorKind::Uniform => play_game(
                    UniformEvaluator::default(),
                    &mcts_config,
                    &selfplay_config,
                    start_pos.clone(),
                    rng,
                ),
            };
            (game_seed, record)
        })
        .collect();

    let mut records = Vec::with_capacity(games);
    for (game_seed, result) in results {
        match result {
            Ok(record) => records.push(record),
            Err(err) => eprintln!("Game with seed {} failed: {}", game_seed, err),
        }
    }

    let total_plies: usize = records.iter().map(|r| r.plies).sum();
    let white_wins = records.iter().filter(|r| r.outcome_white > 0.5).count();
    let black_wins = records.iter().filter(|r| r.outcome_white < -0.5).count();
    let draws = records.len() - white_wins - black_wins;

    for record in records {
        buffer.append(record.examples);
    }

    save_snapshot(&output, &buffer.snapshot())?;

    let elapsed = start.elapsed();
    println!("\nCompleted in {:.2}s", elapsed.as_secs_f64());
    println!("Total plies: {}", total_plies);
    println!(
        "Outcomes: White wins: {}, Black wins: {}, Draws: {}",
        white_wins, black_wins, draws
    );
    println!(
        "Buffer: {} examples ({} capacity), {} games total",
        buffer.len(),
        buffer.capacity(),
        buffer.games_completed()
    );
    println!("Snapshot saved to: {:?}", output);

    Ok(())
}

fn cmd_inspect(path: PathBuf) -> Result<()> {
    let snapshot = load_snapshot(&path)?;

    println!("Snapshot: {:?}", path);
    println!("Capacity: {}", snapshot.capacity);
    println!("Examples: {}", snapshot.examples.len());
    println!("Games completed: {}", snapshot.games_completed);

    if let Some(example) = snapshot.examples.first() {
        println!("Observation length: {}", example.observation.len());
        println!("Policy length: {}", example.policy.len());
    }

    let wins = snapshot.examples.iter().filter(|e| e.value > 0.5).count();
    let losses = snapshot.examples.iter().filter(|e| e.value < -0.5).count();
    let draws = snapshot.examples.len() - wins - losses;
    println!(
        "Value targets: win: {}, loss: {}, draw: {}",
        wins, losses, draws
    );

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            games,
            output,
            resume,
            simulations,
            seed,
            temperature,
            temperature_drop,
            max_plies,
            history,
            evaluator,
            rollout_depth,
            capacity,
            start_fen,
        } => cmd_generate(
            games,
            output,
            resume,
            simulations,
            seed,
            temperature,
            temperature_drop,
            max_plies,
            history,
            evaluator,
            rollout_depth,
            capacity,
            start_fen,
        ),

        Commands::Inspect { snapshot } => cmd_inspect(snapshot),
    }
}
