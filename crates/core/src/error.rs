use thiserror::Error;

/// Errors surfaced by the self-play search core.
///
/// None of these are retried internally; the orchestrator decides whether
/// to abandon the current game or abort the process.
#[derive(Error, Debug)]
pub enum AlphaZeroError {
    /// A move's displacement has no slot in the policy-plane table.
    #[error("move {0} has no policy-plane encoding")]
    UnencodableMove(String),

    /// A policy index does not map back onto the board.
    #[error("policy index {0} does not correspond to a board move")]
    InvalidIndex(usize),

    #[error("invalid FEN string: {0}")]
    InvalidFen(String),

    #[error("invalid UCI move: {0}")]
    InvalidUci(String),

    /// The search produced no visited moves; encoding such a
    /// distribution would divide by a zero visit sum.
    #[error("MCTS distribution has no visited moves")]
    DegenerateDistribution,

    #[error("invalid policy: {0}")]
    InvalidPolicy(String),

    /// Sampling was requested with insufficient stored examples.
    #[error("replay buffer holds {have} examples, {need} requested")]
    BufferUnderflow { have: usize, need: usize },

    /// The evaluator broke its interface contract (wrong-shaped prior
    /// vector, non-finite or out-of-range value). Never clamped.
    #[error("evaluator contract violation: {0}")]
    EvaluatorFault(String),

    #[error("search root is a terminal position")]
    TerminalRoot,

    /// A persisted buffer image fails its internal consistency checks.
    #[error("corrupt snapshot: {0}")]
    CorruptSnapshot(String),

    /// A search or game was cancelled via its stop flag.
    #[error("search aborted")]
    Aborted,
}

/// Convenience Result type for core operations.
pub type Result<T> = std::result::Result<T, AlphaZeroError>;
