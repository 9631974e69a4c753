//! Game position with the state the raw board lacks.
//!
//! `chess::Board` knows piece placement, side to move, castling rights
//! and en passant, but not the halfmove clock, the fullmove number, or
//! which earlier positions have occurred. `Position` carries all of it,
//! so one value is enough for legality, draw detection, and the
//! history-stacked observation encoding.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use alphazero_core::{AlphaZeroError, Result};
use chess::{Board, BoardStatus, ChessMove, Color, MoveGen, Piece};

/// Prior boards retained per position, enough for an 8-frame
/// observation history (current frame plus seven previous).
pub const RECENT_BOARDS: usize = 7;

/// A complete, canonical game position.
///
/// Applying a move produces a new `Position`; sibling search nodes
/// never alias a mutable board.
#[derive(Clone, Debug)]
pub struct Position {
    board: Board,
    halfmove_clock: u32,
    fullmove_number: u32,
    /// Boards preceding this one, most recent first.
    recent: VecDeque<Board>,
    /// Position hashes since the last irreversible move, this one included.
    repetition: Vec<u64>,
}

impl Position {
    /// The standard initial position.
    pub fn startpos() -> Self {
        let board = Board::default();
        Self {
            board,
            halfmove_clock: 0,
            fullmove_number: 1,
            recent: VecDeque::new(),
            repetition: vec![board.get_hash()],
        }
    }

    /// Parse a FEN string, including the halfmove and fullmove counters
    /// (defaulted to `0 1` when absent).
    pub fn from_fen(fen: &str) -> Result<Self> {
        let board = Board::from_str(fen)
            .map_err(|e| AlphaZeroError::InvalidFen(format!("{fen}: {e}")))?;
        let mut counters = fen.split_whitespace().skip(4);
        let halfmove_clock = counters.next().and_then(|s| s.parse().ok()).unwrap_or(0);
        let fullmove_number = counters.next().and_then(|s| s.parse().ok()).unwrap_or(1);
        Ok(Self {
            board,
            halfmove_clock,
            fullmove_number,
            recent: VecDeque::new(),
            repetition: vec![board.get_hash()],
        })
    }

    /// Render the position as FEN with the tracked counters.
    pub fn fen(&self) -> String {
        let base = self.board.to_string();
        let fields: Vec<&str> = base.split_whitespace().collect();
        format!(
            "{} {} {}",
            fields[..4].join(" "),
            self.halfmove_clock,
            self.fullmove_number
        )
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn side_to_move(&self) -> Color {
        self.board.side_to_move()
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    /// Boards preceding this one, most recent first.
    pub fn recent_boards(&self) -> impl Iterator<Item = &Board> {
        self.recent.iter()
    }

    /// All legal moves in movegen order.
    pub fn legal_moves(&self) -> Vec<ChessMove> {
        MoveGen::new_legal(&self.board).collect()
    }

    /// Apply a legal move, producing the successor position.
    pub fn apply(&self, mv: ChessMove) -> Position {
        let is_pawn = self.board.piece_on(mv.get_source()) == Some(Piece::Pawn);
        // A pawn changing file is a capture even when the target square
        // is empty (en passant).
        let is_capture = self.board.piece_on(mv.get_dest()).is_some()
            || (is_pawn && mv.get_source().get_file() != mv.get_dest().get_file());
        let irreversible = is_pawn || is_capture;

        let board = self.board.make_move_new(mv);

        let mut recent = self.recent.clone();
        recent.push_front(self.board);
        recent.truncate(RECENT_BOARDS);

        let mut repetition = if irreversible {
            Vec::new()
        } else {
            self.repetition.clone()
        };
        repetition.push(board.get_hash());

        Position {
            board,
            halfmove_clock: if irreversible {
                0
            } else {
                self.halfmove_clock + 1
            },
            fullmove_number: if self.board.side_to_move() == Color::Black {
                self.fullmove_number + 1
            } else {
                self.fullmove_number
            },
            recent,
            repetition,
        }
    }

    /// True once the game has ended: checkmate, stalemate, the 50-move
    /// rule, or threefold repetition.
    pub fn is_terminal(&self) -> bool {
        self.board.status() != BoardStatus::Ongoing || self.is_draw_by_rule()
    }

    fn is_draw_by_rule(&self) -> bool {
        self.halfmove_clock >= 100 || self.is_threefold()
    }

    fn is_threefold(&self) -> bool {
        let current = self.board.get_hash();
        self.repetition.iter().filter(|&&h| h == current).count() >= 3
    }

    /// Terminal value from the perspective of the side to move:
    /// -1.0 when that side is checkmated, 0.0 for any draw, `None`
    /// while the game is ongoing.
    pub fn terminal_value_for_mover(&self) -> Option<f32> {
        match self.board.status() {
            BoardStatus::Checkmate => Some(-1.0),
            BoardStatus::Stalemate => Some(0.0),
            BoardStatus::Ongoing if self.is_draw_by_rule() => Some(0.0),
            BoardStatus::Ongoing => None,
        }
    }

    /// Finished-game outcome from White's fixed perspective:
    /// +1.0 White win, -1.0 Black win, 0.0 draw, `None` while ongoing.
    pub fn outcome_white(&self) -> Option<f32> {
        match self.board.status() {
            BoardStatus::Checkmate => Some(match self.board.side_to_move() {
                Color::White => -1.0,
                Color::Black => 1.0,
            }),
            BoardStatus::Stalemate => Some(0.0),
            BoardStatus::Ongoing if self.is_draw_by_rule() => Some(0.0),
            BoardStatus::Ongoing => None,
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::startpos()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fen())
    }
}
