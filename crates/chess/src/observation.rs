//! Observation encoding for the evaluator boundary.
//!
//! Renders a position as a flat plane stack: 12 piece planes for the
//! current board and for each retained previous board (zero planes
//! before the game is that old), followed by side-to-move, castling
//! rights, en passant, a scaled halfmove-clock plane, and a constant
//! bias plane. The orchestrator computes this and hands it to the
//! evaluator; the search engine never builds observations itself.

use chess::{BitBoard, Board, Color, Piece};

use crate::Position;

/// Piece planes per history frame (6 piece types x 2 colors).
pub const PIECE_PLANES: usize = 12;

/// Planes appended after the history frames.
pub const STATE_PLANES: usize = 8;

pub const SQUARES: usize = 64;

/// Default history depth, current frame included.
pub const DEFAULT_HISTORY: usize = 8;

const PIECES: [Piece; 6] = [
    Piece::Pawn,
    Piece::Knight,
    Piece::Bishop,
    Piece::Rook,
    Piece::Queen,
    Piece::King,
];

/// Position -> feature-plane encoder with a fixed history depth.
#[derive(Clone, Debug)]
pub struct Encoder {
    history: usize,
}

impl Encoder {
    /// Create an encoder stacking `history` frames (>= 1).
    pub fn new(history: usize) -> Self {
        assert!(history >= 1, "observation history must include the current frame");
        Self { history }
    }

    pub fn history(&self) -> usize {
        self.history
    }

    pub fn num_planes(&self) -> usize {
        PIECE_PLANES * self.history + STATE_PLANES
    }

    /// Length of the flat encoding: `num_planes() * 64`.
    pub fn encoding_len(&self) -> usize {
        self.num_planes() * SQUARES
    }

    /// Encode a position as a flat `Vec<f32>`, laid out plane-major:
    /// `[plane_0_sq_0 .. plane_0_sq_63, plane_1_sq_0, ..]` with squares
    /// numbered a1=0 .. h8=63.
    pub fn encode(&self, pos: &Position) -> Vec<f32> {
        let mut obs = vec![0.0f32; self.encoding_len()];

        encode_pieces(&mut obs, 0, pos.board());
        for (frame, past) in pos.recent_boards().take(self.history - 1).enumerate() {
            encode_pieces(&mut obs, (frame + 1) * PIECE_PLANES, past);
        }

        let base = PIECE_PLANES * self.history;
        let board = pos.board();
        if board.side_to_move() == Color::White {
            fill_plane(&mut obs, base, 1.0);
        }
        let white = board.castle_rights(Color::White);
        let black = board.castle_rights(Color::Black);
        if white.has_kingside() {
            fill_plane(&mut obs, base + 1, 1.0);
        }
        if white.has_queenside() {
            fill_plane(&mut obs, base + 2, 1.0);
        }
        if black.has_kingside() {
            fill_plane(&mut obs, base + 3, 1.0);
        }
        if black.has_queenside() {
            fill_plane(&mut obs, base + 4, 1.0);
        }
        if let Some(sq) = board.en_passant() {
            obs[(base + 5) * SQUARES + sq.to_index()] = 1.0;
        }
        fill_plane(&mut obs, base + 6, pos.halfmove_clock() as f32 / 100.0);
        fill_plane(&mut obs, base + 7, 1.0);

        obs
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY)
    }
}

fn encode_pieces(obs: &mut [f32], plane_base: usize, board: &Board) {
    for color in [Color::White, Color::Black] {
        let color_offset = match color {
            Color::White => 0,
            Color::Black => 6,
        };
        for (i, &piece) in PIECES.iter().enumerate() {
            let plane = plane_base + color_offset + i;
            let pieces: BitBoard = *board.pieces(piece) & *board.color_combined(color);
            for sq in pieces {
                obs[plane * SQUARES + sq.to_index()] = 1.0;
            }
        }
    }
}

fn fill_plane(obs: &mut [f32], plane: usize, value: f32) {
    obs[plane * SQUARES..(plane + 1) * SQUARES].fill(value);
}
