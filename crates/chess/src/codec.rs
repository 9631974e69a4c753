//! Move codec: chess moves <-> policy-plane indices.
//!
//! The policy tensor has shape 8x8x73, keyed by the from-square. The 73
//! channels cover every displacement a piece can make from one square:
//!
//! - 0..=55  queen-like rays: 8 directions x 7 distances
//! - 56..=63 knight jumps
//! - 64..=72 underpromotions: {N, B, R} x {capture left, push, capture right}
//!
//! Queen promotions ride the ray channels; the promotion piece is
//! implicit in a pawn reaching the back rank. The flat index is
//! `from_square * 73 + channel` with squares numbered a1=0 .. h8=63.

use alphazero_core::{AlphaZeroError, Result};
use chess::{Board, ChessMove, Color, File, Piece, Rank, Square};

pub const BOARD_RANKS: usize = 8;
pub const BOARD_FILES: usize = 8;
pub const MOVE_CHANNELS: usize = 73;

/// Size of the flat policy index space (8 * 8 * 73 = 4672).
pub const POLICY_SIZE: usize = BOARD_RANKS * BOARD_FILES * MOVE_CHANNELS;

/// (rank delta, file delta) per ray direction: N, NE, E, SE, S, SW, W, NW.
const RAY_DIRECTIONS: [(i8, i8); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

const KNIGHT_JUMPS: [(i8, i8); 8] = [
    (2, 1),
    (1, 2),
    (-1, 2),
    (-2, 1),
    (-2, -1),
    (-1, -2),
    (1, -2),
    (2, -1),
];

/// Promotion pieces with dedicated channels; queen is implicit.
const UNDERPROMOTIONS: [Piece; 3] = [Piece::Knight, Piece::Bishop, Piece::Rook];

/// Encode a move into its flat policy index.
///
/// Pure and total over legal chess moves. A displacement outside the
/// channel table (or an unknown promotion piece) is an
/// `UnencodableMove` error.
pub fn encode(mv: ChessMove) -> Result<usize> {
    let from = mv.get_source();
    let to = mv.get_dest();
    let dr = to.get_rank().to_index() as i8 - from.get_rank().to_index() as i8;
    let df = to.get_file().to_index() as i8 - from.get_file().to_index() as i8;

    let channel = match mv.get_promotion() {
        Some(piece) if piece != Piece::Queen => {
            let slot = UNDERPROMOTIONS
                .iter()
                .position(|&p| p == piece)
                .ok_or_else(|| unencodable(mv))?;
            if dr.abs() != 1 || df.abs() > 1 {
                return Err(unencodable(mv));
            }
            64 + slot * 3 + (df + 1) as usize
        }
        _ => displacement_channel(dr, df).ok_or_else(|| unencodable(mv))?,
    };

    Ok(from.to_index() * MOVE_CHANNELS + channel)
}

/// Decode a flat policy index back into a move.
///
/// The board supplies the side to move (underpromotion direction) and
/// piece placement (a pawn riding a ray channel onto the back rank is
/// an implicit queen promotion). Whether the decoded move is legal on
/// this board remains the caller's concern.
pub fn decode(index: usize, board: &Board) -> Result<ChessMove> {
    if index >= POLICY_SIZE {
        return Err(AlphaZeroError::InvalidIndex(index));
    }
    let from_rank = (index / MOVE_CHANNELS / BOARD_FILES) as i8;
    let from_file = (index / MOVE_CHANNELS % BOARD_FILES) as i8;
    let channel = index % MOVE_CHANNELS;

    let (dr, df, mut promotion) = if channel < 56 {
        let (r, f) = RAY_DIRECTIONS[channel / 7];
        let distance = (channel % 7 + 1) as i8;
        (r * distance, f * distance, None)
    } else if channel < 64 {
        let (r, f) = KNIGHT_JUMPS[channel - 56];
        (r, f, None)
    } else {
        let slot = (channel - 64) / 3;
        let df = (channel - 64) % 3;
        let dr = match board.side_to_move() {
            Color::White => 1,
            Color::Black => -1,
        };
        (dr, df as i8 - 1, Some(UNDERPROMOTIONS[slot]))
    };

    let to_rank = from_rank + dr;
    let to_file = from_file + df;
    if !(0..8).contains(&to_rank) || !(0..8).contains(&to_file) {
        return Err(AlphaZeroError::InvalidIndex(index));
    }
    let from = make_square(from_rank, from_file);
    let to = make_square(to_rank, to_file);

    if promotion.is_none() && channel < 56 && board.piece_on(from) == Some(Piece::Pawn) {
        let back_rank = matches!(
            (board.side_to_move(), to_rank),
            (Color::White, 7) | (Color::Black, 0)
        );
        if back_rank {
            promotion = Some(Piece::Queen);
        }
    }

    Ok(ChessMove::new(from, to, promotion))
}

/// Canonical textual form, e.g. `e2e4` or `e7e8q`.
pub fn to_uci(mv: ChessMove) -> String {
    let mut s = format!("{}{}", mv.get_source(), mv.get_dest());
    if let Some(piece) = mv.get_promotion() {
        s.push(match piece {
            Piece::Knight => 'n',
            Piece::Bishop => 'b',
            Piece::Rook => 'r',
            _ => 'q',
        });
    }
    s
}

/// Parse the canonical textual form produced by [`to_uci`].
pub fn from_uci(s: &str) -> Result<ChessMove> {
    let invalid = || AlphaZeroError::InvalidUci(s.to_string());
    let chars: Vec<char> = s.chars().collect();
    if chars.len() < 4 || chars.len() > 5 {
        return Err(invalid());
    }
    let square = |file: char, rank: char| -> Result<Square> {
        let f = (file as i32) - ('a' as i32);
        let r = (rank as i32) - ('1' as i32);
        if !(0..8).contains(&f) || !(0..8).contains(&r) {
            return Err(invalid());
        }
        Ok(make_square(r as i8, f as i8))
    };
    let from = square(chars[0], chars[1])?;
    let to = square(chars[2], chars[3])?;
    let promotion = match chars.get(4) {
        None => None,
        Some('n') => Some(Piece::Knight),
        Some('b') => Some(Piece::Bishop),
        Some('r') => Some(Piece::Rook),
        Some('q') => Some(Piece::Queen),
        Some(_) => return Err(invalid()),
    };
    Ok(ChessMove::new(from, to, promotion))
}

fn displacement_channel(dr: i8, df: i8) -> Option<usize> {
    if let Some(jump) = KNIGHT_JUMPS.iter().position(|&d| d == (dr, df)) {
        return Some(56 + jump);
    }
    if dr == 0 && df == 0 {
        return None;
    }
    if dr == 0 || df == 0 || dr.abs() == df.abs() {
        let dir = RAY_DIRECTIONS
            .iter()
            .position(|&d| d == (dr.signum(), df.signum()))?;
        let distance = dr.abs().max(df.abs()) as usize;
        return Some(dir * 7 + distance - 1);
    }
    None
}

fn make_square(rank: i8, file: i8) -> Square {
    Square::make_square(Rank::from_index(rank as usize), File::from_index(file as usize))
}

fn unencodable(mv: ChessMove) -> AlphaZeroError {
    AlphaZeroError::UnencodableMove(to_uci(mv))
}
