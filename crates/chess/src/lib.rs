//! Chess game layer for the self-play core.
//!
//! Board rules (move generation, legality, check detection) come from
//! the `chess` crate. This crate adds what the search and training
//! pipeline need on top:
//!
//! - [`Position`] - board plus halfmove clock, fullmove number,
//!   repetition tracking, and a bounded history of recent boards
//! - [`codec`] - the bijective move <-> policy-index mapping over the
//!   fixed 8x8x73 index space
//! - [`observation`] - position -> feature-plane encoding with a
//!   fixed-depth history, for the evaluator boundary

pub mod codec;
pub mod observation;
mod position;

pub use position::{Position, RECENT_BOARDS};

// Re-export the board vocabulary so downstream crates need not depend
// on the rules crate directly.
pub use chess::{Board, BoardStatus, ChessMove, Color, Piece, Square};
