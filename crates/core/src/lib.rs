//! AlphaZero core - shared error taxonomy and validated policy type.
//!
//! # Types
//!
//! - [`AlphaZeroError`] / [`Result`] - error vocabulary shared by the
//!   search, encoding, and replay crates
//! - [`Policy`] - probability distribution over policy indices
//!   (non-negative, sums to 1.0)

mod error;
mod policy;

pub use error::{AlphaZeroError, Result};
pub use policy::Policy;
