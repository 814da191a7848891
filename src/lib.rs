//! A perfect analysis engine for the board game 'Connect 4'
//!
//! The engine determines the game-theoretic value of any legal position
//! with an optimised game tree search, and can score every playable
//! column individually.
//!
//! # Basic Usage
//!
//! ```
//! use connect4_solver::{solver::Solver, bitboard::BitBoard};
//!
//!# use std::error::Error;
//!# fn main() -> Result<(), Box<dyn Error>> {
//! let board = BitBoard::from_moves("112233")?;
//! let mut solver = Solver::new();
//!
//! assert_eq!(solver.solve(&board), 18);
//!# Ok(())
//!# }
//! ```

use static_assertions::*;
pub use anyhow;

pub mod transposition_table;

pub mod bitboard;

pub mod solver;

mod test;

pub use bitboard::BitBoard;
pub use solver::Solver;
pub use transposition_table::TranspositionTable;

/// The width of the game board in tiles
pub const WIDTH: usize = 7;

/// The height of the game board in tiles
pub const HEIGHT: usize = 6;

// ensure that the given dimensions fit in a u64 for the bitboard representation
const_assert!(WIDTH * (HEIGHT + 1) < 64);
