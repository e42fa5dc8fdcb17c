//! Pure rules for the four-color race game.
//!
//! This crate holds everything that can be computed without I/O: board
//! geometry and movement ([`board`]), turn sequencing ([`turn`]), and the
//! [`env::Environment`] abstraction that keeps time and randomness out of
//! the rules themselves. The server crate drives these state machines and
//! executes their outcomes; tests drive them with a simulated environment.
//!
//! Nothing in this crate panics on game input: every rule violation is a
//! typed result the caller decides to relay or drop.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod board;
pub mod env;
pub mod turn;

pub use board::{
    Board, Capture, Color, HOME_POS, MoveError, MoveOutcome, SAFE_CELLS, TOKENS_PER_COLOR,
    TRACK_LEN, Token, TokenState, TokenStatus, global_index, is_safe_cell,
};
pub use env::Environment;
pub use turn::{
    MAX_CONSECUTIVE_SIXES, RollOutcome, TurnPhase, TurnState, TurnTransition, roll_die,
};
