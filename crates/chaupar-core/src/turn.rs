//! Turn sequencing state machine.
//!
//! Tracks whose turn it is, the dice value in effect, and the running
//! count of consecutive sixes. Methods return named outcomes for the room
//! to act on (broadcast, allow a move, pass the turn); the state machine
//! itself performs no I/O.
//!
//! # State Machine
//!
//! ```text
//!              roll (kept)              move (no bonus)
//! ┌──────────────┐ ─────────> ┌──────────────┐ ─────────> next player,
//! │ AwaitingRoll │            │ AwaitingMove │            AwaitingRoll
//! └──────────────┘ <───────── └──────────────┘
//!        ^          move (six   │        │
//!        │          or capture) │        │ roll (re-roll, dice replaced)
//!        │                      │        v
//!        └── third six voids ───┘   stays AwaitingMove
//! ```
//!
//! A roll arriving in `AwaitingMove` replaces the pending dice value. This
//! mirrors play without a forced-move rule: when the rolled value has no
//! legal move (say, everything in base on a three), the player rolls again
//! instead of the match deadlocking.

use crate::env::Environment;

/// Rolling this many sixes in a row voids the last roll and passes the
/// turn.
pub const MAX_CONSECUTIVE_SIXES: u8 = 3;

/// What the active player owes the game next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    /// No dice value in effect; a roll is expected.
    AwaitingRoll,
    /// A roll is in effect; a move (or a re-roll) is expected.
    AwaitingMove,
}

/// Outcome of applying a roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollOutcome {
    /// The roll is kept as the dice value in effect; a move is pending.
    MovePending,
    /// Third consecutive six: the roll is void and the turn has already
    /// passed.
    Forfeited {
        /// Index of the player now active.
        next_index: u8,
    },
}

/// Outcome of completing a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnTransition {
    /// The player earned a bonus turn (rolled a six or captured) and rolls
    /// again.
    Retained,
    /// The turn passed.
    Advanced {
        /// Index of the player now active.
        next_index: u8,
    },
}

/// Dice roll derived from environment randomness, uniform over `1..=6`.
///
/// Single-byte draws are rejection-sampled: bytes `252..=255` would alias
/// onto the low faces (256 is not a multiple of six) and are discarded.
pub fn roll_die<E: Environment>(env: &E) -> u8 {
    loop {
        let mut byte = [0u8; 1];
        env.random_bytes(&mut byte);
        if byte[0] < 252 {
            return 1 + byte[0] % 6;
        }
    }
}

/// Per-room turn state.
///
/// `advance_turn` is the only place `turn_index` changes, and it always
/// clears the dice value and the six count. Bonus turns deliberately keep
/// the six count so that six/move repeated three times still forfeits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnState {
    turn_index: u8,
    dice_value: u8,
    consecutive_sixes: u8,
    phase: TurnPhase,
}

impl TurnState {
    /// Fresh state: slot 0 active, nothing rolled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            turn_index: 0,
            dice_value: 0,
            consecutive_sixes: 0,
            phase: TurnPhase::AwaitingRoll,
        }
    }

    /// Index of the active player.
    #[must_use]
    pub fn turn_index(&self) -> u8 {
        self.turn_index
    }

    /// Dice value in effect. `0` while no roll is pending a move.
    #[must_use]
    pub fn dice_value(&self) -> u8 {
        self.dice_value
    }

    /// Consecutive sixes rolled by the active player.
    #[must_use]
    pub fn consecutive_sixes(&self) -> u8 {
        self.consecutive_sixes
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// Account for a roll by the active player.
    ///
    /// A six bumps the six count; hitting [`MAX_CONSECUTIVE_SIXES`] voids
    /// the roll and advances the turn immediately. Anything else resets
    /// the count. A kept roll becomes the dice value in effect, replacing
    /// any pending one (re-roll).
    pub fn apply_roll(&mut self, rolled: u8, player_count: u8) -> RollOutcome {
        debug_assert!((1..=6).contains(&rolled), "dice value out of range: {rolled}");

        if rolled == 6 {
            self.consecutive_sixes += 1;
            if self.consecutive_sixes >= MAX_CONSECUTIVE_SIXES {
                self.advance_turn(player_count);
                return RollOutcome::Forfeited { next_index: self.turn_index };
            }
        } else {
            self.consecutive_sixes = 0;
        }

        self.dice_value = rolled;
        self.phase = TurnPhase::AwaitingMove;
        RollOutcome::MovePending
    }

    /// Account for a completed move that did not win the game.
    ///
    /// A six or a capture earns a bonus turn: the dice value clears, the
    /// phase returns to `AwaitingRoll`, and the six count survives.
    /// Otherwise the turn advances.
    pub fn complete_move(&mut self, captured: bool, player_count: u8) -> TurnTransition {
        if self.dice_value == 6 || captured {
            self.dice_value = 0;
            self.phase = TurnPhase::AwaitingRoll;
            return TurnTransition::Retained;
        }

        self.advance_turn(player_count);
        TurnTransition::Advanced { next_index: self.turn_index }
    }

    /// Pass the turn to the next player, wrapping modulo `player_count`.
    ///
    /// The single authority over `turn_index`; also clears the dice value
    /// and the six count for the incoming player.
    pub fn advance_turn(&mut self, player_count: u8) {
        debug_assert!(player_count > 0);
        debug_assert!(self.turn_index < player_count);

        self.turn_index = (self.turn_index + 1) % player_count;
        self.dice_value = 0;
        self.consecutive_sixes = 0;
        self.phase = TurnPhase::AwaitingRoll;
    }
}

impl Default for TurnState {
    fn default() -> Self {
        Self::new()
    }
}
