//! Server-to-client events.
//!
//! One enum covers everything the game emits. The `event` tag selects the
//! variant; payload fields ride alongside it in the same map, so a
//! `dice_result` serializes as
//! `{"event":"dice_result","color":"red","value":6,...}`.

use chaupar_core::board::{Capture, Color, TokenStatus};
use serde::{Deserialize, Serialize};

/// Events emitted by the game server.
///
/// Broadcast variants go to every member of a room; `GameStart` and
/// `GameOver` are per-player because their payloads differ by recipient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Event {
    /// A match was formed. Sent once to each paired player.
    GameStart {
        /// Room the player now belongs to.
        room_id: u64,
        /// The recipient's own color.
        player_color: Color,
        /// Colors of all players in seat (turn) order.
        players: Vec<Color>,
    },

    /// The active player rolled. Broadcast for every roll, including a
    /// forfeited third six.
    DiceResult {
        /// Color that rolled.
        color: Color,
        /// Rolled value, `1..=6`.
        value: u8,
        /// Active seat after the roll was accounted for. Reports the next
        /// player when the roll forfeited the turn.
        turn_index: u8,
        /// Consecutive sixes this roll represents for the roller.
        consecutive_sixes: u8,
    },

    /// The turn passed to another seat.
    TurnChange {
        /// Seat now active.
        turn_index: u8,
    },

    /// A token moved. Broadcast for every successful move.
    TokenMoved {
        /// Color that moved.
        color: Color,
        /// Token that moved.
        token_id: u8,
        /// New wire position, `0..=55` or `56` on finish.
        new_pos: i8,
        /// New status of the token.
        status: TokenStatus,
        /// Enemy token the landing sent back to base, if any.
        killed_info: Option<Capture>,
    },

    /// The match ended. Sent once to each player with their own numbers.
    GameOver {
        /// Winning color.
        winner: Color,
        /// Pot minus rake, as credited to the winner.
        winnings: u64,
        /// The recipient's balance after settlement. `None` when the
        /// wallet collaborator failed for this player.
        new_balance: Option<i64>,
    },
}
