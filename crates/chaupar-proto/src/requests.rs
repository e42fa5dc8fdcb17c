//! Client-to-server requests.

use serde::{Deserialize, Serialize};

/// Requests a client can send once its connection is registered.
///
/// The transport layer decodes these and hands them to the server; framing
/// and authentication live outside this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "request", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Request {
    /// Enter the matchmaking queue.
    JoinQueue {
        /// Stake per player. Pairing only matches equal stakes.
        bet_amount: u64,
        /// Seats in the desired match. Pairing only matches equal counts.
        player_count: u8,
    },

    /// Roll the dice in a room.
    RollDice {
        /// Room the roll is for.
        room_id: u64,
    },

    /// Move a token in a room.
    MoveToken {
        /// Room the move is for.
        room_id: u64,
        /// Token to move.
        token_id: u8,
        /// The dice value the client believes is in effect. Advisory: the
        /// server plays its own dice state and drops stale mismatches.
        dice_value: u8,
    },
}
