//! Per-match room state and message handling.
//!
//! A room owns everything mutable about one match: the board, the turn
//! state, the player slots, and the stake. Handlers validate a request
//! against that state, mutate it, and return actions for the server glue
//! to execute - the room itself performs no I/O, so handlers stay
//! synchronous and directly testable.
//!
//! Requests that fail validation (wrong turn, paused room, stale dice)
//! return no actions. Clients polling with stale state are normal under
//! racing connections, so these are debug-logged no-ops rather than
//! errors.

use chaupar_core::{
    Board, Color, Environment, MAX_CONSECUTIVE_SIXES, RollOutcome, TurnState, TurnTransition,
    roll_die,
};
use chaupar_proto::Event;

/// One seat in a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerSlot {
    /// Live connection for this seat
    pub connection_id: u64,
    /// Authenticated user in the seat
    pub user_id: u64,
    /// Color assigned by slot position
    pub color: Color,
    /// Reserved for auto-filled computer seats; always false here
    pub is_ai: bool,
}

/// Lifecycle of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomStatus {
    /// Match in progress; rolls and moves are accepted.
    Active,
    /// A player disconnected mid-match. Fail closed: nothing is accepted.
    Paused,
    /// A player won. Terminal.
    Finished,
}

/// Actions returned by room handlers for the server glue to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum RoomAction {
    /// Deliver this event to every room member.
    Broadcast {
        /// Event to fan out
        event: Event,
    },

    /// The match ended: pay out and tear the room down.
    Settle {
        /// Seat that won
        winner: PlayerSlot,
        /// All seats, for per-player payout events
        players: Vec<PlayerSlot>,
        /// Stake each player committed
        bet_amount: u64,
    },
}

/// All mutable state of one match.
///
/// Generic over `I` (Instant type) to support virtual time in tests.
/// `created_at` is unused by the rules; it exists so an idle-room sweep
/// can be added without touching match state.
#[derive(Debug, Clone)]
pub struct Room<I = std::time::Instant> {
    id: u64,
    players: Vec<PlayerSlot>,
    board: Board,
    turn: TurnState,
    bet_amount: u64,
    status: RoomStatus,
    created_at: I,
}

impl<I: Copy> Room<I> {
    /// Create an active room with a fresh board and slot 0 to act first.
    #[must_use]
    pub fn new(id: u64, players: Vec<PlayerSlot>, bet_amount: u64, created_at: I) -> Self {
        Self {
            id,
            players,
            board: Board::new(),
            turn: TurnState::new(),
            bet_amount,
            status: RoomStatus::Active,
            created_at,
        }
    }

    /// Room id.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// All seats in slot order.
    #[must_use]
    pub fn players(&self) -> &[PlayerSlot] {
        &self.players
    }

    /// Connection ids of all members, in slot order.
    #[must_use]
    pub fn member_connections(&self) -> Vec<u64> {
        self.players.iter().map(|slot| slot.connection_id).collect()
    }

    /// Current board.
    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Current turn state.
    #[must_use]
    pub fn turn(&self) -> &TurnState {
        &self.turn
    }

    /// Stake each player committed.
    #[must_use]
    pub fn bet_amount(&self) -> u64 {
        self.bet_amount
    }

    /// Lifecycle status.
    #[must_use]
    pub fn status(&self) -> RoomStatus {
        self.status
    }

    /// When the room was created.
    #[must_use]
    pub fn created_at(&self) -> I {
        self.created_at
    }

    /// Handle a roll request.
    ///
    /// The die is drawn from `env` only after the gates pass, so an
    /// out-of-turn request never consumes randomness. A kept roll
    /// broadcasts `dice_result`; a third consecutive six voids the roll
    /// and additionally broadcasts `turn_change` for the player it passed
    /// to, reporting that player's index in both events.
    pub fn handle_roll<E: Environment>(
        &mut self,
        connection_id: u64,
        env: &E,
    ) -> Vec<RoomAction> {
        let Some(seat) = self.active_seat_of(connection_id, "roll") else {
            return Vec::new();
        };

        let color = self.players[seat].color;
        let rolled = roll_die(env);
        let player_count = self.players.len() as u8;

        match self.turn.apply_roll(rolled, player_count) {
            RollOutcome::MovePending => vec![RoomAction::Broadcast {
                event: Event::DiceResult {
                    color,
                    value: rolled,
                    turn_index: self.turn.turn_index(),
                    consecutive_sixes: self.turn.consecutive_sixes(),
                },
            }],
            RollOutcome::Forfeited { next_index } => {
                tracing::debug!(
                    room_id = self.id,
                    connection_id,
                    "third six in a row, turn forfeited"
                );
                vec![
                    RoomAction::Broadcast {
                        event: Event::DiceResult {
                            color,
                            value: rolled,
                            turn_index: next_index,
                            consecutive_sixes: MAX_CONSECUTIVE_SIXES,
                        },
                    },
                    RoomAction::Broadcast {
                        event: Event::TurnChange { turn_index: next_index },
                    },
                ]
            },
        }
    }

    /// Handle a move request.
    ///
    /// `claimed_dice` is the client's advisory copy of the dice value; a
    /// mismatch with the server's pending value marks the request stale
    /// and drops it. The board always moves by the server's value. A
    /// successful move broadcasts `token_moved`; winning additionally
    /// settles, otherwise `turn_change` follows when no bonus applies.
    pub fn handle_move(
        &mut self,
        connection_id: u64,
        token_id: u8,
        claimed_dice: u8,
    ) -> Vec<RoomAction> {
        let Some(seat) = self.active_seat_of(connection_id, "move") else {
            return Vec::new();
        };

        let dice = self.turn.dice_value();
        if dice == 0 {
            tracing::debug!(room_id = self.id, connection_id, "move ignored: no roll pending");
            return Vec::new();
        }
        if claimed_dice != dice {
            tracing::debug!(
                room_id = self.id,
                connection_id,
                claimed_dice,
                dice,
                "move ignored: stale dice value"
            );
            return Vec::new();
        }

        let color = self.players[seat].color;
        let outcome = match self.board.execute_move(color, token_id, dice) {
            Ok(outcome) => outcome,
            Err(error) => {
                // No event for a rejected move; clients resync from the
                // next broadcast.
                tracing::debug!(room_id = self.id, connection_id, %error, "move rejected");
                return Vec::new();
            },
        };

        let mut actions = vec![RoomAction::Broadcast {
            event: Event::TokenMoved {
                color,
                token_id,
                new_pos: outcome.new_pos,
                status: outcome.status,
                killed_info: outcome.capture,
            },
        }];

        if self.board.all_finished(color) {
            self.status = RoomStatus::Finished;
            tracing::info!(room_id = self.id, winner = %color, "match won");
            actions.push(RoomAction::Settle {
                winner: self.players[seat].clone(),
                players: self.players.clone(),
                bet_amount: self.bet_amount,
            });
            return actions;
        }

        let player_count = self.players.len() as u8;
        if let TurnTransition::Advanced { next_index } =
            self.turn.complete_move(outcome.capture.is_some(), player_count)
        {
            actions.push(RoomAction::Broadcast {
                event: Event::TurnChange { turn_index: next_index },
            });
        }

        actions
    }

    /// A member's connection dropped mid-match: freeze the room.
    ///
    /// Fail closed - every later roll and move is ignored. Whether the
    /// opponent wins by forfeit or gets refunded is a product decision
    /// that lives outside this server, so no event is emitted.
    pub fn pause(&mut self, connection_id: u64) {
        if self.status == RoomStatus::Active {
            self.status = RoomStatus::Paused;
            tracing::info!(room_id = self.id, connection_id, "room paused after disconnect");
        }
    }

    /// Gate shared by roll and move: room active, sender a member, and
    /// the member's seat holding the turn. Returns the seat index.
    fn active_seat_of(&self, connection_id: u64, request: &str) -> Option<usize> {
        if self.status != RoomStatus::Active {
            tracing::debug!(
                room_id = self.id,
                connection_id,
                status = ?self.status,
                "{request} ignored: room not active"
            );
            return None;
        }

        let Some(seat) = self
            .players
            .iter()
            .position(|slot| slot.connection_id == connection_id)
        else {
            tracing::debug!(room_id = self.id, connection_id, "{request} ignored: not a member");
            return None;
        };

        if seat != usize::from(self.turn.turn_index()) {
            tracing::debug!(room_id = self.id, connection_id, "{request} ignored: not their turn");
            return None;
        }

        Some(seat)
    }
}
