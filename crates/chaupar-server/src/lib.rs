//! Chaupar matchmaking and match-hosting server.
//!
//! Production glue that wraps [`chaupar_core`]'s pure rules with session
//! tracking, matchmaking, per-room locking, and settlement. Room handlers
//! follow the action pattern: they validate and mutate match state, then
//! return [`RoomAction`]s which [`GameServer`] executes against the
//! delivery and wallet collaborators after the room lock is released.
//!
//! # Components
//!
//! - [`GameServer`]: request dispatch and the concurrency discipline
//! - [`MatchQueue`]: FIFO pairing on (bet amount, player count)
//! - [`RoomRegistry`]: room handles plus the connection reverse index
//! - [`Room`]: per-match state, validation, and event planning
//! - [`Wallet`] / [`Delivery`]: settlement and event fan-out seams
//! - [`SystemEnv`]: production time and RNG
//!
//! # Locking
//!
//! Lock order is queue → registry → room; no two room locks are ever
//! held together. The queue's check-and-remove pairing step runs under a
//! single mutex, so concurrent joins can never hand the same player to
//! two rooms. Each room sits behind its own mutex, serializing the rolls
//! and moves of one match while leaving other matches uncontended.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod delivery;
mod error;
mod queue;
mod registry;
mod room;
mod system_env;
mod wallet;

use std::collections::HashMap;

use chaupar_core::{Color, Environment};
use chaupar_proto::{Event, Request};
pub use delivery::{ChannelDelivery, Delivery, DeliveryError, RecordingDelivery};
pub use error::ServerError;
pub use queue::{EnqueueOutcome, MatchQueue, QueueEntry, QueueError};
pub use registry::{RoomHandle, RoomRegistry};
pub use room::{PlayerSlot, Room, RoomAction, RoomStatus};
pub use system_env::SystemEnv;
use tokio::sync::{Mutex, RwLock};
pub use wallet::{MemoryWallet, Wallet, WalletError};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Room sizes matchmaking will accept.
    pub allowed_player_counts: Vec<u8>,
    /// Maximum number of waiting queue entries.
    pub max_queue_len: usize,
    /// House cut of the pot at settlement, in percent. Zero pays the
    /// whole pot to the winner.
    pub rake_percent: u8,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { allowed_player_counts: vec![2, 4], max_queue_len: 1024, rake_percent: 0 }
    }
}

/// The server: sessions, matchmaking, active rooms, and settlement.
///
/// Generic over the environment (time + randomness), the wallet, and the
/// delivery seam so the whole server runs deterministically in tests. The
/// transport shell owns sockets and calls in: [`register_connection`]
/// after its auth handshake, [`handle_request`] per decoded request, and
/// [`handle_disconnect`] when a connection drops.
///
/// [`register_connection`]: GameServer::register_connection
/// [`handle_request`]: GameServer::handle_request
/// [`handle_disconnect`]: GameServer::handle_disconnect
pub struct GameServer<E: Environment, W, D> {
    env: E,
    wallet: W,
    delivery: D,
    config: ServerConfig,
    /// Connection ID → user ID, filled by the session handoff
    sessions: RwLock<HashMap<u64, u64>>,
    /// Matchmaking queue; its lock makes pairing atomic
    queue: Mutex<MatchQueue>,
    /// Active rooms
    registry: RwLock<RoomRegistry<E::Instant>>,
}

impl<E: Environment, W: Wallet, D: Delivery> GameServer<E, W, D> {
    /// Create a server with no sessions, no waiting players, no rooms.
    pub fn new(env: E, wallet: W, delivery: D, config: ServerConfig) -> Self {
        let queue = MatchQueue::new(config.allowed_player_counts.clone(), config.max_queue_len);
        Self {
            env,
            wallet,
            delivery,
            config,
            sessions: RwLock::new(HashMap::new()),
            queue: Mutex::new(queue),
            registry: RwLock::new(RoomRegistry::new()),
        }
    }

    /// Bind a connection to an authenticated user.
    ///
    /// The auth layer calls this once its handshake completes; requests
    /// from unregistered connections are ignored. Returns `false` if the
    /// connection is already bound.
    pub async fn register_connection(&self, connection_id: u64, user_id: u64) -> bool {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&connection_id) {
            return false;
        }
        sessions.insert(connection_id, user_id);
        tracing::debug!(connection_id, user_id, "connection registered");
        true
    }

    /// Dispatch one decoded client request.
    ///
    /// Anything stale a client can send — an unregistered connection, an
    /// unknown or already torn-down room, an out-of-turn roll, a
    /// mismatched dice value, a rejected board move — returns `Ok` and
    /// emits nothing; only matchmaking rejections surface as errors for
    /// the shell to log. No error events go to clients.
    pub async fn handle_request(
        &self,
        connection_id: u64,
        request: Request,
    ) -> Result<(), ServerError> {
        let session = self.sessions.read().await.get(&connection_id).copied();
        let Some(user_id) = session else {
            tracing::debug!(connection_id, "request from unregistered connection ignored");
            return Ok(());
        };

        match request {
            Request::JoinQueue { bet_amount, player_count } => {
                self.join_queue(connection_id, user_id, bet_amount, player_count).await
            },
            Request::RollDice { room_id } => {
                self.roll_dice(connection_id, room_id).await;
                Ok(())
            },
            Request::MoveToken { room_id, token_id, dice_value } => {
                self.move_token(connection_id, room_id, token_id, dice_value).await;
                Ok(())
            },
        }
    }

    /// Handle a dropped connection.
    ///
    /// A waiting player leaves the queue; a playing one freezes their
    /// room (fail closed). The session binding is cleared either way.
    pub async fn handle_disconnect(&self, connection_id: u64) {
        self.sessions.write().await.remove(&connection_id);

        if self.queue.lock().await.remove(connection_id) {
            tracing::debug!(connection_id, "dropped waiting player");
            return;
        }

        let current = { self.registry.read().await.room_for_connection(connection_id) };
        if let Some(handle) = current {
            handle.lock().await.pause(connection_id);
        }
    }

    /// Number of players waiting in the queue.
    pub async fn queue_len(&self) -> usize {
        self.queue.lock().await.len()
    }

    /// Number of active rooms.
    pub async fn room_count(&self) -> usize {
        self.registry.read().await.len()
    }

    async fn join_queue(
        &self,
        connection_id: u64,
        user_id: u64,
        bet_amount: u64,
        player_count: u8,
    ) -> Result<(), ServerError> {
        // The queue lock spans the pairing check and, on success, room
        // registration: a freshly paired player cannot slip back into the
        // queue before their room exists.
        let mut queue = self.queue.lock().await;

        let current = { self.registry.read().await.room_for_connection(connection_id) };
        if let Some(handle) = current {
            let room = handle.lock().await;
            if room.status() == RoomStatus::Active {
                return Err(ServerError::AlreadyInMatch { connection_id, room_id: room.id() });
            }
        }

        let entry = QueueEntry { connection_id, user_id, bet_amount, player_count };
        match queue.enqueue(entry)? {
            EnqueueOutcome::Waiting => {
                tracing::debug!(connection_id, bet_amount, player_count, "waiting for opponents");
            },
            EnqueueOutcome::Paired(group) => {
                self.open_room(&group, bet_amount).await;
            },
        }
        Ok(())
    }

    /// Turn a paired group into a live room and announce it.
    ///
    /// Colors go by slot position: the pairing submitter sits in slot 0,
    /// opponents follow in the order they queued.
    async fn open_room(&self, group: &[QueueEntry], bet_amount: u64) {
        let room_id = self.env.random_u64();
        let players: Vec<PlayerSlot> = group
            .iter()
            .enumerate()
            .map(|(slot, entry)| PlayerSlot {
                connection_id: entry.connection_id,
                user_id: entry.user_id,
                color: Color::ALL[slot % Color::ALL.len()],
                is_ai: false,
            })
            .collect();
        let colors: Vec<Color> = players.iter().map(|slot| slot.color).collect();

        let room = Room::new(room_id, players.clone(), bet_amount, self.env.now());
        self.registry.write().await.insert(room);

        tracing::info!(room_id, players = players.len(), bet_amount, "match created");

        for slot in &players {
            self.send(slot.connection_id, &Event::GameStart {
                room_id,
                player_color: slot.color,
                players: colors.clone(),
            });
        }
    }

    async fn roll_dice(&self, connection_id: u64, room_id: u64) {
        let Some(handle) = self.registry.read().await.get(room_id) else {
            tracing::debug!(connection_id, room_id, "roll for unknown room ignored");
            return;
        };

        let (actions, recipients) = {
            let mut room = handle.lock().await;
            let actions = room.handle_roll(connection_id, &self.env);
            (actions, room.member_connections())
        };

        self.execute_actions(room_id, &recipients, actions).await;
    }

    async fn move_token(&self, connection_id: u64, room_id: u64, token_id: u8, dice_value: u8) {
        let Some(handle) = self.registry.read().await.get(room_id) else {
            tracing::debug!(connection_id, room_id, "move for unknown room ignored");
            return;
        };

        let (actions, recipients) = {
            let mut room = handle.lock().await;
            let actions = room.handle_move(connection_id, token_id, dice_value);
            (actions, room.member_connections())
        };

        self.execute_actions(room_id, &recipients, actions).await;
    }

    /// Execute planned room actions. Runs after the room lock is
    /// released, so delivery and wallet calls never extend it.
    async fn execute_actions(&self, room_id: u64, recipients: &[u64], actions: Vec<RoomAction>) {
        for action in actions {
            match action {
                RoomAction::Broadcast { event } => {
                    for &connection_id in recipients {
                        self.send(connection_id, &event);
                    }
                },
                RoomAction::Settle { winner, players, bet_amount } => {
                    self.settle(room_id, &winner, &players, bet_amount).await;
                },
            }
        }
    }

    /// Pay out a finished match and tear the room down.
    ///
    /// The winner is credited pot minus rake; every other player gets a
    /// balance read (stakes were debited at bet placement, outside this
    /// server). A wallet failure downgrades that player's `game_over` to
    /// a null balance but never blocks teardown.
    async fn settle(
        &self,
        room_id: u64,
        winner: &PlayerSlot,
        players: &[PlayerSlot],
        bet_amount: u64,
    ) {
        let pot = bet_amount.saturating_mul(players.len() as u64);
        let rake = pot.saturating_mul(u64::from(self.config.rake_percent)) / 100;
        let winnings = pot.saturating_sub(rake);
        // The bet amount is client-supplied; clamp rather than wrap a pot
        // beyond the wallet's signed range into a debit.
        let payout = i64::try_from(winnings).unwrap_or(i64::MAX);

        let winner_balance = match self.wallet.apply_delta(winner.user_id, payout) {
            Ok(balance) => Some(balance),
            Err(error) => {
                tracing::error!(room_id, user_id = winner.user_id, %error, "payout failed");
                None
            },
        };

        for slot in players {
            let new_balance = if slot.user_id == winner.user_id {
                winner_balance
            } else {
                match self.wallet.balance(slot.user_id) {
                    Ok(balance) => Some(balance),
                    Err(error) => {
                        tracing::warn!(room_id, user_id = slot.user_id, %error, "balance read failed");
                        None
                    },
                }
            };

            self.send(slot.connection_id, &Event::GameOver {
                winner: winner.color,
                winnings,
                new_balance,
            });
        }

        self.registry.write().await.remove(room_id);
        tracing::info!(room_id, winner = %winner.color, winnings, "match settled");
    }

    /// Deliver one event, tolerating per-connection failure.
    fn send(&self, connection_id: u64, event: &Event) {
        if let Err(error) = self.delivery.deliver(connection_id, event) {
            tracing::warn!(connection_id, %error, "event delivery failed");
        }
    }
}
