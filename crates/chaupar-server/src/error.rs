//! Server error types.
//!
//! Only matchmaking rejections surface here. Everything stale a client
//! can send — requests from unregistered connections, unknown or
//! torn-down room ids, wrong-turn rolls, mismatched dice — is expected
//! under racing clients and stays a silent no-op with a debug log;
//! wallet and delivery failures are tolerated per player and logged
//! where they happen.

use crate::queue::QueueError;

/// Errors returned to the embedding transport shell.
///
/// None of these carry game state; the shell typically logs them and
/// keeps the connection open.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServerError {
    /// The connection tried to queue while playing an active match.
    #[error("connection {connection_id} is already in match {room_id}")]
    AlreadyInMatch {
        /// Connection the request arrived on
        connection_id: u64,
        /// The match it is still playing
        room_id: u64,
    },

    /// Matchmaking rejected a join request.
    #[error(transparent)]
    Queue(#[from] QueueError),
}
