//! Wallet collaborator for match settlement.
//!
//! Balance storage and deposit/withdraw workflows live outside this server;
//! the match core needs exactly two operations at settlement time: read a
//! balance and apply a signed delta. The trait is synchronous (no async) to
//! maintain a clean synchronous API design, mirroring the other collaborator
//! seams.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

/// Errors from wallet operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalletError {
    /// The user has no wallet record.
    #[error("no wallet for user {user_id}")]
    UserNotFound {
        /// User whose wallet was requested
        user_id: u64,
    },
}

/// Balance lookup and settlement seam.
///
/// Must be Clone (shared with the server glue), Send + Sync (called from
/// async tasks), and synchronous. Implementations typically share internal
/// state via Arc, so clones observe the same balances.
///
/// Called only at terminal settlement: the winner gets one `apply_delta`
/// credit, every other player one `balance` read. Stakes are debited by the
/// bet-placement flow outside this server.
pub trait Wallet: Clone + Send + Sync + 'static {
    /// Current balance for a user.
    fn balance(&self, user_id: u64) -> Result<i64, WalletError>;

    /// Apply a signed delta to a user's balance and return the new balance.
    fn apply_delta(&self, user_id: u64, delta: i64) -> Result<i64, WalletError>;
}

/// In-memory wallet for testing and simulation.
///
/// Thread-safe through Mutex, but uses `lock().expect()` which will panic if
/// the mutex is poisoned - acceptable for test code.
#[allow(clippy::disallowed_types, reason = "Synchronous in-memory operations only")]
#[derive(Clone, Default)]
pub struct MemoryWallet {
    balances: Arc<Mutex<HashMap<u64, i64>>>,
}

impl MemoryWallet {
    /// Create a wallet with no user records.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a user record with a starting balance.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. Acceptable for test code.
    #[allow(clippy::expect_used)]
    #[must_use]
    pub fn with_user(self, user_id: u64, balance: i64) -> Self {
        self.balances.lock().expect("Mutex poisoned").insert(user_id, balance);
        self
    }
}

impl Wallet for MemoryWallet {
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. Acceptable for test code.
    #[allow(clippy::expect_used)]
    fn balance(&self, user_id: u64) -> Result<i64, WalletError> {
        self.balances
            .lock()
            .expect("Mutex poisoned")
            .get(&user_id)
            .copied()
            .ok_or(WalletError::UserNotFound { user_id })
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. Acceptable for test code.
    #[allow(clippy::expect_used)]
    fn apply_delta(&self, user_id: u64, delta: i64) -> Result<i64, WalletError> {
        let mut balances = self.balances.lock().expect("Mutex poisoned");
        let balance = balances.get_mut(&user_id).ok_or(WalletError::UserNotFound { user_id })?;
        *balance += delta;
        Ok(*balance)
    }
}
