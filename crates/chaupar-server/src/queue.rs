//! Matchmaking queue.
//!
//! Players wait here until enough compatible opponents arrive. Compatibility
//! is exact: same bet amount, same requested player count. Selection is
//! FIFO - the earliest compatible entries pair first, no skill or wait-time
//! ranking. Pairing removes every selected entry in the same call that
//! selects it, so as long as the queue sits behind one lock a connection can
//! never be handed to two rooms.

/// One waiting player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    /// Connection the join request arrived on
    pub connection_id: u64,
    /// Authenticated user behind the connection
    pub user_id: u64,
    /// Stake each player commits
    pub bet_amount: u64,
    /// Room size this player asked for
    pub player_count: u8,
}

/// Result of a successful enqueue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// Enough compatible players: a full group, submitter first, opponents
    /// in the order they queued. All members are already removed from the
    /// queue.
    Paired(Vec<QueueEntry>),

    /// Not enough compatible players yet; the entry is now waiting.
    Waiting,
}

/// Errors from queue operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    /// The connection already has a waiting entry.
    #[error("connection {connection_id} is already queued")]
    AlreadyQueued {
        /// Connection that tried to queue twice
        connection_id: u64,
    },

    /// The requested room size is not offered.
    #[error("unsupported player count {player_count}")]
    UnsupportedPlayerCount {
        /// Requested room size
        player_count: u8,
    },

    /// The queue is at capacity.
    #[error("queue is full ({capacity} waiting)")]
    Full {
        /// Configured capacity
        capacity: usize,
    },
}

/// FIFO matchmaking queue.
///
/// Pure data structure; the server serializes access with a single lock so
/// the check-and-remove step in [`MatchQueue::enqueue`] is atomic.
#[derive(Debug)]
pub struct MatchQueue {
    entries: Vec<QueueEntry>,
    allowed_player_counts: Vec<u8>,
    max_len: usize,
}

impl MatchQueue {
    /// Create a queue accepting the given room sizes, holding at most
    /// `max_len` waiting entries. Sizes below two are dropped from the
    /// accepted set: a match needs at least two seats, and the pairing
    /// arithmetic relies on it.
    #[must_use]
    pub fn new(mut allowed_player_counts: Vec<u8>, max_len: usize) -> Self {
        allowed_player_counts.retain(|&count| count >= 2);
        Self { entries: Vec::new(), allowed_player_counts, max_len }
    }

    /// Add a player and try to form a group.
    ///
    /// If `player_count - 1` compatible entries are already waiting, they
    /// are removed and returned together with the submitter as
    /// [`EnqueueOutcome::Paired`]; otherwise the submitter joins the back
    /// of the queue.
    pub fn enqueue(&mut self, entry: QueueEntry) -> Result<EnqueueOutcome, QueueError> {
        if !self.allowed_player_counts.contains(&entry.player_count) {
            return Err(QueueError::UnsupportedPlayerCount { player_count: entry.player_count });
        }

        if self.contains(entry.connection_id) {
            return Err(QueueError::AlreadyQueued { connection_id: entry.connection_id });
        }

        if self.entries.len() >= self.max_len {
            return Err(QueueError::Full { capacity: self.max_len });
        }

        let needed = usize::from(entry.player_count) - 1;
        let compatible: Vec<usize> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, waiting)| {
                waiting.bet_amount == entry.bet_amount
                    && waiting.player_count == entry.player_count
            })
            .map(|(index, _)| index)
            .take(needed)
            .collect();

        if compatible.len() < needed {
            self.entries.push(entry);
            return Ok(EnqueueOutcome::Waiting);
        }

        // Remove from the back so earlier indices stay valid.
        let mut opponents = Vec::with_capacity(needed);
        for &index in compatible.iter().rev() {
            opponents.push(self.entries.remove(index));
        }
        opponents.reverse();

        let mut group = Vec::with_capacity(needed + 1);
        group.push(entry);
        group.extend(opponents);

        Ok(EnqueueOutcome::Paired(group))
    }

    /// Remove a waiting entry by connection id (disconnect path).
    ///
    /// Returns `true` if an entry was removed.
    pub fn remove(&mut self, connection_id: u64) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.connection_id != connection_id);
        self.entries.len() != before
    }

    /// True if the connection has a waiting entry.
    #[must_use]
    pub fn contains(&self, connection_id: u64) -> bool {
        self.entries.iter().any(|entry| entry.connection_id == connection_id)
    }

    /// Number of waiting entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nobody is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue() -> MatchQueue {
        MatchQueue::new(vec![2, 4], 64)
    }

    fn entry(connection_id: u64, bet_amount: u64, player_count: u8) -> QueueEntry {
        QueueEntry { connection_id, user_id: connection_id + 100, bet_amount, player_count }
    }

    #[test]
    fn first_player_waits() {
        let mut queue = queue();

        let outcome = queue.enqueue(entry(1, 100, 2)).unwrap();

        assert_eq!(outcome, EnqueueOutcome::Waiting);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn two_compatible_players_pair_and_leave_the_queue() {
        let mut queue = queue();

        queue.enqueue(entry(1, 100, 2)).unwrap();
        let outcome = queue.enqueue(entry(2, 100, 2)).unwrap();

        let EnqueueOutcome::Paired(group) = outcome else {
            panic!("expected a pairing");
        };
        // Submitter first, then the waiting opponent.
        assert_eq!(group[0].connection_id, 2);
        assert_eq!(group[1].connection_id, 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn different_bets_do_not_pair() {
        let mut queue = queue();

        queue.enqueue(entry(1, 100, 2)).unwrap();
        let outcome = queue.enqueue(entry(2, 250, 2)).unwrap();

        assert_eq!(outcome, EnqueueOutcome::Waiting);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn different_room_sizes_do_not_pair() {
        let mut queue = queue();

        queue.enqueue(entry(1, 100, 2)).unwrap();
        let outcome = queue.enqueue(entry(2, 100, 4)).unwrap();

        assert_eq!(outcome, EnqueueOutcome::Waiting);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn fifo_selection_skips_incompatible_entries() {
        let mut queue = queue();

        queue.enqueue(entry(1, 100, 4)).unwrap();
        queue.enqueue(entry(2, 100, 4)).unwrap();
        queue.enqueue(entry(3, 250, 2)).unwrap();
        assert_eq!(queue.enqueue(entry(4, 100, 4)).unwrap(), EnqueueOutcome::Waiting);

        // 5 pairs with 3 across the two incompatible four-player entries.
        let EnqueueOutcome::Paired(pair) = queue.enqueue(entry(5, 250, 2)).unwrap() else {
            panic!("expected a pairing");
        };
        let ids: Vec<u64> = pair.iter().map(|e| e.connection_id).collect();
        assert_eq!(ids, vec![5, 3]);
        assert_eq!(queue.len(), 3);

        // The four-player group then forms in arrival order.
        let EnqueueOutcome::Paired(group) = queue.enqueue(entry(6, 100, 4)).unwrap() else {
            panic!("expected a pairing");
        };
        let ids: Vec<u64> = group.iter().map(|e| e.connection_id).collect();
        assert_eq!(ids, vec![6, 1, 2, 4]);
        assert!(queue.is_empty());
    }

    #[test]
    fn four_player_rooms_wait_for_four() {
        let mut queue = queue();

        queue.enqueue(entry(1, 100, 4)).unwrap();
        queue.enqueue(entry(2, 100, 4)).unwrap();
        assert_eq!(queue.enqueue(entry(3, 100, 4)).unwrap(), EnqueueOutcome::Waiting);

        let EnqueueOutcome::Paired(group) = queue.enqueue(entry(4, 100, 4)).unwrap() else {
            panic!("expected a pairing");
        };
        let ids: Vec<u64> = group.iter().map(|e| e.connection_id).collect();
        assert_eq!(ids, vec![4, 1, 2, 3]);
        assert!(queue.is_empty());
    }

    #[test]
    fn duplicate_connection_is_rejected() {
        let mut queue = queue();

        queue.enqueue(entry(1, 100, 2)).unwrap();
        let err = queue.enqueue(entry(1, 100, 2)).unwrap_err();

        assert_eq!(err, QueueError::AlreadyQueued { connection_id: 1 });
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn odd_player_counts_are_rejected() {
        let mut queue = queue();

        let err = queue.enqueue(entry(1, 100, 3)).unwrap_err();

        assert_eq!(err, QueueError::UnsupportedPlayerCount { player_count: 3 });
        assert!(queue.is_empty());
    }

    #[test]
    fn room_sizes_below_two_are_never_offered() {
        // Misconfigured sizes are dropped at construction, so a zero or
        // one player join can never reach the pairing arithmetic.
        let mut queue = MatchQueue::new(vec![0, 1, 2], 8);

        let err = queue.enqueue(entry(1, 100, 0)).unwrap_err();
        assert_eq!(err, QueueError::UnsupportedPlayerCount { player_count: 0 });

        let err = queue.enqueue(entry(2, 100, 1)).unwrap_err();
        assert_eq!(err, QueueError::UnsupportedPlayerCount { player_count: 1 });

        assert_eq!(queue.enqueue(entry(3, 100, 2)).unwrap(), EnqueueOutcome::Waiting);
    }

    #[test]
    fn full_queue_rejects_new_entries() {
        let mut queue = MatchQueue::new(vec![2], 2);

        queue.enqueue(entry(1, 100, 2)).unwrap();
        queue.enqueue(entry(2, 250, 2)).unwrap();
        let err = queue.enqueue(entry(3, 500, 2)).unwrap_err();

        assert_eq!(err, QueueError::Full { capacity: 2 });
    }

    #[test]
    fn remove_drops_a_waiting_entry() {
        let mut queue = queue();

        queue.enqueue(entry(1, 100, 2)).unwrap();

        assert!(queue.remove(1));
        assert!(!queue.remove(1));
        assert!(queue.is_empty());

        // The removed player no longer pairs.
        assert_eq!(queue.enqueue(entry(2, 100, 2)).unwrap(), EnqueueOutcome::Waiting);
    }
}
