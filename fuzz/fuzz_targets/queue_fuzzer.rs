//! Fuzz target for the matchmaking queue
//!
//! Interleaves joins and disconnects with colliding connection ids to find
//! pairing bugs the property tests' generated op lists would miss.
//!
//! # Strategy
//!
//! - Few distinct connection ids so rejoin-after-leave and double-join hit
//! - A handful of bet classes and both offered (and some bogus) room sizes
//! - Small capacities so the full-queue path is reached quickly
//!
//! # Invariants
//!
//! - The waiting count never exceeds capacity
//! - A paired group is exactly the requested size, submitter first, all on
//!   the same bet and room size, with no duplicate connections
//! - Every paired member is out of the queue the moment the group forms
//! - Any error leaves the queue untouched
//! - Full is only reported at capacity

#![no_main]

use arbitrary::Arbitrary;
use chaupar_server::{EnqueueOutcome, MatchQueue, QueueEntry, QueueError};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Arbitrary)]
struct QueueScenario {
    capacity: u8,
    ops: Vec<QueueOp>,
}

#[derive(Debug, Clone, Arbitrary)]
enum QueueOp {
    Join { connection_id: u8, bet_class: u8, player_count: u8 },
    Leave { connection_id: u8 },
}

fuzz_target!(|scenario: QueueScenario| {
    let capacity = 1 + usize::from(scenario.capacity % 16);
    let mut queue = MatchQueue::new(vec![2, 4], capacity);

    for op in scenario.ops {
        let before = queue.len();
        assert!(before <= capacity);

        match op {
            QueueOp::Join { connection_id, bet_class, player_count } => {
                let connection_id = u64::from(connection_id % 12);
                let was_queued = queue.contains(connection_id);
                let entry = QueueEntry {
                    connection_id,
                    user_id: connection_id + 1000,
                    bet_amount: u64::from(bet_class % 3) * 50,
                    player_count: player_count % 6,
                };

                match queue.enqueue(entry.clone()) {
                    Ok(EnqueueOutcome::Waiting) => {
                        assert!(queue.contains(connection_id));
                        assert_eq!(queue.len(), before + 1);
                    },
                    Ok(EnqueueOutcome::Paired(group)) => {
                        assert_eq!(group.len(), usize::from(entry.player_count));
                        assert_eq!(group[0], entry, "submitter must lead the group");
                        assert_eq!(queue.len(), before + 1 - group.len());

                        let mut seen = Vec::new();
                        for member in &group {
                            assert_eq!(member.bet_amount, entry.bet_amount);
                            assert_eq!(member.player_count, entry.player_count);
                            assert!(!seen.contains(&member.connection_id));
                            assert!(
                                !queue.contains(member.connection_id),
                                "paired member still waiting"
                            );
                            seen.push(member.connection_id);
                        }
                    },
                    Err(QueueError::AlreadyQueued { .. }) => {
                        assert!(was_queued);
                        assert_eq!(queue.len(), before);
                    },
                    Err(QueueError::UnsupportedPlayerCount { .. }) => {
                        assert!(![2, 4].contains(&entry.player_count));
                        assert_eq!(queue.len(), before);
                    },
                    Err(QueueError::Full { .. }) => {
                        assert_eq!(before, capacity);
                        assert!(!was_queued);
                        assert_eq!(queue.len(), before);
                    },
                }
            },

            QueueOp::Leave { connection_id } => {
                let connection_id = u64::from(connection_id % 12);
                let was_queued = queue.contains(connection_id);

                let removed = queue.remove(connection_id);

                assert_eq!(removed, was_queued);
                assert!(!queue.contains(connection_id));
                assert_eq!(queue.len(), before - usize::from(removed));
            },
        }

        assert_eq!(queue.is_empty(), queue.len() == 0);
    }
});
