//! Room registry for active matches.
//!
//! The registry maintains bidirectional mappings: room id → shared room
//! handle (for request routing) and connection id → room id (for the
//! disconnect path). This enables O(1) lookups in both directions.
//!
//! Rooms are inserted fully formed by the pairing flow and removed on
//! settlement; there is no lazy creation. Abandoned (paused, never
//! resumed) rooms currently stay registered - the room's `created_at`
//! instant is the hook for a future idle sweep.

use std::{collections::HashMap, sync::Arc};

use tokio::sync::Mutex;

use crate::room::Room;

/// Shared, lock-guarded handle to one room.
///
/// All roll/move handling for a match is serialized through this lock.
pub type RoomHandle<I> = Arc<Mutex<Room<I>>>;

/// Registry of all active rooms.
///
/// Generic over `I` (Instant type) to support virtual time in tests.
#[derive(Debug)]
pub struct RoomRegistry<I = std::time::Instant> {
    /// Room ID → shared room handle
    rooms: HashMap<u64, RoomHandle<I>>,
    /// Connection ID → room ID (reverse index for disconnects)
    connection_rooms: HashMap<u64, u64>,
}

impl<I> RoomRegistry<I> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self { rooms: HashMap::new(), connection_rooms: HashMap::new() }
    }

    /// Register a freshly created room and index its members.
    ///
    /// Returns the shared handle. Room ids come from environment
    /// randomness, so a collision means a broken environment.
    pub fn insert(&mut self, room: Room<I>) -> RoomHandle<I>
    where
        I: Copy,
    {
        let room_id = room.id();
        debug_assert!(!self.rooms.contains_key(&room_id), "room id collision");

        for connection_id in room.member_connections() {
            self.connection_rooms.insert(connection_id, room_id);
        }

        let handle = Arc::new(Mutex::new(room));
        self.rooms.insert(room_id, Arc::clone(&handle));
        handle
    }

    /// Handle for a room id. `None` if the room is gone.
    #[must_use]
    pub fn get(&self, room_id: u64) -> Option<RoomHandle<I>> {
        self.rooms.get(&room_id).map(Arc::clone)
    }

    /// Handle for the room a connection plays in, if any.
    #[must_use]
    pub fn room_for_connection(&self, connection_id: u64) -> Option<RoomHandle<I>> {
        let room_id = self.connection_rooms.get(&connection_id)?;
        self.rooms.get(room_id).map(Arc::clone)
    }

    /// Remove a room and clear its members from the reverse index.
    ///
    /// Returns the handle if the room existed.
    pub fn remove(&mut self, room_id: u64) -> Option<RoomHandle<I>> {
        let handle = self.rooms.remove(&room_id)?;
        self.connection_rooms.retain(|_, id| *id != room_id);
        Some(handle)
    }

    /// True if the room is registered.
    #[must_use]
    pub fn contains(&self, room_id: u64) -> bool {
        self.rooms.contains_key(&room_id)
    }

    /// Number of active rooms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// True if no rooms are active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

impl<I> Default for RoomRegistry<I> {
    fn default() -> Self {
        Self::new()
    }
}
