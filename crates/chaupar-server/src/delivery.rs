//! Event delivery collaborator.
//!
//! The transport layer (socket framing, origin policy) lives outside this
//! server. Game logic hands finished [`Event`]s to a `Delivery`
//! implementation keyed by connection id; broadcast fan-out is the caller's
//! loop over room members, so a failure toward one connection never blocks
//! the rest.
//!
//! Two implementations ship here: [`RecordingDelivery`] captures events for
//! test inspection, [`ChannelDelivery`] encodes events to CBOR and pushes
//! the bytes into per-connection channels for a transport shell to drain.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use bytes::Bytes;
use chaupar_proto::{Event, ProtocolError, encode_event};
use tokio::sync::mpsc;

/// Errors from event delivery.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// The connection has no live outbound channel.
    #[error("connection {connection_id} is not reachable")]
    Disconnected {
        /// Connection the event was addressed to
        connection_id: u64,
    },

    /// The event could not be encoded for the wire.
    #[error(transparent)]
    Encode(#[from] ProtocolError),
}

/// Outbound event seam.
///
/// Must be Clone (shared with the server glue), Send + Sync (called from
/// async tasks), and synchronous - implementations queue or record, they do
/// not block on the network.
pub trait Delivery: Clone + Send + Sync + 'static {
    /// Deliver one event to one connection.
    fn deliver(&self, connection_id: u64, event: &Event) -> Result<(), DeliveryError>;
}

/// Test delivery that records every event instead of sending it.
///
/// Thread-safe through Mutex, but uses `lock().expect()` which will panic if
/// the mutex is poisoned - acceptable for test code.
#[allow(clippy::disallowed_types, reason = "Synchronous in-memory operations only")]
#[derive(Clone, Default)]
pub struct RecordingDelivery {
    events: Arc<Mutex<Vec<(u64, Event)>>>,
}

impl RecordingDelivery {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain and return everything recorded so far, in delivery order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. Acceptable for test code.
    #[allow(clippy::expect_used)]
    pub fn take(&self) -> Vec<(u64, Event)> {
        std::mem::take(&mut *self.events.lock().expect("Mutex poisoned"))
    }

    /// Events delivered to one connection, in delivery order.
    ///
    /// Does not drain; repeated calls see the same prefix.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. Acceptable for test code.
    #[allow(clippy::expect_used)]
    pub fn events_for(&self, connection_id: u64) -> Vec<Event> {
        self.events
            .lock()
            .expect("Mutex poisoned")
            .iter()
            .filter(|(recipient, _)| *recipient == connection_id)
            .map(|(_, event)| event.clone())
            .collect()
    }

    /// Total number of recorded deliveries.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. Acceptable for test code.
    #[allow(clippy::expect_used)]
    pub fn len(&self) -> usize {
        self.events.lock().expect("Mutex poisoned").len()
    }

    /// True if nothing has been delivered.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. Acceptable for test code.
    #[allow(clippy::expect_used)]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.lock().expect("Mutex poisoned").is_empty()
    }
}

impl Delivery for RecordingDelivery {
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. Acceptable for test code.
    #[allow(clippy::expect_used)]
    fn deliver(&self, connection_id: u64, event: &Event) -> Result<(), DeliveryError> {
        self.events.lock().expect("Mutex poisoned").push((connection_id, event.clone()));
        Ok(())
    }
}

/// Delivery over per-connection byte channels.
///
/// Each registered connection gets an unbounded channel of CBOR-encoded
/// events; the transport shell holds the receiving half and writes the bytes
/// to its socket. Unbounded is acceptable because a match produces a small,
/// bounded event stream.
#[allow(clippy::disallowed_types, reason = "Short-held sync lock around the sender map")]
#[derive(Clone, Default)]
pub struct ChannelDelivery {
    senders: Arc<Mutex<HashMap<u64, mpsc::UnboundedSender<Bytes>>>>,
}

impl ChannelDelivery {
    /// Create a delivery with no connections.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an outbound channel for a connection.
    ///
    /// Replaces any previous channel for the same id; the old receiver sees
    /// end-of-stream.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[allow(clippy::expect_used)]
    pub fn register(&self, connection_id: u64) -> mpsc::UnboundedReceiver<Bytes> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.lock().expect("Mutex poisoned").insert(connection_id, tx);
        rx
    }

    /// Drop a connection's outbound channel.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[allow(clippy::expect_used)]
    pub fn unregister(&self, connection_id: u64) {
        self.senders.lock().expect("Mutex poisoned").remove(&connection_id);
    }
}

impl Delivery for ChannelDelivery {
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[allow(clippy::expect_used)]
    fn deliver(&self, connection_id: u64, event: &Event) -> Result<(), DeliveryError> {
        let encoded = encode_event(event)?;

        let mut senders = self.senders.lock().expect("Mutex poisoned");
        let Some(sender) = senders.get(&connection_id) else {
            return Err(DeliveryError::Disconnected { connection_id });
        };

        if sender.send(encoded).is_err() {
            // Receiver is gone; drop the stale sender so later calls fail fast.
            senders.remove(&connection_id);
            return Err(DeliveryError::Disconnected { connection_id });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chaupar_core::Color;
    use chaupar_proto::decode_event;

    use super::*;

    fn turn_change(turn_index: u8) -> Event {
        Event::TurnChange { turn_index }
    }

    #[test]
    fn recorder_keeps_delivery_order() {
        let delivery = RecordingDelivery::new();

        delivery.deliver(1, &turn_change(0)).unwrap();
        delivery.deliver(2, &turn_change(0)).unwrap();
        delivery.deliver(1, &turn_change(1)).unwrap();

        assert_eq!(delivery.len(), 3);
        assert_eq!(delivery.events_for(1), vec![turn_change(0), turn_change(1)]);
        assert_eq!(delivery.events_for(2), vec![turn_change(0)]);
    }

    #[test]
    fn recorder_take_drains() {
        let delivery = RecordingDelivery::new();

        delivery.deliver(1, &turn_change(0)).unwrap();

        assert_eq!(delivery.take(), vec![(1, turn_change(0))]);
        assert!(delivery.is_empty());
    }

    #[test]
    fn channel_delivery_round_trips_events() {
        let delivery = ChannelDelivery::new();
        let mut rx = delivery.register(9);

        let event = Event::GameStart {
            room_id: 42,
            player_color: Color::Red,
            players: vec![Color::Red, Color::Green],
        };
        delivery.deliver(9, &event).unwrap();

        let bytes = rx.try_recv().unwrap();
        assert_eq!(decode_event(&bytes).unwrap(), event);
    }

    #[test]
    fn unknown_connection_is_disconnected() {
        let delivery = ChannelDelivery::new();

        let err = delivery.deliver(9, &turn_change(0)).unwrap_err();
        assert!(matches!(err, DeliveryError::Disconnected { connection_id: 9 }));
    }

    #[test]
    fn dropped_receiver_is_disconnected() {
        let delivery = ChannelDelivery::new();
        let rx = delivery.register(9);
        drop(rx);

        let err = delivery.deliver(9, &turn_change(0)).unwrap_err();
        assert!(matches!(err, DeliveryError::Disconnected { connection_id: 9 }));
    }

    #[test]
    fn unregister_closes_the_channel() {
        let delivery = ChannelDelivery::new();
        let mut rx = delivery.register(9);

        delivery.unregister(9);

        assert!(delivery.deliver(9, &turn_change(0)).is_err());
        assert!(rx.try_recv().is_err());
    }
}
