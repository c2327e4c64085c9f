//! Controller input: peer identity, updates, pairing and the control channel.
//!
//! Updates arrive from the network context at arbitrary times. They are
//! handed to the game loop through a single-producer/single-consumer ring
//! buffer and applied at the start of each tick, so the producer never
//! touches game state directly and each serve edge is popped exactly once.

use core::fmt;

use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use serde::{Deserialize, Serialize};

use crate::geometry::Side;

/// Identity of a remote controller on the mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(pub u32);

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "peer-{:04x}", self.0)
    }
}

/// Latest reading reported by a controller.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlUpdate {
    /// Paddle angle in radians, if this update carries one.
    pub angle: Option<f32>,
    /// Button pressed since the previous update.
    pub serve_edge: bool,
}

impl ControlUpdate {
    pub fn angle(angle: f32) -> Self {
        Self {
            angle: Some(angle),
            serve_edge: false,
        }
    }

    pub fn serve() -> Self {
        Self {
            angle: None,
            serve_edge: true,
        }
    }
}

/// Binds up to two peers to sides in the order they report in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeerTable {
    slots: [Option<PeerId>; 2],
}

impl PeerTable {
    /// Binds `peer` to the first free side. Returns its side, or `None` when
    /// both sides are already taken by other peers.
    pub fn pair(&mut self, peer: PeerId) -> Option<Side> {
        if let Some(side) = self.side_of(peer) {
            return Some(side);
        }
        let side = Side::BOTH.into_iter().find(|side| self.slots[side.index()].is_none())?;
        self.slots[side.index()] = Some(peer);
        Some(side)
    }

    pub fn side_of(&self, peer: PeerId) -> Option<Side> {
        Side::BOTH
            .into_iter()
            .find(|side| self.slots[side.index()] == Some(peer))
    }

    pub fn peer(&self, side: Side) -> Option<PeerId> {
        self.slots[side.index()]
    }

    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }
}

/// An update tagged with its sender.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlEnvelope {
    pub peer: PeerId,
    pub update: ControlUpdate,
}

/// Creates a bounded control channel holding up to `capacity` updates.
pub fn control_channel(capacity: usize) -> (ControlSender, ControlReceiver) {
    let (producer, consumer) = HeapRb::<ControlEnvelope>::new(capacity).split();
    (
        ControlSender {
            producer,
            dropped: 0,
        },
        ControlReceiver { consumer },
    )
}

/// Network-side end of the control channel.
pub struct ControlSender {
    producer: HeapProd<ControlEnvelope>,
    dropped: u64,
}

impl ControlSender {
    /// Queues an update without blocking. Returns `false` and counts the
    /// update as dropped when the game loop has fallen behind.
    pub fn send(&mut self, peer: PeerId, update: ControlUpdate) -> bool {
        match self.producer.try_push(ControlEnvelope { peer, update }) {
            Ok(()) => true,
            Err(_) => {
                self.dropped += 1;
                false
            }
        }
    }

    /// Updates rejected because the channel was full.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

/// Game-loop end of the control channel.
pub struct ControlReceiver {
    consumer: HeapCons<ControlEnvelope>,
}

impl ControlReceiver {
    pub fn try_recv(&mut self) -> Option<ControlEnvelope> {
        self.consumer.try_pop()
    }

    pub fn pending(&self) -> usize {
        self.consumer.occupied_len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peers_pair_in_arrival_order() {
        let mut table = PeerTable::default();
        assert_eq!(table.pair(PeerId(7)), Some(Side::Left));
        assert_eq!(table.pair(PeerId(3)), Some(Side::Right));
        assert!(table.is_complete());
        assert_eq!(table.pair(PeerId(9)), None);
        assert_eq!(table.peer(Side::Right), Some(PeerId(3)));
    }

    #[test]
    fn re_pairing_keeps_the_existing_side() {
        let mut table = PeerTable::default();
        table.pair(PeerId(1));
        assert_eq!(table.pair(PeerId(1)), Some(Side::Left));
        assert!(!table.is_complete());
        assert_eq!(table.side_of(PeerId(2)), None);
    }

    #[test]
    fn channel_delivers_in_order() {
        let (mut tx, mut rx) = control_channel(4);
        assert!(tx.send(PeerId(1), ControlUpdate::angle(0.5)));
        assert!(tx.send(PeerId(2), ControlUpdate::serve()));
        assert_eq!(rx.pending(), 2);
        let first = rx.try_recv().unwrap();
        assert_eq!(first.peer, PeerId(1));
        assert_eq!(first.update.angle, Some(0.5));
        let second = rx.try_recv().unwrap();
        assert!(second.update.serve_edge);
        assert!(rx.try_recv().is_none());
    }

    #[test]
    fn full_channel_drops_new_updates() {
        let (mut tx, mut rx) = control_channel(2);
        assert!(tx.send(PeerId(1), ControlUpdate::angle(0.1)));
        assert!(tx.send(PeerId(1), ControlUpdate::angle(0.2)));
        assert!(!tx.send(PeerId(1), ControlUpdate::angle(0.3)));
        assert_eq!(tx.dropped(), 1);
        assert_eq!(rx.try_recv().unwrap().update.angle, Some(0.1));
    }

    #[test]
    fn channel_crosses_threads() {
        let (mut tx, mut rx) = control_channel(8);
        std::thread::spawn(move || {
            for i in 0..4 {
                assert!(tx.send(PeerId(1), ControlUpdate::angle(i as f32)));
            }
        })
        .join()
        .unwrap();
        let angles: Vec<f32> = std::iter::from_fn(|| rx.try_recv())
            .filter_map(|env| env.update.angle)
            .collect();
        assert_eq!(angles, vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn updates_parse_from_camel_case() {
        let update: ControlUpdate =
            serde_json::from_str(r#"{"angle": 1.5, "serveEdge": true}"#).unwrap();
        assert_eq!(update.angle, Some(1.5));
        assert!(update.serve_edge);
    }
}
