//! The seam between game logic and whatever carries room broadcasts.
//!
//! The session only ever talks to a [`RoomChannel`]; real deployments plug
//! in their realtime backend, tests plug in [`LocalHub`] or
//! [`MemoryChannel`]. Channels are fire-and-forget: publishing never
//! confirms delivery to anyone.

use crate::protocol::RoomEvent;
use crate::types::PlayerId;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("room channel is closed")]
    Closed,
}

/// Outbound half of a room subscription.
///
/// Implementations must not echo the publisher's own events back to it;
/// the local player's state is applied locally, never round-tripped.
pub trait RoomChannel: Send + Sync {
    fn publish(&self, event: &RoomEvent) -> Result<(), TransportError>;

    /// Tear down the subscription. Publishing afterwards fails.
    fn close(&self);
}

/// One event as carried by the in-process hub, tagged with its publisher.
#[derive(Debug, Clone)]
struct Envelope {
    sender: PlayerId,
    event: RoomEvent,
}

/// An in-process room bus connecting several sessions in one test binary.
#[derive(Clone)]
pub struct LocalHub {
    bus: broadcast::Sender<Envelope>,
}

impl Default for LocalHub {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalHub {
    pub fn new() -> Self {
        let (bus, _) = broadcast::channel(256);
        Self { bus }
    }

    /// Subscribe one player. Returns the publishing half and an inbox that
    /// filters out the player's own events.
    pub fn join(&self, player_id: impl Into<PlayerId>) -> (LocalChannel, LocalInbox) {
        let player_id = player_id.into();
        let inbox = LocalInbox {
            player_id: player_id.clone(),
            receiver: self.bus.subscribe(),
        };
        let channel = LocalChannel {
            player_id,
            bus: self.bus.clone(),
            open: Arc::new(Mutex::new(true)),
        };
        (channel, inbox)
    }
}

pub struct LocalChannel {
    player_id: PlayerId,
    bus: broadcast::Sender<Envelope>,
    open: Arc<Mutex<bool>>,
}

impl RoomChannel for LocalChannel {
    fn publish(&self, event: &RoomEvent) -> Result<(), TransportError> {
        let open = self.open.lock().map_err(|_| TransportError::Closed)?;
        if !*open {
            return Err(TransportError::Closed);
        }
        // A send error just means nobody is subscribed; fire-and-forget.
        let _ = self.bus.send(Envelope {
            sender: self.player_id.clone(),
            event: event.clone(),
        });
        Ok(())
    }

    fn close(&self) {
        if let Ok(mut open) = self.open.lock() {
            *open = false;
        }
    }
}

/// Inbound half of a [`LocalHub`] subscription.
pub struct LocalInbox {
    player_id: PlayerId,
    receiver: broadcast::Receiver<Envelope>,
}

impl LocalInbox {
    /// Next event published by a peer, if any is queued. Lagged slots are
    /// skipped, matching the at-most-once semantics of the real backend.
    pub fn try_recv(&mut self) -> Option<RoomEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(env) if env.sender == self.player_id => continue,
                Ok(env) => return Some(env.event),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }

    /// Drain everything currently queued.
    pub fn drain(&mut self) -> Vec<RoomEvent> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}

/// A channel that records what was published. For asserting on outbound
/// traffic in tests.
#[derive(Clone, Default)]
pub struct MemoryChannel {
    published: Arc<Mutex<Vec<RoomEvent>>>,
}

impl MemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything published since the last call.
    pub fn take(&self) -> Vec<RoomEvent> {
        match self.published.lock() {
            Ok(mut published) => std::mem::take(&mut *published),
            Err(_) => Vec::new(),
        }
    }
}

impl RoomChannel for MemoryChannel {
    fn publish(&self, event: &RoomEvent) -> Result<(), TransportError> {
        self.published
            .lock()
            .map_err(|_| TransportError::Closed)?
            .push(event.clone());
        Ok(())
    }

    fn close(&self) {}
}
