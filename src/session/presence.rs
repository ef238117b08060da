//! Presence publication and merge handling for the local session.

use super::GameSession;
use crate::protocol::{PresenceUpdate, RoomEvent};
use crate::types::SquadMember;

impl GameSession {
    /// The local player's full roster record, as peers should see it.
    pub fn local_snapshot(&self) -> SquadMember {
        SquadMember {
            id: self.identity.id.clone(),
            name: self.identity.name.clone(),
            class: self.identity.class,
            is_zombie: self.is_zombie,
            is_dead: self.is_dead,
            tasks_completed: self
                .run
                .as_ref()
                .map(|r| r.completed_count())
                .unwrap_or(0),
            coords: self.coords,
            is_ready: self.is_ready,
            is_host: self.is_host,
        }
    }

    /// Broadcast a full snapshot and merge it into our own roster, so the
    /// local view and the peers' views converge from the same payload.
    pub(crate) fn publish_presence(&mut self) {
        let update = PresenceUpdate::from(&self.local_snapshot());
        self.roster.apply_presence(update.clone());
        self.publish(&RoomEvent::PresenceSync(update));
        self.check_outcome();
    }

    /// Broadcast a partial update touching only the given fields.
    pub(crate) fn publish_partial(&mut self, update: PresenceUpdate) {
        self.roster.apply_presence(update.clone());
        self.publish(&RoomEvent::PresenceSync(update));
    }

    /// Merge a peer's presence payload.
    ///
    /// If a stale echo of our own record arrives (a peer re-announcing on
    /// our behalf, or an old duplicate), merge it and then re-assert the
    /// authoritative local snapshot on top.
    pub(crate) fn on_presence_sync(&mut self, update: PresenceUpdate) {
        let own = update.id == self.identity.id;
        self.roster.apply_presence(update);
        if own {
            self.roster
                .apply_presence(PresenceUpdate::from(&self.local_snapshot()));
        }
        self.check_outcome();
    }
}
