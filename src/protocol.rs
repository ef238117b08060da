use crate::types::*;
use serde::{Deserialize, Serialize};

/// Broadcast events on the per-room channel.
///
/// The wire format matches the original deployment: an `event` name plus a
/// JSON `payload`. No ordering or delivery guarantees beyond best effort;
/// every handler must tolerate duplicates and reordering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum RoomEvent {
    /// Partial snapshot of one member, merged into every peer's roster.
    PresenceSync(PresenceUpdate),
    /// A newly joined peer asking the room to re-announce itself.
    RequestPresence {},
    /// Host's start signal; all recipients transition to Playing.
    GameStart {},
    ChatMessage(ChatMessage),
    InfectionAttempt {
        #[serde(rename = "targetId")]
        target_id: PlayerId,
    },
    HealAttempt {
        #[serde(rename = "targetId")]
        target_id: PlayerId,
    },
    KillAttempt {
        #[serde(rename = "targetId")]
        target_id: PlayerId,
    },
}

/// The partial wire form of a `SquadMember`.
///
/// Only `id` is mandatory; absent fields are preserved on merge. There are
/// no per-field timestamps, so payloads touching different field subsets
/// can overwrite each other in arrival order. Accepted weak-consistency
/// tradeoff of the protocol, not a bug.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PresenceUpdate {
    pub id: PlayerId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        rename = "pClass",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub class: Option<PlayerClass>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_zombie: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_dead: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks_completed: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coords: Option<Coords>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_ready: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_host: Option<bool>,
}

impl From<&SquadMember> for PresenceUpdate {
    /// A full snapshot: every field present.
    fn from(m: &SquadMember) -> Self {
        Self {
            id: m.id.clone(),
            name: Some(m.name.clone()),
            class: Some(m.class),
            is_zombie: Some(m.is_zombie),
            is_dead: Some(m.is_dead),
            tasks_completed: Some(m.tasks_completed),
            coords: m.coords,
            is_ready: Some(m.is_ready),
            is_host: Some(m.is_host),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_wire_names() {
        let ev = RoomEvent::InfectionAttempt {
            target_id: "p2".into(),
        };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["event"], "infection_attempt");
        assert_eq!(json["payload"]["targetId"], "p2");

        let ev = RoomEvent::RequestPresence {};
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["event"], "request_presence");
    }

    #[test]
    fn partial_presence_omits_absent_fields() {
        let update = PresenceUpdate {
            id: "p1".into(),
            tasks_completed: Some(3),
            ..Default::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["tasksCompleted"], 3);
        assert!(json.get("isZombie").is_none());
        assert!(json.get("pClass").is_none());
    }

    #[test]
    fn presence_round_trips() {
        let ev = RoomEvent::PresenceSync(PresenceUpdate {
            id: "p1".into(),
            name: Some("RAVEN".into()),
            is_zombie: Some(true),
            ..Default::default()
        });
        let json = serde_json::to_string(&ev).unwrap();
        let back: RoomEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ev);
    }
}
