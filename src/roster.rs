//! The per-client replicated view of every player in the room.
//!
//! There is no central authority: each client merges `presence_sync`
//! payloads into its own roster and derives everything else (progress,
//! survivors, win/loss input) from that merged view. Merging is idempotent
//! and commutative for disjoint field sets, which is what keeps divergence
//! bounded under duplicate and out-of-order delivery.

use crate::geo::distance_meters;
use crate::protocol::PresenceUpdate;
use crate::types::*;
use std::collections::HashMap;

/// A member annotated with its distance to the local player.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyMember {
    pub member: SquadMember,
    pub distance_m: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Roster {
    members: HashMap<PlayerId, SquadMember>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one presence payload.
    ///
    /// Fields present in the payload are taken as the latest known value;
    /// absent fields are preserved. Unknown ids are inserted with safe
    /// defaults for whatever the payload does not carry.
    pub fn apply_presence(&mut self, update: PresenceUpdate) {
        let member = self
            .members
            .entry(update.id.clone())
            .or_insert_with(|| SquadMember::unknown(update.id.clone()));

        if let Some(name) = update.name {
            member.name = name;
        }
        if let Some(class) = update.class {
            member.class = class;
        }
        if let Some(is_zombie) = update.is_zombie {
            member.is_zombie = is_zombie;
        }
        if let Some(is_dead) = update.is_dead {
            member.is_dead = is_dead;
        }
        if let Some(tasks_completed) = update.tasks_completed {
            member.tasks_completed = tasks_completed;
        }
        if let Some(coords) = update.coords {
            member.coords = Some(coords);
        }
        if let Some(is_ready) = update.is_ready {
            member.is_ready = is_ready;
        }
        if let Some(is_host) = update.is_host {
            member.is_host = is_host;
        }
    }

    pub fn get(&self, id: &str) -> Option<&SquadMember> {
        self.members.get(id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> impl Iterator<Item = &SquadMember> {
        self.members.values()
    }

    /// Drop every record. Used when leaving a room; a roster is only ever
    /// rebuilt by rejoining.
    pub fn clear(&mut self) {
        self.members.clear();
    }

    /// Members eligible to count toward the human win/loss quorum.
    ///
    /// The permanent horde leader is excluded unless the tuning says
    /// otherwise; merely-infected players stay in the quorum (they can be
    /// healed back).
    pub fn potential_humans<'a>(
        &'a self,
        tuning: &'a GameTuning,
    ) -> impl Iterator<Item = &'a SquadMember> {
        self.members.values().filter(move |m| {
            tuning.primordial_in_quorum || m.class != PlayerClass::ZumbiPrimordial
        })
    }

    /// Quorum members that are still alive and human.
    pub fn survivors<'a>(
        &'a self,
        tuning: &'a GameTuning,
    ) -> impl Iterator<Item = &'a SquadMember> {
        self.potential_humans(tuning)
            .filter(|m| !m.is_zombie && !m.is_dead)
    }

    /// Mission progress across all survivors, rounded percent in [0, 100].
    /// Zero when nobody is left standing.
    pub fn global_progress(&self, tuning: &GameTuning) -> u32 {
        let survivors: Vec<_> = self.survivors(tuning).collect();
        if survivors.is_empty() {
            return 0;
        }
        let possible = survivors.len() as u32 * tuning.total_tasks;
        let completed: u32 = survivors.iter().map(|m| m.tasks_completed).sum();
        (((completed as f64 / possible as f64) * 100.0).round() as u32).min(100)
    }

    /// Members within `radius_m` of `self_coords`, excluding the local
    /// player and anyone without a known position, nearest first.
    pub fn nearby(&self, self_id: &str, self_coords: Coords, radius_m: f64) -> Vec<NearbyMember> {
        let mut near: Vec<NearbyMember> = self
            .members
            .values()
            .filter(|m| m.id != self_id)
            .filter_map(|m| {
                let coords = m.coords?;
                let distance_m = distance_meters(self_coords, coords);
                (distance_m <= radius_m).then(|| NearbyMember {
                    member: m.clone(),
                    distance_m,
                })
            })
            .collect();
        near.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));
        near
    }
}
