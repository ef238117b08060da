//! Proximity-gated tactical actions: infect, heal, eliminate.
//!
//! The initiator only validates and broadcasts; the *target's* client is
//! the one that mutates state when it receives an attempt addressed to
//! it, then re-announces itself. Nobody ever rewrites another player's
//! roster record directly.

use super::GameSession;
use crate::geo::distance_meters;
use crate::protocol::RoomEvent;
use crate::types::{PlayerClass, SessionPhase};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Infect,
    Heal,
    Kill,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ActionError {
    #[error("you are in no state to act")]
    NotInPlay,

    #[error("your class cannot perform this action")]
    NotAuthorized,

    #[error("target is not in the squad")]
    UnknownTarget,

    #[error("no GPS fix for you or the target")]
    PositionUnavailable,

    #[error("target out of range ({distance_m} m)")]
    TargetTooFar { distance_m: u32 },
}

impl GameSession {
    /// Validate and broadcast a tactical action against `target_id`.
    ///
    /// On success exactly one attempt event goes out and local feedback is
    /// shown; the local roster is left untouched until the target
    /// re-announces its new state.
    pub fn issue_action(&mut self, kind: ActionKind, target_id: &str) -> Result<(), ActionError> {
        if self.phase != SessionPhase::Playing || self.is_dead {
            return Err(ActionError::NotInPlay);
        }
        if !self.may_perform(kind) {
            return Err(ActionError::NotAuthorized);
        }

        let target = self
            .roster
            .get(target_id)
            .ok_or(ActionError::UnknownTarget)?;
        let (here, there) = match (self.coords, target.coords) {
            (Some(a), Some(b)) => (a, b),
            _ => return Err(ActionError::PositionUnavailable),
        };
        let distance_m = distance_meters(here, there);
        if distance_m > self.tuning.action_range_m {
            return Err(ActionError::TargetTooFar {
                distance_m: distance_m.round() as u32,
            });
        }

        let target_id = target_id.to_string();
        let (event, confirmation) = match kind {
            ActionKind::Infect => (
                RoomEvent::InfectionAttempt {
                    target_id: target_id.clone(),
                },
                "MORDIDA DESFERIDA! ALVO EXPOSTO AO VÍRUS.",
            ),
            ActionKind::Heal => (
                RoomEvent::HealAttempt {
                    target_id: target_id.clone(),
                },
                "ANTÍGENO INJETADO NO ALVO.",
            ),
            ActionKind::Kill => (
                RoomEvent::KillAttempt {
                    target_id: target_id.clone(),
                },
                "DISPARO EFETUADO. ALVO ABATIDO.",
            ),
        };
        info!(?kind, %target_id, distance_m, "tactical action issued");
        self.publish(&event);
        self.set_feedback(confirmation);
        Ok(())
    }

    fn may_perform(&self, kind: ActionKind) -> bool {
        match kind {
            ActionKind::Infect => self.is_zombie,
            ActionKind::Heal => self.identity.class == PlayerClass::Medico && !self.is_zombie,
            ActionKind::Kill => self.identity.class == PlayerClass::Executor && !self.is_zombie,
        }
    }

    /// React to an attempt received from the room. Attempts addressed to
    /// other players are ignored; only the target applies the effect.
    pub(crate) fn apply_attempt(&mut self, kind: ActionKind, target_id: &str) {
        if target_id != self.identity.id || self.phase != SessionPhase::Playing {
            return;
        }
        match kind {
            ActionKind::Infect => {
                if self.is_zombie {
                    return;
                }
                self.is_zombie = true;
                self.is_dead = self.tuning.infection_is_lethal;
                self.silenced = true;
                if let Some(run) = &mut self.run {
                    run.clear();
                }
                self.set_feedback("SINAL VITAL PERDIDO: VOCÊ FOI INFECTADO!");
            }
            ActionKind::Heal => {
                // Duplicate delivery is legal; a heal of a healthy player
                // must not restart their task list.
                if !self.is_zombie && !self.is_dead {
                    return;
                }
                self.is_zombie = false;
                self.is_dead = false;
                self.silenced = false;
                self.identity.class = PlayerClass::Default;
                match &mut self.run {
                    Some(run) => run.regenerate(PlayerClass::Default),
                    None => {}
                }
                self.set_feedback("ANTÍGENO APLICADO! VOCÊ ESTÁ CURADO.");
            }
            ActionKind::Kill => {
                if self.is_dead {
                    return;
                }
                self.is_dead = true;
                self.is_zombie = true;
                if let Some(run) = &mut self.run {
                    run.clear();
                }
                self.set_feedback("ALVO ELIMINADO PELO EXECUTOR.");
            }
        }
        info!(?kind, "tactical effect applied to local player");
        self.publish_presence();
    }
}
