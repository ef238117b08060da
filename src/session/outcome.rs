//! Win/loss derivation.
//!
//! Every client derives the verdict independently from its merged roster;
//! there is no referee. The verdict only considers players eligible for
//! the human quorum, and it is evaluated over the *living* members of
//! that quorum so a squad that loses its last human actually ends the
//! game instead of waiting on the fallen.

use super::GameSession;
use crate::types::{DebriefStats, GameOutcome, PlayerClass, SessionPhase};
use tracing::info;

impl GameSession {
    /// Re-derive the verdict from the current roster. Called after every
    /// merge that can change it; a no-op once a verdict is set.
    pub(crate) fn check_outcome(&mut self) {
        if self.phase != SessionPhase::Playing || self.outcome.is_some() {
            return;
        }
        // A roster that only contains ourselves is a room nobody else has
        // announced into yet, not a finished game. Wait for peers.
        if !self.roster.members().any(|m| m.id != self.identity.id) {
            return;
        }
        let quorum_size = self.roster.potential_humans(&self.tuning).count();
        if quorum_size == 0 {
            return;
        }

        let survivors: Vec<_> = self.roster.survivors(&self.tuning).collect();
        let humans_won = if survivors.is_empty() {
            false
        } else if survivors
            .iter()
            .all(|m| m.tasks_completed >= self.tuning.total_tasks)
        {
            true
        } else {
            return;
        };

        let medic_survived = self
            .roster
            .survivors(&self.tuning)
            .any(|m| m.class == PlayerClass::Medico);
        let primordial_down = self
            .roster
            .members()
            .any(|m| m.class == PlayerClass::ZumbiPrimordial && m.is_dead);

        // The verdict is shared; its reading is per-player. The horde
        // celebrates exactly when the humans do not.
        let success = if self.is_zombie {
            !humans_won
        } else {
            humans_won
        };

        let mut narrative = match (self.is_zombie, humans_won) {
            (false, true) => "MISSÃO CUMPRIDA! EXTRAÇÃO AUTORIZADA.".to_string(),
            (false, false) => "EXTINÇÃO TOTAL. A HORDA DOMINOU O SETOR.".to_string(),
            (true, false) => "A HORDA PREVALECEU. O SETOR É NOSSO.".to_string(),
            (true, true) => "OS SOBREVIVENTES ESCAPARAM. A CAÇADA FALHOU.".to_string(),
        };
        if humans_won && medic_survived && !self.is_zombie {
            narrative.push_str(" O MÉDICO MANTEVE TODOS DE PÉ.");
        }
        if primordial_down {
            narrative.push_str(" O PRIMORDIAL FOI NEUTRALIZADO.");
        }

        let title = if success { "VITÓRIA" } else { "FRACASSO" };
        info!(humans_won, success, "verdict reached");

        self.outcome = Some(GameOutcome {
            success,
            title: title.to_string(),
            narrative,
        });
        self.phase = if success {
            SessionPhase::Finished
        } else {
            SessionPhase::Failed
        };
    }

    /// Numbers handed to the narrator for the debrief monologue.
    pub fn debrief_stats(&self) -> DebriefStats {
        DebriefStats {
            completed_tasks: self
                .run
                .as_ref()
                .map(|r| r.completed_count())
                .unwrap_or(0),
            total_tasks: self.tuning.total_tasks,
            time_remaining: self.run.as_ref().map(|r| r.time_left()).unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{PresenceUpdate, RoomEvent};
    use crate::transport::MemoryChannel;
    use crate::types::*;

    fn playing(class: PlayerClass) -> GameSession {
        let mut s = GameSession::new(SessionIdentity::generate(), GameTuning::default());
        s.begin_class_select();
        s.identify("raven", class.auth_key()).unwrap();
        s.create_room().unwrap();
        s.attach_channel(Box::new(MemoryChannel::new()));
        s.start_game().unwrap();
        s
    }

    fn peer(id: &str, class: PlayerClass, tasks: u32, zombie: bool, dead: bool) -> RoomEvent {
        RoomEvent::PresenceSync(PresenceUpdate {
            id: id.into(),
            class: Some(class),
            tasks_completed: Some(tasks),
            is_zombie: Some(zombie),
            is_dead: Some(dead),
            ..Default::default()
        })
    }

    #[test]
    fn no_verdict_while_tasks_remain() {
        let mut s = playing(PlayerClass::Default);
        s.handle_event(peer("p2", PlayerClass::Default, 3, false, false));
        assert!(s.outcome().is_none());
        assert_eq!(s.phase(), SessionPhase::Playing);
    }

    #[test]
    fn all_survivors_done_is_a_human_victory() {
        let mut s = playing(PlayerClass::Default);
        s.handle_event(peer("p2", PlayerClass::Default, 4, false, false));
        assert!(s.outcome().is_none(), "local player still has tasks");

        // Finish our own four tasks.
        for code in ["201", "214", "237", "259"] {
            s.unlock_task(code).unwrap();
            s.complete_task().unwrap();
            s.confirm_receipt().unwrap();
        }

        let outcome = s.outcome().expect("verdict");
        assert!(outcome.success);
        assert_eq!(outcome.title, "VITÓRIA");
        assert_eq!(s.phase(), SessionPhase::Finished);
    }

    #[test]
    fn no_living_humans_is_a_human_defeat() {
        let mut s = playing(PlayerClass::Default);
        s.handle_event(peer("p2", PlayerClass::Default, 2, false, false));

        // Both humans fall.
        s.handle_event(peer("p2", PlayerClass::Default, 2, true, true));
        let id = s.player_id().to_string();
        s.handle_event(RoomEvent::InfectionAttempt { target_id: id });

        // Local player is now a zombie, so the shared human defeat reads
        // as a personal win.
        let outcome = s.outcome().expect("verdict");
        assert!(outcome.success);
        assert_eq!(s.phase(), SessionPhase::Finished);
    }

    #[test]
    fn fallen_humans_do_not_block_the_verdict() {
        let mut s = playing(PlayerClass::Default);
        s.handle_event(peer("p2", PlayerClass::Default, 1, true, true));

        for code in ["201", "214", "237", "259"] {
            s.unlock_task(code).unwrap();
            s.complete_task().unwrap();
            s.confirm_receipt().unwrap();
        }
        // p2 is turned with 1/4 tasks; only the living survivor counts.
        assert!(s.outcome().expect("verdict").success);
    }

    #[test]
    fn primordial_sees_inverted_verdict() {
        let mut s = playing(PlayerClass::ZumbiPrimordial);
        assert!(s.is_zombie());
        s.handle_event(peer("p2", PlayerClass::Default, 4, false, false));

        let outcome = s.outcome().expect("verdict");
        assert!(!outcome.success, "humans won, the horde did not");
        assert_eq!(outcome.title, "FRACASSO");
        assert_eq!(s.phase(), SessionPhase::Failed);
    }

    #[test]
    fn solo_roster_reaches_no_verdict() {
        // Before anyone else announces into the room, an infected local
        // player must land in Playing, not in an instant horde victory.
        let s = playing(PlayerClass::Infectado);
        assert!(s.is_zombie());
        assert!(s.outcome().is_none());
        assert_eq!(s.phase(), SessionPhase::Playing);
    }

    #[test]
    fn primordial_alone_never_ends_the_game() {
        let mut s = playing(PlayerClass::ZumbiPrimordial);
        // Default tuning keeps the primordial out of the quorum, so a
        // roster with nobody else in it has no quorum and no verdict.
        assert!(s.outcome().is_none());
        assert_eq!(s.phase(), SessionPhase::Playing);
    }

    #[test]
    fn verdict_is_sticky() {
        let mut s = playing(PlayerClass::Default);
        s.handle_event(peer("p2", PlayerClass::Default, 4, true, true));
        for code in ["201", "214", "237", "259"] {
            s.unlock_task(code).unwrap();
            s.complete_task().unwrap();
            s.confirm_receipt().unwrap();
        }
        let first = s.outcome().cloned().expect("verdict");

        // A late contradictory payload must not flip a reached verdict.
        s.handle_event(peer("p3", PlayerClass::Default, 0, false, false));
        assert_eq!(s.outcome(), Some(&first));
    }

    #[test]
    fn medic_survival_flavors_the_narrative() {
        let mut s = playing(PlayerClass::Medico);
        s.handle_event(peer("p2", PlayerClass::Default, 4, false, false));
        for code in ["189", "123", "167", "193"] {
            s.unlock_task(code).unwrap();
            s.complete_task().unwrap();
            s.confirm_receipt().unwrap();
        }
        let outcome = s.outcome().expect("verdict");
        assert!(outcome.success);
        assert!(outcome.narrative.contains("MÉDICO"));
    }
}
