//! Multi-client integration tests over the in-process room hub.
//!
//! Each test wires several full sessions to one `LocalHub` and shuttles
//! broadcasts between them, checking that every client converges on the
//! same roster and verdict without any coordinator.

use outbreak::protocol::RoomEvent;
use outbreak::session::{ActionError, ActionKind, GameSession};
use outbreak::transport::{LocalHub, LocalInbox};
use outbreak::types::*;

struct Client {
    session: GameSession,
    inbox: LocalInbox,
}

impl Client {
    fn join(hub: &LocalHub, name: &str, class_key: &str, room_code: Option<&str>) -> Client {
        let mut session = GameSession::new(SessionIdentity::generate(), GameTuning::default());
        session.begin_class_select();
        session.identify(name, class_key).unwrap();
        match room_code {
            Some(code) => session.join_room(code).unwrap(),
            None => {
                session.create_room().unwrap();
            }
        }
        let (channel, inbox) = hub.join(session.player_id().to_string());
        session.attach_channel(Box::new(channel));
        Client { session, inbox }
    }

    fn id(&self) -> String {
        self.session.player_id().to_string()
    }
}

/// Deliver queued broadcasts until every inbox is drained.
fn pump(clients: &mut [&mut Client]) {
    for _ in 0..16 {
        let mut delivered = false;
        for client in clients.iter_mut() {
            while let Some(event) = client.inbox.try_recv() {
                client.session.handle_event(event);
                delivered = true;
            }
        }
        if !delivered {
            return;
        }
    }
    panic!("room traffic did not quiesce");
}

fn complete_all_tasks(session: &mut GameSession, codes: [&str; 4]) {
    for code in codes {
        session.unlock_task(code).unwrap();
        session.complete_task().unwrap();
        session.confirm_receipt().unwrap();
    }
}

const MEDICO_CODES: [&str; 4] = ["189", "123", "167", "193"];
const DEFAULT_CODES: [&str; 4] = ["201", "214", "237", "259"];

#[test]
fn full_mission_from_lobby_to_extraction() {
    let hub = LocalHub::new();

    let mut host = Client::join(&hub, "raven", "", None);
    let code = host.session.room_code().unwrap().to_string();
    assert_eq!(code.len(), 4);

    let mut medic = Client::join(&hub, "wolf", PlayerClass::Medico.auth_key(), Some(&code));
    pump(&mut [&mut host, &mut medic]);

    // Both rosters converged before the game even starts.
    assert_eq!(host.session.roster().len(), 2);
    assert_eq!(medic.session.roster().len(), 2);
    let host_seen = medic.session.roster().get(&host.id()).unwrap();
    assert!(host_seen.is_host);
    assert_eq!(host_seen.name, "RAVEN");

    host.session.start_game().unwrap();
    pump(&mut [&mut host, &mut medic]);
    assert_eq!(host.session.phase(), SessionPhase::Playing);
    assert_eq!(medic.session.phase(), SessionPhase::Playing);
    println!("✅ lobby and start converged");

    complete_all_tasks(&mut host.session, DEFAULT_CODES);
    pump(&mut [&mut host, &mut medic]);
    assert!(host.session.outcome().is_none(), "medic still working");
    assert_eq!(host.session.global_progress(), 50);

    complete_all_tasks(&mut medic.session, MEDICO_CODES);
    pump(&mut [&mut host, &mut medic]);

    for client in [&host, &medic] {
        let outcome = match client.session.outcome() {
            Some(outcome) => outcome,
            None => panic!("no verdict for {}", client.session.player_id()),
        };
        assert!(outcome.success);
        assert_eq!(outcome.title, "VITÓRIA");
        assert_eq!(client.session.phase(), SessionPhase::Finished);
        assert_eq!(client.session.global_progress(), 100);
    }
    // Receipt messages traveled the radio both ways.
    assert!(host
        .session
        .chat()
        .iter()
        .filter(|m| m.kind == MessageKind::Receipt)
        .count()
        >= 8);
    println!("✅ both clients reached the same victory");
}

#[test]
fn proximity_gate_and_infection_flip() {
    let hub = LocalHub::new();
    let mut primordial = Client::join(&hub, "zero", PlayerClass::ZumbiPrimordial.auth_key(), None);
    let code = primordial.session.room_code().unwrap().to_string();
    let mut survivor = Client::join(&hub, "dove", "", Some(&code));
    pump(&mut [&mut primordial, &mut survivor]);

    primordial.session.start_game().unwrap();
    pump(&mut [&mut primordial, &mut survivor]);
    assert!(primordial.session.is_zombie());

    // ~20 m apart: the bite must not even leave the radio.
    primordial
        .session
        .update_coords(Coords { lat: 0.0, lng: 0.0 });
    survivor
        .session
        .update_coords(Coords { lat: 0.00018, lng: 0.0 });
    pump(&mut [&mut primordial, &mut survivor]);

    let target = survivor.id();
    match primordial.session.issue_action(ActionKind::Infect, &target) {
        Err(ActionError::TargetTooFar { distance_m }) => assert!(distance_m >= 16),
        other => panic!("expected out-of-range rejection, got {other:?}"),
    }
    pump(&mut [&mut primordial, &mut survivor]);
    assert!(!survivor.session.is_zombie());
    println!("✅ out-of-range attempt blocked");

    // Close the gap to ~9 m and bite for real.
    survivor
        .session
        .update_coords(Coords { lat: 0.00008, lng: 0.0 });
    pump(&mut [&mut primordial, &mut survivor]);
    primordial
        .session
        .issue_action(ActionKind::Infect, &target)
        .unwrap();
    pump(&mut [&mut primordial, &mut survivor]);

    assert!(survivor.session.is_zombie());
    assert!(survivor.session.is_dead());
    assert!(
        primordial
            .session
            .roster()
            .get(&target)
            .unwrap()
            .is_zombie,
        "target's new state must replicate back to the attacker"
    );

    // The last quorum human fell, so the horde wins on every screen.
    for client in [&primordial, &survivor] {
        let outcome = client.session.outcome().expect("verdict");
        assert!(outcome.success, "zombies read the human defeat as a win");
        assert_eq!(client.session.phase(), SessionPhase::Finished);
    }
    println!("✅ infection flipped the survivor and ended the game");
}

#[test]
fn heal_brings_an_infected_player_back() {
    let hub = LocalHub::new();
    let mut medic = Client::join(&hub, "wolf", PlayerClass::Medico.auth_key(), None);
    let code = medic.session.room_code().unwrap().to_string();
    let mut patient = Client::join(&hub, "dove", "", Some(&code));
    pump(&mut [&mut medic, &mut patient]);

    medic.session.start_game().unwrap();
    pump(&mut [&mut medic, &mut patient]);

    medic.session.update_coords(Coords { lat: 0.0, lng: 0.0 });
    patient
        .session
        .update_coords(Coords { lat: 0.00008, lng: 0.0 });
    pump(&mut [&mut medic, &mut patient]);

    // The horde got the patient (simulated bite from off-screen).
    let patient_id = patient.id();
    patient.session.handle_event(RoomEvent::InfectionAttempt {
        target_id: patient_id.clone(),
    });
    pump(&mut [&mut medic, &mut patient]);
    assert!(medic.session.roster().get(&patient_id).unwrap().is_zombie);
    assert_eq!(patient.session.send_chat("..."), Err(outbreak::session::ChatError::Silenced));

    medic
        .session
        .issue_action(ActionKind::Heal, &patient_id)
        .unwrap();
    pump(&mut [&mut medic, &mut patient]);

    assert!(!patient.session.is_zombie());
    assert!(!patient.session.is_dead());
    assert_eq!(patient.session.class(), PlayerClass::Default);
    assert_eq!(
        patient.session.task_run().unwrap().completed_count(),
        0,
        "healed players restart the survivor task list"
    );
    assert!(!medic.session.roster().get(&patient_id).unwrap().is_zombie);
    patient.session.send_chat("na escuta").unwrap();
    println!("✅ heal restored the patient on every roster");
}

#[test]
fn late_joiner_converges_via_presence_request() {
    let hub = LocalHub::new();
    let mut host = Client::join(&hub, "raven", "", None);
    let code = host.session.room_code().unwrap().to_string();
    let mut early = Client::join(&hub, "wolf", PlayerClass::Mapeador.auth_key(), Some(&code));
    pump(&mut [&mut host, &mut early]);

    // The late joiner has seen none of the earlier traffic.
    let mut late = Client::join(&hub, "crow", "", Some(&code));
    pump(&mut [&mut host, &mut early, &mut late]);

    assert_eq!(late.session.roster().len(), 3);
    for client in [&host, &early] {
        let seen = client.session.roster().get(&late.id()).unwrap();
        assert_eq!(seen.name, "CROW");
    }
    println!("✅ late joiner pulled the full roster");
}

#[test]
fn chat_replicates_once_per_message() {
    let hub = LocalHub::new();
    let mut host = Client::join(&hub, "raven", "", None);
    let code = host.session.room_code().unwrap().to_string();
    let mut peer = Client::join(&hub, "wolf", "", Some(&code));
    pump(&mut [&mut host, &mut peer]);

    host.session.send_chat("ponto de encontro no mercado").unwrap();
    pump(&mut [&mut host, &mut peer]);

    let texts: Vec<_> = peer
        .session
        .chat()
        .iter()
        .filter(|m| m.kind == MessageKind::Text)
        .collect();
    assert_eq!(texts.len(), 1);
    assert_eq!(texts[0].sender, "RAVEN");
    assert_eq!(texts[0].text, "ponto de encontro no mercado");
    assert_eq!(
        host.session
            .chat()
            .iter()
            .filter(|m| m.kind == MessageKind::Text)
            .count(),
        1,
        "sender keeps exactly one local copy"
    );
    println!("✅ chat replicated without duplication");
}
