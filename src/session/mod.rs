//! The local player's game session.
//!
//! One `GameSession` per client. It owns the replicated roster, the local
//! task run, chat, and the phase machine, and it is the only thing that
//! talks to the room channel. Peers influence it exclusively through
//! [`GameSession::handle_event`]; everything else is driven by the local
//! UI layer and the once-a-second [`GameSession::tick`].

mod outcome;
mod presence;
mod tactical;

pub use tactical::{ActionError, ActionKind};

use crate::protocol::{PresenceUpdate, RoomEvent};
use crate::roster::{NearbyMember, Roster};
use crate::tasks::{TaskError, TaskRun, TimerTick};
use crate::transport::RoomChannel;
use crate::types::*;
use rand::Rng;
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IdentifyError {
    #[error("a call sign is required")]
    NameMissing,

    #[error("unrecognized class key")]
    InvalidClassKey,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ChatError {
    #[error("the dead do not speak")]
    Silenced,

    #[error("not connected to a room")]
    NotInRoom,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RadarError {
    #[error("this class carries no radar")]
    NotEquipped,

    #[error("radar recharging, {0}s left")]
    CoolingDown(u64),

    #[error("radar already sweeping")]
    AlreadyActive,
}

/// Transient on-screen feedback from tactical actions and timeouts.
#[derive(Debug, Clone)]
struct Feedback {
    text: String,
    secs_left: u32,
}

#[derive(Debug, Clone, Copy, Default)]
struct RadarState {
    active_secs_left: u32,
    cooldown_secs_left: u64,
}

pub struct GameSession {
    identity: SessionIdentity,
    tuning: GameTuning,
    phase: SessionPhase,
    is_host: bool,
    room_code: Option<RoomCode>,
    channel: Option<Box<dyn RoomChannel>>,
    roster: Roster,
    chat: Vec<ChatMessage>,
    coords: Option<Coords>,
    is_zombie: bool,
    is_dead: bool,
    /// Set when a bite cuts this player off the radio; cleared by a heal.
    silenced: bool,
    is_ready: bool,
    run: Option<TaskRun>,
    radar: RadarState,
    feedback: Option<Feedback>,
    outcome: Option<GameOutcome>,
}

impl GameSession {
    pub fn new(identity: SessionIdentity, tuning: GameTuning) -> Self {
        Self {
            identity,
            tuning,
            phase: SessionPhase::Idle,
            is_host: false,
            room_code: None,
            channel: None,
            roster: Roster::new(),
            chat: Vec::new(),
            coords: None,
            is_zombie: false,
            is_dead: false,
            silenced: false,
            is_ready: false,
            run: None,
            radar: RadarState::default(),
            feedback: None,
            outcome: None,
        }
    }

    // Accessors

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn player_id(&self) -> &str {
        &self.identity.id
    }

    pub fn class(&self) -> PlayerClass {
        self.identity.class
    }

    pub fn is_host(&self) -> bool {
        self.is_host
    }

    pub fn is_zombie(&self) -> bool {
        self.is_zombie
    }

    pub fn is_dead(&self) -> bool {
        self.is_dead
    }

    pub fn room_code(&self) -> Option<&str> {
        self.room_code.as_deref()
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn chat(&self) -> &[ChatMessage] {
        &self.chat
    }

    pub fn outcome(&self) -> Option<&GameOutcome> {
        self.outcome.as_ref()
    }

    pub fn feedback(&self) -> Option<&str> {
        self.feedback.as_ref().map(|f| f.text.as_str())
    }

    pub fn task_run(&self) -> Option<&TaskRun> {
        self.run.as_ref()
    }

    pub fn tuning(&self) -> &GameTuning {
        &self.tuning
    }

    /// Mission progress across all survivors, percent.
    pub fn global_progress(&self) -> u32 {
        self.roster.global_progress(&self.tuning)
    }

    // Pre-game flow

    pub fn begin_class_select(&mut self) {
        self.phase = SessionPhase::SelectClass;
    }

    /// Lock in call sign and (optionally) a class key. Empty key enrolls
    /// as the default survivor class.
    pub fn identify(&mut self, name: &str, class_key: &str) -> Result<(), IdentifyError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(IdentifyError::NameMissing);
        }
        let class = match class_key.trim() {
            "" => PlayerClass::Default,
            key => PlayerClass::from_auth_key(key).ok_or(IdentifyError::InvalidClassKey)?,
        };
        self.identity.name = name.to_uppercase();
        self.identity.class = class;
        self.phase = SessionPhase::JoinRoom;
        info!(name = %self.identity.name, class = ?class, "identified");
        Ok(())
    }

    pub fn back_to_class_select(&mut self) {
        self.phase = SessionPhase::SelectClass;
    }

    /// Host path: mint a room code and open the lobby.
    pub fn create_room(&mut self) -> Result<RoomCode, String> {
        if self.phase != SessionPhase::JoinRoom {
            return Err(format!("cannot create a room from {:?}", self.phase));
        }
        let code = generate_room_code();
        self.is_host = true;
        self.room_code = Some(code.clone());
        self.phase = SessionPhase::Lobby;
        info!(code = %code, "room created");
        Ok(code)
    }

    /// Guest path: join an existing room by its 4-digit code.
    pub fn join_room(&mut self, code: &str) -> Result<(), String> {
        if self.phase != SessionPhase::JoinRoom {
            return Err(format!("cannot join a room from {:?}", self.phase));
        }
        let code = code.trim();
        if code.len() != 4 || !code.chars().all(|c| c.is_ascii_digit()) {
            return Err("room codes are 4 digits".to_string());
        }
        self.is_host = false;
        self.room_code = Some(code.to_string());
        self.phase = SessionPhase::Lobby;
        info!(code = %code, "joined room");
        Ok(())
    }

    /// Wire up the room broadcast channel. Announces the local player and
    /// asks existing members to re-announce themselves so a late joiner
    /// converges quickly.
    pub fn attach_channel(&mut self, channel: Box<dyn RoomChannel>) {
        self.channel = Some(channel);
        self.publish(&RoomEvent::RequestPresence {});
        self.publish_presence();
    }

    pub fn set_ready(&mut self, ready: bool) {
        self.is_ready = ready;
        self.publish_partial(PresenceUpdate {
            id: self.identity.id.clone(),
            is_ready: Some(ready),
            ..Default::default()
        });
    }

    /// Host-only: broadcast the start signal and begin locally.
    pub fn start_game(&mut self) -> Result<(), String> {
        if !self.is_host {
            return Err("only the host can start the game".to_string());
        }
        if self.phase != SessionPhase::Lobby {
            return Err(format!("cannot start from {:?}", self.phase));
        }
        self.publish(&RoomEvent::GameStart {});
        self.start_local();
        Ok(())
    }

    /// Enter Playing: deal the class task list and announce full state.
    fn start_local(&mut self) {
        self.is_zombie = self.identity.class.starts_infected();
        self.is_dead = false;
        self.silenced = false;
        self.is_ready = true;
        self.run = Some(TaskRun::new(self.identity.class, &self.tuning));
        self.radar = RadarState::default();
        self.outcome = None;
        self.phase = SessionPhase::Playing;
        info!(class = ?self.identity.class, "game started");
        self.publish_presence();
    }

    /// Drop everything tied to the room and return to idle. The roster is
    /// never reused; rejoining rebuilds it from presence traffic.
    pub fn leave_room(&mut self) {
        if let Some(channel) = self.channel.take() {
            channel.close();
        }
        self.roster.clear();
        self.chat.clear();
        self.run = None;
        self.room_code = None;
        self.is_host = false;
        self.is_ready = false;
        self.is_zombie = false;
        self.is_dead = false;
        self.silenced = false;
        self.radar = RadarState::default();
        self.feedback = None;
        self.outcome = None;
        self.phase = SessionPhase::Idle;
        info!("left room");
    }

    // Incoming traffic

    /// Apply one event received from a peer. Must tolerate duplicates,
    /// reordering, and events for phases we are not in.
    pub fn handle_event(&mut self, event: RoomEvent) {
        debug!(?event, "room event received");
        match event {
            RoomEvent::PresenceSync(update) => self.on_presence_sync(update),
            RoomEvent::RequestPresence {} => self.publish_presence(),
            RoomEvent::GameStart {} => {
                if self.phase == SessionPhase::Lobby {
                    self.start_local();
                }
            }
            RoomEvent::ChatMessage(msg) => self.on_chat_message(msg),
            RoomEvent::InfectionAttempt { target_id } => {
                self.apply_attempt(ActionKind::Infect, &target_id)
            }
            RoomEvent::HealAttempt { target_id } => {
                self.apply_attempt(ActionKind::Heal, &target_id)
            }
            RoomEvent::KillAttempt { target_id } => {
                self.apply_attempt(ActionKind::Kill, &target_id)
            }
        }
    }

    fn on_chat_message(&mut self, msg: ChatMessage) {
        // Duplicate delivery is legal on the wire; keep one copy per id.
        if self.chat.iter().any(|m| m.id == msg.id) {
            return;
        }
        self.chat.push(msg);
    }

    // Clock

    /// Advance all session countdowns by one second.
    pub fn tick(&mut self) {
        if let Some(feedback) = &mut self.feedback {
            feedback.secs_left = feedback.secs_left.saturating_sub(1);
        }
        if self.feedback.as_ref().is_some_and(|f| f.secs_left == 0) {
            self.feedback = None;
        }

        if self.radar.active_secs_left > 0 {
            self.radar.active_secs_left -= 1;
        }
        if self.radar.cooldown_secs_left > 0 {
            self.radar.cooldown_secs_left -= 1;
        }

        let paused =
            self.phase != SessionPhase::Playing || self.is_dead || self.radar_active();
        let timed_out = match &mut self.run {
            Some(run) => run.tick(paused) == TimerTick::TimedOut,
            None => false,
        };
        if timed_out {
            warn!("round timer expired, task reset");
            self.set_feedback("TEMPO ESGOTADO! A TAREFA FOI REINICIADA.");
        }
    }

    pub(crate) fn set_feedback(&mut self, text: &str) {
        self.feedback = Some(Feedback {
            text: text.to_string(),
            secs_left: self.tuning.feedback_secs,
        });
    }

    // Position

    /// New GPS fix from the sensor layer. Published as a coords-only
    /// partial so stale task counts are never re-broadcast.
    pub fn update_coords(&mut self, coords: Coords) {
        self.coords = Some(coords);
        self.publish_partial(PresenceUpdate {
            id: self.identity.id.clone(),
            coords: Some(coords),
            ..Default::default()
        });
    }

    pub fn coords(&self) -> Option<Coords> {
        self.coords
    }

    /// Peers inside the always-on critical proximity ring.
    pub fn critical_contacts(&self) -> Vec<NearbyMember> {
        match self.coords {
            Some(here) => self
                .roster
                .nearby(&self.identity.id, here, self.tuning.critical_range_m),
            None => Vec::new(),
        }
    }

    // Radar

    pub fn radar_active(&self) -> bool {
        self.radar.active_secs_left > 0
    }

    /// Fire the class radar sweep. Mapper and primordial only.
    pub fn start_radar(&mut self) -> Result<(), RadarError> {
        if self.radar_range().is_none() {
            return Err(RadarError::NotEquipped);
        }
        if self.radar_active() {
            return Err(RadarError::AlreadyActive);
        }
        if self.radar.cooldown_secs_left > 0 {
            return Err(RadarError::CoolingDown(self.radar.cooldown_secs_left));
        }
        self.radar.active_secs_left = self.tuning.radar_duration_secs;
        self.radar.cooldown_secs_left = self.tuning.radar_cooldown_secs;
        info!(class = ?self.identity.class, "radar sweep started");
        Ok(())
    }

    fn radar_range(&self) -> Option<f64> {
        match self.identity.class {
            PlayerClass::Mapeador => Some(self.tuning.mapper_radar_range_m),
            PlayerClass::ZumbiPrimordial => Some(self.tuning.primordial_radar_range_m),
            _ => None,
        }
    }

    /// Peers visible on an active radar sweep, nearest first.
    pub fn radar_contacts(&self) -> Vec<NearbyMember> {
        if !self.radar_active() {
            return Vec::new();
        }
        match (self.coords, self.radar_range()) {
            (Some(here), Some(range)) => self.roster.nearby(&self.identity.id, here, range),
            _ => Vec::new(),
        }
    }

    // Chat

    /// Send a radio message. The dead and the freshly bitten are cut off;
    /// players who *start* the game turned keep their radio.
    pub fn send_chat(&mut self, text: &str) -> Result<(), ChatError> {
        if self.is_dead || self.silenced {
            return Err(ChatError::Silenced);
        }
        if self.channel.is_none() {
            return Err(ChatError::NotInRoom);
        }
        let msg = self.build_message(text, MessageKind::Text, None);
        self.chat.push(msg.clone());
        self.publish(&RoomEvent::ChatMessage(msg));
        Ok(())
    }

    fn build_message(
        &self,
        text: &str,
        kind: MessageKind,
        metadata: Option<ReceiptMeta>,
    ) -> ChatMessage {
        let sender = if self.identity.name.is_empty() {
            "OPERADOR".to_string()
        } else {
            self.identity.name.clone()
        };
        ChatMessage {
            id: ulid::Ulid::new().to_string(),
            sender,
            text: text.to_string(),
            timestamp: chrono::Utc::now().format("%H:%M").to_string(),
            kind,
            is_zombie: self.is_zombie,
            metadata,
        }
    }

    // Task proxying

    pub fn unlock_task(&mut self, code: &str) -> Result<(), TaskError> {
        self.active_run()?.unlock(code)
    }

    pub fn complete_task(&mut self) -> Result<(), TaskError> {
        self.active_run()?.complete()
    }

    /// Confirm the completion receipt: advances the task list, announces
    /// the new count, and posts the receipt to the squad radio.
    pub fn confirm_receipt(&mut self) -> Result<(), TaskError> {
        let run = self.active_run()?;
        let (title, time_left) = match run.current_task() {
            Some(task) => (task.title.clone(), run.time_left()),
            None => return Err(TaskError::NoActiveTask),
        };
        let completed = run.confirm_receipt()?;

        self.publish_partial(PresenceUpdate {
            id: self.identity.id.clone(),
            tasks_completed: Some(completed),
            ..Default::default()
        });

        let receipt = ReceiptMeta {
            task_title: title.clone(),
            receipt_id: ulid::Ulid::new().to_string(),
            time_left,
        };
        let msg = self.build_message(
            &format!("TAREFA CONCLUÍDA: {title}"),
            MessageKind::Receipt,
            Some(receipt),
        );
        self.chat.push(msg.clone());
        self.publish(&RoomEvent::ChatMessage(msg));

        self.check_outcome();
        Ok(())
    }

    fn active_run(&mut self) -> Result<&mut TaskRun, TaskError> {
        if self.phase != SessionPhase::Playing || self.is_dead {
            return Err(TaskError::NoActiveTask);
        }
        self.run.as_mut().ok_or(TaskError::NoActiveTask)
    }

    // Outbound plumbing

    pub(crate) fn publish(&self, event: &RoomEvent) {
        if let Some(channel) = &self.channel {
            if let Err(err) = channel.publish(event) {
                warn!(%err, "dropping outbound event");
            }
        }
    }
}

/// 4-digit room code, 1000..=9999.
fn generate_room_code() -> RoomCode {
    rand::rng().random_range(1000..10000).to_string()
}
