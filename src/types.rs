use serde::{Deserialize, Serialize};

/// Opaque ID types for type safety
pub type PlayerId = String;
pub type MessageId = String;
pub type RoomCode = String;

/// The finite states a single client can be in during one room session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionPhase {
    Idle,
    SelectClass,
    JoinRoom,
    Lobby,
    Playing,
    Finished,
    Failed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlayerClass {
    Medico,
    Cientista,
    Executor,
    Mapeador,
    ZumbiPrimordial,
    Infectado,
    #[default]
    Default,
}

impl PlayerClass {
    /// All classes, enrollable ones first.
    pub const ALL: [PlayerClass; 7] = [
        PlayerClass::Medico,
        PlayerClass::Cientista,
        PlayerClass::Executor,
        PlayerClass::Mapeador,
        PlayerClass::ZumbiPrimordial,
        PlayerClass::Infectado,
        PlayerClass::Default,
    ];

    /// The 8-character enrollment key (`#ddd#ddd`), empty for the default class.
    pub fn auth_key(&self) -> &'static str {
        match self {
            PlayerClass::Medico => "#724#890",
            PlayerClass::Cientista => "#655#918",
            PlayerClass::Executor => "#900#312",
            PlayerClass::Mapeador => "#477#260",
            PlayerClass::ZumbiPrimordial => "#666#131",
            PlayerClass::Infectado => "#812#541",
            PlayerClass::Default => "",
        }
    }

    /// Resolve an enrollment key to a class.
    pub fn from_auth_key(key: &str) -> Option<PlayerClass> {
        Self::ALL
            .into_iter()
            .find(|c| *c != PlayerClass::Default && c.auth_key() == key)
    }

    /// Display name shown in rosters and chat.
    pub fn display_name(&self) -> &'static str {
        match self {
            PlayerClass::Medico => "MÉDICO",
            PlayerClass::Cientista => "CIENTISTA",
            PlayerClass::Executor => "EXECUTOR",
            PlayerClass::Mapeador => "MAPEADOR",
            PlayerClass::ZumbiPrimordial => "ZUMBI PRIMORDIAL",
            PlayerClass::Infectado => "INFECTADO",
            PlayerClass::Default => "SOBREVIVENTE",
        }
    }

    /// Classes that start the game already turned.
    pub fn starts_infected(&self) -> bool {
        matches!(self, PlayerClass::Infectado | PlayerClass::ZumbiPrimordial)
    }
}

/// A GPS fix as delivered by the external geolocation sensor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coords {
    pub lat: f64,
    pub lng: f64,
}

/// One replicated roster record per participant.
///
/// Every client holds its own copy of every member, converged via
/// `presence_sync` broadcasts. The local player's record is authoritative
/// for itself; everything else is last-writer-wins per received payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SquadMember {
    pub id: PlayerId,
    pub name: String,
    #[serde(rename = "pClass")]
    pub class: PlayerClass,
    pub is_zombie: bool,
    pub is_dead: bool,
    pub tasks_completed: u32,
    pub coords: Option<Coords>,
    pub is_ready: bool,
    pub is_host: bool,
}

impl SquadMember {
    /// A fresh record with safe defaults for everything but the id.
    pub fn unknown(id: PlayerId) -> Self {
        Self {
            id,
            name: String::new(),
            class: PlayerClass::Default,
            is_zombie: false,
            is_dead: false,
            tasks_completed: 0,
            coords: None,
            is_ready: false,
            is_host: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageKind {
    Text,
    Receipt,
    System,
}

/// Metadata attached to task-completion receipt messages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptMeta {
    pub task_title: String,
    pub receipt_id: String,
    pub time_left: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: MessageId,
    pub sender: String,
    pub text: String,
    /// HH:MM, UTC. Display-only, never compared.
    pub timestamp: String,
    pub kind: MessageKind,
    pub is_zombie: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ReceiptMeta>,
}

/// Derived end-of-game verdict. Recomputed from the roster, never stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameOutcome {
    pub success: bool,
    pub title: String,
    pub narrative: String,
}

/// Statistics handed to the narrator at game end.
#[derive(Debug, Clone)]
pub struct DebriefStats {
    pub completed_tasks: u32,
    pub total_tasks: u32,
    pub time_remaining: u32,
}

/// Tuning knobs that vary across revisions of the original game.
///
/// These are deliberately configuration rather than constants: the source
/// revisions disagree on several of them (lethal infection, primordial
/// quorum membership, radar numbers).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameTuning {
    /// Per-task round timer, seconds.
    pub round_seconds: u32,
    /// Fixed task-list length per player.
    pub total_tasks: u32,
    /// Maximum distance for infect/heal/kill, meters.
    pub action_range_m: f64,
    /// Radius of the critical-proximity view, meters.
    pub critical_range_m: f64,
    pub mapper_radar_range_m: f64,
    pub primordial_radar_range_m: f64,
    pub radar_cooldown_secs: u64,
    pub radar_duration_secs: u32,
    /// Whether a successful infection also sets the death flag.
    pub infection_is_lethal: bool,
    /// Whether the permanent horde leader counts toward the human quorum.
    pub primordial_in_quorum: bool,
    /// How long transient action feedback stays visible, seconds.
    pub feedback_secs: u32,
}

impl Default for GameTuning {
    fn default() -> Self {
        Self {
            round_seconds: 90,
            total_tasks: 4,
            action_range_m: 15.0,
            critical_range_m: 10.0,
            mapper_radar_range_m: 50.0,
            primordial_radar_range_m: 25.0,
            radar_cooldown_secs: 300,
            radar_duration_secs: 70,
            infection_is_lethal: true,
            primordial_in_quorum: false,
            feedback_secs: 4,
        }
    }
}

impl GameTuning {
    /// Load tuning from environment variables, falling back to defaults
    /// for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            round_seconds: env_parse("OUTBREAK_ROUND_SECONDS", defaults.round_seconds),
            total_tasks: defaults.total_tasks,
            action_range_m: env_parse("OUTBREAK_ACTION_RANGE_M", defaults.action_range_m),
            critical_range_m: env_parse("OUTBREAK_CRITICAL_RANGE_M", defaults.critical_range_m),
            mapper_radar_range_m: env_parse(
                "OUTBREAK_MAPPER_RADAR_RANGE_M",
                defaults.mapper_radar_range_m,
            ),
            primordial_radar_range_m: env_parse(
                "OUTBREAK_PRIMORDIAL_RADAR_RANGE_M",
                defaults.primordial_radar_range_m,
            ),
            radar_cooldown_secs: env_parse(
                "OUTBREAK_RADAR_COOLDOWN_SECS",
                defaults.radar_cooldown_secs,
            ),
            radar_duration_secs: env_parse(
                "OUTBREAK_RADAR_DURATION_SECS",
                defaults.radar_duration_secs,
            ),
            infection_is_lethal: env_parse(
                "OUTBREAK_INFECTION_IS_LETHAL",
                defaults.infection_is_lethal,
            ),
            primordial_in_quorum: env_parse(
                "OUTBREAK_PRIMORDIAL_IN_QUORUM",
                defaults.primordial_in_quorum,
            ),
            feedback_secs: env_parse("OUTBREAK_FEEDBACK_SECS", defaults.feedback_secs),
        }
    }
}

fn env_parse<T: std::str::FromStr>(var: &str, default: T) -> T {
    std::env::var(var)
        .ok()
        .and_then(|s| {
            let trimmed = s.trim();
            (!trimmed.is_empty())
                .then(|| trimmed.parse().ok())
                .flatten()
        })
        .unwrap_or(default)
}

/// The local player's immutable identity plus mutable pre-game choices.
///
/// Constructed once at process start and injected into the session; the id
/// is stable for the lifetime of the session.
#[derive(Debug, Clone)]
pub struct SessionIdentity {
    pub id: PlayerId,
    pub name: String,
    pub class: PlayerClass,
}

impl SessionIdentity {
    pub fn generate() -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            name: String::new(),
            class: PlayerClass::Default,
        }
    }
}
