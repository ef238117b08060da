//! Per-class task lists and the per-task round-timer sequencer.
//!
//! A player's four tasks are fixed at game start from the static tables
//! below. The sequencer only advances on confirmed completion; a timeout
//! restarts the countdown and wipes the minigame widget's progress, it
//! never skips a task.

use crate::types::{GameTuning, PlayerClass};
use serde::{Deserialize, Serialize};

/// Minigame-specific configuration, keyed by minigame kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPayload {
    Lockpick { pins: u8 },
    Memory { sequence: Vec<u8> },
    Wires { wire_count: u8 },
    Typing { phrase: String },
    Radio,
    /// The pre-unlocked secret task of the infected classes.
    InfectadoSecret,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    /// 1-based position in the player's list.
    pub id: u32,
    pub title: String,
    pub description: String,
    /// 3-digit gate code; `None` means the task is pre-unlocked.
    pub unlock_code: Option<String>,
    pub payload: TaskPayload,
}

fn task(id: u32, title: &str, code: &str, description: &str, payload: TaskPayload) -> Task {
    Task {
        id,
        title: title.to_string(),
        description: description.to_string(),
        unlock_code: (!code.is_empty()).then(|| code.to_string()),
        payload,
    }
}

/// The fixed 4-task list for a class.
pub fn class_tasks(class: PlayerClass) -> Vec<Task> {
    use TaskPayload::*;
    match class {
        PlayerClass::Medico => vec![
            task(1, "CURAR FERIMENTOS", "189", "Realize suturas de alta precisão.", Lockpick { pins: 5 }),
            task(2, "PRODUZIR KITS", "123", "Memorize a combinação química.", Memory { sequence: vec![1, 2, 3, 6, 5, 4, 7, 8, 9] }),
            task(3, "TRATAR INFECTADOS", "167", "Descontaminação viral.", Memory { sequence: vec![1, 6, 7, 3, 9, 2, 4, 8, 5] }),
            task(4, "POSTO MÉDICO", "193", "Sincronize o banco de dados.", Typing { phrase: "AUTORIZAR_SISTEMA_MEDICO_RECARGA_MOLECULAR_NIVEL_X9".into() }),
        ],
        PlayerClass::Cientista => vec![
            task(1, "PESQUISAR ORIGEM", "501", "Mapeie o DNA do Vírus-Z.", Memory { sequence: vec![5, 0, 1, 8, 4, 7, 3, 2, 9] }),
            task(2, "DESENVOLVER VACINA", "534", "Estabilize conexões de antígenos.", Wires { wire_count: 7 }),
            task(3, "ANALISAR AMOSTRAS", "567", "Filtre interferências.", Radio),
            task(4, "CRIAR TECNOLOGIA", "589", "Destrave o núcleo de energia.", Lockpick { pins: 6 }),
        ],
        PlayerClass::Executor => vec![
            task(1, "ELIMINAR ZUMBIS", "601", "Libere a trava de segurança.", Lockpick { pins: 6 }),
            task(2, "PROTEGER BASES", "628", "Arme cercas eletrificadas.", Wires { wire_count: 7 }),
            task(3, "MISSÃO DE RISCO", "654", "Autentique bombardeio.", Typing { phrase: "CONFIRMAR_ALVO_BOMBARDEIO_ORBITAL_AREA_CONTAMINADA_7".into() }),
            task(4, "ESCOLTA ARMADA", "689", "Religue o sistema de rádio.", Wires { wire_count: 6 }),
        ],
        PlayerClass::Mapeador => vec![
            task(1, "EXPLORAR ÁREAS", "701", "Rastreie sinal de satélite.", Radio),
            task(2, "ATUALIZAR MAPAS", "724", "Grave coordenadas de perigo.", Memory { sequence: vec![7, 2, 4, 0, 5, 8, 1, 9, 3] }),
            task(3, "MARCAR RECURSOS", "758", "Destranque cofre militar.", Lockpick { pins: 5 }),
            task(4, "GUIAR GRUPOS", "789", "Transmita rota de fuga.", Typing { phrase: "RECONFIGURAR_SATELITE_GPS_ROTA_FUGA_SETOR_DELTA_X".into() }),
        ],
        PlayerClass::ZumbiPrimordial => vec![
            task(1, "PACIENTE ZERO", "", "Inicie a dispersão do patógeno.", InfectadoSecret),
            task(2, "SABOTAGEM BIO", "423", "Destrua circuitos de emergência.", Wires { wire_count: 7 }),
            task(3, "GRITO DA HORDA", "446", "Grito ensurdecedor.", Memory { sequence: vec![4, 4, 6, 4, 4, 6, 1, 1, 9] }),
            task(4, "INFECTAR TUDO", "478", "Abra jaulas biológicas.", Lockpick { pins: 6 }),
        ],
        PlayerClass::Infectado => vec![
            task(1, "NECROSE", "", "O vírus avança.", InfectadoSecret),
            task(2, "SABOTAGEM", "423", "Corte a fiação.", Wires { wire_count: 7 }),
            task(3, "RASTRO", "446", "Siga o som do coração.", Memory { sequence: vec![4, 4, 6, 1, 2, 9, 8, 7] }),
            task(4, "INVASÃO", "478", "Arrombe portas blindadas.", Lockpick { pins: 5 }),
        ],
        PlayerClass::Default => vec![
            task(1, "PROCURAR SUPRIMENTOS", "201", "Tente abrir o armário.", Lockpick { pins: 4 }),
            task(2, "REFORÇAR ABRIGO", "214", "Religue o gerador.", Wires { wire_count: 6 }),
            task(3, "EXPLORAR RECURSOS", "237", "Busque itens.", Memory { sequence: vec![2, 3, 7, 5, 8, 0, 1, 4] }),
            task(4, "AJUDAR OUTROS", "259", "Transmita o código de socorro.", Typing { phrase: "S.O.S_PRECISAMOS_DE_EXTRACAO_IMEDIATA_PONTO_7".into() }),
        ],
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TaskError {
    #[error("no active task")]
    NoActiveTask,

    #[error("wrong unlock code")]
    WrongCode,

    #[error("task is still locked")]
    Locked,

    #[error("completion receipt is awaiting confirmation")]
    ReceiptPending,

    #[error("no receipt to confirm")]
    NoReceipt,
}

/// What one second of wall clock did to the round timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTick {
    /// Timer not running (locked task, receipt up, overlay, finished).
    Idle,
    Counted,
    /// Countdown hit zero: timer restarted, widget progress wiped.
    TimedOut,
}

/// One player's run through their task list.
#[derive(Debug, Clone)]
pub struct TaskRun {
    tasks: Vec<Task>,
    current: usize,
    unlocked: bool,
    receipt_visible: bool,
    time_left: u32,
    round_seconds: u32,
    widget_epoch: u64,
}

impl TaskRun {
    pub fn new(class: PlayerClass, tuning: &GameTuning) -> Self {
        let mut run = Self {
            tasks: class_tasks(class),
            current: 0,
            unlocked: false,
            receipt_visible: false,
            time_left: tuning.round_seconds,
            round_seconds: tuning.round_seconds,
            widget_epoch: 0,
        };
        run.auto_unlock();
        run
    }

    /// Secret tasks carry no code and unlock themselves.
    fn auto_unlock(&mut self) {
        self.unlocked = matches!(
            self.current_task(),
            Some(Task {
                unlock_code: None,
                ..
            })
        );
    }

    pub fn current_task(&self) -> Option<&Task> {
        self.tasks.get(self.current)
    }

    pub fn completed_count(&self) -> u32 {
        self.current.min(self.tasks.len()) as u32
    }

    pub fn is_finished(&self) -> bool {
        !self.tasks.is_empty() && self.current >= self.tasks.len()
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    pub fn receipt_visible(&self) -> bool {
        self.receipt_visible
    }

    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    /// Bumped whenever the widget must rebuild its internal progress.
    pub fn widget_epoch(&self) -> u64 {
        self.widget_epoch
    }

    /// Supply the 3-digit gate code for the current task. Starts the round
    /// timer on success; re-entering the code of an unlocked task is a no-op.
    pub fn unlock(&mut self, code: &str) -> Result<(), TaskError> {
        if self.receipt_visible {
            return Err(TaskError::ReceiptPending);
        }
        let task = self.current_task().ok_or(TaskError::NoActiveTask)?;
        if self.unlocked {
            return Ok(());
        }
        match &task.unlock_code {
            Some(expected) if expected == code => {
                self.unlocked = true;
                Ok(())
            }
            Some(_) => Err(TaskError::WrongCode),
            None => {
                self.unlocked = true;
                Ok(())
            }
        }
    }

    /// The minigame widget reported completion: halt the timer and show
    /// the receipt. The task index does not move until the receipt is
    /// confirmed.
    pub fn complete(&mut self) -> Result<(), TaskError> {
        if self.receipt_visible {
            return Err(TaskError::ReceiptPending);
        }
        if self.current_task().is_none() {
            return Err(TaskError::NoActiveTask);
        }
        if !self.unlocked {
            return Err(TaskError::Locked);
        }
        self.receipt_visible = true;
        Ok(())
    }

    /// Dismiss the receipt and advance. Returns the new completed count.
    pub fn confirm_receipt(&mut self) -> Result<u32, TaskError> {
        if !self.receipt_visible {
            return Err(TaskError::NoReceipt);
        }
        self.receipt_visible = false;
        self.current += 1;
        self.unlocked = false;
        self.time_left = self.round_seconds;
        self.auto_unlock();
        Ok(self.completed_count())
    }

    /// Advance the round timer by one second.
    ///
    /// `paused` covers everything outside the sequencer's own knowledge:
    /// radar overlay up, player dead, session not in Playing.
    pub fn tick(&mut self, paused: bool) -> TimerTick {
        if paused || !self.unlocked || self.receipt_visible || self.current_task().is_none() {
            return TimerTick::Idle;
        }
        if self.time_left > 1 {
            self.time_left -= 1;
            return TimerTick::Counted;
        }
        // Timeout: full timer back, gate re-locked, widget progress wiped.
        self.time_left = self.round_seconds;
        self.unlocked = false;
        self.widget_epoch += 1;
        self.auto_unlock();
        TimerTick::TimedOut
    }

    /// Infection/elimination wipes the list entirely.
    pub fn clear(&mut self) {
        self.tasks.clear();
        self.current = 0;
        self.unlocked = false;
        self.receipt_visible = false;
        self.time_left = self.round_seconds;
    }

    /// A heal hands the player the default survivor list, from the top.
    pub fn regenerate(&mut self, class: PlayerClass) {
        self.tasks = class_tasks(class);
        self.current = 0;
        self.receipt_visible = false;
        self.time_left = self.round_seconds;
        self.auto_unlock();
    }
}
