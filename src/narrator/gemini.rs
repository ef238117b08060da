//! Gemini-backed narrator.

use super::{NarratorError, NarratorProvider};
use crate::types::{DebriefStats, GameOutcome};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
}

impl GeminiConfig {
    /// Read `GEMINI_API_KEY` (required), `GEMINI_MODEL` and
    /// `GEMINI_TIMEOUT_SECS` (optional) from the environment.
    pub fn from_env() -> Result<Self, NarratorError> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| NarratorError::ConfigError("GEMINI_API_KEY not set".to_string()))?;
        let model = std::env::var("GEMINI_MODEL")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let timeout = std::env::var("GEMINI_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        Ok(Self {
            api_key,
            model,
            timeout,
        })
    }
}

pub struct GeminiNarrator {
    config: GeminiConfig,
    client: reqwest::Client,
}

impl GeminiNarrator {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn prompt(outcome: &GameOutcome, stats: &DebriefStats) -> String {
        let result = if outcome.success {
            "os sobreviventes completaram todas as tarefas e foram extraídos"
        } else {
            "a horda dominou o setor e ninguém sobrou"
        };
        format!(
            "Você é o VELHO REED, um operador de rádio veterano e amargo em um \
             apocalipse zumbi. Fale em português, em no máximo duas frases curtas, \
             sem aspas. Resuma o fim da missão para o novato: {result}. \
             O novato completou {completed} de {total} tarefas e restavam \
             {time} segundos no relógio.",
            completed = stats.completed_tasks,
            total = stats.total_tasks,
            time = stats.time_remaining,
        )
    }
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Content,
}

#[async_trait]
impl NarratorProvider for GeminiNarrator {
    async fn debrief(
        &self,
        outcome: &GameOutcome,
        stats: &DebriefStats,
    ) -> Result<String, NarratorError> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.config.model, self.config.api_key
        );
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Self::prompt(outcome, stats),
                }],
            }],
        };

        debug!(model = %self.config.model, "requesting debrief narration");
        let response = tokio::time::timeout(
            self.config.timeout,
            self.client.post(&url).json(&body).send(),
        )
        .await
        .map_err(|_| NarratorError::Timeout)?
        .map_err(|e| NarratorError::ApiError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(NarratorError::ApiError(format!(
                "status {}",
                response.status()
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| NarratorError::ParseError(e.to_string()))?;
        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text.trim().to_string())
            .ok_or_else(|| NarratorError::ParseError("empty candidate list".to_string()))
    }
}
