//! End-of-game debrief narration.
//!
//! The narrator is optional flavor: a provider turns the verdict and the
//! player's numbers into a short in-character monologue. Every path that
//! can fail falls back to a canned line, so the debrief screen never
//! depends on an external API being up.

mod gemini;

pub use gemini::{GeminiConfig, GeminiNarrator};

use crate::types::{DebriefStats, GameOutcome};
use async_trait::async_trait;
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum NarratorError {
    #[error("narrator API error: {0}")]
    ApiError(String),

    #[error("narrator request timed out")]
    Timeout,

    #[error("narrator configuration error: {0}")]
    ConfigError(String),

    #[error("failed to parse narrator response: {0}")]
    ParseError(String),
}

#[async_trait]
pub trait NarratorProvider: Send + Sync {
    /// One short in-character debrief line for the given verdict.
    async fn debrief(
        &self,
        outcome: &GameOutcome,
        stats: &DebriefStats,
    ) -> Result<String, NarratorError>;
}

/// The canned lines used when no provider is configured or it fails.
pub fn fallback_debrief(success: bool) -> &'static str {
    if success {
        "Você correu bem, novato. O bunker está trancado. Por enquanto estamos seguros."
    } else {
        "Silêncio no rádio... Outro que vira banquete de errante."
    }
}

/// Ask the provider for a debrief, degrading to the canned line on any
/// failure. Never errors.
pub async fn debrief_or_fallback(
    provider: Option<&dyn NarratorProvider>,
    outcome: &GameOutcome,
    stats: &DebriefStats,
) -> String {
    match provider {
        Some(provider) => match provider.debrief(outcome, stats).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => fallback_debrief(outcome.success).to_string(),
            Err(err) => {
                warn!(%err, "narrator failed, using fallback line");
                fallback_debrief(outcome.success).to_string()
            }
        },
        None => fallback_debrief(outcome.success).to_string(),
    }
}
