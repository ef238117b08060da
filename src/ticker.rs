//! Wall-clock driver for a running session.

use crate::session::GameSession;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

/// Owns the one background task that drives `session.tick()`.
///
/// Starting an already-running ticker aborts the previous task first, so
/// a session is never ticked by two loops at once.
#[derive(Default)]
pub struct SessionTicker {
    task: Option<JoinHandle<()>>,
}

impl SessionTicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drive `session.tick()` once a second until [`stop`](Self::stop).
    ///
    /// All countdowns (round timer, radar, feedback) advance on this
    /// single clock, so a session with no ticker simply stands still.
    pub fn start(&mut self, session: Arc<Mutex<GameSession>>) {
        self.stop();
        self.task = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            // The first tick fires immediately; skip it so the second one
            // equals one elapsed second.
            interval.tick().await;
            loop {
                interval.tick().await;
                session.lock().await.tick();
            }
        }));
        debug!("session ticker started");
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("session ticker stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for SessionTicker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GameTuning, SessionIdentity};

    fn shared_session() -> Arc<Mutex<GameSession>> {
        Arc::new(Mutex::new(GameSession::new(
            SessionIdentity::generate(),
            GameTuning::default(),
        )))
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_advances_session_time() {
        let session = shared_session();
        session.lock().await.set_feedback("NA ESCUTA");

        let mut ticker = SessionTicker::new();
        ticker.start(session.clone());
        tokio::time::sleep(Duration::from_secs(5)).await;
        ticker.stop();

        assert!(!ticker.is_running());
        assert!(session.lock().await.feedback().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn restart_replaces_the_previous_loop() {
        let session = shared_session();
        // Default feedback lifetime is 4 s; a doubled-up ticker would burn
        // through it in 2 s of wall clock.
        session.lock().await.set_feedback("NA ESCUTA");

        let mut ticker = SessionTicker::new();
        ticker.start(session.clone());
        ticker.start(session.clone());
        assert!(ticker.is_running());

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert!(
            session.lock().await.feedback().is_some(),
            "two live loops would already have expired the feedback"
        );

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(session.lock().await.feedback().is_none());
        ticker.stop();
    }
}
