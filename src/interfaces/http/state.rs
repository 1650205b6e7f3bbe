use crate::application::{ClassifyUseCase, SubmitOutcome, WizardController};
use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::LLMConfig;
use crate::domain::wizard::WizardView;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::{info, warn};
use uuid::Uuid;

struct Session {
    wizard: WizardController,
    last_touched: Instant,
}

/// One wizard per browser session, kept in memory only.
pub struct AppState {
    pub classify_use_case: ClassifyUseCase,
    pub llm_config: LLMConfig,
    session_ttl: Duration,
    sessions: Mutex<HashMap<Uuid, Session>>,
}

impl AppState {
    pub fn new(
        classify_use_case: ClassifyUseCase,
        llm_config: LLMConfig,
        session_ttl: Duration,
    ) -> Self {
        Self {
            classify_use_case,
            llm_config,
            session_ttl,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Also drops sessions idle for longer than the TTL.
    pub fn create_session(&self) -> Result<(Uuid, WizardView)> {
        let id = Uuid::new_v4();
        let wizard = WizardController::new();
        let view = wizard.view();

        let mut sessions = self.lock_sessions()?;
        let before = sessions.len();
        let ttl = self.session_ttl;
        sessions.retain(|_, session| {
            session.wizard.is_pending() || session.last_touched.elapsed() < ttl
        });
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!(evicted, "Evicted idle wizard sessions");
        }

        sessions.insert(
            id,
            Session {
                wizard,
                last_touched: Instant::now(),
            },
        );
        Ok((id, view))
    }

    pub fn remove_session(&self, id: Uuid) -> Result<()> {
        self.lock_sessions()?
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| session_not_found(id))
    }

    pub fn with_session<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut WizardController) -> Result<T>,
    ) -> Result<T> {
        let mut sessions = self.lock_sessions()?;
        let session = sessions.get_mut(&id).ok_or_else(|| session_not_found(id))?;
        session.last_touched = Instant::now();
        f(&mut session.wizard)
    }

    /// The session lock is released while the completion service is awaited;
    /// the `Submitting` state keeps a second submit from starting meanwhile.
    /// If this future is dropped mid-flight the session returns to editing.
    pub async fn submit(&self, id: Uuid) -> Result<WizardView> {
        let outcome = self.with_session(id, |wizard| wizard.begin_submit())?;

        if let SubmitOutcome::Pending(request) = outcome {
            let mut in_flight = InFlight {
                state: self,
                id,
                done: false,
            };
            let result = self
                .classify_use_case
                .execute(&self.llm_config, &request.description)
                .await;
            in_flight.done = true;
            self.with_session(id, |wizard| wizard.complete_submit(result))?;
        }

        self.with_session(id, |wizard| Ok(wizard.view()))
    }

    #[cfg(test)]
    fn session_count(&self) -> usize {
        self.lock_sessions().map(|sessions| sessions.len()).unwrap_or(0)
    }

    fn lock_sessions(&self) -> Result<MutexGuard<'_, HashMap<Uuid, Session>>> {
        self.sessions
            .lock()
            .map_err(|_| AppError::Internal("Session store lock poisoned".to_string()))
    }
}

/// Completes an abandoned submission as failed so the wizard stays editable.
struct InFlight<'a> {
    state: &'a AppState,
    id: Uuid,
    done: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.done {
            return;
        }

        warn!(session_id = %self.id, "Submission dropped before completion");
        let _ = self.state.with_session(self.id, |wizard| {
            wizard.complete_submit(Err(AppError::Internal(
                "submission cancelled".to_string(),
            )))
        });
    }
}

fn session_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Wizard session {}", id))
}
