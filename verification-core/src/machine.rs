//! The session state machine
//!
//! [`SessionDriver::step`] is the only code path that mutates session state.
//! Each invocation is one poll tick: it counts the attempt, enforces the
//! stage ceiling, polls the verifier backend, and either advances the
//! session or absorbs the error and waits for the next tick.

use std::sync::Arc;

use tracing::{debug, error, info, warn};
use verifier_client::{ConnectionStatus, ProofStatus, VerifierApi};

use crate::events::{EventSender, HostEvent};
use crate::session::{SessionState, VerificationSession};
use crate::store::{SessionStore, VerifiedRecord};
use crate::types::environment::EngineConfig;

/// What the poll scheduler should do after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StepOutcome {
    /// Keep the series running
    Continue,
    /// The session reached a terminal state (or vanished); stop the series
    Stop,
}

/// Drives sessions through the transition graph, one tick at a time.
#[derive(Clone)]
pub(crate) struct SessionDriver {
    store: Arc<SessionStore>,
    verified: Arc<VerifiedRecord>,
    backend: Arc<dyn VerifierApi>,
    events: EventSender,
    config: EngineConfig,
}

impl SessionDriver {
    pub(crate) fn new(
        store: Arc<SessionStore>,
        verified: Arc<VerifiedRecord>,
        backend: Arc<dyn VerifierApi>,
        events: EventSender,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            verified,
            backend,
            events,
            config,
        }
    }

    /// Executes one poll tick for `user_id`.
    pub(crate) async fn step(&self, user_id: &str) -> StepOutcome {
        let Some(session) = self.store.get(user_id) else {
            warn!("Poll tick for unknown session {user_id}, stopping series");
            return StepOutcome::Stop;
        };

        match session.state {
            SessionState::AwaitingConnection => self.poll_connection(&session).await,
            SessionState::AwaitingProof => self.poll_proof(&session).await,
            state => {
                warn!("Poll tick for session {user_id} in state `{state}`, stopping series");
                StepOutcome::Stop
            }
        }
    }

    /// Moves a session that hit an unexpected fault to `Failed`.
    pub(crate) fn fail(&self, user_id: &str) {
        let Some(session) = self.store.get(user_id) else {
            return;
        };
        error!("Unexpected fault while polling session {user_id}, failing it");
        self.complete(user_id, session.state, SessionState::Failed);
    }

    /// One tick while waiting for the wallet connection.
    async fn poll_connection(&self, session: &VerificationSession) -> StepOutcome {
        let user_id = &session.user_id;

        let Some(attempts) = self.bump_attempts(user_id) else {
            return StepOutcome::Stop;
        };
        if attempts > self.config.connection_timeout_ticks {
            info!("Connection wait for {user_id} exceeded {} polls", attempts - 1);
            return self.complete(user_id, SessionState::AwaitingConnection, SessionState::Expired);
        }

        let refs = session.refs();
        match self.backend.connection_status(&refs).await {
            Ok(ConnectionStatus::Active) => match self.backend.request_proof(&refs).await {
                Ok(proof_exchange_id) => {
                    debug!("Connection active for {user_id}, proof request sent");
                    let updated = self.store.update(user_id, |s| {
                        s.proof_exchange_id = proof_exchange_id;
                        s.transition(SessionState::AwaitingProof);
                    });
                    if updated.is_some() {
                        self.events.emit(HostEvent::StateChanged {
                            user_id: user_id.clone(),
                            old: SessionState::AwaitingConnection,
                            new: SessionState::AwaitingProof,
                        });
                    }
                    StepOutcome::Continue
                }
                Err(e) => {
                    // The connection stays active; retry on the next tick.
                    warn!("Proof request for {user_id} failed, will retry: {e}");
                    StepOutcome::Continue
                }
            },
            Ok(ConnectionStatus::Pending) => StepOutcome::Continue,
            Err(e) => {
                warn!("Connection status check #{attempts} for {user_id} failed: {e}");
                StepOutcome::Continue
            }
        }
    }

    /// One tick while waiting for the proof presentation.
    async fn poll_proof(&self, session: &VerificationSession) -> StepOutcome {
        let user_id = &session.user_id;

        let Some(attempts) = self.bump_attempts(user_id) else {
            return StepOutcome::Stop;
        };
        if attempts > self.config.proof_timeout_ticks {
            info!("Proof wait for {user_id} exceeded {} polls", attempts - 1);
            return self.complete(user_id, SessionState::AwaitingProof, SessionState::Expired);
        }

        match self.backend.proof_status(&session.refs()).await {
            Ok(ProofStatus::Presented) => {
                self.complete(user_id, SessionState::AwaitingProof, SessionState::Verified)
            }
            Ok(ProofStatus::Declined) => {
                self.complete(user_id, SessionState::AwaitingProof, SessionState::Rejected)
            }
            Ok(ProofStatus::Pending) => StepOutcome::Continue,
            Err(e) => {
                warn!("Proof status check #{attempts} for {user_id} failed: {e}");
                StepOutcome::Continue
            }
        }
    }

    /// Counts one poll attempt against the current waiting state.
    fn bump_attempts(&self, user_id: &str) -> Option<u32> {
        self.store.update(user_id, |session| {
            session.attempts += 1;
            session.attempts
        })
    }

    /// Ends a session: records the terminal transition, removes it from the
    /// active store, and notifies the host.
    ///
    /// The verified record insert is idempotent, so a terminal observation
    /// delivered twice still records and announces the user exactly once.
    fn complete(&self, user_id: &str, from: SessionState, to: SessionState) -> StepOutcome {
        self.store.update(user_id, |session| session.transition(to));
        self.store.remove(user_id);

        self.events.emit(HostEvent::StateChanged {
            user_id: user_id.to_string(),
            old: from,
            new: to,
        });

        if to == SessionState::Verified && self.verified.insert(user_id) {
            self.events.emit(HostEvent::Verified {
                user_id: user_id.to_string(),
            });
        }

        if let Some(message) = to.terminal_message() {
            self.events.emit(HostEvent::Terminal {
                user_id: user_id.to_string(),
                state: to,
                message,
            });
        }

        info!("Verification session for {user_id} ended in state `{to}`");
        StepOutcome::Stop
    }
}
