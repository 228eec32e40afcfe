//! The verification engine the host application talks to

mod poller;

use std::sync::{Arc, Mutex};

use flume::Receiver;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use verifier_client::{Invitation, VerifierApi};

use crate::error::VerificationError;
use crate::events::{EventSender, HostEvent};
use crate::machine::SessionDriver;
use crate::session::SessionState;
use crate::store::{SessionStore, VerifiedRecord};
use crate::types::environment::EngineConfig;

use self::poller::SessionPoller;

/// Facade over the verification lifecycle.
///
/// The engine owns the session store, the verified-user record, and the poll
/// scheduler. The host calls it from any thread; all network I/O happens on
/// tokio worker tasks and every user-observable outcome arrives through the
/// event receiver returned by [`VerificationEngine::new`].
pub struct VerificationEngine {
    store: Arc<SessionStore>,
    verified: Arc<VerifiedRecord>,
    backend: Arc<dyn VerifierApi>,
    driver: SessionDriver,
    events: EventSender,
    config: EngineConfig,
    shutdown_token: CancellationToken,
    poller_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl VerificationEngine {
    /// Creates an engine over a verifier backend.
    ///
    /// Returns the engine and the host event receiver; the receiver is meant
    /// to be drained on the host's designated main thread.
    #[must_use]
    pub fn new(
        backend: Arc<dyn VerifierApi>,
        config: EngineConfig,
    ) -> (Self, Receiver<HostEvent>) {
        let store = Arc::new(SessionStore::new(config.session_ttl));
        let verified = Arc::new(VerifiedRecord::new());
        let (events, receiver) = EventSender::channel(config.event_capacity);
        let driver = SessionDriver::new(
            Arc::clone(&store),
            Arc::clone(&verified),
            Arc::clone(&backend),
            events.clone(),
            config.clone(),
        );

        let engine = Self {
            store,
            verified,
            backend,
            driver,
            events,
            config,
            shutdown_token: CancellationToken::new(),
            poller_handles: Mutex::new(Vec::new()),
        };

        (engine, receiver)
    }

    /// Starts a verification for `user_id`.
    ///
    /// Reserves the user's session slot, asks the verifier for an
    /// invitation, and arms the recurring poll. On success the invitation is
    /// returned and also announced through a `SessionCreated` event.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyInProgress` when a live session exists for the user,
    /// or `InvitationFailed` when the verifier cannot create an invitation;
    /// in that case no session is left behind and the user may retry
    /// immediately.
    pub async fn start_verification(
        &self,
        user_id: &str,
    ) -> Result<Invitation, VerificationError> {
        self.store.create(user_id)?;
        info!("Starting verification for {user_id}");

        let invitation = match self.backend.create_invitation(user_id).await {
            Ok(invitation) => invitation,
            Err(e) => {
                // The session was never armed: drop the reservation and
                // surface the failure synchronously.
                self.store
                    .update(user_id, |session| session.transition(SessionState::Failed));
                self.store.remove(user_id);
                error!("Invitation creation for {user_id} failed: {e}");
                return Err(VerificationError::InvitationFailed(e));
            }
        };

        self.store.update(user_id, |session| {
            session.external_session_id = invitation.session_id.clone();
            session.connection_id = invitation.connection_id.clone();
            session.qr_payload = Some(invitation.qr_payload.clone());
            session.transition(SessionState::AwaitingConnection);
        });

        self.events.emit(HostEvent::SessionCreated {
            user_id: user_id.to_string(),
            qr_payload: invitation.qr_payload.clone(),
        });
        self.events.emit(HostEvent::StateChanged {
            user_id: user_id.to_string(),
            old: SessionState::Initiating,
            new: SessionState::AwaitingConnection,
        });

        self.spawn_poller(user_id);

        Ok(invitation)
    }

    /// Whether `user_id` has been verified.
    ///
    /// Consults the verified record only; an unknown user is simply not
    /// verified. Safe to call from the host's main thread.
    #[must_use]
    pub fn is_verified(&self, user_id: &str) -> bool {
        self.verified.contains(user_id)
    }

    /// State of the user's active session, if one exists.
    #[must_use]
    pub fn session_state(&self, user_id: &str) -> Option<SessionState> {
        self.store.get(user_id).map(|session| session.state)
    }

    /// Removes `user_id` from the verified record.
    ///
    /// Returns `false` if the user was not verified.
    pub fn clear_verified(&self, user_id: &str) -> bool {
        self.verified.clear(user_id)
    }

    /// Probes the verifier service once, logging the result.
    ///
    /// Intended for host startup, mirroring a health check against the
    /// configured backend.
    pub async fn check_verifier(&self) -> bool {
        match self.backend.ping().await {
            Ok(()) => {
                info!("Verifier service is reachable");
                true
            }
            Err(e) => {
                warn!("Verifier service is not reachable: {e}");
                false
            }
        }
    }

    /// Returns a clone of the shutdown token for external control.
    #[must_use]
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Cancels every poll series and waits for the workers to stop.
    pub async fn shutdown(&self) {
        self.shutdown_token.cancel();
        info!("Verification engine shutdown initiated");

        let handles: Vec<JoinHandle<()>> = {
            let mut guard = self
                .poller_handles
                .lock()
                .expect("poller handle list lock poisoned");
            guard.drain(..).collect()
        };

        for handle in handles {
            if let Err(e) = handle.await {
                error!("Poller task error: {e}");
            }
        }

        info!("All verification pollers stopped");
    }

    /// Arms the recurring poll series for a freshly created session.
    fn spawn_poller(&self, user_id: &str) {
        let poller = SessionPoller::new(
            user_id.to_string(),
            self.driver.clone(),
            self.config.initial_delay,
            self.config.poll_period,
            self.shutdown_token.clone(),
        );

        let handle = tokio::spawn(poller.run());

        let mut guard = self
            .poller_handles
            .lock()
            .expect("poller handle list lock poisoned");
        guard.retain(|h| !h.is_finished());
        guard.push(handle);
    }
}
