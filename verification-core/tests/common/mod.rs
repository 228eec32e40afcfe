// Not every helper is used in every test file.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use flume::Receiver;
use tracing_subscriber::EnvFilter;

use verification_core::{EngineConfig, HostEvent, SessionState, VerificationEngine};
use verifier_client::{
    ClientResult, ConnectionStatus, ExchangeRefs, Invitation, ProofStatus, VerifierApi,
};

/// Initializes test logging once; subsequent calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}

/// A verifier backend whose responses are scripted per method.
///
/// Empty scripts fall back to the happy defaults: invitations succeed with
/// `qr-<user>` identifiers, connection and proof stay pending.
#[derive(Default)]
pub struct MockVerifier {
    invitations: Mutex<VecDeque<ClientResult<Invitation>>>,
    connection: Mutex<VecDeque<ClientResult<ConnectionStatus>>>,
    proof: Mutex<VecDeque<ClientResult<ProofStatus>>>,
    invitation_delay: Mutex<Option<Duration>>,
    pub connection_polls: AtomicU32,
    pub proof_polls: AtomicU32,
    pub proof_requests: AtomicU32,
}

impl MockVerifier {
    pub fn script_invitation(&self, response: ClientResult<Invitation>) {
        self.invitations.lock().unwrap().push_back(response);
    }

    pub fn script_connection(
        &self,
        responses: impl IntoIterator<Item = ClientResult<ConnectionStatus>>,
    ) {
        self.connection.lock().unwrap().extend(responses);
    }

    pub fn script_proof(&self, responses: impl IntoIterator<Item = ClientResult<ProofStatus>>) {
        self.proof.lock().unwrap().extend(responses);
    }

    pub fn delay_invitations(&self, delay: Duration) {
        *self.invitation_delay.lock().unwrap() = Some(delay);
    }

    pub fn connection_poll_count(&self) -> u32 {
        self.connection_polls.load(Ordering::SeqCst)
    }

    pub fn proof_poll_count(&self) -> u32 {
        self.proof_polls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VerifierApi for MockVerifier {
    async fn create_invitation(&self, user_id: &str) -> ClientResult<Invitation> {
        let delay = *self.invitation_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self.invitations.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| {
            Ok(Invitation {
                qr_payload: format!("qr-{user_id}"),
                session_id: Some(format!("sess-{user_id}")),
                connection_id: Some(format!("conn-{user_id}")),
            })
        })
    }

    async fn connection_status(&self, _refs: &ExchangeRefs) -> ClientResult<ConnectionStatus> {
        self.connection_polls.fetch_add(1, Ordering::SeqCst);
        self.connection
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(ConnectionStatus::Pending))
    }

    async fn request_proof(&self, _refs: &ExchangeRefs) -> ClientResult<Option<String>> {
        self.proof_requests.fetch_add(1, Ordering::SeqCst);
        Ok(None)
    }

    async fn proof_status(&self, _refs: &ExchangeRefs) -> ClientResult<ProofStatus> {
        self.proof_polls.fetch_add(1, Ordering::SeqCst);
        self.proof
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(ProofStatus::Pending))
    }

    async fn ping(&self) -> ClientResult<()> {
        Ok(())
    }
}

/// A poll cadence fast enough for tests while keeping the default ceilings.
pub fn fast_config() -> EngineConfig {
    EngineConfig {
        poll_period: Duration::from_millis(10),
        initial_delay: Duration::from_millis(20),
        ..EngineConfig::default()
    }
}

/// Builds an engine over a mock backend with the fast test cadence.
pub fn engine_with(
    backend: Arc<MockVerifier>,
) -> (VerificationEngine, Receiver<HostEvent>, Arc<MockVerifier>) {
    let (engine, events) = VerificationEngine::new(
        Arc::clone(&backend) as Arc<dyn VerifierApi>,
        fast_config(),
    );
    (engine, events, backend)
}

/// Waits for the next host event, failing the test after five seconds.
pub async fn next_event(events: &Receiver<HostEvent>) -> HostEvent {
    tokio::time::timeout(Duration::from_secs(5), events.recv_async())
        .await
        .expect("timed out waiting for a host event")
        .expect("host event channel closed")
}

/// Drains events until a `Terminal` arrives; returns the terminal state and
/// everything received on the way, terminal included.
pub async fn collect_until_terminal(
    events: &Receiver<HostEvent>,
) -> (SessionState, Vec<HostEvent>) {
    let mut seen = Vec::new();
    loop {
        let event = next_event(events).await;
        seen.push(event.clone());
        if let HostEvent::Terminal { state, .. } = event {
            return (state, seen);
        }
    }
}
