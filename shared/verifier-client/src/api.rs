//! The backend seam the session state machine polls against

use async_trait::async_trait;

use crate::error::ClientResult;

/// A wallet invitation returned by a verifier backend.
#[derive(Debug, Clone)]
pub struct Invitation {
    /// Payload the host renders as a QR code (an invitation URL)
    pub qr_payload: String,
    /// Verifier-side session identifier, when the backend has one
    pub session_id: Option<String>,
    /// Connection identifier, when the backend tracks connections
    pub connection_id: Option<String>,
}

/// The identifiers a session has accumulated, passed back to the backend on
/// every poll. Each is assigned at a successive stage of the exchange.
#[derive(Debug, Clone, Default)]
pub struct ExchangeRefs {
    /// Stable identifier of the requesting user
    pub user_id: String,
    /// Verifier-side session identifier
    pub session_id: Option<String>,
    /// Connection identifier
    pub connection_id: Option<String>,
    /// Proof exchange identifier
    pub proof_exchange_id: Option<String>,
}

impl ExchangeRefs {
    /// Creates refs for a session that only has a user so far.
    #[must_use]
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Self::default()
        }
    }
}

/// Observed state of the wallet connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// The wallet has not connected yet
    Pending,
    /// The wallet connection is active
    Active,
}

/// Observed state of the proof exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofStatus {
    /// No presentation has arrived yet
    Pending,
    /// The wallet presented a valid proof
    Presented,
    /// The wallet declined or abandoned the exchange
    Declined,
}

/// Operations the session state machine needs from a verifier service.
///
/// The two known verifier surfaces (a generic integration server and an
/// ACA-Py-style admin API) both implement this trait; the state machine does
/// not know which one it is polling.
#[async_trait]
pub trait VerifierApi: Send + Sync {
    /// Creates a credential-exchange invitation for `user_id`.
    ///
    /// # Errors
    ///
    /// Any `ClientError` here is fatal to the verification attempt: the
    /// session is never armed.
    async fn create_invitation(&self, user_id: &str) -> ClientResult<Invitation>;

    /// Reports the state of the wallet connection for this exchange.
    ///
    /// # Errors
    ///
    /// Errors are transient: the caller counts the attempt and re-polls.
    async fn connection_status(&self, refs: &ExchangeRefs) -> ClientResult<ConnectionStatus>;

    /// Asks the verifier to request a proof over the active connection.
    ///
    /// Returns the proof exchange identifier when the backend reports one;
    /// `None` means the proof exchange must be tracked by connection instead.
    ///
    /// # Errors
    ///
    /// Errors are transient: the caller stays in the connection-wait state
    /// and retries on the next poll.
    async fn request_proof(&self, refs: &ExchangeRefs) -> ClientResult<Option<String>>;

    /// Reports the state of the proof exchange.
    ///
    /// # Errors
    ///
    /// Errors are transient: the caller counts the attempt and re-polls.
    async fn proof_status(&self, refs: &ExchangeRefs) -> ClientResult<ProofStatus>;

    /// Cheap reachability probe, used once at host startup.
    ///
    /// # Errors
    ///
    /// Returns the underlying `ClientError` so the caller can log why the
    /// verifier is unreachable.
    async fn ping(&self) -> ClientResult<()>;
}
