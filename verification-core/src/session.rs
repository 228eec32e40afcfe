//! Per-user verification session state

use std::time::Duration;

use chrono::{DateTime, Utc};
use strum::Display;
use verifier_client::ExchangeRefs;

/// State of a verification session.
///
/// Transitions are monotonic along the exchange: a session only moves
/// forward, and only the polling step function moves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum SessionState {
    /// The invitation is being created with the verifier
    Initiating,
    /// Waiting for the user's wallet to connect
    AwaitingConnection,
    /// Waiting for the wallet to present the requested proof
    AwaitingProof,
    /// The proof was presented and validated
    Verified,
    /// The wallet declined or abandoned the exchange
    Rejected,
    /// The exchange failed before or while polling
    Failed,
    /// An attempt ceiling was reached while waiting
    Expired,
}

impl SessionState {
    /// Whether this state ends the session.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Verified | Self::Rejected | Self::Failed | Self::Expired
        )
    }

    /// Whether the transition graph has an edge from `self` to `next`.
    ///
    /// `Failed` is reachable from every non-terminal state: invitation
    /// failures end an `Initiating` session, and an unexpected fault in the
    /// poll loop ends a waiting one.
    #[must_use]
    pub const fn can_advance(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Initiating, Self::AwaitingConnection)
                | (Self::AwaitingConnection, Self::AwaitingProof | Self::Expired)
                | (Self::AwaitingProof, Self::Verified | Self::Rejected | Self::Expired)
                | (
                    Self::Initiating | Self::AwaitingConnection | Self::AwaitingProof,
                    Self::Failed
                )
        )
    }

    /// The user-facing message for a terminal state, `None` otherwise.
    #[must_use]
    pub const fn terminal_message(self) -> Option<&'static str> {
        match self {
            Self::Verified => Some("Identity verification completed successfully"),
            Self::Rejected => Some("Verification was rejected or abandoned"),
            Self::Failed => Some("Verification failed, try again later"),
            Self::Expired => Some("Verification timed out, start a new verification to retry"),
            Self::Initiating | Self::AwaitingConnection | Self::AwaitingProof => None,
        }
    }
}

/// One user's verification session. At most one non-terminal session exists
/// per user at any time; the session store enforces that.
#[derive(Debug, Clone)]
pub struct VerificationSession {
    /// Stable identifier of the requesting user
    pub user_id: String,
    /// Verifier-side session identifier, assigned with the invitation
    pub external_session_id: Option<String>,
    /// Connection identifier, assigned with the invitation when the backend
    /// tracks connections
    pub connection_id: Option<String>,
    /// Proof exchange identifier, assigned when the proof request is sent
    pub proof_exchange_id: Option<String>,
    /// Invitation payload the host renders as a QR code
    pub qr_payload: Option<String>,
    /// Current state
    pub state: SessionState,
    /// Creation time, used for the absolute wall-clock expiry backstop
    pub created_at: DateTime<Utc>,
    /// Poll iterations since entering the current waiting state
    pub attempts: u32,
}

impl VerificationSession {
    pub(crate) fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            external_session_id: None,
            connection_id: None,
            proof_exchange_id: None,
            qr_payload: None,
            state: SessionState::Initiating,
            created_at: Utc::now(),
            attempts: 0,
        }
    }

    /// Advances the session along the transition graph.
    ///
    /// Entering a waiting state starts a fresh attempt count.
    pub(crate) fn transition(&mut self, next: SessionState) {
        debug_assert!(
            self.state.can_advance(next),
            "invalid session transition {} -> {next}",
            self.state
        );

        if matches!(
            next,
            SessionState::AwaitingConnection | SessionState::AwaitingProof
        ) {
            self.attempts = 0;
        }
        self.state = next;
    }

    /// Whether wall-clock time since creation exceeds `ttl`.
    ///
    /// This is an independent backstop beyond the per-stage attempt
    /// ceilings, covering a poll series that never fired.
    #[must_use]
    pub fn is_expired(&self, ttl: Duration) -> bool {
        Utc::now()
            .signed_duration_since(self.created_at)
            .to_std()
            .is_ok_and(|elapsed| elapsed > ttl)
    }

    /// The identifiers accumulated so far, in the form the verifier backend
    /// consumes.
    #[must_use]
    pub fn refs(&self) -> ExchangeRefs {
        ExchangeRefs {
            user_id: self.user_id.clone(),
            session_id: self.external_session_id.clone(),
            connection_id: self.connection_id.clone(),
            proof_exchange_id: self.proof_exchange_id.clone(),
        }
    }
}
