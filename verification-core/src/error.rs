//! Error types for the verification engine

use thiserror::Error;
use verifier_client::ClientError;

use crate::store::StoreError;

/// Errors a verification request can surface to the host.
///
/// Everything that happens after a session is armed is absorbed by the
/// polling loop and reported through the event channel; only these
/// creation-time failures propagate synchronously.
#[derive(Error, Debug)]
pub enum VerificationError {
    /// A live session already exists for this user
    #[error("A verification is already in progress for this user")]
    AlreadyInProgress {
        /// QR payload of the live session, so the host can re-show it
        qr_payload: Option<String>,
    },

    /// The verifier refused or failed the invitation request
    #[error("Could not create a verification invitation: {0}")]
    InvitationFailed(#[from] ClientError),
}

impl From<StoreError> for VerificationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AlreadyInProgress { qr_payload } => Self::AlreadyInProgress { qr_payload },
        }
    }
}
