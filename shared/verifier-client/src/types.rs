//! Typed verifier response shapes and tolerant decoding
//!
//! Every field the remote may omit is an `Option`: a missing field is a
//! per-poll condition the state machine absorbs, not a fatal decode failure.
//! Callers promote absent fields they depend on with [`require`].

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::DecodeError;

/// Response of the integration server's invitation-creation endpoint
/// (`POST /verify-player`).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPlayerResponse {
    /// Whether the server accepted the verification request
    #[serde(default)]
    pub success: bool,
    /// URL encoding the wallet invitation, rendered as a QR by the host
    pub qr_url: Option<String>,
    /// Server-side session identifier
    pub session_id: Option<String>,
    /// Refusal message when `success` is false
    pub message: Option<String>,
}

/// Response of the integration server's status endpoint
/// (`GET /status/{user}`).
#[derive(Debug, Deserialize)]
pub struct StatusResponse {
    /// Whether the user's proof has been validated
    #[serde(default)]
    pub verified: bool,
}

/// Response of the ACA-Py-style invitation endpoint
/// (`POST /create-invitation`).
#[derive(Debug, Deserialize)]
pub struct CreateInvitationResponse {
    /// URL encoding the wallet invitation
    pub invitation_url: Option<String>,
    /// Identifier of the connection the invitation establishes
    pub connection_id: Option<String>,
}

/// A connection record (`GET /connections?connectionId={id}`).
#[derive(Debug, Deserialize)]
pub struct ConnectionRecord {
    /// Remote connection state, `"active"` once the wallet connected
    pub state: Option<String>,
}

/// A proof exchange record (`GET /present-proof-2.0/records/{id}` or an
/// element of the record listing).
#[derive(Debug, Deserialize)]
pub struct ProofRecord {
    /// Remote proof exchange state
    pub state: Option<String>,
    /// Connection the exchange belongs to
    pub connection_id: Option<String>,
    /// Proof exchange identifier
    pub pres_ex_id: Option<String>,
}

/// Listing of proof exchange records (`GET /present-proof-2.0/records`).
#[derive(Debug, Deserialize)]
pub struct ProofRecordList {
    /// All tracked proof exchanges
    #[serde(default)]
    pub results: Vec<ProofRecord>,
}

/// Response of the proof-request endpoint (`POST /send-proof-request`).
#[derive(Debug, Deserialize)]
pub struct SendProofResponse {
    /// Identifier of the created proof exchange, when the service reports one
    pub pres_ex_id: Option<String>,
}

/// Decodes a response body, mapping parse failures to
/// [`DecodeError::Malformed`].
///
/// # Errors
///
/// Returns `DecodeError::Malformed` if the body is not valid JSON for `T`.
pub fn decode<T: DeserializeOwned>(body: &str) -> Result<T, DecodeError> {
    serde_json::from_str(body).map_err(|e| DecodeError::Malformed {
        detail: e.to_string(),
    })
}

/// Promotes an optional field to required.
///
/// # Errors
///
/// Returns `DecodeError::MissingField` if the field is absent.
pub fn require<T>(field: Option<T>, name: &'static str) -> Result<T, DecodeError> {
    field.ok_or(DecodeError::MissingField(name))
}
