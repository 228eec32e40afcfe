//! Verifier backend B: an ACA-Py-style verifier
//!
//! Invitations and proof requests go through the verifier's own API; proof
//! exchange records are read from the agent admin API. When
//! `send-proof-request` does not return an exchange id, proof state is
//! tracked by scanning the record listing for this session's connection.

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::api::{ConnectionStatus, ExchangeRefs, Invitation, ProofStatus, VerifierApi};
use crate::error::ClientResult;
use crate::http::HttpClient;
use crate::types::{
    decode, require, ConnectionRecord, CreateInvitationResponse, ProofRecord, ProofRecordList,
    SendProofResponse,
};

/// Default connect deadline for ACA-Py requests
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
/// Default read deadline for ACA-Py requests
const DEFAULT_READ_TIMEOUT_SECS: u64 = 30;
/// Default verifier API base URL
const DEFAULT_VERIFIER_URL: &str = "http://localhost:4002/v2";
/// Default agent admin API base URL
const DEFAULT_ADMIN_URL: &str = "http://localhost:8021";

/// Configuration for [`AcaPyClient`]
#[derive(Debug, Clone)]
pub struct AcaPyConfig {
    /// Base URL of the verifier API (invitations, proof requests)
    pub verifier_url: String,
    /// Base URL of the agent admin API (proof exchange records)
    pub admin_url: String,
    /// Prefix of the invitation label, suffixed with the user id
    pub invitation_label_prefix: String,
    /// Prefix of the connection alias, suffixed with the user id
    pub invitation_alias_prefix: String,
    /// Label attached to proof requests
    pub proof_request_label: String,
    /// Proof request version string
    pub proof_request_version: String,
    /// Connect deadline
    pub connect_timeout: Duration,
    /// Read deadline
    pub read_timeout: Duration,
}

impl AcaPyConfig {
    /// Creates a configuration with default labels and deadlines.
    #[must_use]
    pub fn new(verifier_url: impl Into<String>, admin_url: impl Into<String>) -> Self {
        Self {
            verifier_url: verifier_url.into(),
            admin_url: admin_url.into(),
            invitation_label_prefix: "game-server".to_string(),
            invitation_alias_prefix: "player".to_string(),
            proof_request_label: "Game Server Verification".to_string(),
            proof_request_version: "1.0".to_string(),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            read_timeout: Duration::from_secs(DEFAULT_READ_TIMEOUT_SECS),
        }
    }

    /// Creates a configuration from `SSI_ACAPY_VERIFIER_URL` and
    /// `SSI_ACAPY_ADMIN_URL`, with local-agent fallbacks.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(
            env::var("SSI_ACAPY_VERIFIER_URL").unwrap_or_else(|_| DEFAULT_VERIFIER_URL.to_string()),
            env::var("SSI_ACAPY_ADMIN_URL").unwrap_or_else(|_| DEFAULT_ADMIN_URL.to_string()),
        )
    }
}

/// Client for the ACA-Py-style verifier surface
pub struct AcaPyClient {
    config: AcaPyConfig,
    http: HttpClient,
}

impl AcaPyClient {
    /// Creates a new client.
    #[must_use]
    pub fn new(config: AcaPyConfig) -> Self {
        let http = HttpClient::new(config.connect_timeout, config.read_timeout);
        Self { config, http }
    }
}

/// Maps a remote proof exchange state string onto [`ProofStatus`].
fn map_proof_state(state: &str) -> ProofStatus {
    match state {
        "presentation-received" | "done" => ProofStatus::Presented,
        "abandoned" | "request-rejected" => ProofStatus::Declined,
        _ => ProofStatus::Pending,
    }
}

#[async_trait]
impl VerifierApi for AcaPyClient {
    async fn create_invitation(&self, user_id: &str) -> ClientResult<Invitation> {
        let url = format!("{}/create-invitation", self.config.verifier_url);
        let body = serde_json::json!({
            "label": format!("{}-{}", self.config.invitation_label_prefix, user_id),
            "alias": format!("{}-{}", self.config.invitation_alias_prefix, user_id),
        });

        let text = self.http.post_json(&url, &body).await?;
        let response: CreateInvitationResponse = decode(&text)?;

        let qr_payload = require(response.invitation_url, "invitation_url")?;
        let connection_id = require(response.connection_id, "connection_id")?;
        debug!("Created invitation for {user_id} on connection {connection_id}");

        Ok(Invitation {
            qr_payload,
            session_id: None,
            connection_id: Some(connection_id),
        })
    }

    async fn connection_status(&self, refs: &ExchangeRefs) -> ClientResult<ConnectionStatus> {
        let connection_id = require(refs.connection_id.as_deref(), "connection_id")?;
        let url = format!(
            "{}/connections?connectionId={}",
            self.config.verifier_url, connection_id
        );

        let text = self.http.get(&url).await?;
        let record: ConnectionRecord = decode(&text)?;
        let state = require(record.state, "state")?;

        if state == "active" {
            Ok(ConnectionStatus::Active)
        } else {
            Ok(ConnectionStatus::Pending)
        }
    }

    async fn request_proof(&self, refs: &ExchangeRefs) -> ClientResult<Option<String>> {
        let connection_id = require(refs.connection_id.as_deref(), "connection_id")?;
        let url = format!("{}/send-proof-request", self.config.verifier_url);
        let body = serde_json::json!({
            "proofRequestlabel": self.config.proof_request_label,
            "connectionId": connection_id,
            "version": self.config.proof_request_version,
        });

        let text = self.http.post_json(&url, &body).await?;
        let response: SendProofResponse = decode(&text)?;
        debug!(
            "Proof request sent on connection {connection_id}, exchange id: {:?}",
            response.pres_ex_id
        );

        Ok(response.pres_ex_id)
    }

    async fn proof_status(&self, refs: &ExchangeRefs) -> ClientResult<ProofStatus> {
        if let Some(proof_exchange_id) = refs.proof_exchange_id.as_deref() {
            let url = format!(
                "{}/present-proof-2.0/records/{}",
                self.config.admin_url, proof_exchange_id
            );

            let text = self.http.get(&url).await?;
            let record: ProofRecord = decode(&text)?;
            let state = require(record.state, "state")?;

            return Ok(map_proof_state(&state));
        }

        // Fallback: no exchange id was reported, scan the record listing for
        // this session's connection.
        let connection_id = require(refs.connection_id.as_deref(), "connection_id")?;
        let url = format!("{}/present-proof-2.0/records", self.config.admin_url);

        let text = self.http.get(&url).await?;
        let listing: ProofRecordList = decode(&text)?;

        for record in listing.results {
            if record.connection_id.as_deref() != Some(connection_id) {
                continue;
            }
            if let Some(state) = record.state.as_deref() {
                let status = map_proof_state(state);
                if status != ProofStatus::Pending {
                    return Ok(status);
                }
            }
        }

        Ok(ProofStatus::Pending)
    }

    async fn ping(&self) -> ClientResult<()> {
        let url = format!("{}/status", self.config.admin_url);
        self.http.get(&url).await.map(|_| ())
    }
}
