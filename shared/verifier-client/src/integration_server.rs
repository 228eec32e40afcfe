//! Verifier backend A: a generic SSI integration server
//!
//! This server owns the whole credential exchange behind two endpoints: one
//! creates an invitation for a user, the other reports whether the user's
//! proof has been validated. There is no observable connection stage, so
//! [`VerifierApi::connection_status`] reports the connection active as soon
//! as the invitation exists and the proof wait spans the whole exchange.

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::api::{ConnectionStatus, ExchangeRefs, Invitation, ProofStatus, VerifierApi};
use crate::error::{ClientError, ClientResult};
use crate::http::HttpClient;
use crate::types::{decode, require, StatusResponse, VerifyPlayerResponse};

/// Default connect deadline for integration server requests
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;
/// Default read deadline for integration server requests
const DEFAULT_READ_TIMEOUT_SECS: u64 = 10;
/// Default base URL when none is configured
const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Configuration for [`IntegrationServerClient`]
#[derive(Debug, Clone)]
pub struct IntegrationServerConfig {
    /// Base URL of the integration server
    pub base_url: String,
    /// Connect deadline
    pub connect_timeout: Duration,
    /// Read deadline
    pub read_timeout: Duration,
}

impl IntegrationServerConfig {
    /// Creates a configuration with default deadlines.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            read_timeout: Duration::from_secs(DEFAULT_READ_TIMEOUT_SECS),
        }
    }

    /// Creates a configuration from the `SSI_VERIFIER_BASE_URL` environment
    /// variable, falling back to `http://localhost:8080`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(env::var("SSI_VERIFIER_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()))
    }
}

/// Client for the integration-server verifier surface
pub struct IntegrationServerClient {
    config: IntegrationServerConfig,
    http: HttpClient,
}

impl IntegrationServerClient {
    /// Creates a new client.
    #[must_use]
    pub fn new(config: IntegrationServerConfig) -> Self {
        let http = HttpClient::new(config.connect_timeout, config.read_timeout);
        Self { config, http }
    }
}

#[async_trait]
impl VerifierApi for IntegrationServerClient {
    async fn create_invitation(&self, user_id: &str) -> ClientResult<Invitation> {
        let url = format!("{}/verify-player", self.config.base_url);
        let body = serde_json::json!({ "playerName": user_id });

        let text = self.http.post_json(&url, &body).await?;
        let response: VerifyPlayerResponse = decode(&text)?;

        if !response.success {
            return Err(ClientError::Service {
                message: response
                    .message
                    .unwrap_or_else(|| "verification request refused".to_string()),
            });
        }

        let qr_payload = require(response.qr_url, "qrUrl")?;
        let session_id = require(response.session_id, "sessionId")?;
        debug!("Created verification session {session_id} for {user_id}");

        Ok(Invitation {
            qr_payload,
            session_id: Some(session_id),
            connection_id: None,
        })
    }

    async fn connection_status(&self, _refs: &ExchangeRefs) -> ClientResult<ConnectionStatus> {
        // The server exposes no connection stage; the proof wait covers it.
        Ok(ConnectionStatus::Active)
    }

    async fn request_proof(&self, _refs: &ExchangeRefs) -> ClientResult<Option<String>> {
        // Proof requests are driven by the server itself.
        Ok(None)
    }

    async fn proof_status(&self, refs: &ExchangeRefs) -> ClientResult<ProofStatus> {
        let url = format!("{}/status/{}", self.config.base_url, refs.user_id);

        let text = self.http.get(&url).await?;
        let response: StatusResponse = decode(&text)?;

        // This surface never reports a rejection; the attempt ceiling
        // handles abandoned exchanges.
        if response.verified {
            Ok(ProofStatus::Presented)
        } else {
            Ok(ProofStatus::Pending)
        }
    }

    async fn ping(&self) -> ClientResult<()> {
        let url = format!("{}/status/ping", self.config.base_url);
        self.http.get(&url).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_match_the_server_deadlines() {
        let config = IntegrationServerConfig::new("http://verifier:8080");

        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.read_timeout, Duration::from_secs(10));
    }
}
