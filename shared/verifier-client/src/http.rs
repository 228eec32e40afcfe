//! Timeout-bounded HTTP transport shared by the verifier backends

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;

use crate::error::{ClientError, ClientResult};

/// Maximum number of idle connections to maintain per host
const MAX_IDLE_CONNECTIONS_PER_HOST: usize = 10;

/// Thin wrapper over a pooled [`reqwest::Client`] with finite connect and
/// read deadlines.
///
/// Both deadlines must be finite: an unreachable verifier has to fail fast so
/// the poll cadence is preserved. Retry policy lives in the state machine,
/// never here.
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a new client with the given connect and read deadlines.
    ///
    /// # Panics
    ///
    /// Panics if the underlying TLS backend cannot be initialized.
    #[must_use]
    pub fn new(connect_timeout: Duration, read_timeout: Duration) -> Self {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(read_timeout)
            .pool_max_idle_per_host(MAX_IDLE_CONNECTIONS_PER_HOST)
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }

    /// Issues a GET request and returns the raw response body.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Transport` on network failure and
    /// `ClientError::Remote` on a non-2xx status.
    pub async fn get(&self, url: &str) -> ClientResult<String> {
        Self::execute(self.client.get(url)).await
    }

    /// Issues a POST request with a JSON body and returns the raw response body.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Transport` on network failure and
    /// `ClientError::Remote` on a non-2xx status.
    pub async fn post_json<B>(&self, url: &str, body: &B) -> ClientResult<String>
    where
        B: Serialize + Sync,
    {
        Self::execute(self.client.post(url).json(body)).await
    }

    async fn execute(request: reqwest::RequestBuilder) -> ClientResult<String> {
        let response = request.send().await.map_err(ClientError::Transport)?;

        let status = response.status();
        let body = response.text().await.map_err(ClientError::Transport)?;

        if status.is_success() {
            Ok(body)
        } else {
            Err(ClientError::Remote { status, body })
        }
    }
}
