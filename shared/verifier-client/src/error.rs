//! Error types for verifier service communication

use reqwest::StatusCode;
use thiserror::Error;

/// Result type for verifier client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur while talking to a verifier service
#[derive(Error, Debug)]
pub enum ClientError {
    /// Network-level failure: DNS, connect, or read deadline exceeded
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The verifier answered with a non-2xx status
    #[error("Verifier returned {status}: {body}")]
    Remote {
        /// HTTP status code of the response
        status: StatusCode,
        /// Raw response body
        body: String,
    },

    /// The verifier answered 2xx but reported failure in the envelope
    #[error("Verifier refused the request: {message}")]
    Service {
        /// Human-readable refusal message from the service
        message: String,
    },

    /// The response body could not be decoded
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Errors that can occur while decoding a verifier response body
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The body was not valid JSON
    #[error("Malformed response body: {detail}")]
    Malformed {
        /// Parser diagnostic
        detail: String,
    },

    /// A field the caller depends on was absent
    #[error("Response is missing field `{0}`")]
    MissingField(&'static str),
}
