//! HTTP clients for credential verifier services
//!
//! This crate provides the transport layer of the verification pipeline: a
//! timeout-bounded HTTP client, tolerant decoding of verifier responses, and
//! the [`api::VerifierApi`] seam the session state machine polls against.
//! Two backends implement the seam: a generic integration server and an
//! ACA-Py-style verifier.

pub mod acapy;
pub mod api;
pub mod error;
pub mod http;
pub mod integration_server;
pub mod types;

pub use api::{ConnectionStatus, ExchangeRefs, Invitation, ProofStatus, VerifierApi};
pub use error::{ClientError, ClientResult, DecodeError};
