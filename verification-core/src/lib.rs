//! Verification session lifecycle for SSI credential exchanges
//!
//! A host application (a game server) asks this crate to verify that a user
//! holds a valid credential. The crate initiates a credential exchange with a
//! remote verifier service, polls it on a fixed cadence from tokio worker
//! tasks, drives a per-user session through a small state machine, and hands
//! every user-observable outcome to the host through one ordered event
//! channel. The host never blocks on network I/O.

pub mod engine;
pub mod error;
pub mod events;
pub mod session;
pub mod store;
pub mod types;

mod machine;

pub use engine::VerificationEngine;
pub use error::VerificationError;
pub use events::HostEvent;
pub use session::{SessionState, VerificationSession};
pub use types::environment::EngineConfig;
