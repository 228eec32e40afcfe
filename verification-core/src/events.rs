//! Host event channel
//!
//! Everything the host may show to a user flows through one bounded channel,
//! in observation order. The single receiver is meant to be drained on the
//! host's designated main thread; poll workers only ever send. An event is
//! sent strictly after the HTTP poll that caused it completed.

use flume::{Receiver, Sender, TrySendError};
use tracing::warn;

use crate::session::SessionState;

/// An observable outcome of the verification lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// A session was created and its invitation is ready to show
    SessionCreated {
        /// The requesting user
        user_id: String,
        /// Payload to render as a QR code
        qr_payload: String,
    },
    /// A session moved along the transition graph
    StateChanged {
        /// The requesting user
        user_id: String,
        /// State before the transition
        old: SessionState,
        /// State after the transition
        new: SessionState,
    },
    /// The user was verified and recorded; emitted at most once per user
    /// until the record is cleared
    Verified {
        /// The verified user
        user_id: String,
    },
    /// The session ended; emitted exactly once per session
    Terminal {
        /// The requesting user
        user_id: String,
        /// The terminal state
        state: SessionState,
        /// Fixed human-readable message for that state
        message: &'static str,
    },
}

/// Sending half of the host event channel.
///
/// Sends never block the poll loop: when the host stops draining, events are
/// dropped with a warning instead of stalling a worker.
#[derive(Clone)]
pub(crate) struct EventSender {
    tx: Sender<HostEvent>,
}

impl EventSender {
    /// Creates the bounded event channel.
    pub(crate) fn channel(capacity: usize) -> (Self, Receiver<HostEvent>) {
        let (tx, rx) = flume::bounded(capacity);
        (Self { tx }, rx)
    }

    /// Sends an event, dropping it if the host is not keeping up.
    pub(crate) fn emit(&self, event: HostEvent) {
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!("Host event queue full, dropping event: {event:?}");
            }
            Err(TrySendError::Disconnected(event)) => {
                warn!("Host event queue disconnected, dropping event: {event:?}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_arrive_in_send_order() {
        let (sender, receiver) = EventSender::channel(8);

        sender.emit(HostEvent::SessionCreated {
            user_id: "alice".to_string(),
            qr_payload: "qr".to_string(),
        });
        sender.emit(HostEvent::Verified {
            user_id: "alice".to_string(),
        });

        assert!(matches!(
            receiver.recv().unwrap(),
            HostEvent::SessionCreated { .. }
        ));
        assert!(matches!(receiver.recv().unwrap(), HostEvent::Verified { .. }));
    }

    #[test]
    fn full_channel_drops_instead_of_blocking() {
        let (sender, receiver) = EventSender::channel(1);

        sender.emit(HostEvent::Verified {
            user_id: "alice".to_string(),
        });
        // Second emit must not block even though nothing is draining.
        sender.emit(HostEvent::Verified {
            user_id: "bob".to_string(),
        });

        assert_eq!(receiver.len(), 1);
    }
}
