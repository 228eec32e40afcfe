//! Shared session and verified-user state
//!
//! Both containers are shared across all concurrent poll workers and the
//! host thread. Operations are single-key and hold their lock only for the
//! duration of the map access, never across network I/O.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;
use std::time::Duration;

use thiserror::Error;

use crate::session::VerificationSession;

/// Result type for session store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during session store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// A live session already exists for this user
    #[error("A verification is already in progress for this user")]
    AlreadyInProgress {
        /// QR payload of the live session, so the host can re-show it
        qr_payload: Option<String>,
    },
}

/// Process-wide mapping from user id to active verification session.
///
/// Single authority for session creation, lookup, expiry, and removal. All
/// state mutation after creation goes through the polling step function.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, VerificationSession>>,
    session_ttl: Duration,
}

impl SessionStore {
    /// Creates an empty store with the given absolute session lifetime.
    #[must_use]
    pub fn new(session_ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            session_ttl,
        }
    }

    /// Creates a session for `user_id`.
    ///
    /// A session that is past the absolute wall-clock lifetime is treated as
    /// dead and replaced; this covers a poll series that never fired.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::AlreadyInProgress` if a live session exists.
    pub(crate) fn create(&self, user_id: &str) -> StoreResult<VerificationSession> {
        let mut sessions = self.sessions.write().expect("session store lock poisoned");

        if let Some(existing) = sessions.get(user_id) {
            if !existing.state.is_terminal() && !existing.is_expired(self.session_ttl) {
                return Err(StoreError::AlreadyInProgress {
                    qr_payload: existing.qr_payload.clone(),
                });
            }
        }

        let session = VerificationSession::new(user_id);
        sessions.insert(user_id.to_string(), session.clone());
        Ok(session)
    }

    /// Returns a snapshot of the session for `user_id`, if any.
    #[must_use]
    pub fn get(&self, user_id: &str) -> Option<VerificationSession> {
        self.sessions
            .read()
            .expect("session store lock poisoned")
            .get(user_id)
            .cloned()
    }

    /// Removes and returns the session for `user_id`.
    pub(crate) fn remove(&self, user_id: &str) -> Option<VerificationSession> {
        self.sessions
            .write()
            .expect("session store lock poisoned")
            .remove(user_id)
    }

    /// Applies `f` to the session for `user_id` under the write lock.
    ///
    /// Returns `None` if no session exists. This is the single mutation path
    /// used by the state machine and the invitation hand-off.
    pub(crate) fn update<F, R>(&self, user_id: &str, f: F) -> Option<R>
    where
        F: FnOnce(&mut VerificationSession) -> R,
    {
        self.sessions
            .write()
            .expect("session store lock poisoned")
            .get_mut(user_id)
            .map(f)
    }

    /// Number of tracked sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .expect("session store lock poisoned")
            .len()
    }

    /// Whether the store tracks no sessions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-wide set of users confirmed verified.
///
/// Append-only during normal operation; the sole source of truth for status
/// queries and join-time checks. Independent of the active-session map.
#[derive(Default)]
pub struct VerifiedRecord {
    users: RwLock<HashSet<String>>,
}

impl VerifiedRecord {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `user_id` as verified. Returns `false` if already recorded.
    pub(crate) fn insert(&self, user_id: &str) -> bool {
        self.users
            .write()
            .expect("verified record lock poisoned")
            .insert(user_id.to_string())
    }

    /// Whether `user_id` has been verified.
    #[must_use]
    pub fn contains(&self, user_id: &str) -> bool {
        self.users
            .read()
            .expect("verified record lock poisoned")
            .contains(user_id)
    }

    /// Removes `user_id` from the record. Returns `false` if absent.
    pub(crate) fn clear(&self, user_id: &str) -> bool {
        self.users
            .write()
            .expect("verified record lock poisoned")
            .remove(user_id)
    }

    /// Number of verified users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.read().expect("verified record lock poisoned").len()
    }

    /// Whether no user has been verified.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::session::SessionState;

    const TTL: Duration = Duration::from_secs(600);

    #[test]
    fn second_create_for_the_same_user_fails() {
        let store = SessionStore::new(TTL);
        store.create("alice").unwrap();
        store.update("alice", |s| s.qr_payload = Some("qr-1".to_string()));

        let err = store.create("alice").unwrap_err();

        match err {
            StoreError::AlreadyInProgress { qr_payload } => {
                assert_eq!(qr_payload.as_deref(), Some("qr-1"));
            }
        }
    }

    #[test]
    fn stale_session_is_replaced_on_create() {
        let store = SessionStore::new(TTL);
        store.create("alice").unwrap();
        store.update("alice", |s| {
            s.created_at = Utc::now() - chrono::Duration::seconds(700);
        });

        let replacement = store.create("alice").unwrap();

        assert_eq!(replacement.state, SessionState::Initiating);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn create_succeeds_after_removal() {
        let store = SessionStore::new(TTL);
        store.create("alice").unwrap();
        store.remove("alice");

        assert!(store.create("alice").is_ok());
    }

    #[test]
    fn distinct_users_do_not_interfere() {
        let store = SessionStore::new(TTL);
        store.create("alice").unwrap();

        assert!(store.create("bob").is_ok());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn verified_insert_is_idempotent() {
        let record = VerifiedRecord::new();

        assert!(record.insert("alice"));
        assert!(!record.insert("alice"));
        assert_eq!(record.len(), 1);
        assert!(record.contains("alice"));
    }

    #[test]
    fn clear_removes_a_verified_user() {
        let record = VerifiedRecord::new();
        record.insert("alice");

        assert!(record.clear("alice"));
        assert!(!record.contains("alice"));
        assert!(!record.clear("alice"));
    }
}
