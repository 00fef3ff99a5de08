//! Session state
//!
//! The in-memory state that decides between Identify and Resume: the
//! server-assigned session id and the last-seen dispatch sequence number.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

/// Per-socket session state, shared across connection restarts.
#[derive(Default)]
pub(crate) struct SessionState {
    /// Set on READY, cleared on InvalidSession. Present means the next
    /// handshake is a Resume.
    session_id: Mutex<Option<String>>,

    /// Largest `s` observed on any dispatch; echoed in heartbeats and
    /// Resume packets.
    last_seq: AtomicU64,

    /// Heartbeat interval (ms) learned from the most recent READY, kept
    /// for resumed links whose RESUMED payload omits it.
    heartbeat_interval: AtomicU64,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current session id, if a session is established.
    pub fn session_id(&self) -> Option<String> {
        self.session_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Record the session id from a READY payload.
    pub fn set_session_id(&self, id: &str) {
        *self
            .session_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(id.to_string());
    }

    /// Forget the session so the next handshake is a fresh Identify.
    pub fn clear(&self) {
        *self
            .session_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// The last-seen sequence number.
    pub fn sequence(&self) -> u64 {
        self.last_seq.load(Ordering::SeqCst)
    }

    /// Record a dispatch sequence number.
    ///
    /// Concurrent dispatches may race; the stored value converges to the
    /// largest sequence seen.
    pub fn observe_sequence(&self, seq: u64) {
        self.last_seq.fetch_max(seq, Ordering::SeqCst);
    }

    /// The last heartbeat interval learned from READY, in milliseconds.
    pub fn heartbeat_interval(&self) -> u64 {
        self.heartbeat_interval.load(Ordering::SeqCst)
    }

    /// Record the heartbeat interval, in milliseconds.
    pub fn set_heartbeat_interval(&self, millis: u64) {
        self.heartbeat_interval.store(millis, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_lifecycle() {
        let session = SessionState::new();
        assert_eq!(session.session_id(), None);

        session.set_session_id("asdf");
        assert_eq!(session.session_id().as_deref(), Some("asdf"));

        session.clear();
        assert_eq!(session.session_id(), None);
    }

    #[test]
    fn test_sequence_is_monotonic() {
        let session = SessionState::new();
        assert_eq!(session.sequence(), 0);

        session.observe_sequence(5);
        assert_eq!(session.sequence(), 5);

        // An out-of-order frame must not move the counter backwards.
        session.observe_sequence(3);
        assert_eq!(session.sequence(), 5);

        session.observe_sequence(9);
        assert_eq!(session.sequence(), 9);
    }

    #[test]
    fn test_heartbeat_interval_roundtrip() {
        let session = SessionState::new();
        assert_eq!(session.heartbeat_interval(), 0);
        session.set_heartbeat_interval(41_250);
        assert_eq!(session.heartbeat_interval(), 41_250);
    }
}
