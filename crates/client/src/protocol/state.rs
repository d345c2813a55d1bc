//! Request/response sequencing state of a connection.
//!
//! ```text
//!     Idle
//!       | put_request()
//!       v
//!     RequestStarted
//!       | ( put_header() )*  end_headers()
//!       v
//!     RequestSent
//!       | get_response()
//!       v
//!     UnreadResponse ----------- put_request() ----> RequestStartedUnread
//!       | response drained                              | end_headers()
//!       v                                               v
//!     Idle                                          RequestSentUnread
//! ```
//!
//! A response that will close the connection is handed over completely, so
//! `get_response()` goes straight back to `Idle` in that case. Once a pending
//! response finishes, every `*Unread` state collapses into its plain phase.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use triomphe::Arc;

/// Lets a connection observe whether the persistent response it handed out is finished.
#[derive(Debug, Clone, Default)]
pub struct ResponseTracker {
    closed: Arc<AtomicBool>,
}

impl ResponseTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub(crate) fn mark_closed(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

/// The six legal states of a connection.
#[derive(Debug, Clone, Default)]
pub enum ConnectionState {
    #[default]
    Idle,
    RequestStarted,
    RequestSent,
    UnreadResponse(ResponseTracker),
    RequestStartedUnread(ResponseTracker),
    RequestSentUnread(ResponseTracker),
}

impl ConnectionState {
    pub fn name(&self) -> &'static str {
        match self {
            ConnectionState::Idle => "Idle",
            ConnectionState::RequestStarted => "Request-started",
            ConnectionState::RequestSent => "Request-sent",
            ConnectionState::UnreadResponse(_) => "Unread-response",
            ConnectionState::RequestStartedUnread(_) => "Req-started-unread-response",
            ConnectionState::RequestSentUnread(_) => "Req-sent-unread-response",
        }
    }

    pub fn tracker(&self) -> Option<&ResponseTracker> {
        match self {
            ConnectionState::Idle | ConnectionState::RequestStarted | ConnectionState::RequestSent => None,
            ConnectionState::UnreadResponse(tracker)
            | ConnectionState::RequestStartedUnread(tracker)
            | ConnectionState::RequestSentUnread(tracker) => Some(tracker),
        }
    }

    #[inline]
    pub fn has_unread_response(&self) -> bool {
        self.tracker().is_some()
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        matches!(self, ConnectionState::Idle | ConnectionState::UnreadResponse(_))
    }

    /// Drops the pending response once it has been fully read or closed.
    pub(crate) fn forget_finished(self) -> Self {
        match self {
            ConnectionState::UnreadResponse(t) if t.is_closed() => ConnectionState::Idle,
            ConnectionState::RequestStartedUnread(t) if t.is_closed() => ConnectionState::RequestStarted,
            ConnectionState::RequestSentUnread(t) if t.is_closed() => ConnectionState::RequestSent,
            state => state,
        }
    }

    /// `put_request()`: only legal from an idle phase.
    pub(crate) fn start_request(self) -> Result<Self, Self> {
        match self {
            ConnectionState::Idle => Ok(ConnectionState::RequestStarted),
            ConnectionState::UnreadResponse(t) => Ok(ConnectionState::RequestStartedUnread(t)),
            state => Err(state),
        }
    }

    /// `end_headers()`: only legal while a request is being built.
    pub(crate) fn finish_request(self) -> Result<Self, Self> {
        match self {
            ConnectionState::RequestStarted => Ok(ConnectionState::RequestSent),
            ConnectionState::RequestStartedUnread(t) => Ok(ConnectionState::RequestSentUnread(t)),
            state => Err(state),
        }
    }

    #[inline]
    pub(crate) fn accepts_headers(&self) -> bool {
        matches!(self, ConnectionState::RequestStarted | ConnectionState::RequestStartedUnread(_))
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legal_sequence() {
        let state = ConnectionState::Idle.start_request().unwrap();
        assert!(state.accepts_headers());
        let state = state.finish_request().unwrap();
        assert!(matches!(state, ConnectionState::RequestSent));
        assert!(!state.accepts_headers());
    }

    #[test]
    fn illegal_transitions_keep_state() {
        let state = ConnectionState::RequestSent.start_request().unwrap_err();
        assert!(matches!(state, ConnectionState::RequestSent));

        let state = ConnectionState::Idle.finish_request().unwrap_err();
        assert!(matches!(state, ConnectionState::Idle));
    }

    #[test]
    fn pending_response_travels_with_the_request() {
        let tracker = ResponseTracker::new();
        let state = ConnectionState::UnreadResponse(tracker.clone()).start_request().unwrap();
        assert_eq!(state.name(), "Req-started-unread-response");
        let state = state.finish_request().unwrap();
        assert!(state.has_unread_response());

        tracker.mark_closed();
        let state = state.forget_finished();
        assert!(matches!(state, ConnectionState::RequestSent));
    }

    #[test]
    fn open_response_is_not_forgotten() {
        let state = ConnectionState::UnreadResponse(ResponseTracker::new()).forget_finished();
        assert!(state.has_unread_response());
        assert!(state.is_idle());
    }
}
