//! Single-flight abort coordination.
//!
//! The abort handshake tells the server the client is leaving voluntarily.
//! It is idempotent by design: while one abort request is in flight, every
//! further `abort()` call collapses onto it and shares its outcome — the
//! server never sees a duplicate request. Once the in-flight request
//! settles (or its token is cancelled), the state resets so a later abort,
//! for example after a fresh reconnect, issues a new request.
//!
//! Abort state deliberately outlives sessions; it belongs to the transport,
//! not to any one socket.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::completion::Completion;
use crate::error::Error;
use crate::transport::provider::{HttpClient, HttpMethod};
use crate::transport::session::Session;

// ============================================================================
// AbortState
// ============================================================================

/// Lock-guarded single-flight state.
#[derive(Default)]
struct AbortState {
    /// An abort request is currently in flight.
    in_progress: bool,
    /// Token shared by every caller that collapsed onto the in-flight
    /// request. Kept after settlement until the next abort replaces it.
    shared: Option<Completion<()>>,
}

// ============================================================================
// AbortGuard
// ============================================================================

/// Coordinates the abort handshake across concurrent callers and sessions.
pub(crate) struct AbortGuard {
    state: Arc<Mutex<AbortState>>,
}

impl AbortGuard {
    /// Creates a guard with no abort in flight.
    pub(crate) fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(AbortState::default())),
        }
    }

    /// Runs (or joins) the abort handshake.
    ///
    /// Marks the session's teardown as abort-owned first, so a socket
    /// close/failure racing the POST is already suppressed. Then, under the
    /// state lock: join an in-flight request if there is one, otherwise
    /// issue a single POST to `url` and publish the shared token.
    ///
    /// Any HTTP response settles the token as completed — the server
    /// observed the request regardless of status. Only a transport-level
    /// failure fails it, with [`Error::Abort`]. Cancelling the token aborts
    /// the request task and resets the in-flight flag.
    pub(crate) fn run(
        &self,
        http: Arc<dyn HttpClient>,
        url: String,
        session: Option<Arc<Session>>,
    ) -> Completion<()> {
        if let Some(session) = &session {
            session.mark_abort_requested();
        }

        let token = Completion::new();
        {
            let mut state = self.state.lock();
            if state.in_progress
                && let Some(shared) = &state.shared
            {
                debug!("abort already in flight, sharing its outcome");
                return shared.clone();
            }
            state.in_progress = true;
            state.shared = Some(token.clone());
        }

        info!("starting abort handshake");
        let request_state = Arc::clone(&self.state);
        let task = tokio::spawn({
            let token = token.clone();
            async move {
                let result = http.request(HttpMethod::Post, &url, Some(String::new())).await;
                request_state.lock().in_progress = false;
                match result {
                    Ok(_) => {
                        debug!("abort handshake finished");
                        token.complete(());
                    }
                    Err(err) => {
                        warn!(error = %err, "abort request failed");
                        token.fail(Error::abort(err.to_string()));
                    }
                }
            }
        });

        let cancel_state = Arc::clone(&self.state);
        token.on_cancel(move || {
            task.abort();
            cancel_state.lock().in_progress = false;
        });
        token
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::error::Result;
    use crate::transport::provider::{DataHandler, HttpResponse};
    use crate::transport::testing::MockHttpClient;

    const ABORT_URL: &str = "https://example.com/push/abort?connectionToken=tok";

    fn noop_session() -> Arc<Session> {
        let handler: DataHandler = Box::new(|_| {});
        Session::new(handler)
    }

    #[tokio::test]
    async fn test_single_request_for_concurrent_aborts() {
        let guard = AbortGuard::new();
        let (http, gate) = MockHttpClient::gated();
        let http = Arc::new(http);

        let first = guard.run(http.clone(), ABORT_URL.into(), None);
        let second = guard.run(http.clone(), ABORT_URL.into(), None);

        // Both callers share the in-flight request.
        tokio::task::yield_now().await;
        assert_eq!(http.request_count(), 1);

        gate.add_permits(1);
        first.wait().await.unwrap();
        second.wait().await.unwrap();
        assert_eq!(http.request_count(), 1);
    }

    #[tokio::test]
    async fn test_request_is_a_post_to_the_abort_url() {
        let guard = AbortGuard::new();
        let http = Arc::new(MockHttpClient::new());

        guard.run(http.clone(), ABORT_URL.into(), None).wait().await.unwrap();

        let requests = http.requests.lock();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, HttpMethod::Post);
        assert_eq!(requests[0].url, ABORT_URL);
        assert_eq!(requests[0].body.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_marks_session_abort_requested() {
        let guard = AbortGuard::new();
        let http = Arc::new(MockHttpClient::new());
        let session = noop_session();

        let token = guard.run(http.clone(), ABORT_URL.into(), Some(session.clone()));
        assert!(session.abort_requested());
        token.wait().await.unwrap();
    }

    #[tokio::test]
    async fn test_settled_abort_allows_a_new_request() {
        let guard = AbortGuard::new();
        let http = Arc::new(MockHttpClient::new());

        guard.run(http.clone(), ABORT_URL.into(), None).wait().await.unwrap();
        guard.run(http.clone(), ABORT_URL.into(), None).wait().await.unwrap();

        assert_eq!(http.request_count(), 2);
    }

    #[tokio::test]
    async fn test_transport_failure_shared_by_all_callers() {
        let guard = AbortGuard::new();
        let (http, gate) = MockHttpClient::gated();
        http.push_response(Err(Error::http("connection refused")));
        let http = Arc::new(http);

        let first = guard.run(http.clone(), ABORT_URL.into(), None);
        let second = guard.run(http.clone(), ABORT_URL.into(), None);
        gate.add_permits(1);

        for token in [first, second] {
            let err = token.wait().await.unwrap_err();
            assert!(matches!(err, Error::Abort { .. }));
        }
        assert_eq!(http.request_count(), 1);
    }

    #[tokio::test]
    async fn test_non_success_status_still_completes() {
        let guard = AbortGuard::new();
        let http = Arc::new(MockHttpClient::new());
        http.push_response(Ok(HttpResponse {
            status: 500,
            body: String::new(),
        }));

        // The server observed the request; status does not matter.
        let outcome: Result<()> = guard.run(http.clone(), ABORT_URL.into(), None).wait().await;
        assert!(outcome.is_ok());
    }

    #[tokio::test]
    async fn test_cancel_resets_in_flight_state() {
        let guard = AbortGuard::new();
        let (http, _gate) = MockHttpClient::gated();
        let http = Arc::new(http);

        let first = guard.run(http.clone(), ABORT_URL.into(), None);
        tokio::task::yield_now().await;
        first.cancel();
        assert!(first.is_cancelled());

        // The next abort issues a fresh request.
        let _second = guard.run(http.clone(), ABORT_URL.into(), None);
        tokio::task::yield_now().await;
        assert_eq!(http.request_count(), 2);
    }
}
