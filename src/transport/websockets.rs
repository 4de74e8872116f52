//! The WebSocket client transport.
//!
//! [`WebSocketTransport`] ties the pieces together: it negotiates a
//! connection token over HTTP, opens one socket session at a time, funnels
//! outbound payloads through the single send worker, and coordinates the
//! idempotent abort handshake.
//!
//! # Operation Flow
//!
//! ```text
//! negotiate ──► GET  {base}negotiate?...      one-shot, token in the body
//! start ──────► open {base}connect?...        session token settles on the
//!                                             first open/failure event
//! send ───────► session socket ◄── SendQueue  ordered, one in flight
//! abort ──────► POST {base}abort?...          single-flight, shared outcome
//! ```
//!
//! Every operation returns a [`Completion`] immediately; nothing blocks the
//! caller.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::completion::Completion;
use crate::connection::ConnectionContext;
use crate::error::{Error, Result};
use crate::protocol::negotiate::NegotiationResult;
use crate::protocol::urls::{self, ConnectionKind};
use crate::transport::ClientTransport;
use crate::transport::abort::AbortGuard;
use crate::transport::net::{ReqwestHttpClient, TungsteniteSocketProvider};
use crate::transport::provider::{DataHandler, HttpClient, HttpMethod, SocketProvider};
use crate::transport::sender::SendQueue;
use crate::transport::session::Session;

// ============================================================================
// Constants
// ============================================================================

/// Wire name of this transport, sent as the `transport` query parameter.
pub const TRANSPORT_NAME: &str = "webSockets";

// ============================================================================
// WebSocketTransport
// ============================================================================

/// WebSocket implementation of [`ClientTransport`].
///
/// Holds at most one live [`Session`]; starting a new one supersedes and
/// tears down the previous. Abort state outlives sessions so reconnect
/// cycles keep the single-flight guarantee.
///
/// # Thread Safety
///
/// `WebSocketTransport` is `Send + Sync`; operations may be invoked
/// concurrently from any task.
pub struct WebSocketTransport {
    /// HTTP side of the handshake (negotiate, abort).
    http: Arc<dyn HttpClient>,
    /// Socket factory for sessions.
    sockets: Arc<dyn SocketProvider>,
    /// The current session, superseded by each `start()`.
    current: Mutex<Option<Arc<Session>>>,
    /// Ordered send worker.
    queue: SendQueue,
    /// Single-flight abort coordination.
    abort_guard: AbortGuard,
}

impl WebSocketTransport {
    /// Creates a transport over the given providers.
    ///
    /// Spawns the send worker task; must be called within a Tokio runtime.
    #[must_use]
    pub fn new(http: Arc<dyn HttpClient>, sockets: Arc<dyn SocketProvider>) -> Self {
        Self {
            http,
            sockets,
            current: Mutex::new(None),
            queue: SendQueue::new(),
            abort_guard: AbortGuard::new(),
        }
    }

    /// Creates a transport over the bundled `reqwest`/`tokio-tungstenite`
    /// providers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the HTTP client fails to initialize.
    pub fn with_defaults() -> Result<Self> {
        let http = Arc::new(ReqwestHttpClient::new()?);
        let sockets = Arc::new(TungsteniteSocketProvider::new());
        Ok(Self::new(http, sockets))
    }
}

// ============================================================================
// WebSocketTransport - ClientTransport
// ============================================================================

impl ClientTransport for WebSocketTransport {
    fn name(&self) -> &'static str {
        TRANSPORT_NAME
    }

    fn supports_keep_alive(&self) -> bool {
        true
    }

    fn negotiate(&self, conn: &dyn ConnectionContext) -> Completion<NegotiationResult> {
        let url = match urls::negotiate_url(conn) {
            Ok(url) => url,
            Err(err) => return Completion::failed(err),
        };

        debug!("starting negotiation");
        let token = Completion::new();
        let http = Arc::clone(&self.http);
        let task = tokio::spawn({
            let token = token.clone();
            async move {
                match http.request(HttpMethod::Get, &url, None).await {
                    Ok(response) if response.is_success() => {
                        match serde_json::from_str::<NegotiationResult>(&response.body) {
                            Ok(result) => {
                                debug!("negotiation complete");
                                token.complete(result);
                            }
                            Err(err) => {
                                token.fail(Error::negotiation_parse(err.to_string()));
                            }
                        }
                    }
                    Ok(response) => {
                        token.fail(Error::negotiation_status(response.status));
                    }
                    Err(err) => {
                        token.fail(Error::negotiation(err.to_string()));
                    }
                }
            }
        });
        token.on_cancel(move || task.abort());
        token
    }

    fn start(
        &self,
        conn: &dyn ConnectionContext,
        kind: ConnectionKind,
        on_data: DataHandler,
    ) -> Completion<()> {
        let url = match urls::connect_url(conn, kind, self.name()) {
            Ok(url) => url,
            Err(err) => return Completion::failed(err),
        };

        let session = Session::new(on_data);
        let previous = self.current.lock().replace(Arc::clone(&session));
        if let Some(previous) = previous {
            previous.supersede();
        }

        info!(reconnect = kind.is_reconnect(), "opening socket session");
        let socket = self.sockets.open(&url, session.clone());
        session.attach(socket);
        session.token()
    }

    fn send(&self, _conn: &dyn ConnectionContext, payload: &str) -> Completion<()> {
        let socket = self.current.lock().as_ref().and_then(|s| s.open_socket());
        match socket {
            Some(socket) => self.queue.enqueue(socket, payload.to_owned()),
            None => Completion::failed(Error::SendUnavailable),
        }
    }

    fn abort(&self, conn: &dyn ConnectionContext) -> Completion<()> {
        let url = match urls::abort_url(conn, self.name()) {
            Ok(url) => url,
            Err(err) => return Completion::failed(err),
        };
        let session = self.current.lock().clone();
        self.abort_guard.run(Arc::clone(&self.http), url, session)
    }
}

// ============================================================================
// Tests
// ============================================================================
