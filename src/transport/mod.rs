//! Transport layer.
//!
//! This module contains the transport surface ([`ClientTransport`] and its
//! WebSocket implementation), the provider interfaces it consumes, and the
//! internal machinery — session lifecycle, send serialization, abort
//! coordination.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐  negotiate / abort   ┌──────────────┐
//! │  WebSocketTransport  │─────────────────────►│  HttpClient  │
//! │                      │                      └──────────────┘
//! │  Session ◄ events ───┼──────────────────────┐
//! │  SendQueue ─ writes ─┼───────────────────►┌─┴──────────────┐
//! │  AbortGuard          │                    │ SocketProvider │
//! └──────────────────────┘                    └────────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `provider` | Interfaces consumed by the transport |
//! | `net` | Default `reqwest`/`tokio-tungstenite` providers |
//! | `websockets` | The WebSocket transport |
//! | `session` | Socket session lifecycle (internal) |
//! | `sender` | Ordered send worker (internal) |
//! | `abort` | Single-flight abort coordination (internal) |

// ============================================================================
// Imports
// ============================================================================

use crate::completion::Completion;
use crate::connection::ConnectionContext;
use crate::protocol::negotiate::NegotiationResult;
use crate::protocol::urls::ConnectionKind;

// ============================================================================
// Submodules
// ============================================================================

/// Default network providers.
pub mod net;

/// Provider interfaces consumed by the transport.
pub mod provider;

/// The WebSocket transport.
pub mod websockets;

pub(crate) mod abort;
pub(crate) mod sender;
pub(crate) mod session;

#[cfg(test)]
pub(crate) mod testing;

// ============================================================================
// Re-exports
// ============================================================================

pub use net::{ReqwestHttpClient, TungsteniteSocketProvider};
pub use provider::{
    DataHandler, HttpClient, HttpMethod, HttpResponse, NORMAL_CLOSURE, SocketHandle,
    SocketListener, SocketProvider,
};
pub use websockets::{TRANSPORT_NAME, WebSocketTransport};

// ============================================================================
// ClientTransport
// ============================================================================

/// The operations a client transport exposes.
///
/// Every operation returns a [`Completion`] immediately and never blocks
/// the caller; outcomes, including all failures, arrive through the token.
/// Cancellation is cooperative via [`Completion::cancel`].
pub trait ClientTransport: Send + Sync {
    /// Wire name of this transport, sent as the `transport` query
    /// parameter.
    fn name(&self) -> &'static str;

    /// Whether this transport keeps the connection alive by itself.
    fn supports_keep_alive(&self) -> bool;

    /// Negotiates a connection token with the server.
    ///
    /// One GET request; the token resolves with the parsed
    /// [`NegotiationResult`] or fails with a negotiation error. Cancelling
    /// the token aborts the outstanding request.
    fn negotiate(&self, conn: &dyn ConnectionContext) -> Completion<NegotiationResult>;

    /// Opens (or reopens) the socket session.
    ///
    /// Supersedes any previous session. The returned token completes on the
    /// first open event, fails on the first failure event, and — when
    /// cancelled — closes the socket gracefully unless an abort handshake
    /// is already tearing the session down. `on_data` receives every
    /// payload in arrival order while the session is open.
    fn start(
        &self,
        conn: &dyn ConnectionContext,
        kind: ConnectionKind,
        on_data: DataHandler,
    ) -> Completion<()>;

    /// Sends one payload over the open session.
    ///
    /// Fails immediately with [`Error::SendUnavailable`] when no socket is
    /// open. Writes execute one at a time, in submission order. The token
    /// acknowledges the provider-level write handoff, not server-side
    /// delivery.
    ///
    /// [`Error::SendUnavailable`]: crate::error::Error::SendUnavailable
    fn send(&self, conn: &dyn ConnectionContext, payload: &str) -> Completion<()>;

    /// Runs the voluntary disconnect handshake.
    ///
    /// Idempotent: concurrent calls collapse onto one request and share its
    /// outcome. Socket close/failure events observed after this call do not
    /// fail the session token.
    fn abort(&self, conn: &dyn ConnectionContext) -> Completion<()>;
}
