//! Push Transport - WebSocket client transport for push-messaging servers.
//!
//! This library implements the client side of a push-messaging handshake
//! over a persistent WebSocket: it negotiates a connection token over HTTP,
//! opens and reopens socket sessions with that token, serializes outbound
//! sends through a single ordered worker, and performs a coordinated,
//! idempotent disconnect ("abort") handshake.
//!
//! Key design principles:
//!
//! - Every operation returns a cancellable [`Completion`] token immediately;
//!   nothing blocks the caller and all failures arrive through the token.
//! - At most one socket session is live per transport; a new `start()`
//!   supersedes the previous one.
//! - Concurrent `abort()` calls collapse onto a single in-flight request.
//! - The network sits behind provider traits; `reqwest` and
//!   `tokio-tungstenite` defaults are bundled, mocks drop in for tests.
//!
//! # Quick Start
//!
//! ```no_run
//! use push_transport::{
//!     ClientTransport, ConnectionInfo, ConnectionKind, Result, WebSocketTransport,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let transport = WebSocketTransport::with_defaults()?;
//!     let mut conn = ConnectionInfo::new("https://example.com/push/");
//!
//!     // Obtain a connection token
//!     let negotiation = transport.negotiate(&conn).wait().await?;
//!     conn = conn.with_connection_token(negotiation.connection_token);
//!
//!     // Open the session and print incoming payloads
//!     let session = transport.start(
//!         &conn,
//!         ConnectionKind::Initial,
//!         Box::new(|payload| println!("received: {payload}")),
//!     );
//!     session.wait().await?;
//!
//!     // Send something, then leave politely
//!     transport.send(&conn, "hello").wait().await?;
//!     transport.abort(&conn).wait().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`completion`] | Cancellable completion tokens |
//! | [`connection`] | Connection context consumed by the transport |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`protocol`] | Handshake URLs and the negotiation payload |
//! | [`transport`] | Transport surface, providers, session machinery |

// ============================================================================
// Modules
// ============================================================================

/// Cancellable completion tokens.
///
/// [`Completion`] settles exactly once as completed, failed, or cancelled;
/// every asynchronous operation on the transport returns one.
pub mod completion;

/// Connection context consumed by the transport.
///
/// The transport reads base URL and tokens from a [`ConnectionContext`] the
/// caller supplies on every operation.
pub mod connection;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Handshake protocol types.
///
/// URL construction and the negotiate response payload.
pub mod protocol;

/// Transport layer.
///
/// [`ClientTransport`], its WebSocket implementation, and the provider
/// interfaces it consumes.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Completion types
pub use completion::{Completion, CompletionState};

// Connection types
pub use connection::{ConnectionContext, ConnectionInfo};

// Error types
pub use error::{Error, Result};

// Protocol types
pub use protocol::{ConnectionKind, HandshakeParams, NegotiationResult};

// Transport types
pub use transport::{
    ClientTransport, DataHandler, HttpClient, HttpMethod, HttpResponse, ReqwestHttpClient,
    SocketHandle, SocketListener, SocketProvider, TRANSPORT_NAME, TungsteniteSocketProvider,
    WebSocketTransport,
};
