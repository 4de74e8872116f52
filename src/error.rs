//! Error types for the push transport.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use push_transport::{Result, Error};
//!
//! async fn example(transport: &WebSocketTransport, conn: &ConnectionInfo) -> Result<()> {
//!     let negotiation = transport.negotiate(conn).wait().await?;
//!     println!("token: {}", negotiation.connection_token);
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Negotiation | [`Error::Negotiation`], [`Error::NegotiationStatus`], [`Error::NegotiationParse`] |
//! | Connection | [`Error::Connection`] |
//! | Send | [`Error::SendUnavailable`], [`Error::SendFailed`] |
//! | Abort | [`Error::Abort`] |
//! | Provider | [`Error::Http`], [`Error::WebSocket`] |
//! | Completion | [`Error::Cancelled`] |
//!
//! # Cloneability
//!
//! Every variant carries owned data ([`String`] messages, status codes), so
//! [`Error`] is `Clone`. This matters for shared completion tokens: when
//! several callers collapse onto one abort handshake, each of them receives
//! the same failure. Underlying provider errors are flattened into their
//! display text at the point they are wrapped.

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug, Clone)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when a base URL is invalid, a built URL does not parse, or
    /// a collaborator fails to initialize at construction time.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Negotiation Errors
    // ========================================================================
    /// Negotiation request failed at the transport level.
    ///
    /// Returned when the negotiate request produced no HTTP response at all.
    #[error("Negotiation failed: {message}")]
    Negotiation {
        /// Description of the underlying transport failure.
        message: String,
    },

    /// Negotiation answered with a non-success HTTP status.
    #[error("Negotiation rejected with HTTP status {status}")]
    NegotiationStatus {
        /// The HTTP status code the server answered with.
        status: u16,
    },

    /// Negotiation response body could not be parsed.
    #[error("Negotiation response could not be parsed: {message}")]
    NegotiationParse {
        /// Description of the parse failure.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// Socket session terminated unexpectedly.
    ///
    /// Returned when the socket closes or fails while no abort handshake is
    /// in progress.
    #[error("Connection terminated unexpectedly: {message}")]
    Connection {
        /// Description of the termination.
        message: String,
    },

    // ========================================================================
    // Send Errors
    // ========================================================================
    /// Send attempted without an open socket.
    #[error("No open socket available for send")]
    SendUnavailable,

    /// Provider-level socket write failure.
    #[error("Socket write failed: {message}")]
    SendFailed {
        /// Description of the write failure.
        message: String,
    },

    // ========================================================================
    // Abort Errors
    // ========================================================================
    /// Abort request failed at the transport level.
    #[error("Abort request failed: {message}")]
    Abort {
        /// Description of the underlying transport failure.
        message: String,
    },

    // ========================================================================
    // Provider Errors
    // ========================================================================
    /// HTTP provider error.
    #[error("HTTP error: {message}")]
    Http {
        /// Description of the HTTP provider failure.
        message: String,
    },

    /// WebSocket provider error.
    #[error("WebSocket error: {message}")]
    WebSocket {
        /// Description of the socket provider failure.
        message: String,
    },

    // ========================================================================
    // Completion Errors
    // ========================================================================
    /// The awaited completion token was cancelled.
    #[error("Operation was cancelled")]
    Cancelled,
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a transport-level negotiation error.
    #[inline]
    pub fn negotiation(message: impl Into<String>) -> Self {
        Self::Negotiation {
            message: message.into(),
        }
    }

    /// Creates a status-carrying negotiation error.
    #[inline]
    pub fn negotiation_status(status: u16) -> Self {
        Self::NegotiationStatus { status }
    }

    /// Creates a negotiation parse error.
    #[inline]
    pub fn negotiation_parse(message: impl Into<String>) -> Self {
        Self::NegotiationParse {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a send failure error.
    #[inline]
    pub fn send_failed(message: impl Into<String>) -> Self {
        Self::SendFailed {
            message: message.into(),
        }
    }

    /// Creates an abort error.
    #[inline]
    pub fn abort(message: impl Into<String>) -> Self {
        Self::Abort {
            message: message.into(),
        }
    }

    /// Creates an HTTP provider error.
    #[inline]
    pub fn http(message: impl Into<String>) -> Self {
        Self::Http {
            message: message.into(),
        }
    }

    /// Creates a WebSocket provider error.
    #[inline]
    pub fn web_socket(message: impl Into<String>) -> Self {
        Self::WebSocket {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a negotiation error.
    #[inline]
    #[must_use]
    pub fn is_negotiation_error(&self) -> bool {
        matches!(
            self,
            Self::Negotiation { .. } | Self::NegotiationStatus { .. } | Self::NegotiationParse { .. }
        )
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::WebSocket { .. })
    }

    /// Returns `true` if this is a send error.
    #[inline]
    #[must_use]
    pub fn is_send_error(&self) -> bool {
        matches!(self, Self::SendUnavailable | Self::SendFailed { .. })
    }

    /// Returns `true` if the operation was cancelled.
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns `true` if this error may succeed on retry.
    ///
    /// The transport never retries internally; this predicate exists for
    /// callers layering their own retry policy.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Negotiation { .. }
                | Self::Connection { .. }
                | Self::SendFailed { .. }
                | Self::Abort { .. }
                | Self::Http { .. }
                | Self::WebSocket { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
