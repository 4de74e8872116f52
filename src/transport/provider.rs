//! Provider interfaces consumed by the transport.
//!
//! The transport core never talks to the network directly; it drives an
//! [`HttpClient`] for the negotiate/abort requests and a [`SocketProvider`]
//! for the persistent session. Default implementations over `reqwest` and
//! `tokio-tungstenite` live in [`net`](crate::transport::net); tests swap in
//! mocks.
//!
//! # Socket Event Contract
//!
//! A provider delivers events to the registered [`SocketListener`] from a
//! task or thread it owns, one event at a time, in the order they occurred
//! on the wire:
//!
//! - exactly one `on_open` after the connection is established, or exactly
//!   one `on_failure` if it never establishes;
//! - `on_message` only between `on_open` and the closing events;
//! - `on_closing`/`on_closed` for an orderly shutdown, `on_failure` for a
//!   broken one; nothing after either.
//!
//! Listener methods are synchronous and must not block; the transport's
//! implementations only flip guarded state and settle completion tokens.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// WebSocket close code for a normal, voluntary closure.
pub const NORMAL_CLOSURE: u16 = 1000;

// ============================================================================
// HTTP
// ============================================================================

/// HTTP method of a handshake request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// GET (negotiate).
    Get,
    /// POST (abort).
    Post,
}

/// Minimal HTTP response surface the handshake needs.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

impl HttpResponse {
    /// Returns `true` for 2xx statuses.
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One-shot HTTP request execution.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Performs a single request and returns status plus body.
    ///
    /// Cancellation happens by dropping the future (the transport aborts
    /// the task driving it).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] when no response was obtained at all;
    /// non-success statuses are returned as responses, not errors.
    async fn request(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<String>,
    ) -> Result<HttpResponse>;
}

// ============================================================================
// Socket
// ============================================================================

/// Receiver of socket lifecycle events.
///
/// See the [module documentation](self) for the delivery contract.
pub trait SocketListener: Send + Sync {
    /// The connection is established.
    fn on_open(&self);

    /// A text message arrived.
    fn on_message(&self, text: &str);

    /// The peer started an orderly shutdown.
    fn on_closing(&self, code: u16, reason: &str);

    /// The connection is fully closed.
    fn on_closed(&self, code: u16, reason: &str);

    /// The connection failed.
    fn on_failure(&self, error: Error);
}

/// Handle to one open (or opening) socket.
#[async_trait]
pub trait SocketHandle: Send + Sync {
    /// Writes one text message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WebSocket`] if the write could not be handed to the
    /// connection.
    async fn write(&self, text: &str) -> Result<()>;

    /// Initiates a close handshake. Fire-and-forget; close completion is
    /// reported through the listener.
    fn close(&self, code: u16, reason: &str);
}

/// Factory opening sockets against a URL.
pub trait SocketProvider: Send + Sync {
    /// Starts connecting to `url` and returns the handle immediately.
    ///
    /// Connection progress — open, messages, closure, failure — is
    /// delivered asynchronously to `listener`.
    fn open(&self, url: &str, listener: Arc<dyn SocketListener>) -> Arc<dyn SocketHandle>;
}

// ============================================================================
// Data Delivery
// ============================================================================

/// Callback receiving session payloads, in arrival order.
///
/// Invoked synchronously from the provider's event context; keep it cheap
/// and hand heavy work to a channel or task.
pub type DataHandler = Box<dyn Fn(&str) + Send + Sync>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_success_bounds() {
        let ok = HttpResponse {
            status: 200,
            body: String::new(),
        };
        let created = HttpResponse {
            status: 204,
            body: String::new(),
        };
        let redirect = HttpResponse {
            status: 302,
            body: String::new(),
        };
        let error = HttpResponse {
            status: 500,
            body: String::new(),
        };

        assert!(ok.is_success());
        assert!(created.is_success());
        assert!(!redirect.is_success());
        assert!(!error.is_success());
    }
}
