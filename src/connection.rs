//! Connection context consumed by the transport.
//!
//! The transport does not own connection state; it reads everything it
//! needs — base URL, server-issued tokens, connection data — from a
//! [`ConnectionContext`] supplied by the caller on every operation. The
//! connection layer that manages that state lives outside this crate.
//!
//! [`ConnectionInfo`] is a plain owned implementation for callers that keep
//! the fields themselves (and for tests).

// ============================================================================
// Imports
// ============================================================================

// (std only)

// ============================================================================
// ConnectionContext
// ============================================================================

/// Read access to the state of one logical connection.
///
/// `message_id`, `groups_token` and `connection_data` are `None` until the
/// server has issued them; URL building substitutes the empty string.
///
/// # Thread Safety
///
/// Implementations are read concurrently from caller tasks and spawned
/// transport tasks, hence the `Send + Sync` bound.
pub trait ConnectionContext: Send + Sync {
    /// Base URL of the server, e.g. `https://example.com/push/`.
    ///
    /// A missing trailing slash is tolerated; URL building appends one.
    fn url(&self) -> &str;

    /// The server-issued connection token, empty before negotiation.
    fn connection_token(&self) -> &str;

    /// Last received message id, used on reconnect.
    fn message_id(&self) -> Option<&str>;

    /// Server-issued groups token, if any.
    fn groups_token(&self) -> Option<&str>;

    /// Application-provided connection data forwarded on every call.
    fn connection_data(&self) -> Option<&str>;
}

// ============================================================================
// ConnectionInfo
// ============================================================================

/// Owned [`ConnectionContext`] implementation.
///
/// # Example
///
/// ```
/// use push_transport::ConnectionInfo;
///
/// let conn = ConnectionInfo::new("https://example.com/push/")
///     .with_connection_token("tok");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConnectionInfo {
    /// Base URL of the server.
    pub url: String,
    /// Server-issued connection token.
    pub connection_token: String,
    /// Last received message id.
    pub message_id: Option<String>,
    /// Server-issued groups token.
    pub groups_token: Option<String>,
    /// Application-provided connection data.
    pub connection_data: Option<String>,
}

impl ConnectionInfo {
    /// Creates a connection info with the given base URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Sets the connection token.
    #[inline]
    #[must_use]
    pub fn with_connection_token(mut self, token: impl Into<String>) -> Self {
        self.connection_token = token.into();
        self
    }

    /// Sets the message id.
    #[inline]
    #[must_use]
    pub fn with_message_id(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = Some(message_id.into());
        self
    }

    /// Sets the groups token.
    #[inline]
    #[must_use]
    pub fn with_groups_token(mut self, groups_token: impl Into<String>) -> Self {
        self.groups_token = Some(groups_token.into());
        self
    }

    /// Sets the connection data.
    #[inline]
    #[must_use]
    pub fn with_connection_data(mut self, connection_data: impl Into<String>) -> Self {
        self.connection_data = Some(connection_data.into());
        self
    }
}

impl ConnectionContext for ConnectionInfo {
    fn url(&self) -> &str {
        &self.url
    }

    fn connection_token(&self) -> &str {
        &self.connection_token
    }

    fn message_id(&self) -> Option<&str> {
        self.message_id.as_deref()
    }

    fn groups_token(&self) -> Option<&str> {
        self.groups_token.as_deref()
    }

    fn connection_data(&self) -> Option<&str> {
        self.connection_data.as_deref()
    }
}

// ============================================================================
// Tests
// ============================================================================
