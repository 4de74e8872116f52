//! Handshake URL construction.
//!
//! Pure, deterministic construction of the negotiate, connect, reconnect and
//! abort URLs. Parameter order is fixed so built URLs are reproducible:
//!
//! ```text
//! {base}connect?connectionData=..&connectionToken=..&groupsToken=..&messageId=..&transport=..
//! ```
//!
//! All parameter values are percent-encoded (UTF-8). The base URL is
//! validated up front and the finished URL is validated again; either
//! failing produces [`Error::Config`] instead of a silently malformed URL.

// ============================================================================
// Imports
// ============================================================================

use url::Url;

use crate::connection::ConnectionContext;
use crate::error::{Error, Result};

// ============================================================================
// ConnectionKind
// ============================================================================

/// Whether a session opens fresh or resumes a dropped one.
///
/// Selects the handshake path: `connect` for the initial session,
/// `reconnect` when resuming with a previously issued message id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionKind {
    /// First session for this connection token.
    Initial,
    /// Resuming after a dropped session.
    Reconnect,
}

impl ConnectionKind {
    /// Returns the URL path segment for this kind.
    #[inline]
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Initial => "connect",
            Self::Reconnect => "reconnect",
        }
    }

    /// Returns `true` for [`ConnectionKind::Reconnect`].
    #[inline]
    #[must_use]
    pub const fn is_reconnect(self) -> bool {
        matches!(self, Self::Reconnect)
    }
}

// ============================================================================
// HandshakeParams
// ============================================================================

/// Query parameters shared by the token-correlated handshake URLs.
///
/// Absent message id, groups token and connection data collapse to the
/// empty string, matching what the server expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeParams {
    /// Application-provided connection data.
    pub connection_data: String,
    /// Server-issued connection token.
    pub connection_token: String,
    /// Server-issued groups token.
    pub groups_token: String,
    /// Last received message id.
    pub message_id: String,
    /// Transport name, e.g. `webSockets`.
    pub transport: String,
}

impl HandshakeParams {
    /// Collects the parameters from a connection context.
    #[must_use]
    pub fn from_context(conn: &dyn ConnectionContext, transport: &str) -> Self {
        Self {
            connection_data: conn.connection_data().unwrap_or_default().to_owned(),
            connection_token: conn.connection_token().to_owned(),
            groups_token: conn.groups_token().unwrap_or_default().to_owned(),
            message_id: conn.message_id().unwrap_or_default().to_owned(),
            transport: transport.to_owned(),
        }
    }

    /// Renders the fixed-order, percent-encoded query string.
    #[must_use]
    pub fn query(&self) -> String {
        format!(
            "connectionData={}&connectionToken={}&groupsToken={}&messageId={}&transport={}",
            urlencoding::encode(&self.connection_data),
            urlencoding::encode(&self.connection_token),
            urlencoding::encode(&self.groups_token),
            urlencoding::encode(&self.message_id),
            urlencoding::encode(&self.transport),
        )
    }
}

// ============================================================================
// URL Builders
// ============================================================================

/// Builds the negotiate URL.
///
/// Negotiation happens before any token exists, so the query carries only
/// the connection data.
///
/// # Errors
///
/// Returns [`Error::Config`] if the base URL is invalid.
pub fn negotiate_url(conn: &dyn ConnectionContext) -> Result<String> {
    let base = validated_base(conn)?;
    let connection_data = conn.connection_data().unwrap_or_default();
    finish(format!(
        "{base}negotiate?connectionData={}",
        urlencoding::encode(connection_data)
    ))
}

/// Builds the connect or reconnect URL.
///
/// # Errors
///
/// Returns [`Error::Config`] if the base URL is invalid or the finished URL
/// does not parse.
pub fn connect_url(
    conn: &dyn ConnectionContext,
    kind: ConnectionKind,
    transport: &str,
) -> Result<String> {
    let base = validated_base(conn)?;
    let params = HandshakeParams::from_context(conn, transport);
    finish(format!("{base}{}?{}", kind.path(), params.query()))
}

/// Builds the abort URL.
///
/// Uses the same fixed five-parameter query as connect, so every
/// token-correlated call shares one shape.
///
/// # Errors
///
/// Returns [`Error::Config`] if the base URL is invalid or the finished URL
/// does not parse.
pub fn abort_url(conn: &dyn ConnectionContext, transport: &str) -> Result<String> {
    let base = validated_base(conn)?;
    let params = HandshakeParams::from_context(conn, transport);
    finish(format!("{base}abort?{}", params.query()))
}

// ============================================================================
// Validation
// ============================================================================

/// Validates the base URL and normalizes it to end with `/`.
fn validated_base(conn: &dyn ConnectionContext) -> Result<String> {
    let raw = conn.url();
    Url::parse(raw).map_err(|e| Error::config(format!("invalid base URL {raw:?}: {e}")))?;

    let mut base = raw.to_owned();
    if !base.ends_with('/') {
        base.push('/');
    }
    Ok(base)
}

/// Re-parses the finished URL before handing it out.
fn finish(url: String) -> Result<String> {
    Url::parse(&url).map_err(|e| Error::config(format!("built URL {url:?} does not parse: {e}")))?;
    Ok(url)
}

// ============================================================================
// Tests
// ============================================================================
