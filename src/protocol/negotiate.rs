//! Negotiation response payload.
//!
//! The server answers the negotiate request with a JSON document carrying
//! the connection token plus a handful of advisory fields. Only the token is
//! mandatory; everything else is optional and server-version dependent.
//!
//! # Format
//!
//! ```json
//! {
//!   "ConnectionToken": "abc",
//!   "ConnectionId": "5f2b...",
//!   "ProtocolVersion": "1.5",
//!   "TryWebSockets": true,
//!   "KeepAliveTimeout": 20.0,
//!   "DisconnectTimeout": 30.0
//! }
//! ```

// ============================================================================
// Imports
// ============================================================================

use serde::Deserialize;

// ============================================================================
// NegotiationResult
// ============================================================================

/// Parsed negotiate response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NegotiationResult {
    /// Server-issued token correlating all subsequent calls to one logical
    /// connection.
    pub connection_token: String,

    /// Server-side identifier of the connection.
    #[serde(default)]
    pub connection_id: Option<String>,

    /// Relative URL the server wants subsequent calls on, if different.
    #[serde(default)]
    pub url: Option<String>,

    /// Protocol version the server speaks.
    #[serde(default)]
    pub protocol_version: Option<String>,

    /// Whether the server believes websockets will work.
    #[serde(default)]
    pub try_web_sockets: Option<bool>,

    /// Keep-alive timeout in seconds, if keep-alive is enabled.
    #[serde(default)]
    pub keep_alive_timeout: Option<f64>,

    /// Seconds without traffic after which the server considers the
    /// connection gone.
    #[serde(default)]
    pub disconnect_timeout: Option<f64>,
}

// ============================================================================
// Tests
// ============================================================================
