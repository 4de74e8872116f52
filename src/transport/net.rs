//! Default network providers.
//!
//! Bundled implementations of the provider interfaces:
//!
//! - [`ReqwestHttpClient`] — [`HttpClient`] over `reqwest`, used for the
//!   negotiate and abort requests.
//! - [`TungsteniteSocketProvider`] — [`SocketProvider`] over
//!   `tokio-tungstenite`. Each opened socket runs on its own task that owns
//!   the stream, dispatches listener events, and drains a command channel
//!   for writes and closes.
//!
//! The transport core only sees the trait objects; swapping these out (for
//! tests, or for a different stack) requires no core changes.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::Message;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::transport::provider::{
    HttpClient, HttpMethod, HttpResponse, NORMAL_CLOSURE, SocketHandle, SocketListener,
    SocketProvider,
};

// ============================================================================
// ReqwestHttpClient
// ============================================================================

/// [`HttpClient`] backed by `reqwest`.
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    /// Builds the underlying HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if client initialization fails (for
    /// example, the TLS backend cannot be set up).
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn request(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<String>,
    ) -> Result<HttpResponse> {
        let mut builder = match method {
            HttpMethod::Get => self.client.get(url),
            HttpMethod::Post => self.client.post(url),
        };
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::http(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| Error::http(e.to_string()))?;

        trace!(status, "http response received");
        Ok(HttpResponse { status, body })
    }
}

// ============================================================================
// TungsteniteSocketProvider
// ============================================================================

/// [`SocketProvider`] backed by `tokio-tungstenite`.
#[derive(Debug, Default)]
pub struct TungsteniteSocketProvider;

impl TungsteniteSocketProvider {
    /// Creates the provider.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl SocketProvider for TungsteniteSocketProvider {
    fn open(&self, url: &str, listener: Arc<dyn SocketListener>) -> Arc<dyn SocketHandle> {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_socket(url.to_owned(), listener, rx));
        Arc::new(ChannelSocketHandle { tx })
    }
}

// ============================================================================
// ChannelSocketHandle
// ============================================================================

/// Commands from the handle to the socket task.
enum SocketCommand {
    Write {
        text: String,
        done: oneshot::Sender<Result<()>>,
    },
    Close {
        code: u16,
        reason: String,
    },
}

/// Handle backed by the socket task's command channel.
struct ChannelSocketHandle {
    tx: mpsc::UnboundedSender<SocketCommand>,
}

#[async_trait]
impl SocketHandle for ChannelSocketHandle {
    async fn write(&self, text: &str) -> Result<()> {
        let (done, ack) = oneshot::channel();
        self.tx
            .send(SocketCommand::Write {
                text: text.to_owned(),
                done,
            })
            .map_err(|_| Error::web_socket("socket task is gone"))?;
        ack.await
            .map_err(|_| Error::web_socket("socket task dropped the write"))?
    }

    fn close(&self, code: u16, reason: &str) {
        let _ = self.tx.send(SocketCommand::Close {
            code,
            reason: reason.to_owned(),
        });
    }
}

// ============================================================================
// Socket Task
// ============================================================================

/// Owns one websocket connection end to end.
async fn run_socket(
    url: String,
    listener: Arc<dyn SocketListener>,
    mut commands: mpsc::UnboundedReceiver<SocketCommand>,
) {
    let stream = match tokio_tungstenite::connect_async(url.as_str()).await {
        Ok((stream, _response)) => stream,
        Err(err) => {
            warn!(error = %err, "websocket connect failed");
            listener.on_failure(Error::web_socket(err.to_string()));
            return;
        }
    };

    debug!("websocket connected");
    listener.on_open();

    let (mut sink, mut source) = stream.split();
    loop {
        tokio::select! {
            message = source.next() => match message {
                Some(Ok(Message::Text(text))) => listener.on_message(text.as_str()),
                Some(Ok(Message::Close(frame))) => {
                    let (code, reason) = match &frame {
                        Some(frame) => (u16::from(frame.code), frame.reason.as_str().to_owned()),
                        None => (NORMAL_CLOSURE, String::new()),
                    };
                    debug!(code, "websocket closing");
                    listener.on_closing(code, &reason);
                    listener.on_closed(code, &reason);
                    break;
                }
                // Binary, ping and pong frames are not part of the protocol.
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    listener.on_failure(Error::web_socket(err.to_string()));
                    break;
                }
                None => {
                    listener.on_failure(Error::web_socket("websocket stream ended unexpectedly"));
                    break;
                }
            },
            command = commands.recv() => match command {
                Some(SocketCommand::Write { text, done }) => {
                    let result = sink
                        .send(Message::text(text))
                        .await
                        .map_err(|e| Error::web_socket(e.to_string()));
                    let _ = done.send(result);
                }
                Some(SocketCommand::Close { code, reason }) => {
                    debug!(code, "sending close frame");
                    let frame = CloseFrame {
                        code: CloseCode::from(code),
                        reason: reason.into(),
                    };
                    if let Err(err) = sink.send(Message::Close(Some(frame))).await {
                        trace!(error = %err, "close frame not sent");
                    }
                }
                None => {
                    // Every handle is gone; shut the stream down.
                    let _ = sink.close().await;
                    break;
                }
            },
        }
    }

    debug!("websocket task terminated");
}

// ============================================================================
// Tests
// ============================================================================
