//! Socket session lifecycle.
//!
//! A [`Session`] is one attempt to hold an open socket: it is created by
//! `start()`, driven by the provider's socket events, and torn down by
//! cancellation, by an abort handshake, or by being superseded when a new
//! session starts.
//!
//! # Lifecycle
//!
//! ```text
//!              on_open                on_closing / on_closed / on_failure
//! Connecting ──────────► Open ──────────────────────────────────────► Closed
//!      │                                                                ▲
//!      └── cancel / supersede ──────────────────────────────────────────┘
//! ```
//!
//! The session token settles exactly once: completed on the first open
//! event, failed on the first close/failure event (unless an abort is in
//! progress, which suppresses the failure — the teardown is expected), or
//! cancelled by the caller.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::completion::Completion;
use crate::error::Error;
use crate::transport::provider::{DataHandler, NORMAL_CLOSURE, SocketHandle, SocketListener};

// ============================================================================
// Phase
// ============================================================================

/// Coarse connection phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Socket requested, open event not yet delivered.
    Connecting,
    /// Open and delivering messages.
    Open,
    /// Torn down; terminal.
    Closed,
}

// ============================================================================
// Session
// ============================================================================

/// One socket session owned by the transport.
///
/// Shared as `Arc<Session>` between the transport (current-session slot)
/// and the socket provider (registered listener). All mutable state is
/// behind locks or atomics; events may arrive on provider threads while
/// API calls run on caller tasks.
pub(crate) struct Session {
    /// Session token returned by `start()`.
    token: Completion<()>,
    /// Caller's payload sink.
    on_data: DataHandler,
    /// Owned socket handle; `None` until attached and after release.
    socket: Mutex<Option<Arc<dyn SocketHandle>>>,
    /// Connection phase.
    phase: Mutex<Phase>,
    /// Set by the abort coordinator; suppresses close/failure propagation.
    abort_requested: AtomicBool,
}

impl Session {
    /// Creates a session and wires its cancellation path.
    ///
    /// Cancelling the token performs a graceful close (code 1000) unless an
    /// abort is in progress, in which case the abort request already tells
    /// the server we are leaving and no close frame is sent.
    pub(crate) fn new(on_data: DataHandler) -> Arc<Self> {
        let session = Arc::new(Self {
            token: Completion::new(),
            on_data,
            socket: Mutex::new(None),
            phase: Mutex::new(Phase::Connecting),
            abort_requested: AtomicBool::new(false),
        });

        // Weak: the token owns the handler, the session owns the token.
        let weak = Arc::downgrade(&session);
        session.token.on_cancel(move || {
            if let Some(session) = weak.upgrade() {
                session.close_on_cancel();
            }
        });

        session
    }

    /// Returns a clone of the session token.
    #[must_use]
    pub(crate) fn token(&self) -> Completion<()> {
        self.token.clone()
    }

    /// Stores the socket handle obtained from the provider.
    ///
    /// If the token already settled (a failure or cancellation raced the
    /// provider's `open` call), the handle is closed instead of stored so
    /// no live socket outlives a dead session.
    pub(crate) fn attach(&self, socket: Arc<dyn SocketHandle>) {
        {
            let mut slot = self.socket.lock();
            // Checked under the slot lock: the cancel handler takes this
            // lock after the token transitions, so a concurrent cancel
            // either sees the stored handle or is observed here.
            if !self.token.is_settled() {
                *slot = Some(socket);
                return;
            }
        }
        if !self.abort_requested() {
            socket.close(NORMAL_CLOSURE, "");
        }
    }

    /// Returns the socket handle while the session is open.
    #[must_use]
    pub(crate) fn open_socket(&self) -> Option<Arc<dyn SocketHandle>> {
        if *self.phase.lock() != Phase::Open {
            return None;
        }
        self.socket.lock().clone()
    }

    /// Marks the session as being torn down by an abort handshake.
    ///
    /// Subsequent close/failure events will not fail the session token.
    pub(crate) fn mark_abort_requested(&self) {
        self.abort_requested.store(true, Ordering::SeqCst);
    }

    /// Returns `true` if an abort handshake owns this session's teardown.
    #[must_use]
    pub(crate) fn abort_requested(&self) -> bool {
        self.abort_requested.load(Ordering::SeqCst)
    }

    /// Cancels the session and releases its socket.
    ///
    /// Called when a newer session takes over; exactly one session owns the
    /// socket at a time.
    pub(crate) fn supersede(&self) {
        debug!("superseding session");
        self.token.cancel();
        self.socket.lock().take();
        *self.phase.lock() = Phase::Closed;
    }

    /// Cancel handler: graceful close unless an abort is in progress.
    fn close_on_cancel(&self) {
        let socket = self.socket.lock().take();
        *self.phase.lock() = Phase::Closed;

        if self.abort_requested() {
            trace!("cancelled during abort, skipping close frame");
            return;
        }
        if let Some(socket) = socket {
            debug!("closing socket after cancellation");
            socket.close(NORMAL_CLOSURE, "");
        }
    }

    /// Common handling for close and failure events.
    fn terminate(&self, error: Error) {
        *self.phase.lock() = Phase::Closed;
        self.socket.lock().take();

        if self.abort_requested() {
            trace!("suppressing socket event during abort");
            return;
        }
        // No-op if the token already settled (first event wins).
        self.token.fail(error);
    }
}

// ============================================================================
// Session - Socket Events
// ============================================================================

impl SocketListener for Session {
    fn on_open(&self) {
        {
            let mut phase = self.phase.lock();
            if *phase != Phase::Connecting {
                trace!("ignoring open event outside connecting phase");
                return;
            }
            *phase = Phase::Open;
        }
        debug!("socket session open");
        self.token.complete(());
    }

    fn on_message(&self, text: &str) {
        if *self.phase.lock() != Phase::Open {
            trace!("dropping message outside open phase");
            return;
        }
        (self.on_data)(text);
    }

    fn on_closing(&self, code: u16, reason: &str) {
        self.terminate(Error::connection(format!(
            "server is closing the socket: code {code}, reason {reason:?}"
        )));
    }

    fn on_closed(&self, code: u16, reason: &str) {
        self.terminate(Error::connection(format!(
            "socket closed: code {code}, reason {reason:?}"
        )));
    }

    fn on_failure(&self, error: Error) {
        warn!(error = %error, "socket failure");
        self.terminate(Error::connection(format!("socket failure: {error}")));
    }
}

// ============================================================================
// Tests
// ============================================================================
