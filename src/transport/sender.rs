//! Ordered send serialization.
//!
//! All outbound writes funnel through a [`SendQueue`]: an unbounded FIFO
//! channel drained by a single worker task. That single consumer is the
//! whole ordering argument — at most one write is in flight at a time, and
//! writes execute in submission order no matter how many tasks call
//! `send()` concurrently.
//!
//! Each enqueued write carries its own completion token. A job whose token
//! was cancelled before the worker reaches it is skipped silently; a
//! provider-level write failure fails that job's token with
//! [`Error::SendFailed`].

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::completion::Completion;
use crate::error::Error;
use crate::transport::provider::SocketHandle;

// ============================================================================
// SendJob
// ============================================================================

/// One queued write.
struct SendJob {
    /// Socket the payload goes to (captured at enqueue time).
    socket: Arc<dyn SocketHandle>,
    /// Payload text.
    payload: String,
    /// Per-send token.
    token: Completion<()>,
}

// ============================================================================
// SendQueue
// ============================================================================

/// Single-worker FIFO write queue.
pub(crate) struct SendQueue {
    tx: mpsc::UnboundedSender<SendJob>,
}

impl SendQueue {
    /// Creates the queue and spawns its worker task.
    ///
    /// Must be called within a Tokio runtime.
    pub(crate) fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_worker(rx));
        Self { tx }
    }

    /// Enqueues a write and returns its token.
    ///
    /// The token completes when the provider accepted the write, fails with
    /// [`Error::SendFailed`] when the provider rejected it, and stays
    /// cancelled if the caller cancels before the worker reaches the job.
    pub(crate) fn enqueue(&self, socket: Arc<dyn SocketHandle>, payload: String) -> Completion<()> {
        let token = Completion::new();
        let job = SendJob {
            socket,
            payload,
            token: token.clone(),
        };
        if self.tx.send(job).is_err() {
            token.fail(Error::send_failed("send worker is not running"));
        }
        token
    }
}

// ============================================================================
// Worker
// ============================================================================

/// Drains the queue one write at a time.
async fn run_worker(mut rx: mpsc::UnboundedReceiver<SendJob>) {
    debug!("send worker started");

    while let Some(job) = rx.recv().await {
        if job.token.is_cancelled() {
            trace!("skipping cancelled send");
            continue;
        }

        match job.socket.write(&job.payload).await {
            Ok(()) => {
                job.token.complete(());
            }
            Err(err) => {
                warn!(error = %err, "socket write failed");
                job.token.fail(Error::send_failed(err.to_string()));
            }
        }
    }

    debug!("send worker terminated");
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use crate::transport::testing::MockSocket;

    #[tokio::test]
    async fn test_sends_execute_in_submission_order() {
        let queue = SendQueue::new();
        let socket = Arc::new(MockSocket::default());
        socket.set_write_delay(Duration::from_millis(10));

        let a = queue.enqueue(socket.clone(), "a".into());
        let b = queue.enqueue(socket.clone(), "b".into());
        let c = queue.enqueue(socket.clone(), "c".into());

        a.wait().await.unwrap();
        b.wait().await.unwrap();
        c.wait().await.unwrap();

        assert_eq!(socket.writes.lock().as_slice(), &["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_at_most_one_write_in_flight() {
        let queue = SendQueue::new();
        let socket = Arc::new(MockSocket::default());
        socket.set_write_delay(Duration::from_millis(5));

        let tokens: Vec<_> = (0..6)
            .map(|i| queue.enqueue(socket.clone(), format!("m{i}")))
            .collect();
        for token in tokens {
            token.wait().await.unwrap();
        }

        assert_eq!(socket.max_in_flight(), 1);
        assert_eq!(socket.writes.lock().len(), 6);
    }

    #[tokio::test]
    async fn test_cancelled_job_is_skipped_silently() {
        let queue = SendQueue::new();
        let socket = Arc::new(MockSocket::default());
        socket.set_write_delay(Duration::from_millis(50));

        let first = queue.enqueue(socket.clone(), "first".into());
        let doomed = queue.enqueue(socket.clone(), "doomed".into());
        doomed.cancel();
        let last = queue.enqueue(socket.clone(), "last".into());

        first.wait().await.unwrap();
        last.wait().await.unwrap();

        assert!(doomed.is_cancelled());
        assert_eq!(socket.writes.lock().as_slice(), &["first", "last"]);
    }

    #[tokio::test]
    async fn test_write_failure_fails_that_token_only() {
        let queue = SendQueue::new();
        let socket = Arc::new(MockSocket::default());
        socket.fail_next_write();

        let failing = queue.enqueue(socket.clone(), "boom".into());
        let healthy = queue.enqueue(socket.clone(), "fine".into());

        let err = failing.wait().await.unwrap_err();
        assert!(matches!(err, Error::SendFailed { .. }));
        healthy.wait().await.unwrap();

        assert_eq!(socket.writes.lock().as_slice(), &["fine"]);
    }

    #[tokio::test]
    async fn test_each_send_gets_its_own_token() {
        let queue = SendQueue::new();
        let socket = Arc::new(MockSocket::default());

        let a = queue.enqueue(socket.clone(), "a".into());
        let b = queue.enqueue(socket.clone(), "b".into());
        a.wait().await.unwrap();
        b.wait().await.unwrap();

        // Cancelling one settled token must not affect the other.
        assert!(!a.cancel());
        assert!(b.is_completed());
    }
}
