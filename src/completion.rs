//! Cancellable completion tokens.
//!
//! Every asynchronous operation on the transport returns a [`Completion`]:
//! a handle that settles exactly once as completed, failed, or cancelled.
//! The creator resolves it; any holder may cancel it or await it.
//!
//! # State Machine
//!
//! ```text
//!             complete(v)
//!           ┌────────────► Completed(v)
//!           │
//! Pending ──┼─ fail(e) ──► Failed(e)
//!           │
//!           └─ cancel() ─► Cancelled
//! ```
//!
//! Transitions are monotonic: the first terminal transition wins, every
//! later transition is a no-op. This holds under concurrent callers.
//!
//! # Cancellation
//!
//! A single cancel handler can be registered with
//! [`on_cancel`](Completion::on_cancel). [`cancel`](Completion::cancel) runs
//! it synchronously, exactly once, and only if the token was still pending.
//! After any terminal state the handler slot is dropped and the token is
//! inert.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::error::{Error, Result};

// ============================================================================
// Types
// ============================================================================

/// Cancel handler callback type.
///
/// Invoked at most once, synchronously, from within [`Completion::cancel`].
type CancelHandler = Box<dyn FnOnce() + Send>;

/// Observable state of a [`Completion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionState {
    /// Not yet settled.
    Pending,
    /// Settled with a value.
    Completed,
    /// Settled with an error.
    Failed,
    /// Cancelled before settling.
    Cancelled,
}

// ============================================================================
// Internal State
// ============================================================================

enum State<T> {
    Pending,
    Completed(T),
    Failed(Error),
    Cancelled,
}

struct Slot<T> {
    state: State<T>,
    on_cancel: Option<CancelHandler>,
}

struct Inner<T> {
    slot: Mutex<Slot<T>>,
    /// Flipped to `true` on the terminal transition; wakes `wait()`ers.
    done: watch::Sender<bool>,
}

// ============================================================================
// Completion
// ============================================================================

/// A cancellable asynchronous result handle.
///
/// Cheap to clone; all clones observe the same state. The clone held by the
/// operation resolves it, the clone returned to the caller awaits or cancels
/// it.
///
/// # Thread Safety
///
/// All operations are safe under concurrent invocation from multiple
/// threads; exactly one terminal transition wins.
pub struct Completion<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Completion<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for Completion<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Completion<T> {
    /// Creates a new pending completion.
    #[must_use]
    pub fn new() -> Self {
        let (done, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                slot: Mutex::new(Slot {
                    state: State::Pending,
                    on_cancel: None,
                }),
                done,
            }),
        }
    }

    /// Creates a completion that is already failed.
    ///
    /// Used for synchronous failure paths that must still hand the caller a
    /// token, such as a send without an open socket.
    #[must_use]
    pub fn failed(error: Error) -> Self {
        let completion = Self::new();
        completion.fail(error);
        completion
    }

    /// Settles the token with a value.
    ///
    /// Returns `true` if this call performed the transition; `false` if the
    /// token was already terminal (the value is dropped).
    pub fn complete(&self, value: T) -> bool {
        let dropped_handler;
        {
            let mut slot = self.inner.slot.lock();
            if !matches!(slot.state, State::Pending) {
                return false;
            }
            slot.state = State::Completed(value);
            dropped_handler = slot.on_cancel.take();
        }
        // Handler is released outside the lock and never invoked.
        drop(dropped_handler);
        self.inner.done.send_replace(true);
        true
    }

    /// Settles the token with an error.
    ///
    /// Returns `true` if this call performed the transition; `false` if the
    /// token was already terminal.
    pub fn fail(&self, error: Error) -> bool {
        let dropped_handler;
        {
            let mut slot = self.inner.slot.lock();
            if !matches!(slot.state, State::Pending) {
                return false;
            }
            slot.state = State::Failed(error);
            dropped_handler = slot.on_cancel.take();
        }
        drop(dropped_handler);
        self.inner.done.send_replace(true);
        true
    }

    /// Cancels the token.
    ///
    /// Transitions Pending → Cancelled and invokes the registered cancel
    /// handler exactly once, synchronously, on the calling thread. A no-op
    /// returning `false` if the token was already terminal.
    pub fn cancel(&self) -> bool {
        let handler;
        {
            let mut slot = self.inner.slot.lock();
            if !matches!(slot.state, State::Pending) {
                return false;
            }
            slot.state = State::Cancelled;
            handler = slot.on_cancel.take();
        }
        if let Some(handler) = handler {
            handler();
        }
        self.inner.done.send_replace(true);
        true
    }

    /// Registers the cancel handler.
    ///
    /// The slot holds a single handler: registering again replaces the
    /// previous one. Registration after any terminal state is a no-op — in
    /// particular, a handler registered after cancellation never runs.
    pub fn on_cancel(&self, handler: impl FnOnce() + Send + 'static) {
        let mut slot = self.inner.slot.lock();
        if matches!(slot.state, State::Pending) {
            slot.on_cancel = Some(Box::new(handler));
        }
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> CompletionState {
        match self.inner.slot.lock().state {
            State::Pending => CompletionState::Pending,
            State::Completed(_) => CompletionState::Completed,
            State::Failed(_) => CompletionState::Failed,
            State::Cancelled => CompletionState::Cancelled,
        }
    }

    /// Returns `true` if the token is not yet settled.
    #[inline]
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.state() == CompletionState::Pending
    }

    /// Returns `true` if the token settled with a value.
    #[inline]
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.state() == CompletionState::Completed
    }

    /// Returns `true` if the token settled with an error.
    #[inline]
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.state() == CompletionState::Failed
    }

    /// Returns `true` if the token was cancelled.
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.state() == CompletionState::Cancelled
    }

    /// Returns `true` if the token reached any terminal state.
    #[inline]
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.state() != CompletionState::Pending
    }
}

// ============================================================================
// Completion - Awaiting
// ============================================================================

impl<T: Clone> Completion<T> {
    /// Returns the outcome if the token is terminal, `None` while pending.
    ///
    /// A cancelled token yields `Err(`[`Error::Cancelled`]`)`.
    #[must_use]
    pub fn try_result(&self) -> Option<Result<T>> {
        let slot = self.inner.slot.lock();
        match &slot.state {
            State::Pending => None,
            State::Completed(value) => Some(Ok(value.clone())),
            State::Failed(error) => Some(Err(error.clone())),
            State::Cancelled => Some(Err(Error::Cancelled)),
        }
    }

    /// Waits for the token to settle and returns the outcome.
    ///
    /// Multiple waiters are supported; each receives a clone of the value
    /// or error.
    pub async fn wait(&self) -> Result<T> {
        // Subscribe before the first peek so a transition between the peek
        // and the await still flips the watch version we observe.
        let mut done = self.inner.done.subscribe();
        loop {
            if let Some(outcome) = self.try_result() {
                return outcome;
            }
            if done.changed().await.is_err() {
                // Unreachable while `self` is alive: `inner` owns the sender.
                return Err(Error::Cancelled);
            }
        }
    }
}

impl<T> std::fmt::Debug for Completion<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Completion")
            .field("state", &self.state())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_new_is_pending() {
        let token: Completion<u32> = Completion::new();
        assert!(token.is_pending());
        assert!(!token.is_settled());
        assert!(token.try_result().is_none());
    }

    #[test]
    fn test_complete_wins_once() {
        let token = Completion::new();
        assert!(token.complete(7));
        assert!(!token.complete(8));
        assert!(token.is_completed());
        assert_eq!(token.try_result().unwrap().unwrap(), 7);
    }

    #[test]
    fn test_fail_is_terminal() {
        let token: Completion<()> = Completion::new();
        assert!(token.fail(Error::send_failed("pipe")));
        assert!(!token.complete(()));
        assert!(!token.cancel());
        assert!(token.is_failed());
        let err = token.try_result().unwrap().unwrap_err();
        assert!(err.is_send_error());
    }

    #[test]
    fn test_cancel_runs_handler_once() {
        let token: Completion<()> = Completion::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        token.on_cancel(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(token.cancel());
        assert!(!token.cancel());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_cancel_after_complete_is_noop() {
        let token = Completion::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        token.on_cancel(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(token.complete(1));
        assert!(!token.cancel());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(token.is_completed());
    }

    #[test]
    fn test_handler_registered_after_cancel_never_runs() {
        let token: Completion<()> = Completion::new();
        token.cancel();

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        token.on_cancel(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_second_handler_replaces_first() {
        let token: Completion<()> = Completion::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let first = Arc::clone(&calls);
        token.on_cancel(move || {
            first.fetch_add(100, Ordering::SeqCst);
        });
        let second = Arc::clone(&calls);
        token.on_cancel(move || {
            second.fetch_add(1, Ordering::SeqCst);
        });

        token.cancel();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_constructor() {
        let token: Completion<()> = Completion::failed(Error::SendUnavailable);
        assert!(token.is_failed());
        assert!(matches!(
            token.try_result(),
            Some(Err(Error::SendUnavailable))
        ));
    }

    #[test]
    fn test_clones_share_state() {
        let token = Completion::new();
        let observer = token.clone();
        token.complete("done");
        assert!(observer.is_completed());
    }

    #[test]
    fn test_concurrent_transitions_single_winner() {
        let token: Completion<usize> = Completion::new();
        let wins = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let token = token.clone();
                let wins = Arc::clone(&wins);
                std::thread::spawn(move || {
                    let won = match i % 3 {
                        0 => token.complete(i),
                        1 => token.fail(Error::connection("race")),
                        _ => token.cancel(),
                    };
                    if won {
                        wins.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(wins.load(Ordering::SeqCst), 1);
        assert!(token.is_settled());
    }

    #[test]
    fn test_wait_is_pending_until_settled() {
        use tokio_test::{assert_pending, assert_ready};

        let token: Completion<u32> = Completion::new();
        let mut wait = tokio_test::task::spawn(token.wait());
        assert_pending!(wait.poll());

        token.complete(5);
        assert!(wait.is_woken());
        let outcome = assert_ready!(wait.poll());
        assert_eq!(outcome.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_wait_resolves_on_complete() {
        let token = Completion::new();
        let waiter = token.clone();

        let task = tokio::spawn(async move { waiter.wait().await });
        tokio::task::yield_now().await;
        token.complete(42);

        assert_eq!(task.await.unwrap().unwrap(), 42);
    }

    #[tokio::test]
    async fn test_wait_on_settled_token_returns_immediately() {
        let token = Completion::new();
        token.complete("abc");
        assert_eq!(token.wait().await.unwrap(), "abc");
    }

    #[tokio::test]
    async fn test_wait_on_cancelled_token() {
        let token: Completion<()> = Completion::new();
        token.cancel();
        assert!(matches!(token.wait().await, Err(Error::Cancelled)));
    }

    #[tokio::test]
    async fn test_multiple_waiters_observe_same_outcome() {
        let token: Completion<()> = Completion::new();
        let first = token.clone();
        let second = token.clone();

        let a = tokio::spawn(async move { first.wait().await });
        let b = tokio::spawn(async move { second.wait().await });
        tokio::task::yield_now().await;
        token.fail(Error::abort("refused"));

        for outcome in [a.await.unwrap(), b.await.unwrap()] {
            assert!(matches!(outcome, Err(Error::Abort { .. })));
        }
    }
}
