//! Mock providers shared by the transport test modules.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Semaphore;

use crate::error::{Error, Result};
use crate::transport::provider::{
    HttpClient, HttpMethod, HttpResponse, SocketHandle, SocketListener, SocketProvider,
};

// ============================================================================
// MockSocket
// ============================================================================

/// Socket handle that records writes and closes.
#[derive(Default)]
pub(crate) struct MockSocket {
    /// Accepted writes, in execution order.
    pub(crate) writes: Mutex<Vec<String>>,
    /// Close calls as `(code, reason)`.
    pub(crate) closes: Mutex<Vec<(u16, String)>>,
    /// Fail the next write instead of recording it.
    fail_next: AtomicBool,
    /// Artificial write latency.
    write_delay: Mutex<Option<Duration>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockSocket {
    /// Makes every write sleep for `delay` before settling.
    pub(crate) fn set_write_delay(&self, delay: Duration) {
        *self.write_delay.lock() = Some(delay);
    }

    /// Makes the next write fail with a provider error.
    pub(crate) fn fail_next_write(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Highest number of writes observed concurrently in flight.
    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SocketHandle for MockSocket {
    async fn write(&self, text: &str) -> Result<()> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let delay = *self.write_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let result = if self.fail_next.swap(false, Ordering::SeqCst) {
            Err(Error::web_socket("mock write failure"))
        } else {
            self.writes.lock().push(text.to_owned());
            Ok(())
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn close(&self, code: u16, reason: &str) {
        self.closes.lock().push((code, reason.to_owned()));
    }
}

// ============================================================================
// MockSocketProvider
// ============================================================================

/// Record of one `open` call.
#[derive(Clone)]
pub(crate) struct OpenedSocket {
    pub(crate) url: String,
    pub(crate) listener: Arc<dyn SocketListener>,
    pub(crate) socket: Arc<MockSocket>,
}

/// Provider handing out [`MockSocket`]s and exposing the listeners.
#[derive(Default)]
pub(crate) struct MockSocketProvider {
    opened: Mutex<Vec<OpenedSocket>>,
}

impl MockSocketProvider {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Number of sockets opened so far.
    pub(crate) fn open_count(&self) -> usize {
        self.opened.lock().len()
    }

    /// The `n`th opened socket.
    pub(crate) fn opened(&self, index: usize) -> OpenedSocket {
        self.opened.lock()[index].clone()
    }

    /// The most recently opened socket.
    pub(crate) fn last(&self) -> OpenedSocket {
        self.opened.lock().last().expect("no socket opened").clone()
    }
}

impl SocketProvider for MockSocketProvider {
    fn open(&self, url: &str, listener: Arc<dyn SocketListener>) -> Arc<dyn SocketHandle> {
        let socket = Arc::new(MockSocket::default());
        self.opened.lock().push(OpenedSocket {
            url: url.to_owned(),
            listener,
            socket: Arc::clone(&socket),
        });
        socket
    }
}

// ============================================================================
// MockHttpClient
// ============================================================================

/// Record of one HTTP request.
pub(crate) struct RecordedRequest {
    pub(crate) method: HttpMethod,
    pub(crate) url: String,
    pub(crate) body: Option<String>,
}

/// HTTP client with scripted responses and a request log.
///
/// Without scripted responses every request answers `200` with an empty
/// body. A gated client holds each request in flight until the test adds a
/// permit, which is how single-flight behavior is observed.
pub(crate) struct MockHttpClient {
    responses: Mutex<VecDeque<Result<HttpResponse>>>,
    pub(crate) requests: Mutex<Vec<RecordedRequest>>,
    gate: Option<Arc<Semaphore>>,
}

impl MockHttpClient {
    pub(crate) fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// Creates a client whose requests block until permits are added.
    pub(crate) fn gated() -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let client = Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            gate: Some(Arc::clone(&gate)),
        };
        (client, gate)
    }

    /// Scripts the response for the next request.
    pub(crate) fn push_response(&self, response: Result<HttpResponse>) {
        self.responses.lock().push_back(response);
    }

    /// Number of requests observed so far (including in-flight ones).
    pub(crate) fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn request(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<String>,
    ) -> Result<HttpResponse> {
        self.requests.lock().push(RecordedRequest {
            method,
            url: url.to_owned(),
            body,
        });

        if let Some(gate) = &self.gate {
            let permit = gate
                .acquire()
                .await
                .map_err(|_| Error::http("mock gate closed"))?;
            permit.forget();
        }

        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| {
                Ok(HttpResponse {
                    status: 200,
                    body: String::new(),
                })
            })
    }
}
