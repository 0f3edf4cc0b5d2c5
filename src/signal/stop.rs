use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Single-use, broadcast stop request.
///
/// Clones share the same underlying state, so the orchestrator can keep one
/// handle to close while stages hold clones to observe. Closing is idempotent:
/// only the first [`StopSignal::close`] call reports `true`, every later or
/// concurrent call is a no-op returning `false`.
#[derive(Clone, Debug, Default)]
pub struct StopSignal {
    inner: Arc<StopInner>,
}

#[derive(Debug, Default)]
struct StopInner {
    closed: AtomicBool,
    token: CancellationToken,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Closes the signal. Returns whether this call performed the close.
    pub fn close(&self) -> bool {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.inner.token.cancel();
        true
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Resolves once the signal has been closed. Resolves immediately if it
    /// already was.
    pub async fn closed(&self) {
        self.inner.token.cancelled().await;
    }

    /// Token view of the signal for APIs that take a [`CancellationToken`].
    ///
    /// The token is a child, so cancelling it does not close this signal.
    pub fn token(&self) -> CancellationToken {
        self.inner.token.child_token()
    }

    /// Observe-only handle handed to stages. Stages never close their own
    /// stop signal.
    pub fn listener(&self) -> StopListener {
        StopListener {
            inner: self.inner.clone(),
        }
    }
}

/// Read-only view of a [`StopSignal`].
#[derive(Clone, Debug)]
pub struct StopListener {
    inner: Arc<StopInner>,
}

impl StopListener {
    pub fn is_stopped(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    pub async fn stopped(&self) {
        self.inner.token.cancelled().await;
    }

    pub fn token(&self) -> CancellationToken {
        self.inner.token.child_token()
    }
}
