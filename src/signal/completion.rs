use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Creates a linked completion pair. The stage keeps the guard for the lifetime
/// of its loop; the orchestrator keeps the [`Completion`].
pub fn completion_channel() -> (CompletionGuard, Completion) {
    let token = Arc::new(CancellationToken::new());
    (
        CompletionGuard {
            token: token.clone(),
        },
        Completion { token },
    )
}

/// Stage-owned side of a completion signal.
///
/// Dropping the guard fires the completion, so a stage task that returns early
/// or unwinds still reports that its loop exited.
#[derive(Debug)]
pub struct CompletionGuard {
    token: Arc<CancellationToken>,
}

impl CompletionGuard {
    /// Fires the completion now. Equivalent to dropping the guard.
    pub fn complete(self) {}
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Observer side of a completion signal. Fires exactly once and stays fired.
#[derive(Clone, Debug)]
pub struct Completion {
    token: Arc<CancellationToken>,
}

impl Completion {
    /// A completion that has already fired.
    pub fn fired() -> Self {
        let (guard, completion) = completion_channel();
        guard.complete();
        completion
    }

    pub fn is_complete(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Waits for the completion to fire. Can be awaited any number of times.
    pub async fn wait(&self) {
        self.token.cancelled().await;
    }
}
