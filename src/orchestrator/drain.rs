use crate::signal::completion::Completion;
use std::time::Duration;
use tokio::time;

/// Outcome of waiting for a stopped stage to finish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DrainOutcome {
    Completed,
    TimedOut(Duration),
}

/// Waits for `done` to fire, bounded by `limit` when one is configured.
pub(crate) async fn drain(done: &Completion, limit: Option<Duration>) -> DrainOutcome {
    let Some(limit) = limit else {
        done.wait().await;
        return DrainOutcome::Completed;
    };

    match time::timeout(limit, done.wait()).await {
        Ok(()) => DrainOutcome::Completed,
        Err(_) => DrainOutcome::TimedOut(limit),
    }
}
