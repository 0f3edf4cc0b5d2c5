use crate::runtime::protocol::{StageError, StageKind};
use anyhow::Error as AnyError;
use tokio::sync::mpsc::{self, error::TrySendError};

/// Creates a bounded error conduit for `stage` holding at most `capacity`
/// undelivered errors.
pub fn error_channel(stage: StageKind, capacity: usize) -> (ErrorReporter, ErrorSignal) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (ErrorReporter { stage, tx }, ErrorSignal { rx })
}

/// Stage-side handle used to surface fatal errors to the orchestrator.
#[derive(Clone, Debug)]
pub struct ErrorReporter {
    stage: StageKind,
    tx: mpsc::Sender<StageError>,
}

impl ErrorReporter {
    pub fn stage(&self) -> StageKind {
        self.stage
    }

    /// Reports an error without blocking. Returns `false` when the error was
    /// dropped because the buffer is full or the orchestrator is gone.
    pub fn report(&self, error: AnyError) -> bool {
        match self.tx.try_send(StageError::new(self.stage, error)) {
            Ok(()) => true,
            Err(TrySendError::Full(dropped)) => {
                tracing::warn!(
                    stage = ?self.stage,
                    error = %dropped,
                    "error buffer full; dropping stage error"
                );
                false
            }
            Err(TrySendError::Closed(dropped)) => {
                tracing::debug!(
                    stage = ?self.stage,
                    error = %dropped,
                    "orchestrator no longer listening; dropping stage error"
                );
                false
            }
        }
    }
}

/// Orchestrator-side end of an error conduit.
///
/// `None` from [`ErrorSignal::recv`] means every reporter was dropped, i.e. no
/// further errors can arrive. It is not an error by itself.
#[derive(Debug)]
pub struct ErrorSignal {
    rx: mpsc::Receiver<StageError>,
}

impl ErrorSignal {
    pub async fn recv(&mut self) -> Option<StageError> {
        self.rx.recv().await
    }

    pub(crate) fn try_recv(&mut self) -> Option<StageError> {
        self.rx.try_recv().ok()
    }
}
