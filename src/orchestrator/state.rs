use crate::runtime::observer::PipelineObserver;
use std::sync::Arc;

/// Shutdown state machine of a single pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Running,
    DrainingGenerator,
    DrainingSender,
    Terminated,
}

/// Event that moved the pipeline towards shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownTrigger {
    GeneratorError,
    SenderError,
    ExternalStop,
    /// The generator exhausted its workload; the sender is told to drain.
    GeneratorFinished,
    /// The sender exited on its own; the run ends without a drain.
    SenderFinished,
}

impl ShutdownTrigger {
    /// Triggers that start the full ordered drain.
    pub fn is_fatal(self) -> bool {
        matches!(
            self,
            ShutdownTrigger::GeneratorError
                | ShutdownTrigger::SenderError
                | ShutdownTrigger::ExternalStop
        )
    }
}

/// Tracks the current state and reports every transition exactly once.
pub(crate) struct StateTracker {
    current: PipelineState,
    observer: Arc<dyn PipelineObserver>,
}

impl StateTracker {
    pub(crate) fn new(observer: Arc<dyn PipelineObserver>) -> Self {
        Self {
            current: PipelineState::Running,
            observer,
        }
    }

    pub(crate) fn current(&self) -> PipelineState {
        self.current
    }

    pub(crate) fn advance(&mut self, next: PipelineState) {
        if self.current == next {
            return;
        }
        debug_assert!(
            self.current != PipelineState::Terminated,
            "terminated pipeline cannot change state"
        );
        self.observer.on_state_change(self.current, next);
        self.current = next;
    }
}
