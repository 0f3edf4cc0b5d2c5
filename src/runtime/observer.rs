//! Reporting surface of the orchestrator.
//!
//! Mid-run failures never come back through the return value of
//! [`Orchestrator::run`](crate::Orchestrator::run); they are handed to a
//! [`PipelineObserver`] instead. [`TracingObserver`] is the default and turns
//! every event into a `tracing` record.

use crate::orchestrator::state::{PipelineState, ShutdownTrigger};
use crate::runtime::protocol::{StageError, StageKind};
use std::time::Duration;

pub trait PipelineObserver: Send + Sync + 'static {
    fn on_state_change(&self, from: PipelineState, to: PipelineState);

    /// Called once per stage error received by the orchestrator.
    fn on_stage_error(&self, error: &StageError);

    fn on_shutdown(&self, trigger: ShutdownTrigger);

    /// `closed` is false when the stop signal had already been closed.
    fn on_stop_issued(&self, stage: StageKind, closed: bool);

    fn on_drain_timeout(&self, stage: StageKind, waited: Duration);

    fn on_terminated(&self);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn on_state_change(&self, from: PipelineState, to: PipelineState) {
        tracing::debug!(?from, ?to, "pipeline state transition");
    }

    fn on_stage_error(&self, error: &StageError) {
        tracing::error!(
            stage = %error.stage(),
            error = %error,
            "stage error; pipeline is shutting down"
        );
    }

    fn on_shutdown(&self, trigger: ShutdownTrigger) {
        match trigger {
            ShutdownTrigger::ExternalStop => tracing::info!("shutting down tx spammer"),
            ShutdownTrigger::GeneratorFinished => {
                tracing::info!("tx generator finished; draining sender")
            }
            ShutdownTrigger::SenderFinished => tracing::info!("tx sender finished"),
            ShutdownTrigger::GeneratorError | ShutdownTrigger::SenderError => {
                tracing::warn!(?trigger, "stage failure; initiating ordered shutdown")
            }
        }
    }

    fn on_stop_issued(&self, stage: StageKind, closed: bool) {
        if closed {
            tracing::debug!(%stage, "stop signal issued");
        } else {
            tracing::trace!(%stage, "stop signal already closed");
        }
    }

    fn on_drain_timeout(&self, stage: StageKind, waited: Duration) {
        tracing::warn!(
            %stage,
            waited_ms = waited.as_millis() as u64,
            "stage did not finish draining in time; continuing shutdown"
        );
    }

    fn on_terminated(&self) {
        tracing::info!("tx spammer stopped");
    }
}
