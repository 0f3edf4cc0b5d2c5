//! Run-scoped resources: the three stage stop signals and the metrics reporter.

use crate::runtime::observer::PipelineObserver;
use crate::runtime::protocol::StageKind;
use crate::runtime::telemetry::{self, Telemetry};
use crate::signal::stop::{StopListener, StopSignal};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Stages that run concurrently and can be told to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Stoppable {
    Generator,
    Sender,
    Watcher,
}

impl Stoppable {
    pub(crate) fn stage(self) -> StageKind {
        match self {
            Stoppable::Generator => StageKind::Generator,
            Stoppable::Sender => StageKind::Sender,
            Stoppable::Watcher => StageKind::Watcher,
        }
    }
}

/// Stop signals owned by the orchestrator, one per running stage.
#[derive(Debug, Default)]
struct StageStops {
    generator: StopSignal,
    sender: StopSignal,
    watcher: StopSignal,
}

impl StageStops {
    fn signal(&self, stage: Stoppable) -> &StopSignal {
        match stage {
            Stoppable::Generator => &self.generator,
            Stoppable::Sender => &self.sender,
            Stoppable::Watcher => &self.watcher,
        }
    }
}

pub(crate) struct RunLifecycle {
    stops: StageStops,
    observer: Arc<dyn PipelineObserver>,
    telemetry: Arc<Telemetry>,
    run_token: CancellationToken,
    metrics_handle: Option<JoinHandle<()>>,
}

impl RunLifecycle {
    pub(crate) fn spawn(
        observer: Arc<dyn PipelineObserver>,
        telemetry: Arc<Telemetry>,
        metrics_interval: Duration,
    ) -> Self {
        let run_token = CancellationToken::new();
        let metrics_handle = telemetry::spawn_metrics_reporter(
            telemetry.clone(),
            run_token.clone(),
            metrics_interval,
        );
        Self {
            stops: StageStops::default(),
            observer,
            telemetry,
            run_token,
            metrics_handle: Some(metrics_handle),
        }
    }

    pub(crate) fn listener(&self, stage: Stoppable) -> StopListener {
        self.stops.signal(stage).listener()
    }

    pub(crate) fn observer(&self) -> &Arc<dyn PipelineObserver> {
        &self.observer
    }

    pub(crate) fn telemetry(&self) -> &Arc<Telemetry> {
        &self.telemetry
    }

    /// Closes the stop signal of `stage`. Safe to call any number of times.
    pub(crate) fn issue_stop(&self, stage: Stoppable) -> bool {
        let closed = self.stops.signal(stage).close();
        self.telemetry.record_stop(closed);
        self.observer.on_stop_issued(stage.stage(), closed);
        closed
    }

    pub(crate) async fn shutdown(mut self) {
        self.run_token.cancel();
        if let Some(handle) = self.metrics_handle.take() {
            if let Err(err) = handle.await {
                tracing::warn!(error = %err, "metrics reporter task panicked");
            }
        }
    }
}
