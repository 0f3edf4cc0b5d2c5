//! The shutdown coordination loop.
//!
//! A single task multiplexes stage errors, stage completions and the external
//! stop request with `tokio::select!` (random branch order, so simultaneously
//! ready sources are picked fairly). Stops always go out in the order
//! generator, sender, watcher.

use super::drain::{drain, DrainOutcome};
use super::lifecycle::{RunLifecycle, Stoppable};
use super::state::{PipelineState, ShutdownTrigger, StateTracker};
use crate::runtime::protocol::StageError;
use crate::signal::completion::Completion;
use crate::signal::errors::ErrorSignal;
use crate::signal::stop::StopListener;
use std::time::Duration;

pub(crate) struct CoordinatorParams {
    pub lifecycle: RunLifecycle,
    pub external_stop: StopListener,
    pub generator_done: Completion,
    pub generator_errors: ErrorSignal,
    pub sender_done: Completion,
    pub sender_errors: ErrorSignal,
    pub drain_timeout: Option<Duration>,
}

pub(crate) struct Coordinator {
    lifecycle: RunLifecycle,
    external_stop: StopListener,
    generator_done: Completion,
    generator_errors: ErrorSignal,
    sender_done: Completion,
    sender_errors: ErrorSignal,
    drain_timeout: Option<Duration>,
    state: StateTracker,
}

enum Event {
    StageFailed(StageError, ShutdownTrigger),
    ExternalStop,
    GeneratorFinished,
    SenderFinished,
}

impl Coordinator {
    pub(crate) fn new(params: CoordinatorParams) -> Self {
        let CoordinatorParams {
            lifecycle,
            external_stop,
            generator_done,
            generator_errors,
            sender_done,
            sender_errors,
            drain_timeout,
        } = params;
        let state = StateTracker::new(lifecycle.observer().clone());

        Self {
            lifecycle,
            external_stop,
            generator_done,
            generator_errors,
            sender_done,
            sender_errors,
            drain_timeout,
            state,
        }
    }

    /// Runs until the pipeline is terminated.
    pub(crate) async fn run(mut self) {
        let mut generator_finished = false;
        let mut generator_errors_open = true;
        let mut sender_errors_open = true;

        loop {
            let event = tokio::select! {
                error = self.generator_errors.recv(), if generator_errors_open => match error {
                    Some(error) => Event::StageFailed(error, ShutdownTrigger::GeneratorError),
                    None => {
                        generator_errors_open = false;
                        continue;
                    }
                },
                error = self.sender_errors.recv(), if sender_errors_open => match error {
                    Some(error) => Event::StageFailed(error, ShutdownTrigger::SenderError),
                    None => {
                        sender_errors_open = false;
                        continue;
                    }
                },
                _ = self.external_stop.stopped() => Event::ExternalStop,
                _ = self.sender_done.wait() => Event::SenderFinished,
                _ = self.generator_done.wait(), if !generator_finished => Event::GeneratorFinished,
            };

            match event {
                Event::StageFailed(error, trigger) => {
                    self.report_error(&error);
                    self.ordered_shutdown(trigger).await;
                    break;
                }
                Event::ExternalStop => {
                    self.ordered_shutdown(ShutdownTrigger::ExternalStop).await;
                    break;
                }
                Event::SenderFinished => {
                    self.lifecycle
                        .observer()
                        .on_shutdown(ShutdownTrigger::SenderFinished);
                    if !generator_finished {
                        // Nothing consumes the generator's output anymore.
                        self.lifecycle.issue_stop(Stoppable::Generator);
                    }
                    self.lifecycle.issue_stop(Stoppable::Watcher);
                    self.state.advance(PipelineState::Terminated);
                    break;
                }
                Event::GeneratorFinished => {
                    generator_finished = true;
                    self.lifecycle
                        .observer()
                        .on_shutdown(ShutdownTrigger::GeneratorFinished);
                    self.lifecycle.issue_stop(Stoppable::Sender);
                }
            }
        }

        self.finish().await;
    }

    async fn ordered_shutdown(&mut self, trigger: ShutdownTrigger) {
        debug_assert!(trigger.is_fatal());
        self.lifecycle.observer().on_shutdown(trigger);

        self.state.advance(PipelineState::DrainingGenerator);
        self.lifecycle.issue_stop(Stoppable::Generator);
        self.await_stage(Stoppable::Generator).await;

        self.state.advance(PipelineState::DrainingSender);
        self.lifecycle.issue_stop(Stoppable::Sender);
        self.await_stage(Stoppable::Sender).await;

        self.lifecycle.issue_stop(Stoppable::Watcher);
        self.state.advance(PipelineState::Terminated);
    }

    async fn await_stage(&self, stage: Stoppable) {
        let done = match stage {
            Stoppable::Generator => &self.generator_done,
            Stoppable::Sender => &self.sender_done,
            Stoppable::Watcher => return,
        };

        if let DrainOutcome::TimedOut(waited) = drain(done, self.drain_timeout).await {
            self.lifecycle
                .observer()
                .on_drain_timeout(stage.stage(), waited);
        }
    }

    fn report_error(&self, error: &StageError) {
        self.lifecycle.telemetry().record_stage_error();
        self.lifecycle.observer().on_stage_error(error);
    }

    async fn finish(mut self) {
        debug_assert_eq!(self.state.current(), PipelineState::Terminated);

        // Errors that raced with the shutdown are still reported once.
        while let Some(error) = self.generator_errors.try_recv() {
            self.report_error(&error);
        }
        while let Some(error) = self.sender_errors.try_recv() {
            self.report_error(&error);
        }

        self.lifecycle.telemetry().record_shutdown();
        self.lifecycle.observer().on_terminated();
        self.lifecycle.shutdown().await;
    }
}
