use super::coordinator::{Coordinator, CoordinatorParams};
use super::lifecycle::{RunLifecycle, Stoppable};
use crate::runtime::config::{PipelineConfig, PipelineSpec};
use crate::runtime::observer::{PipelineObserver, TracingObserver};
use crate::runtime::protocol::{
    ContractDeployer, GeneratorOutput, SenderOutput, TxGenerator, TxSender, TxWatcher,
};
use crate::runtime::telemetry::Telemetry;
use crate::signal::completion::{completion_channel, Completion};
use crate::signal::stop::StopListener;
use anyhow::Error as AnyError;
use std::sync::Arc;

#[derive(Debug)]
pub enum PipelineError {
    /// The deployer failed; no stage was started.
    Deployment(AnyError),
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::Deployment(err) => write!(f, "contract deployment error: {err}"),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Deployment(err) => Some(err.as_ref()),
        }
    }
}

/// Wires the deployer, generator, sender and watcher into one pipeline run.
///
/// The orchestrator is consumed by [`Orchestrator::run`]; every signal it
/// creates lives for exactly one run.
pub struct Orchestrator<D, G, S, W> {
    config: Arc<PipelineConfig>,
    deployer: D,
    generator: G,
    sender: S,
    watcher: W,
    observer: Arc<dyn PipelineObserver>,
    telemetry: Arc<Telemetry>,
}

impl<D, G, S, W> Orchestrator<D, G, S, W>
where
    D: ContractDeployer,
    G: TxGenerator,
    S: TxSender<Tx = G::Tx>,
    W: TxWatcher,
{
    pub fn new(config: PipelineConfig, deployer: D, generator: G, sender: S, watcher: W) -> Self {
        Self {
            config: Arc::new(config),
            deployer,
            generator,
            sender,
            watcher,
            observer: Arc::new(TracingObserver),
            telemetry: Arc::new(Telemetry::default()),
        }
    }

    /// Replaces the default [`TracingObserver`].
    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Returns a clone of the telemetry handle shared with the stages.
    pub fn telemetry(&self) -> Arc<Telemetry> {
        self.telemetry.clone()
    }

    /// Deploys the target contracts, starts the watcher, generator and sender,
    /// and hands back the aggregate completion.
    ///
    /// Only a deployment failure is returned. Once the stages are running, any
    /// stage error or `external_stop` leads to an ordered shutdown that is
    /// reported through the observer; the completion fires when it is done.
    pub async fn run(self, external_stop: StopListener) -> Result<Completion, PipelineError> {
        let Self {
            config,
            mut deployer,
            generator,
            sender,
            watcher,
            observer,
            telemetry,
        } = self;

        debug_assert!(
            config.validate().is_ok(),
            "PipelineConfig should have been validated at construction time"
        );

        let targets = deployer
            .deploy(&config)
            .await
            .map_err(PipelineError::Deployment)?;
        tracing::info!(
            contracts = targets.len(),
            rpc_url = config.rpc_url(),
            "target contracts deployed; starting tx spammer"
        );

        let spec = Arc::new(PipelineSpec::new(
            config.clone(),
            targets,
            telemetry.clone(),
        ));
        let lifecycle = RunLifecycle::spawn(observer, telemetry, config.metrics_interval());

        let pending = watcher.start(spec.clone(), lifecycle.listener(Stoppable::Watcher));
        let GeneratorOutput {
            done: generator_done,
            transactions,
            errors: generator_errors,
        } = generator.start(spec.clone(), lifecycle.listener(Stoppable::Generator));
        let SenderOutput {
            done: sender_done,
            errors: sender_errors,
        } = sender.start(
            spec,
            lifecycle.listener(Stoppable::Sender),
            transactions,
            pending,
        );

        let coordinator = Coordinator::new(CoordinatorParams {
            lifecycle,
            external_stop,
            generator_done,
            generator_errors,
            sender_done,
            sender_errors,
            drain_timeout: config.drain_timeout(),
        });

        let (guard, completion) = completion_channel();
        tokio::spawn(async move {
            let _guard = guard;
            coordinator.run().await;
        });

        Ok(completion)
    }
}
