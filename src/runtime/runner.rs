use crate::orchestrator::Orchestrator;
use crate::runtime::protocol::{ContractDeployer, TxGenerator, TxSender, TxWatcher};
use crate::signal::stop::StopSignal;
use anyhow::{Context, Result};
use tokio::signal;

/// Runs an orchestrator as a long-lived service and handles OS signals for graceful shutdowns.
pub struct Runner<D, G, S, W> {
    orchestrator: Orchestrator<D, G, S, W>,
    shutdown: StopSignal,
}

impl<D, G, S, W> Runner<D, G, S, W>
where
    D: ContractDeployer,
    G: TxGenerator,
    S: TxSender<Tx = G::Tx>,
    W: TxWatcher,
{
    pub fn new(orchestrator: Orchestrator<D, G, S, W>) -> Self {
        Self {
            orchestrator,
            shutdown: StopSignal::new(),
        }
    }

    /// Returns the external stop signal so callers can integrate with their own
    /// signal handlers or cancellation strategies.
    pub fn stop_signal(&self) -> StopSignal {
        self.shutdown.clone()
    }

    /// Runs until a Ctrl-C (SIGINT) is received, the stop signal is closed
    /// elsewhere, or the pipeline finishes on its own.
    pub async fn run_until_ctrl_c(self) -> Result<()> {
        let Self {
            orchestrator,
            shutdown,
        } = self;

        let done = orchestrator
            .run(shutdown.listener())
            .await
            .context("failed to start tx spammer")?;
        tracing::info!("runner started; waiting for Ctrl-C (SIGINT) to initiate shutdown");

        tokio::select! {
            result = signal::ctrl_c() => {
                match result {
                    Ok(()) => tracing::info!("Ctrl-C received; shutting down runner"),
                    Err(err) => tracing::warn!(
                        error = %err,
                        "failed to listen for Ctrl-C; shutting down runner"
                    ),
                }
            }
            _ = done.wait() => {
                tracing::info!("pipeline terminated; runner exiting");
                return Ok(());
            }
        }

        shutdown.close();
        done.wait().await;
        Ok(())
    }
}
