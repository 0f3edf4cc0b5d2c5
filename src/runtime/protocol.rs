use crate::runtime::config::{PipelineConfig, PipelineSpec};
use crate::signal::completion::Completion;
use crate::signal::errors::ErrorSignal;
use crate::signal::stop::StopListener;
use alloy_primitives::{Address, B256};
use anyhow::Error as AnyError;
use core::future::Future;
use core::pin::Pin;
use std::sync::Arc;
use tokio::sync::mpsc;

pub type DeployFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<Address>, AnyError>> + Send + 'a>>;

/// FIFO stream of transactions from the generator to the sender.
pub type TxStream<T> = mpsc::Receiver<T>;

/// Stream of transaction status updates from the watcher to the sender.
pub type PendingStream = mpsc::Receiver<PendingTx>;

/// Identifies one of the pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    Deployer,
    Generator,
    Sender,
    Watcher,
}

impl core::fmt::Display for StageKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            StageKind::Deployer => "deployer",
            StageKind::Generator => "generator",
            StageKind::Sender => "sender",
            StageKind::Watcher => "watcher",
        };
        f.write_str(name)
    }
}

/// Error surfaced by a running stage. Every instance is pipeline-fatal.
#[derive(Debug)]
pub struct StageError {
    stage: StageKind,
    source: AnyError,
}

impl StageError {
    pub fn new(stage: StageKind, source: AnyError) -> Self {
        Self { stage, source }
    }

    pub fn stage(&self) -> StageKind {
        self.stage
    }

    pub fn into_source(self) -> AnyError {
        self.source
    }
}

impl core::fmt::Display for StageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} stage error: {}", self.stage, self.source)
    }
}

impl std::error::Error for StageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

/// Lifecycle state of a watched transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStatus {
    Pending,
    Included { block: u64 },
    Dropped,
}

/// A status observation for a previously sent transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTx {
    pub hash: B256,
    pub status: TxStatus,
}

impl PendingTx {
    pub fn new(hash: B256, status: TxStatus) -> Self {
        Self { hash, status }
    }

    pub fn is_final(&self) -> bool {
        !matches!(self.status, TxStatus::Pending)
    }
}

/// Handles returned by [`TxGenerator::start`].
pub struct GeneratorOutput<T> {
    pub done: Completion,
    pub transactions: TxStream<T>,
    pub errors: ErrorSignal,
}

/// Handles returned by [`TxSender::start`].
pub struct SenderOutput {
    pub done: Completion,
    pub errors: ErrorSignal,
}

/// Deploys the target contracts. Runs once, before any other stage.
pub trait ContractDeployer: Send + 'static {
    fn deploy<'a>(&'a mut self, config: &'a PipelineConfig) -> DeployFuture<'a>;
}

/// Produces transactions until it runs out of work or is stopped.
///
/// Implementations spawn their own task, hold the
/// [`CompletionGuard`](crate::CompletionGuard) for the lifetime of that task
/// and stop producing promptly once `stop` fires.
pub trait TxGenerator: Send + 'static {
    type Tx: Send + 'static;

    fn start(self, spec: Arc<PipelineSpec>, stop: StopListener) -> GeneratorOutput<Self::Tx>;
}

/// Consumes generated transactions and pushes them to the target node.
pub trait TxSender: Send + 'static {
    type Tx: Send + 'static;

    fn start(
        self,
        spec: Arc<PipelineSpec>,
        stop: StopListener,
        transactions: TxStream<Self::Tx>,
        pending: PendingStream,
    ) -> SenderOutput;
}

/// Observes in-flight transactions. Its completion is never awaited; it is
/// stopped last and left to wind down on its own.
pub trait TxWatcher: Send + 'static {
    fn start(self, spec: Arc<PipelineSpec>, stop: StopListener) -> PendingStream;
}
