pub mod orchestrator;
pub mod runtime;
pub mod signal;

pub use orchestrator::state::{PipelineState, ShutdownTrigger};
pub use orchestrator::{Orchestrator, PipelineError};
pub use runtime::config::{
    PipelineConfig, PipelineConfigBuilder, PipelineConfigParams, PipelineSpec,
};
pub use runtime::observer::{PipelineObserver, TracingObserver};
pub use runtime::protocol::{
    ContractDeployer, DeployFuture, GeneratorOutput, PendingStream, PendingTx, SenderOutput,
    StageError, StageKind, TxGenerator, TxSender, TxStatus, TxStream, TxWatcher,
};
pub use runtime::runner::Runner;
pub use runtime::telemetry::{init_tracing, Telemetry, TelemetrySnapshot};
pub use signal::completion::{completion_channel, Completion, CompletionGuard};
pub use signal::errors::{error_channel, ErrorReporter, ErrorSignal};
pub use signal::stop::{StopListener, StopSignal};
