use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy_primitives::{Address, B256};
use anyhow::anyhow;
use tokio::sync::mpsc;
use tokio::time::sleep;
use txspam::{
    completion_channel, error_channel, ContractDeployer, DeployFuture, ErrorReporter,
    GeneratorOutput, PendingStream, PendingTx, PipelineConfig, PipelineSpec, SenderOutput,
    StageKind, StopListener, TxGenerator, TxSender, TxStatus, TxStream, TxWatcher,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEvent {
    Deployed(usize),
    Started(StageKind),
    StopObserved(StageKind),
    Exited(StageKind),
    Sent(u64),
}

/// Shared, ordered record of what the mock stages did.
#[derive(Clone, Default)]
pub struct EventLog {
    inner: Arc<Mutex<Vec<LogEvent>>>,
}

impl EventLog {
    pub fn push(&self, event: LogEvent) {
        self.inner.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<LogEvent> {
        self.inner.lock().unwrap().clone()
    }

    pub fn contains(&self, event: &LogEvent) -> bool {
        self.inner.lock().unwrap().contains(event)
    }

    pub fn position(&self, event: &LogEvent) -> Option<usize> {
        self.inner.lock().unwrap().iter().position(|e| e == event)
    }

    pub fn sent(&self) -> Vec<u64> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                LogEvent::Sent(seq) => Some(seq),
                _ => None,
            })
            .collect()
    }

    pub fn started(&self) -> Vec<StageKind> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                LogEvent::Started(stage) => Some(stage),
                _ => None,
            })
            .collect()
    }
}

pub struct MockDeployer {
    failure: Option<&'static str>,
    log: EventLog,
}

impl MockDeployer {
    pub fn succeeding(log: EventLog) -> Self {
        Self { failure: None, log }
    }

    pub fn failing(log: EventLog, message: &'static str) -> Self {
        Self {
            failure: Some(message),
            log,
        }
    }
}

impl ContractDeployer for MockDeployer {
    fn deploy<'a>(&'a mut self, config: &'a PipelineConfig) -> DeployFuture<'a> {
        Box::pin(async move {
            if let Some(message) = self.failure {
                return Err(anyhow!(message));
            }
            let targets: Vec<Address> = (0..config.contract_count())
                .map(|idx| Address::repeat_byte(idx as u8 + 1))
                .collect();
            self.log.push(LogEvent::Deployed(targets.len()));
            Ok(targets)
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub enum GeneratorBehavior {
    /// Produce until stopped.
    Unbounded,
    /// Produce `n` transactions, then exit on its own.
    Finite(u64),
    /// Produce `n` transactions, report an error, then wait for the stop.
    FailAfter(u64),
    /// Ignore the stop signal for the given duration before exiting.
    Stubborn(Duration),
}

pub struct MockGenerator {
    behavior: GeneratorBehavior,
    log: EventLog,
}

impl MockGenerator {
    pub fn new(behavior: GeneratorBehavior, log: EventLog) -> Self {
        Self { behavior, log }
    }
}

impl TxGenerator for MockGenerator {
    type Tx = u64;

    fn start(self, spec: Arc<PipelineSpec>, stop: StopListener) -> GeneratorOutput<u64> {
        let config = spec.config();
        let (tx, transactions) = mpsc::channel(config.tx_buffer());
        let (reporter, errors) = error_channel(StageKind::Generator, config.error_buffer());
        let (guard, done) = completion_channel();
        self.log.push(LogEvent::Started(StageKind::Generator));

        let log = self.log;
        let behavior = self.behavior;
        tokio::spawn(async move {
            let _guard = guard;
            generate(behavior, &spec, tx, reporter, &stop, &log).await;
            log.push(LogEvent::Exited(StageKind::Generator));
        });

        GeneratorOutput {
            done,
            transactions,
            errors,
        }
    }
}

async fn generate(
    behavior: GeneratorBehavior,
    spec: &PipelineSpec,
    tx: mpsc::Sender<u64>,
    reporter: ErrorReporter,
    stop: &StopListener,
    log: &EventLog,
) {
    let limit = match behavior {
        GeneratorBehavior::Unbounded => None,
        GeneratorBehavior::Finite(n) | GeneratorBehavior::FailAfter(n) => Some(n),
        GeneratorBehavior::Stubborn(hold) => {
            stop.stopped().await;
            log.push(LogEvent::StopObserved(StageKind::Generator));
            sleep(hold).await;
            return;
        }
    };

    let mut seq = 0;
    while limit.map_or(true, |limit| seq < limit) {
        tokio::select! {
            biased;
            _ = stop.stopped() => {
                log.push(LogEvent::StopObserved(StageKind::Generator));
                return;
            }
            sent = tx.send(seq) => {
                if sent.is_err() {
                    return;
                }
                spec.telemetry().record_generated(1);
                seq += 1;
            }
        }
        sleep(spec.config().tx_interval()).await;
    }

    if let GeneratorBehavior::FailAfter(_) = behavior {
        reporter.report(anyhow!("generator ran out of funded accounts"));
        stop.stopped().await;
        log.push(LogEvent::StopObserved(StageKind::Generator));
    }
}

#[derive(Debug, Clone, Copy)]
pub enum SenderBehavior {
    /// Consume until stopped, even after the input stream closed.
    UntilStopped,
    /// Exit on its own after sending `n` transactions.
    ExitAfter(u64),
    /// Report an error after sending `n` transactions, keep consuming until stopped.
    FailAfter(u64),
}

pub struct MockSender {
    behavior: SenderBehavior,
    log: EventLog,
}

impl MockSender {
    pub fn new(behavior: SenderBehavior, log: EventLog) -> Self {
        Self { behavior, log }
    }
}

impl TxSender for MockSender {
    type Tx = u64;

    fn start(
        self,
        spec: Arc<PipelineSpec>,
        stop: StopListener,
        transactions: TxStream<u64>,
        pending: PendingStream,
    ) -> SenderOutput {
        let (reporter, errors) = error_channel(StageKind::Sender, spec.config().error_buffer());
        let (guard, done) = completion_channel();
        self.log.push(LogEvent::Started(StageKind::Sender));

        let log = self.log;
        let behavior = self.behavior;
        tokio::spawn(async move {
            let _guard = guard;
            send(behavior, &spec, transactions, pending, reporter, &stop, &log).await;
            log.push(LogEvent::Exited(StageKind::Sender));
        });

        SenderOutput { done, errors }
    }
}

async fn send(
    behavior: SenderBehavior,
    spec: &PipelineSpec,
    mut transactions: TxStream<u64>,
    mut pending: PendingStream,
    reporter: ErrorReporter,
    stop: &StopListener,
    log: &EventLog,
) {
    let mut count = 0u64;
    let mut inputs_open = true;
    let mut pending_open = true;

    match behavior {
        SenderBehavior::ExitAfter(0) => return,
        SenderBehavior::FailAfter(0) => {
            reporter.report(anyhow!("nonce too low"));
        }
        _ => {}
    }

    loop {
        tokio::select! {
            biased;
            _ = stop.stopped() => {
                log.push(LogEvent::StopObserved(StageKind::Sender));
                while let Ok(seq) = transactions.try_recv() {
                    log.push(LogEvent::Sent(seq));
                    spec.telemetry().record_sent(1);
                }
                return;
            }
            next = transactions.recv(), if inputs_open => match next {
                Some(seq) => {
                    log.push(LogEvent::Sent(seq));
                    spec.telemetry().record_sent(1);
                    count += 1;
                    match behavior {
                        SenderBehavior::ExitAfter(n) if count >= n => return,
                        SenderBehavior::FailAfter(n) if count == n => {
                            reporter.report(anyhow!("nonce too low"));
                        }
                        _ => {}
                    }
                }
                None => inputs_open = false,
            },
            update = pending.recv(), if pending_open => match update {
                Some(update) => {
                    if update.is_final() {
                        spec.telemetry().record_confirmed(1);
                    }
                }
                None => pending_open = false,
            },
        }
    }
}

pub struct MockWatcher {
    log: EventLog,
}

impl MockWatcher {
    pub fn new(log: EventLog) -> Self {
        Self { log }
    }
}

impl TxWatcher for MockWatcher {
    fn start(self, spec: Arc<PipelineSpec>, stop: StopListener) -> PendingStream {
        let (tx, pending) = mpsc::channel(spec.config().pending_buffer());
        self.log.push(LogEvent::Started(StageKind::Watcher));

        let log = self.log;
        tokio::spawn(async move {
            let mut block = 0u64;
            loop {
                tokio::select! {
                    _ = stop.stopped() => {
                        log.push(LogEvent::StopObserved(StageKind::Watcher));
                        break;
                    }
                    _ = sleep(Duration::from_millis(5)) => {
                        block += 1;
                        let update = PendingTx::new(
                            B256::repeat_byte(block as u8),
                            TxStatus::Included { block },
                        );
                        let _ = tx.try_send(update);
                    }
                }
            }
            log.push(LogEvent::Exited(StageKind::Watcher));
        });

        pending
    }
}
