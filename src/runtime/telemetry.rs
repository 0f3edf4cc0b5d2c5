use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio::{select, time};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Default interval used by the metrics reporter task.
pub const DEFAULT_METRICS_INTERVAL: Duration = Duration::from_secs(5);

static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// Installs a basic tracing subscriber (if one is not already active).
///
/// The subscriber honours `RUST_LOG` if it is present, otherwise it falls back to `info`.
/// Calling this function multiple times is harmless.
pub fn init_tracing() {
    if TRACING_INIT.get().is_some() {
        return;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .try_init();

    let _ = TRACING_INIT.set(());
}

/// Rolling counters shared by the orchestrator and the stages.
#[derive(Default, Debug)]
pub struct Telemetry {
    generated_txs: AtomicU64,
    sent_txs: AtomicU64,
    confirmed_txs: AtomicU64,
    stage_errors: AtomicU64,
    stops_issued: AtomicU64,
    redundant_closes: AtomicU64,
    shutdowns: AtomicU64,
}

impl Telemetry {
    pub fn record_generated(&self, count: u64) {
        self.generated_txs.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_sent(&self, count: u64) {
        self.sent_txs.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_confirmed(&self, count: u64) {
        self.confirmed_txs.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_stage_error(&self) {
        self.stage_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a stop close attempt; `closed` is the result of the close call.
    pub fn record_stop(&self, closed: bool) {
        if closed {
            self.stops_issued.fetch_add(1, Ordering::Relaxed);
        } else {
            self.redundant_closes.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_shutdown(&self) {
        self.shutdowns.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            generated_txs: self.generated_txs.load(Ordering::Relaxed),
            sent_txs: self.sent_txs.load(Ordering::Relaxed),
            confirmed_txs: self.confirmed_txs.load(Ordering::Relaxed),
            stage_errors: self.stage_errors.load(Ordering::Relaxed),
            stops_issued: self.stops_issued.load(Ordering::Relaxed),
            redundant_closes: self.redundant_closes.load(Ordering::Relaxed),
            shutdowns: self.shutdowns.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TelemetrySnapshot {
    pub generated_txs: u64,
    pub sent_txs: u64,
    pub confirmed_txs: u64,
    pub stage_errors: u64,
    pub stops_issued: u64,
    pub redundant_closes: u64,
    pub shutdowns: u64,
}

/// Spawns a background task that periodically logs send throughput and stage counters.
pub fn spawn_metrics_reporter(
    telemetry: Arc<Telemetry>,
    shutdown: CancellationToken,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut last_snapshot = telemetry.snapshot();
        let mut last_tick = Instant::now();

        loop {
            select! {
                _ = shutdown.cancelled() => {
                    tracing::info!(target: "txspam::metrics", "metrics reporter shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    let current_snapshot = telemetry.snapshot();
                    let sent_delta = current_snapshot
                        .sent_txs
                        .saturating_sub(last_snapshot.sent_txs);
                    let elapsed = last_tick.elapsed().as_secs_f64();
                    let throughput = if elapsed <= f64::EPSILON {
                        0.0
                    } else {
                        sent_delta as f64 / elapsed
                    };

                    tracing::info!(
                        target: "txspam::metrics",
                        tps = format!("{throughput:.2}"),
                        generated = current_snapshot.generated_txs,
                        sent = current_snapshot.sent_txs,
                        confirmed = current_snapshot.confirmed_txs,
                        stage_errors = current_snapshot.stage_errors,
                        "runtime metrics snapshot"
                    );

                    last_snapshot = current_snapshot;
                    last_tick = Instant::now();
                }
            }
        }
    })
}
