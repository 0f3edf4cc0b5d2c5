use crate::runtime::telemetry::{self, Telemetry};
use alloy_primitives::{Address, U256};
use anyhow::{bail, Context, Result};
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_CONTRACT_COUNT: usize = 1;
const DEFAULT_TX_INTERVAL_MS: u64 = 100;
const DEFAULT_GAS_LIMIT: u64 = 100_000;
const DEFAULT_GAS_PRICE_WEI: u64 = 1_000_000_000;
const DEFAULT_TX_BUFFER: usize = 1_024;
const DEFAULT_PENDING_BUFFER: usize = 1_024;
const DEFAULT_ERROR_BUFFER: usize = 16;

/// Runtime configuration for a load-generation pipeline.
///
/// All instances must be constructed via [`PipelineConfig::builder`] or [`PipelineConfig::new`]
/// so invariants are validated before any stage observes the values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    rpc_url: String,
    chain_id: u64,
    contract_count: usize,
    tx_limit: Option<u64>,
    tx_interval: Duration,
    gas_limit: u64,
    gas_price: U256,
    tx_buffer: usize,
    pending_buffer: usize,
    error_buffer: usize,
    metrics_interval: Duration,
    drain_timeout: Option<Duration>,
}

pub struct PipelineConfigParams {
    pub rpc_url: String,
    pub chain_id: u64,
    pub contract_count: usize,
    pub tx_limit: Option<u64>,
    pub tx_interval: Duration,
    pub gas_limit: u64,
    pub gas_price: U256,
    pub tx_buffer: usize,
    pub pending_buffer: usize,
    pub error_buffer: usize,
    pub metrics_interval: Duration,
    pub drain_timeout: Option<Duration>,
}

impl PipelineConfig {
    /// Returns a builder to incrementally construct and validate a configuration.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Constructs a configuration directly from the provided values.
    pub fn new(params: PipelineConfigParams) -> Result<Self> {
        let PipelineConfigParams {
            rpc_url,
            chain_id,
            contract_count,
            tx_limit,
            tx_interval,
            gas_limit,
            gas_price,
            tx_buffer,
            pending_buffer,
            error_buffer,
            metrics_interval,
            drain_timeout,
        } = params;

        let config = Self {
            rpc_url: rpc_url.trim().to_owned(),
            chain_id,
            contract_count,
            tx_limit,
            tx_interval,
            gas_limit,
            gas_price,
            tx_buffer,
            pending_buffer,
            error_buffer,
            metrics_interval,
            drain_timeout,
        };

        config.validate()?;
        Ok(config)
    }

    /// Endpoint of the execution node the stages talk to.
    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Number of target contracts the deployer is asked to create.
    pub fn contract_count(&self) -> usize {
        self.contract_count
    }

    /// Total transactions the generator should emit. `None` means unbounded.
    pub fn tx_limit(&self) -> Option<u64> {
        self.tx_limit
    }

    /// Pause between two generated transactions.
    pub fn tx_interval(&self) -> Duration {
        self.tx_interval
    }

    pub fn gas_limit(&self) -> u64 {
        self.gas_limit
    }

    pub fn gas_price(&self) -> U256 {
        self.gas_price
    }

    /// Capacity of the generator -> sender transaction stream.
    pub fn tx_buffer(&self) -> usize {
        self.tx_buffer
    }

    /// Capacity of the watcher -> sender pending observation stream.
    pub fn pending_buffer(&self) -> usize {
        self.pending_buffer
    }

    /// Capacity of each stage's error conduit.
    pub fn error_buffer(&self) -> usize {
        self.error_buffer
    }

    /// Interval used by the telemetry reporter.
    pub fn metrics_interval(&self) -> Duration {
        self.metrics_interval
    }

    /// Upper bound on each drain step during shutdown. `None` waits forever.
    pub fn drain_timeout(&self) -> Option<Duration> {
        self.drain_timeout
    }

    /// Performs validation on an existing configuration instance.
    pub fn validate(&self) -> Result<()> {
        validate_url(&self.rpc_url)?;

        if self.chain_id == 0 {
            bail!("chain_id must be greater than 0");
        }

        if self.contract_count == 0 {
            bail!("contract_count must be greater than 0");
        }

        if self.tx_limit == Some(0) {
            bail!("tx_limit must be greater than 0 when set");
        }

        if self.gas_limit == 0 {
            bail!("gas_limit must be greater than 0");
        }

        if self.tx_buffer == 0 {
            bail!("tx_buffer must be greater than 0");
        }

        if self.pending_buffer == 0 {
            bail!("pending_buffer must be greater than 0");
        }

        if self.error_buffer == 0 {
            bail!("error_buffer must be greater than 0");
        }

        if self.metrics_interval.is_zero() {
            bail!("metrics_interval must be greater than 0");
        }

        if matches!(self.drain_timeout, Some(timeout) if timeout.is_zero()) {
            bail!("drain_timeout must be greater than 0 when set");
        }

        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct PipelineConfigBuilder {
    rpc_url: Option<String>,
    chain_id: Option<u64>,
    contract_count: Option<usize>,
    tx_limit: Option<u64>,
    tx_interval: Option<Duration>,
    gas_limit: Option<u64>,
    gas_price: Option<U256>,
    tx_buffer: Option<usize>,
    pending_buffer: Option<usize>,
    error_buffer: Option<usize>,
    metrics_interval: Option<Duration>,
    drain_timeout: Option<Duration>,
}

impl PipelineConfigBuilder {
    pub fn rpc_url(mut self, url: impl Into<String>) -> Self {
        self.rpc_url = Some(url.into());
        self
    }

    pub fn chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    pub fn contract_count(mut self, count: usize) -> Self {
        self.contract_count = Some(count);
        self
    }

    pub fn tx_limit(mut self, limit: u64) -> Self {
        self.tx_limit = Some(limit);
        self
    }

    pub fn tx_interval(mut self, interval: Duration) -> Self {
        self.tx_interval = Some(interval);
        self
    }

    pub fn gas_limit(mut self, gas: u64) -> Self {
        self.gas_limit = Some(gas);
        self
    }

    pub fn gas_price(mut self, wei: U256) -> Self {
        self.gas_price = Some(wei);
        self
    }

    pub fn tx_buffer(mut self, capacity: usize) -> Self {
        self.tx_buffer = Some(capacity);
        self
    }

    pub fn pending_buffer(mut self, capacity: usize) -> Self {
        self.pending_buffer = Some(capacity);
        self
    }

    pub fn error_buffer(mut self, capacity: usize) -> Self {
        self.error_buffer = Some(capacity);
        self
    }

    pub fn metrics_interval(mut self, interval: Duration) -> Self {
        self.metrics_interval = Some(interval);
        self
    }

    pub fn drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<PipelineConfig> {
        let params = PipelineConfigParams {
            rpc_url: self.rpc_url.context("rpc_url is required")?,
            chain_id: self.chain_id.context("chain_id is required")?,
            contract_count: self.contract_count.unwrap_or(DEFAULT_CONTRACT_COUNT),
            tx_limit: self.tx_limit,
            tx_interval: self
                .tx_interval
                .unwrap_or_else(|| Duration::from_millis(DEFAULT_TX_INTERVAL_MS)),
            gas_limit: self.gas_limit.unwrap_or(DEFAULT_GAS_LIMIT),
            gas_price: self
                .gas_price
                .unwrap_or_else(|| U256::from(DEFAULT_GAS_PRICE_WEI)),
            tx_buffer: self.tx_buffer.unwrap_or(DEFAULT_TX_BUFFER),
            pending_buffer: self.pending_buffer.unwrap_or(DEFAULT_PENDING_BUFFER),
            error_buffer: self.error_buffer.unwrap_or(DEFAULT_ERROR_BUFFER),
            metrics_interval: self
                .metrics_interval
                .unwrap_or(telemetry::DEFAULT_METRICS_INTERVAL),
            drain_timeout: self.drain_timeout,
        };

        PipelineConfig::new(params)
    }
}

fn validate_url(url: &str) -> Result<()> {
    let url = url.trim();
    let supported = ["http://", "https://", "ws://", "wss://"];
    if !supported.iter().any(|scheme| url.starts_with(scheme)) {
        bail!("rpc_url must start with http://, https://, ws:// or wss://");
    }
    Ok(())
}

/// Read-only bundle shared by every stage of a single run.
///
/// Built by the orchestrator once deployment succeeded, so the target
/// addresses are always populated by the time a stage sees it.
#[derive(Debug)]
pub struct PipelineSpec {
    config: Arc<PipelineConfig>,
    targets: Vec<Address>,
    telemetry: Arc<Telemetry>,
}

impl PipelineSpec {
    pub fn new(
        config: Arc<PipelineConfig>,
        targets: Vec<Address>,
        telemetry: Arc<Telemetry>,
    ) -> Self {
        Self {
            config,
            targets,
            telemetry,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Contract addresses produced by the deployer.
    pub fn targets(&self) -> &[Address] {
        &self.targets
    }

    /// Counters stages can use to report generated/sent/confirmed volume.
    pub fn telemetry(&self) -> &Arc<Telemetry> {
        &self.telemetry
    }
}
