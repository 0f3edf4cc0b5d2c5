//! Pipeline orchestration.
//!
//! `Orchestrator` is the only entry point callers see. The work is split so
//! each concern lives in the module that owns it:
//! - `lifecycle` owns the per-run stop signals and the metrics reporter.
//! - `coordinator` runs the event loop and the ordered shutdown.
//! - `state` defines the shutdown state machine and its triggers.
//! - `drain` waits for a stopped stage, optionally bounded by a timeout.

mod coordinator;
mod drain;
mod lifecycle;
mod pipeline;
pub mod state;

pub use pipeline::{Orchestrator, PipelineError};
