//! Runtime glue: configuration, stage protocol, observer, telemetry, and the
//! service runner.

pub mod config;
pub mod observer;
pub mod protocol;
pub mod runner;
pub mod telemetry;
