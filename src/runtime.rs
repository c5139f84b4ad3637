//! Runtime glue that wires configuration, the processor seam, telemetry, and
//! runner orchestration.

pub mod config;
pub mod processor;
pub mod runner;
pub mod telemetry;
