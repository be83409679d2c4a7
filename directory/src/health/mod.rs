//! Health monitoring module
//!
//! This module provides the instance health state machine and the probes
//! that feed it.

pub mod monitor;
pub mod probe;

pub use monitor::{aggregate_health, HealthMonitor};
pub use probe::{HealthProbe, HttpProbe, ProbeTarget};
