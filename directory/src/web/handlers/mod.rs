//! HTTP request handlers for the directory API.
//!
//! This module is organized by domain:
//! - `common` - Response envelope and error mapping
//! - `services` - Service registration and per-service listings
//! - `instances` - Instance creation, lookup, retirement and usage
//! - `health` - Health updates and on-demand probes
//! - `statistics` - Per-service usage statistics

pub mod common;
pub mod health;
pub mod instances;
pub mod services;
pub mod statistics;

pub use health::*;
pub use instances::*;
pub use services::*;
pub use statistics::*;
