//! HTTP client for the service directory.
//!
//! Service owners use [`RegistryClient`] (or any [`ServiceRegistry`]
//! implementation) to register, deregister, report health and read usage
//! statistics.

mod client;
mod error;
pub mod types;

pub use client::{RegistryClient, ServiceRegistry};
pub use error::ClientError;
pub use types::{HealthStatus, Service, ServiceRegistration, ServiceStatistics};
