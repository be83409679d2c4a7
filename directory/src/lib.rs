pub mod config;
pub mod constants;
pub mod database;
pub mod errors;
pub mod health;
pub mod services;
pub mod web;

// Re-export commonly used types
pub use config::{Config, ConfigManager};
pub use database::Database;
pub use errors::{DirectoryError, DirectoryResult};
pub use health::{HealthMonitor, HttpProbe};
pub use services::{HistoryArchive, InstanceStore, ServiceStore, StatisticsAggregator};
