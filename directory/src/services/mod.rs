// File: directory/src/services/mod.rs

pub mod history_archive;
pub mod instance_store;
pub mod service_store;
pub mod statistics;

pub use history_archive::HistoryArchive;
pub use instance_store::InstanceStore;
pub use service_store::ServiceStore;
pub use statistics::{ServiceStatistics, StatisticsAggregator};
