//! This module provides reusable test utilities:
//! - Mock instance endpoints and a fixed-outcome probe
//! - Test configuration builders
//! - In-memory test databases with wired components
//! - Common test data

// Allow unused code in test fixtures - not every test binary uses every helper
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod mock_instance;
pub mod mock_probe;
pub mod test_config;
pub mod test_data;
pub mod test_database;

// Re-export commonly used items
pub use mock_instance::MockInstanceServer;
pub use mock_probe::StaticProbe;
pub use test_config::TestConfigBuilder;
pub use test_data::*;
pub use test_database::TestDatabase;
