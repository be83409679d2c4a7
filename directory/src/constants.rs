//! Central repository for configuration defaults, limits, and store tuning
//!
//! Constants are grouped by the concern they configure.

/// SQLite connection tuning
pub mod database {
    /// How long a writer waits on a locked database before failing
    pub const BUSY_TIMEOUT_SECONDS: u64 = 5;

    pub const MAX_CONNECTIONS: u32 = 10;
}

/// Bounds applied when validating caller input
pub mod limits {
    pub const MIN_CLIENT_RATING: f64 = 0.0;
    pub const MAX_CLIENT_RATING: f64 = 5.0;

    pub const MAX_LATITUDE: f64 = 90.0;
    pub const MAX_LONGITUDE: f64 = 180.0;
}

/// Fallbacks for optional configuration fields
pub mod defaults {
    pub const CONFIG_PATH: &str = "config/main.toml";

    /// Environment variable overriding `CONFIG_PATH`
    pub const CONFIG_PATH_ENV: &str = "REGISTRY_CONFIG_PATH";

    pub const HOST: &str = "0.0.0.0";
    pub const PORT: u16 = 8080;
    pub const DATABASE_PATH: &str = "data/directory.db";

    /// Per-request deadline applied by the HTTP handlers
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 10;

    pub const PROBE_TIMEOUT_SECONDS: u64 = 5;

    /// Path probed when an instance registered without a URL
    pub const PROBE_PATH: &str = "/health";
}
