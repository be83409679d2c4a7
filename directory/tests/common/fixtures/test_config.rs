//! Test configuration builder for writing config files to a temp directory

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Builder for `main.toml` contents
#[derive(Default)]
pub struct TestConfigBuilder {
    entries: Vec<(String, String)>,
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a raw TOML value, e.g. `.set("port", "9000")` or `.set("host", "\"x\"")`
    pub fn set(mut self, key: &str, value: &str) -> Self {
        self.entries.retain(|(k, _)| k != key);
        self.entries.push((key.to_string(), value.to_string()));
        self
    }

    pub fn to_toml(&self) -> String {
        self.entries
            .iter()
            .map(|(key, value)| format!("{} = {}\n", key, value))
            .collect()
    }

    /// Write `main.toml` into a fresh temp directory
    pub fn build(self) -> TestConfig {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("main.toml");
        fs::write(&path, self.to_toml()).expect("Failed to write main.toml");
        TestConfig { temp_dir, path }
    }
}

/// Config file on disk; removed when dropped
pub struct TestConfig {
    pub temp_dir: TempDir,
    pub path: PathBuf,
}

impl TestConfig {
    pub fn path_string(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}
