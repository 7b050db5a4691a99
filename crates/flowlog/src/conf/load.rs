//! Load: config loading from file and environment variables.

use std::path::Path;

use super::model::{ConfigError, FlowlogConfig};

impl FlowlogConfig {
    /// Load configuration from an optional TOML file, then apply env overrides.
    /// Priority: Environment Variables > Config File > Defaults
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) if Path::new(path).exists() => {
                tracing::info!("Loading flowlog configuration from: {}", path);
                Self::from_file(path)?
            }
            Some(path) => {
                tracing::info!("Flowlog config not found at {}, using defaults", path);
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        Ok(toml::from_str(&contents)?)
    }

    /// Environment variables override file values for the size caps.
    pub fn apply_env_overrides(&mut self) {
        if let Some(v) = env_usize("FLOWLOG_MAX_ARCHIVE_BYTES") {
            self.ingest.max_archive_bytes = v;
        }
        if let Some(v) = env_usize("FLOWLOG_MAX_MEMBER_BYTES") {
            self.ingest.max_member_bytes = v;
        }
        if let Some(v) = env_usize("FLOWLOG_MAX_TOTAL_BYTES") {
            self.ingest.max_total_bytes = v;
        }
        if let Some(v) = env_usize("FLOWLOG_MAX_LINE_BYTES") {
            self.ingest.max_line_bytes = v;
        }
    }
}

fn env_usize(key: &str) -> Option<usize> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}
