use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub server: HttpConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub flowlog: FlowlogSection,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    pub bind_address: String,
    pub write_timeout_secs: u64,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    pub output: LogOutput,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    Stdout,
    File { path: String },
}

/// Where the ingestion core reads its limits and line layout from.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct FlowlogSection {
    /// TOML file holding `[ingest]` and `[layout]`; defaults apply when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_path: Option<String>,
}

impl ServerConfig {
    /// Load configuration from server.toml and environment variables
    pub fn load() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let defaults = config::Config::try_from(&ServerConfig::default())
            .context("Failed to serialize default configuration")?;

        let mut builder = config::Config::builder().add_source(defaults);

        // 1. /etc/flowlog/server.toml (container)
        // 2. config/server.toml (local development)
        // 3. crates/server/config/server.toml (workspace root)
        let config_paths = vec![
            "/etc/flowlog/server",
            "config/server",
            "crates/server/config/server",
        ];

        for path in config_paths {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        // Nested keys use a double underscore: FLOWLOG_SERVER__SERVER__BIND_ADDRESS
        builder = builder.add_source(
            config::Environment::with_prefix("FLOWLOG_SERVER")
                .separator("__")
                .try_parsing(true),
        );

        builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    pub fn validate(&self) -> Result<()> {
        self.server
            .bind_address
            .parse::<std::net::SocketAddr>()
            .context("Invalid bind_address")?;

        if self.server.write_timeout_secs == 0 {
            anyhow::bail!("write_timeout_secs must be > 0");
        }

        if let Some(path) = &self.flowlog.config_path {
            if !std::path::Path::new(path).exists() {
                tracing::warn!("Flowlog config file not found: {} (defaults will be used)", path);
            }
        }

        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server: HttpConfig {
                bind_address: "0.0.0.0:8000".to_string(),
                // uploads are parsed inline, so allow for large archives
                write_timeout_secs: 120,
                enable_cors: false,
                cors_origins: vec!["http://localhost:3000".to_string()],
            },
            logging: LoggingConfig {
                level: "info,server=debug,flowlog=info".to_string(),
                format: LogFormat::Pretty,
                output: LogOutput::Stdout,
            },
            flowlog: FlowlogSection::default(),
        }
    }
}
