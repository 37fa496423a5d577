//! Configuration management for the canary console
//!
//! Settings are layered: `conf/application.yml`, then `CANARY_`-prefixed
//! environment variables (`CANARY_SERVER__PORT=9000`), then command line flags.

use std::time::Duration;

use clap::Parser;
use config::{Config, Environment, File};

use crate::startup::LoggingConfig;

use super::constants::*;

/// Command line arguments for the server
#[derive(Debug, Default, Parser)]
#[command(name = "canary-server", version, about = "Canary ingress console")]
pub struct Cli {
    /// Configuration file, extension optional
    #[arg(short = 'c', long = "config", env = "CANARY_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    pub config_file: String,
    #[arg(long = "address")]
    pub address: Option<String>,
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,
    #[arg(long = "lock-ttl-secs")]
    pub lock_ttl_secs: Option<u64>,
    #[arg(long = "kubeconfig")]
    pub kubeconfig: Option<String>,
}

/// Application configuration loaded from config files and environment
#[derive(Clone, Debug, Default)]
pub struct Configuration {
    pub config: Config,
}

impl Configuration {
    /// Load configuration using the process' command line.
    pub fn new() -> anyhow::Result<Self> {
        Self::load(Cli::parse())
    }

    pub fn load(args: Cli) -> anyhow::Result<Self> {
        let mut config_builder = Config::builder()
            .add_source(File::with_name(&args.config_file).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        if let Some(v) = args.address {
            config_builder = config_builder.set_override(SERVER_ADDRESS_PROPERTY, v)?;
        }
        if let Some(v) = args.port {
            config_builder = config_builder.set_override(SERVER_PORT_PROPERTY, i64::from(v))?;
        }
        if let Some(v) = args.lock_ttl_secs {
            config_builder = config_builder.set_override(LOCK_TTL_PROPERTY, v)?;
        }
        if let Some(v) = args.kubeconfig {
            config_builder = config_builder.set_override(KUBECONFIG_PROPERTY, v)?;
        }

        let app_config = config_builder.build()?;
        Ok(Configuration { config: app_config })
    }

    pub fn from_config(config: Config) -> Self {
        Configuration { config }
    }

    // ========================================================================
    // Server Configuration
    // ========================================================================

    pub fn server_address(&self) -> String {
        self.config
            .get_string(SERVER_ADDRESS_PROPERTY)
            .unwrap_or(DEFAULT_SERVER_ADDRESS.to_string())
    }

    pub fn server_port(&self) -> u16 {
        self.config
            .get_int(SERVER_PORT_PROPERTY)
            .ok()
            .and_then(|v| u16::try_from(v).ok())
            .unwrap_or(DEFAULT_SERVER_PORT)
    }

    /// Upper bound on waiting for in-flight requests once a signal starts the drain
    pub fn graceful_timeout(&self) -> Duration {
        Duration::from_secs(
            self.positive_secs(SERVER_GRACEFUL_TIMEOUT_PROPERTY)
                .unwrap_or(DEFAULT_GRACEFUL_TIMEOUT_SECS),
        )
    }

    // ========================================================================
    // Lock Configuration
    // ========================================================================

    pub fn lock_ttl(&self) -> Duration {
        Duration::from_secs(
            self.positive_secs(LOCK_TTL_PROPERTY)
                .unwrap_or(DEFAULT_LOCK_TTL_SECS),
        )
    }

    pub fn lock_sweep_interval(&self) -> Duration {
        Duration::from_secs(
            self.positive_secs(LOCK_SWEEP_INTERVAL_PROPERTY)
                .unwrap_or(DEFAULT_LOCK_SWEEP_INTERVAL_SECS),
        )
    }

    // ========================================================================
    // Identity / Kubernetes
    // ========================================================================

    pub fn identity_header(&self) -> String {
        self.config
            .get_string(IDENTITY_HEADER_PROPERTY)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(DEFAULT_IDENTITY_HEADER.to_string())
    }

    pub fn kubeconfig(&self) -> Option<String> {
        self.config
            .get_string(KUBECONFIG_PROPERTY)
            .ok()
            .filter(|v| !v.is_empty())
    }

    // ========================================================================
    // Logging
    // ========================================================================

    pub fn logging_config(&self) -> LoggingConfig {
        LoggingConfig::from_config(
            self.config.get_string(LOGS_PATH_PROPERTY).ok(),
            self.config.get_bool(LOGS_CONSOLE_PROPERTY).unwrap_or(true),
            self.config.get_bool(LOGS_FILE_PROPERTY).unwrap_or(false),
            self.config
                .get_string(LOGS_LEVEL_PROPERTY)
                .unwrap_or(DEFAULT_LOG_LEVEL.to_string()),
            self.config.get_bool(LOGS_JSON_PROPERTY).unwrap_or(false),
            &self
                .config
                .get_string(LOGS_ROTATION_PROPERTY)
                .unwrap_or(DEFAULT_LOG_ROTATION.to_string()),
        )
    }

    fn positive_secs(&self, key: &str) -> Option<u64> {
        self.config
            .get_int(key)
            .ok()
            .and_then(|v| u64::try_from(v).ok())
            .filter(|v| *v > 0)
    }
}
