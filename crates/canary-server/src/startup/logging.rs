//! Multi-file logging for the canary console.
//!
//! Console output is always available; file output writes a root log plus one
//! file per component, routed by `tracing` target. Files rotate daily unless
//! `logs.rotation` says `hourly` or `never`:
//!
//! | Log File   | Component                      | Target Prefixes                                   |
//! |------------|--------------------------------|---------------------------------------------------|
//! | canary.log | Root logger (all components)   | (all)                                             |
//! | lock.log   | Ingress edit locks             | canary_core::service::lock, canary_server::api::lock |
//! | drain.log  | Admission, drain and shutdown  | canary_core::service::drain, canary_server::middleware::admission, canary_server::startup::shutdown |
//! | kube.log   | Kubernetes calls and edits     | canary_server::service::kubernetes, canary_server::api::ingress |
//!
//! Log files are stored in `~/canary/logs` unless `logs.path` is set.

use std::path::PathBuf;

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

const APP_NAME: &str = "canary-server";
const ROOT_LOG_FILE: &str = "canary.log";

struct ComponentLogDef {
    file_name: &'static str,
    targets: &'static [&'static str],
}

const COMPONENT_LOGS: &[ComponentLogDef] = &[
    ComponentLogDef {
        file_name: "lock.log",
        targets: &["canary_core::service::lock", "canary_server::api::lock"],
    },
    ComponentLogDef {
        file_name: "drain.log",
        targets: &[
            "canary_core::service::drain",
            "canary_server::middleware::admission",
            "canary_server::startup::shutdown",
        ],
    },
    ComponentLogDef {
        file_name: "kube.log",
        targets: &[
            "canary_server::service::kubernetes",
            "canary_server::api::ingress",
        ],
    },
];

/// Log rotation policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogRotation {
    Daily,
    Hourly,
    Never,
}

impl LogRotation {
    /// Parse a `logs.rotation` value; anything unrecognized rotates daily.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "hourly" => LogRotation::Hourly,
            "never" => LogRotation::Never,
            _ => LogRotation::Daily,
        }
    }
}

impl From<LogRotation> for Rotation {
    fn from(rotation: LogRotation) -> Self {
        match rotation {
            LogRotation::Daily => Rotation::DAILY,
            LogRotation::Hourly => Rotation::HOURLY,
            LogRotation::Never => Rotation::NEVER,
        }
    }
}

/// Logging configuration for the entire application.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub log_dir: PathBuf,
    pub console_output: bool,
    /// Bunyan JSON on the console instead of human-readable lines
    pub console_json: bool,
    pub file_logging: bool,
    pub level: Level,
    pub rotation: LogRotation,
}

fn default_log_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(format!("{}/canary/logs", home))
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            console_output: true,
            console_json: false,
            file_logging: false,
            level: Level::INFO,
            rotation: LogRotation::Daily,
        }
    }
}

impl LoggingConfig {
    /// Create from application configuration.
    pub fn from_config(
        log_dir: Option<String>,
        console_output: bool,
        file_logging: bool,
        level: String,
        console_json: bool,
        rotation: &str,
    ) -> Self {
        Self {
            log_dir: log_dir.map(PathBuf::from).unwrap_or_else(default_log_dir),
            console_output,
            console_json,
            file_logging,
            level: level.parse().unwrap_or(Level::INFO),
            rotation: LogRotation::from_name(rotation),
        }
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.level.to_string()))
    }
}

/// Keeps the non-blocking file writers alive; dropping it flushes buffered output.
pub struct LoggingGuard {
    _file_guards: Vec<WorkerGuard>,
}

/// Initialize the global subscriber.
///
/// `RUST_LOG` overrides the configured level for the console and root file.
/// Component files capture everything from their targets.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<LoggingGuard> {
    if config.file_logging {
        std::fs::create_dir_all(&config.log_dir)?;
    }

    let mut guards: Vec<WorkerGuard> = Vec::new();
    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    if config.console_output {
        if config.console_json {
            layers.push(Box::new(JsonStorageLayer));
            layers.push(Box::new(
                BunyanFormattingLayer::new(APP_NAME.to_string(), std::io::stdout)
                    .with_filter(config.env_filter()),
            ));
        } else {
            layers.push(Box::new(
                fmt::layer()
                    .with_target(true)
                    .with_thread_names(true)
                    .with_filter(config.env_filter()),
            ));
        }
    }

    if config.file_logging {
        let root_appender =
            RollingFileAppender::new(config.rotation.into(), &config.log_dir, ROOT_LOG_FILE);
        let (root_nb, root_guard) = tracing_appender::non_blocking(root_appender);
        guards.push(root_guard);
        layers.push(Box::new(
            fmt::layer()
                .with_writer(root_nb)
                .with_target(true)
                .with_thread_names(true)
                .with_ansi(false)
                .with_filter(config.env_filter()),
        ));

        for component in COMPONENT_LOGS {
            let appender =
                RollingFileAppender::new(config.rotation.into(), &config.log_dir, component.file_name);
            let (nb, guard) = tracing_appender::non_blocking(appender);
            guards.push(guard);

            let targets = component
                .targets
                .iter()
                .fold(Targets::new(), |targets, target| {
                    targets.with_target(*target, LevelFilter::TRACE)
                });

            layers.push(Box::new(
                fmt::layer()
                    .with_writer(nb)
                    .with_target(true)
                    .with_thread_names(true)
                    .with_ansi(false)
                    .with_filter(targets),
            ));
        }
    }

    Registry::default()
        .with(layers)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    if config.file_logging {
        tracing::info!(
            log_dir = %config.log_dir.display(),
            "File logging initialized: {} (root) + {} component log files",
            ROOT_LOG_FILE,
            COMPONENT_LOGS.len()
        );
    }

    Ok(LoggingGuard {
        _file_guards: guards,
    })
}
