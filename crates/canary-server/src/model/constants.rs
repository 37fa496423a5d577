// Configuration keys and defaults

pub const DEFAULT_CONFIG_FILE: &str = "conf/application.yml";
pub const ENV_PREFIX: &str = "CANARY";

pub const SERVER_ADDRESS_PROPERTY: &str = "server.address";
pub const SERVER_PORT_PROPERTY: &str = "server.port";
pub const SERVER_GRACEFUL_TIMEOUT_PROPERTY: &str = "server.graceful_timeout_secs";

pub const LOCK_TTL_PROPERTY: &str = "lock.ttl_secs";
pub const LOCK_SWEEP_INTERVAL_PROPERTY: &str = "lock.sweep_interval_secs";

pub const IDENTITY_HEADER_PROPERTY: &str = "identity.header";

pub const KUBECONFIG_PROPERTY: &str = "kube.kubeconfig";

pub const LOGS_PATH_PROPERTY: &str = "logs.path";
pub const LOGS_LEVEL_PROPERTY: &str = "logs.level";
pub const LOGS_CONSOLE_PROPERTY: &str = "logs.console";
pub const LOGS_FILE_PROPERTY: &str = "logs.file";
pub const LOGS_JSON_PROPERTY: &str = "logs.json";
pub const LOGS_ROTATION_PROPERTY: &str = "logs.rotation";

pub const DEFAULT_SERVER_ADDRESS: &str = "0.0.0.0";
pub const DEFAULT_SERVER_PORT: u16 = 8888;
pub const DEFAULT_GRACEFUL_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LOCK_TTL_SECS: u64 = 24 * 60 * 60;
pub const DEFAULT_LOCK_SWEEP_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_IDENTITY_HEADER: &str = "X-Forwarded-User";
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_LOG_ROTATION: &str = "daily";

/// Paths answered while draining, so orchestrator probes keep working
pub const DRAIN_EXEMPT_PATHS: &[&str] = &["/healthz", "/readyz"];
