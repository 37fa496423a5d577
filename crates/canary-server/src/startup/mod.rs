mod http;
mod logging;
mod shutdown;

pub use http::main_server;
pub use logging::{LogRotation, LoggingConfig, LoggingGuard, init_logging};
pub use shutdown::{GracefulShutdown, ShutdownSignal, wait_for_shutdown_signal};
