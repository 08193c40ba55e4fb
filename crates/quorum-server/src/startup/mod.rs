//! Application startup utilities module.

mod http;
mod logging;
mod shutdown;

pub use http::status_server;
pub use logging::{LogRotation, LoggingConfig, LoggingGuard, init_logging};
pub use shutdown::{ShutdownSignal, listen_for_os_signals, run_with_shutdown};
