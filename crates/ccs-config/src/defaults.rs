use crate::endpoint::TcpEndpoint;
use crate::modes::{DispatchMode, LogFormat};

/// Host the service binds when none is configured.
pub const DEFAULT_LISTEN_HOST: &str = "127.0.0.1";

/// Port the service binds when none is configured.
pub const DEFAULT_LISTEN_PORT: u16 = 7990;

/// Default log filter expression used by the daemon.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Adapter executable invoked to run the optimizing compiler.
pub const DEFAULT_COMPILER_COMMAND: &str = "ccs-compiler-adapter";

/// Seconds a single compile may run before the adapter is killed.
pub const DEFAULT_COMPILER_TIMEOUT_SECS: u64 = 120;

/// Default log filter expression used by the daemon.
#[must_use]
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the daemon.
#[must_use]
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Default scheduling of accepted connections.
#[must_use]
pub fn default_dispatch_mode() -> DispatchMode {
    DispatchMode::Serial
}

/// Computes the default listening endpoint.
#[must_use]
pub fn default_listen_endpoint() -> TcpEndpoint {
    TcpEndpoint::new(DEFAULT_LISTEN_HOST, DEFAULT_LISTEN_PORT)
}

/// Owned compiler command used where allocation is required (e.g. serde).
#[must_use]
pub fn default_compiler_command() -> String {
    DEFAULT_COMPILER_COMMAND.to_owned()
}

/// Default compile timeout in seconds.
#[must_use]
pub const fn default_compiler_timeout_secs() -> u64 {
    DEFAULT_COMPILER_TIMEOUT_SECS
}
